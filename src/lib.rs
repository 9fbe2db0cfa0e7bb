//! City library catalog: books, members, issue/return, search and sort.
//!
//! [`LibraryManager`] owns the catalog and rewrites its two data files after
//! every change. [`Console`](console::Console) is a numbered-menu front end
//! that drives the manager over any pair of input and output streams.

pub mod book;
pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod manager;
pub mod member;
pub mod observers;
pub mod persistence;

pub use book::{Book, BookId, BookStatus};
pub use config::StoreConfig;
pub use error::{ErrorKind, LibraryError};
pub use events::CatalogEvent;
pub use manager::{LibraryManager, SortKey};
pub use member::{Member, MemberId};
