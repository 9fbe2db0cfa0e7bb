use crate::{book::BookId, member::MemberId};

/// Mutations applied to the catalog, reported to observers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogEvent {
    /// A book was added to the catalog
    BookAdded { id: BookId, title: String },
    /// A member was registered
    MemberAdded { id: MemberId, name: String },
    /// A book was checked out to a member
    BookIssued { book: BookId, member: MemberId },
    /// A member handed a book back
    BookReturned { book: BookId, member: MemberId },
}
