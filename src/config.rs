use std::path::{Path, PathBuf};

/// Default file name for the book records
pub const BOOKS_FILE: &str = "books.json";
/// Default file name for the member records
pub const MEMBERS_FILE: &str = "members.json";

/// Locations of the two data files.
///
/// Only one manager may write a given pair of files at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// File holding the book map
    pub books_path: PathBuf,
    /// File holding the member map
    pub members_path: PathBuf,
}

impl StoreConfig {
    /// Both files under `dir`, with the default names
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self { books_path: dir.join(BOOKS_FILE), members_path: dir.join(MEMBERS_FILE) }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { books_path: PathBuf::from(BOOKS_FILE), members_path: PathBuf::from(MEMBERS_FILE) }
    }
}
