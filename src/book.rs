use std::{cmp::Ordering, fmt};

/// Identifier assigned to a book by the manager
pub type BookId = u32;

/// Circulation status of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BookStatus {
    /// Book is on the shelf
    #[default]
    Available,
    /// Book is checked out to a member
    Issued,
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Unique id, assigned on add
    id: BookId,
    /// Title as entered
    title: String,
    /// Author as entered
    author: String,
    /// Free-form category
    category: String,
    /// Whether the book is currently issued
    status: BookStatus,
}

impl Book {
    /// Create a new, available book
    #[must_use]
    pub fn new(id: BookId, title: &str, author: &str, category: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            status: BookStatus::Available,
        }
    }

    /// Rebuild a book from stored fields
    #[must_use]
    pub(crate) fn from_parts(
        id: BookId,
        title: String,
        author: String,
        category: String,
        issued: bool,
    ) -> Self {
        let status = if issued { BookStatus::Issued } else { BookStatus::Available };
        Self { id, title, author, category, status }
    }

    #[must_use]
    pub fn id(&self) -> BookId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn status(&self) -> BookStatus {
        self.status
    }

    /// Whether the book is currently issued
    #[must_use]
    pub fn is_issued(&self) -> bool {
        self.status == BookStatus::Issued
    }

    /// Case-insensitive substring match on title, author or category.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub(crate) fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.author, &self.category]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    /// Mark the book as issued
    pub(crate) fn mark_issued(&mut self) {
        self.status = BookStatus::Issued;
    }

    /// Mark the book as returned
    pub(crate) fn mark_returned(&mut self) {
        self.status = BookStatus::Available;
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Title: {}, Author: {}, Category: {}, Issued: {}",
            self.id,
            self.title,
            self.author,
            self.category,
            self.is_issued()
        )
    }
}

// Natural order is by title, compared as stored. Ties fall through to the
// remaining fields; `Equal` iff `==`.
impl PartialOrd for Book {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Book {
    fn cmp(&self, other: &Self) -> Ordering {
        self.title
            .cmp(&other.title)
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.author.cmp(&other.author))
            .then_with(|| self.category.cmp(&other.category))
            .then_with(|| self.status.cmp(&other.status))
    }
}
