use std::fmt;

use crate::book::BookId;

/// Identifier assigned to a member by the manager
pub type MemberId = u32;

/// A registered library member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Unique id, assigned on add
    id: MemberId,
    /// Display name
    name: String,
    /// Contact address, not validated
    email: String,
    /// Books currently held, in issue order
    issued_books: Vec<BookId>,
}

impl Member {
    /// Create a member holding no books
    #[must_use]
    pub fn new(id: MemberId, name: &str, email: &str) -> Self {
        Self { id, name: name.to_string(), email: email.to_string(), issued_books: Vec::new() }
    }

    /// Rebuild a member from stored fields
    #[must_use]
    pub(crate) fn from_parts(
        id: MemberId,
        name: String,
        email: String,
        issued_books: Vec<BookId>,
    ) -> Self {
        Self { id, name, email, issued_books }
    }

    #[must_use]
    pub fn id(&self) -> MemberId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Ids of the books this member currently holds
    #[must_use]
    pub fn issued_books(&self) -> &[BookId] {
        &self.issued_books
    }

    #[must_use]
    pub fn has_issued_book(&self, book_id: BookId) -> bool {
        self.issued_books.contains(&book_id)
    }

    /// Record a book as held by this member
    pub(crate) fn add_issued_book(&mut self, book_id: BookId) {
        self.issued_books.push(book_id);
    }

    /// Drop the first occurrence of `book_id` from the held list
    pub(crate) fn return_issued_book(&mut self, book_id: BookId) {
        if let Some(pos) = self.issued_books.iter().position(|id| *id == book_id) {
            self.issued_books.remove(pos);
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Email: {}, Issued Books: {}",
            self.id,
            self.name,
            self.email,
            self.issued_books.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_removes_only_that_book() {
        let mut member = Member::new(201, "Ada", "ada@example.com");
        member.add_issued_book(101);
        member.add_issued_book(102);
        member.return_issued_book(101);
        assert_eq!(member.issued_books(), &[102]);
        assert!(!member.has_issued_book(101));
    }

    #[test]
    fn display_counts_issued_books() {
        let mut member = Member::new(201, "Ada", "ada@example.com");
        member.add_issued_book(101);
        assert_eq!(
            member.to_string(),
            "ID: 201, Name: Ada, Email: ada@example.com, Issued Books: 1"
        );
    }
}
