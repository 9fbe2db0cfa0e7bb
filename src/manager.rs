use std::{collections::BTreeMap, fmt, path::Path};

use tracing::{error, warn};

use crate::{
    book::{Book, BookId},
    config::StoreConfig,
    error::{LibraryError, Result},
    events::CatalogEvent,
    member::{Member, MemberId},
    observers::CatalogObserver,
    persistence,
};

/// Id given to the first book of an empty catalog
pub const FIRST_BOOK_ID: BookId = 101;
/// Id given to the first member of an empty catalog
pub const FIRST_MEMBER_ID: MemberId = 201;

/// Field used to order books in a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Title,
    Author,
    Category,
}

impl SortKey {
    /// Map a sort menu answer to a key; anything unrecognized sorts by title
    #[must_use]
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim() {
            "2" => Self::Author,
            "3" => Self::Category,
            _ => Self::Title,
        }
    }

    /// The field of `book` this key compares
    fn field(self, book: &Book) -> &str {
        match self {
            Self::Title => book.title(),
            Self::Author => book.author(),
            Self::Category => book.category(),
        }
    }
}

/// A violation of the rule that a book is issued iff exactly one member holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Book is flagged issued but nobody holds it
    IssuedWithoutHolder(BookId),
    /// A member holds a book that is flagged available
    HeldButAvailable { book: BookId, member: MemberId },
    /// More than one entry across members holds the same book
    MultipleHolders { book: BookId, members: Vec<MemberId> },
    /// A member holds an id that is not in the catalog
    UnknownBook { book: BookId, member: MemberId },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IssuedWithoutHolder(book) => {
                write!(f, "book {book} is issued but held by no member")
            }
            Self::HeldButAvailable { book, member } => {
                write!(f, "member {member} holds book {book}, which is marked available")
            }
            Self::MultipleHolders { book, members } => {
                write!(f, "book {book} is held by several members: {members:?}")
            }
            Self::UnknownBook { book, member } => {
                write!(f, "member {member} holds unknown book {book}")
            }
        }
    }
}

/// Owner of the catalog: books, members, and their persisted copies.
///
/// Every mutating operation applies its change in memory and then rewrites
/// both data files. A failed write does not undo the change; it is logged
/// and kept visible through [`LibraryManager::last_save_error`] until a
/// later save succeeds.
///
/// The manager assumes it is the only writer of its files.
pub struct LibraryManager {
    /// Catalog keyed by book id
    books: BTreeMap<BookId, Book>,
    /// Members keyed by member id
    members: BTreeMap<MemberId, Member>,
    /// Where the maps are persisted
    config: StoreConfig,
    /// Registered change observers
    observers: Vec<Box<dyn CatalogObserver>>,
    /// Message of the last failed save, cleared by a successful one
    last_save_error: Option<String>,
}

impl fmt::Debug for LibraryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryManager")
            .field("books", &self.books)
            .field("members", &self.members)
            .field("config", &self.config)
            .field("observers_count", &self.observers.len())
            .field("last_save_error", &self.last_save_error)
            .finish()
    }
}

impl LibraryManager {
    /// Create an empty manager backed by the files in `config`.
    ///
    /// Nothing is read from disk until [`load_from_file`](Self::load_from_file).
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            books: BTreeMap::new(),
            members: BTreeMap::new(),
            config,
            observers: Vec::new(),
            last_save_error: None,
        }
    }

    /// Register an observer to be notified of catalog changes
    pub fn register_observer(&mut self, observer: Box<dyn CatalogObserver>) {
        self.observers.push(observer);
    }

    /// Replace both maps with the contents of the data files.
    ///
    /// A missing file leaves its map empty. A file that cannot be read or
    /// decoded also leaves its map empty; the error is logged and returned
    /// so the caller can report it, and loading continues with the other file.
    /// A file with undecodable contents is moved aside first, so the next
    /// save does not overwrite it.
    ///
    /// Members may still hold ids of books that failed to load. Those ids
    /// are kept and new book ids are assigned above them.
    pub fn load_from_file(&mut self) -> Vec<LibraryError> {
        let mut problems = Vec::new();

        self.books = persistence::load_books(&self.config.books_path).unwrap_or_else(|e| {
            warn!(error = %e, "could not load books, starting with an empty catalog");
            set_aside_unreadable(&self.config.books_path, &e);
            problems.push(e);
            BTreeMap::new()
        });
        self.members = persistence::load_members(&self.config.members_path).unwrap_or_else(|e| {
            warn!(error = %e, "could not load members, starting with no members");
            set_aside_unreadable(&self.config.members_path, &e);
            problems.push(e);
            BTreeMap::new()
        });

        for issue in self.integrity_issues() {
            warn!(%issue, "inconsistent catalog data");
        }
        self.last_save_error = None;

        problems
    }

    /// Overwrite both data files with the in-memory maps.
    ///
    /// Both files are attempted even if the first write fails.
    ///
    /// # Errors
    ///
    /// Returns the first persistence error encountered.
    pub fn save_to_file(&mut self) -> Result<()> {
        let books = persistence::save_books(&self.config.books_path, &self.books);
        let members = persistence::save_members(&self.config.members_path, &self.members);
        let result = books.and(members);

        self.last_save_error = result.as_ref().err().map(ToString::to_string);
        result
    }

    /// Message of the most recent failed save, if memory is ahead of disk
    #[must_use]
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Whether in-memory state may differ from the data files
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.last_save_error.is_some()
    }

    /// Add a book and return its newly assigned id
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::IdSpaceExhausted` if the highest stored id is
    /// already the largest representable one.
    pub fn add_book(&mut self, title: &str, author: &str, category: &str) -> Result<BookId> {
        let held = self.members.values().flat_map(|m| m.issued_books().iter().copied()).max();
        let highest = self.books.keys().next_back().copied().max(held);
        let id = next_id(highest, FIRST_BOOK_ID)?;
        self.books.insert(id, Book::new(id, title, author, category));

        self.notify(&CatalogEvent::BookAdded { id, title: title.to_string() });
        self.flush();
        Ok(id)
    }

    /// Register a member and return the newly assigned id
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::IdSpaceExhausted` if the highest stored id is
    /// already the largest representable one.
    pub fn add_member(&mut self, name: &str, email: &str) -> Result<MemberId> {
        let id = next_id(self.members.keys().next_back().copied(), FIRST_MEMBER_ID)?;
        self.members.insert(id, Member::new(id, name, email));

        self.notify(&CatalogEvent::MemberAdded { id, name: name.to_string() });
        self.flush();
        Ok(id)
    }

    /// Check a book out to a member
    ///
    /// # Errors
    ///
    /// Returns `BookNotFound` or `MemberNotFound` for unknown ids (checked in
    /// that order), or `AlreadyIssued` if the book is out. State is unchanged
    /// on error.
    pub fn issue_book(&mut self, book_id: BookId, member_id: MemberId) -> Result<()> {
        let book = self.books.get_mut(&book_id).ok_or(LibraryError::BookNotFound(book_id))?;
        let member =
            self.members.get_mut(&member_id).ok_or(LibraryError::MemberNotFound(member_id))?;
        if book.is_issued() {
            return Err(LibraryError::AlreadyIssued(book_id));
        }

        book.mark_issued();
        member.add_issued_book(book_id);

        self.notify(&CatalogEvent::BookIssued { book: book_id, member: member_id });
        self.flush();
        Ok(())
    }

    /// Take a book back from the member holding it
    ///
    /// # Errors
    ///
    /// Returns `BookNotFound` or `MemberNotFound` for unknown ids, or
    /// `NotIssuedToMember` if the member does not hold the book. State is
    /// unchanged on error.
    pub fn return_book(&mut self, book_id: BookId, member_id: MemberId) -> Result<()> {
        let book = self.books.get_mut(&book_id).ok_or(LibraryError::BookNotFound(book_id))?;
        let member =
            self.members.get_mut(&member_id).ok_or(LibraryError::MemberNotFound(member_id))?;
        if !member.has_issued_book(book_id) {
            return Err(LibraryError::NotIssuedToMember { book: book_id, member: member_id });
        }

        book.mark_returned();
        member.return_issued_book(book_id);

        self.notify(&CatalogEvent::BookReturned { book: book_id, member: member_id });
        self.flush();
        Ok(())
    }

    /// Books whose title, author or category contains `term`, ignoring case.
    ///
    /// Issued books are included. An empty result is not an error.
    #[must_use]
    pub fn search_books(&self, term: &str) -> Vec<&Book> {
        let needle = term.to_lowercase();
        self.books.values().filter(|book| book.matches(&needle)).collect()
    }

    /// All books, stably sorted by `key`
    #[must_use]
    pub fn sort_books(&self, key: SortKey) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().collect();
        books.sort_by(|a, b| key.field(a).cmp(key.field(b)));
        books
    }

    #[must_use]
    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id)
    }

    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    /// All books in id order
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// All members in id order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    #[must_use]
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check that issued flags and member holdings agree
    #[must_use]
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut holders: BTreeMap<BookId, Vec<MemberId>> = BTreeMap::new();
        let mut issues = Vec::new();

        for member in self.members.values() {
            for &book in member.issued_books() {
                if self.books.contains_key(&book) {
                    holders.entry(book).or_default().push(member.id());
                } else {
                    issues.push(IntegrityIssue::UnknownBook { book, member: member.id() });
                }
            }
        }

        for book in self.books.values() {
            match (book.is_issued(), holders.remove(&book.id()).as_deref()) {
                (true, None) => issues.push(IntegrityIssue::IssuedWithoutHolder(book.id())),
                (false, Some(&[member])) => {
                    issues.push(IntegrityIssue::HeldButAvailable { book: book.id(), member });
                }
                (_, Some(members)) if members.len() > 1 => {
                    issues.push(IntegrityIssue::MultipleHolders {
                        book: book.id(),
                        members: members.to_vec(),
                    });
                }
                _ => {}
            }
        }

        issues
    }

    /// Tell every observer about an applied change
    fn notify(&self, event: &CatalogEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    /// Persist after a mutation; failures are logged, not propagated
    fn flush(&mut self) {
        if let Err(e) = self.save_to_file() {
            error!(error = %e, "failed to save catalog, in-memory state is ahead of disk");
        }
    }
}

/// `highest + 1`, or `first` when no id is in use
fn next_id(highest: Option<u32>, first: u32) -> Result<u32> {
    match highest {
        None => Ok(first),
        Some(max) => max.checked_add(1).ok_or(LibraryError::IdSpaceExhausted),
    }
}

/// Move a data file with undecodable contents out of the way of the next save
fn set_aside_unreadable(path: &Path, err: &LibraryError) {
    if !matches!(err, LibraryError::Corrupt { .. } | LibraryError::UnsupportedVersion { .. }) {
        return;
    }
    match persistence::quarantine(path) {
        Ok(moved) => {
            warn!(from = %path.display(), to = %moved.display(), "moved unreadable file aside");
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not move unreadable file aside");
        }
    }
}
