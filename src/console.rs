//! Numbered-menu front end for the catalog.
//!
//! The console reads from any [`BufRead`] and writes to any [`Write`], so
//! the same loop drives a terminal or an in-memory script. Every failure
//! is turned into a one-line message and the loop continues; only end of
//! input or the Exit entry stops it.

use std::io::{self, BufRead, Write};

use crate::{
    error::LibraryError,
    manager::{LibraryManager, SortKey},
};

/// Entries of the main menu, numbered as shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddBook,
    AddMember,
    IssueBook,
    ReturnBook,
    SearchBooks,
    SortBooks,
    Exit,
}

impl MenuChoice {
    /// Map a menu number to its entry
    #[must_use]
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::AddBook),
            2 => Some(Self::AddMember),
            3 => Some(Self::IssueBook),
            4 => Some(Self::ReturnBook),
            5 => Some(Self::SearchBooks),
            6 => Some(Self::SortBooks),
            7 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Parse a numeric id typed at a prompt
///
/// # Errors
///
/// Returns `LibraryError::InvalidInput` if the text is not a non-negative integer.
pub fn parse_id(text: &str) -> Result<u32, LibraryError> {
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| LibraryError::InvalidInput(format!("{trimmed:?} is not a valid id")))
}

/// User-facing line for an error
#[must_use]
pub fn describe(err: &LibraryError) -> String {
    match err {
        LibraryError::BookNotFound(_) => "Error: Book ID not found.".to_string(),
        LibraryError::MemberNotFound(_) => "Error: Member ID not found.".to_string(),
        LibraryError::AlreadyIssued(_) => "Error: Book is already issued.".to_string(),
        LibraryError::NotIssuedToMember { .. } => {
            "Error: This book was not issued to this member.".to_string()
        }
        LibraryError::InvalidInput(_) => "Error: Invalid ID format.".to_string(),
        LibraryError::Persistence { .. }
        | LibraryError::Corrupt { .. }
        | LibraryError::UnsupportedVersion { .. } => format!("Error accessing data files: {err}"),
        LibraryError::IdSpaceExhausted => format!("An error occurred: {err}"),
    }
}

/// Interactive menu loop over an input and an output stream
#[derive(Debug)]
pub struct Console<R, W> {
    /// Where answers are read from
    input: R,
    /// Where menus and messages go
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    /// Print problems met while loading the data files
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn report_load_errors(&mut self, problems: &[LibraryError]) -> io::Result<()> {
        for problem in problems {
            writeln!(self.output, "Error loading data from files: {problem}")?;
        }
        Ok(())
    }

    /// Run the menu until Exit is chosen or input ends.
    ///
    /// Both ways out perform a final save.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    pub fn run(&mut self, manager: &mut LibraryManager) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return self.exit(manager);
            };

            let Ok(number) = line.trim().parse::<i64>() else {
                writeln!(self.output, "Invalid input. Please enter a number.")?;
                continue;
            };

            match u32::try_from(number).ok().and_then(MenuChoice::from_number) {
                Some(MenuChoice::AddBook) => self.add_book(manager)?,
                Some(MenuChoice::AddMember) => self.add_member(manager)?,
                Some(MenuChoice::IssueBook) => self.issue_book(manager)?,
                Some(MenuChoice::ReturnBook) => self.return_book(manager)?,
                Some(MenuChoice::SearchBooks) => self.search_books(manager)?,
                Some(MenuChoice::SortBooks) => self.sort_books(manager)?,
                Some(MenuChoice::Exit) => return self.exit(manager),
                None => writeln!(self.output, "Invalid choice. Please try again.")?,
            }
        }
    }

    /// Show the numbered menu and the choice prompt
    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "\nWelcome to City Library Digital Management System")?;
        for (number, label) in [
            (1, "Add Book"),
            (2, "Add Member"),
            (3, "Issue Book"),
            (4, "Return Book"),
            (5, "Search Books"),
            (6, "Sort Books"),
            (7, "Exit"),
        ] {
            writeln!(self.output, "{number}. {label}")?;
        }
        write!(self.output, "Enter your choice: ")?;
        self.output.flush()
    }

    /// One line of input without its line ending, `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    /// Print `label` and read the answer
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Prompt for an id; a malformed answer is reported and yields `None`
    fn prompt_id(&mut self, label: &str) -> io::Result<Option<u32>> {
        let Some(answer) = self.prompt(label)? else {
            return Ok(None);
        };
        match parse_id(&answer) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                self.report(&e)?;
                Ok(None)
            }
        }
    }

    /// Print the message for `err`
    fn report(&mut self, err: &LibraryError) -> io::Result<()> {
        writeln!(self.output, "{}", describe(err))
    }

    /// Tell the user if the last flush left memory ahead of disk
    fn report_unsaved(&mut self, manager: &LibraryManager) -> io::Result<()> {
        if let Some(message) = manager.last_save_error() {
            writeln!(self.output, "Error saving data to files: {message}")?;
        }
        Ok(())
    }

    fn add_book(&mut self, manager: &mut LibraryManager) -> io::Result<()> {
        let Some(title) = self.prompt("Enter Book Title: ")? else { return Ok(()) };
        let Some(author) = self.prompt("Enter Author: ")? else { return Ok(()) };
        let Some(category) = self.prompt("Enter Category: ")? else { return Ok(()) };

        match manager.add_book(&title, &author, &category) {
            Ok(id) => {
                self.report_unsaved(manager)?;
                writeln!(self.output, "Book added successfully with ID: {id}")
            }
            Err(e) => self.report(&e),
        }
    }

    fn add_member(&mut self, manager: &mut LibraryManager) -> io::Result<()> {
        let Some(name) = self.prompt("Enter Member Name: ")? else { return Ok(()) };
        let Some(email) = self.prompt("Enter Email: ")? else { return Ok(()) };

        match manager.add_member(&name, &email) {
            Ok(id) => {
                self.report_unsaved(manager)?;
                writeln!(self.output, "Member added successfully with ID: {id}")
            }
            Err(e) => self.report(&e),
        }
    }

    fn issue_book(&mut self, manager: &mut LibraryManager) -> io::Result<()> {
        let Some(book_id) = self.prompt_id("Enter Book ID to issue: ")? else { return Ok(()) };
        let Some(member_id) = self.prompt_id("Enter Member ID: ")? else { return Ok(()) };

        match manager.issue_book(book_id, member_id) {
            Ok(()) => {
                self.report_unsaved(manager)?;
                writeln!(
                    self.output,
                    "Book {book_id} issued to Member {member_id} successfully."
                )
            }
            Err(e) => self.report(&e),
        }
    }

    fn return_book(&mut self, manager: &mut LibraryManager) -> io::Result<()> {
        let Some(book_id) = self.prompt_id("Enter Book ID to return: ")? else { return Ok(()) };
        let Some(member_id) = self.prompt_id("Enter Member ID: ")? else { return Ok(()) };

        match manager.return_book(book_id, member_id) {
            Ok(()) => {
                self.report_unsaved(manager)?;
                writeln!(
                    self.output,
                    "Book {book_id} returned successfully by Member {member_id}."
                )
            }
            Err(e) => self.report(&e),
        }
    }

    fn search_books(&mut self, manager: &LibraryManager) -> io::Result<()> {
        let Some(term) = self.prompt("Enter search term (title, author, or category): ")? else {
            return Ok(());
        };

        let found = manager.search_books(&term);
        if found.is_empty() {
            return writeln!(self.output, "No books found matching the search term.");
        }
        for book in found {
            writeln!(self.output, "{book}")?;
        }
        Ok(())
    }

    fn sort_books(&mut self, manager: &LibraryManager) -> io::Result<()> {
        writeln!(self.output, "Sort by: 1. Title (default) 2. Author 3. Category")?;
        let choice = self.prompt("Enter choice: ")?.unwrap_or_default();

        for book in manager.sort_books(SortKey::from_choice(&choice)) {
            writeln!(self.output, "{book}")?;
        }
        Ok(())
    }

    /// Final save before leaving the loop
    fn exit(&mut self, manager: &mut LibraryManager) -> io::Result<()> {
        match manager.save_to_file() {
            Ok(()) => writeln!(self.output, "Exiting system. Data saved."),
            Err(e) => {
                self.report(&e)?;
                writeln!(self.output, "Exiting system.")
            }
        }
    }
}
