//! On-disk record format for the catalog.
//!
//! Each map lives in its own JSON document:
//!
//! ```json
//! { "format": "city-library/books", "version": 1, "records": [ ... ] }
//! ```
//!
//! Records are written in ascending id order. Unknown record fields are
//! ignored on load and missing optional fields fall back to defaults, so
//! files written by a later minor revision still load. A document whose
//! `version` is newer than [`FORMAT_VERSION`] is rejected.
//!
//! Writes go to a sibling `.tmp` file which is synced and then renamed
//! over the target, so a crash mid-write leaves the previous file intact.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    book::{Book, BookId},
    error::{LibraryError, Result},
    member::{Member, MemberId},
};

/// Current version of the record format
pub const FORMAT_VERSION: u32 = 1;

/// Format tag of the books document
const BOOKS_FORMAT: &str = "city-library/books";
/// Format tag of the members document
const MEMBERS_FORMAT: &str = "city-library/members";

/// Document wrapper as written
#[derive(Debug, Serialize)]
struct Envelope<T> {
    /// Which map this document holds
    format: &'static str,
    /// Record format version
    version: u32,
    /// One entry per map value
    records: Vec<T>,
}

/// Document wrapper as read, records left undecoded until the version is checked
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    /// Which map this document claims to hold
    format: String,
    /// Record format version
    version: u32,
    /// Undecoded records
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

/// Stored form of a [`Book`]
#[derive(Debug, Deserialize, Serialize)]
struct BookRecord {
    /// Book id
    id: BookId,
    /// Title
    title: String,
    /// Author
    author: String,
    /// Category
    #[serde(default)]
    category: String,
    /// Issued flag
    #[serde(default)]
    issued: bool,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            category: book.category().to_string(),
            issued: book.is_issued(),
        }
    }
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self::from_parts(record.id, record.title, record.author, record.category, record.issued)
    }
}

/// Stored form of a [`Member`]
#[derive(Debug, Deserialize, Serialize)]
struct MemberRecord {
    /// Member id
    id: MemberId,
    /// Name
    name: String,
    /// Email
    #[serde(default)]
    email: String,
    /// Held book ids, in issue order
    #[serde(default)]
    issued_books: Vec<BookId>,
}

impl From<&Member> for MemberRecord {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id(),
            name: member.name().to_string(),
            email: member.email().to_string(),
            issued_books: member.issued_books().to_vec(),
        }
    }
}

impl From<MemberRecord> for Member {
    fn from(record: MemberRecord) -> Self {
        Self::from_parts(record.id, record.name, record.email, record.issued_books)
    }
}

/// Load the book map; a missing file yields an empty map
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a books document,
/// has a newer format version, or holds a malformed record.
pub fn load_books(path: &Path) -> Result<BTreeMap<BookId, Book>> {
    let records: Vec<BookRecord> = read_records(path, BOOKS_FORMAT)?;
    let mut books = BTreeMap::new();
    for record in records {
        let book = Book::from(record);
        if let Some(previous) = books.insert(book.id(), book) {
            let id = previous.id();
            warn!(path = %path.display(), id, "duplicate book record, keeping the last");
        }
    }
    debug!(path = %path.display(), count = books.len(), "loaded books");
    Ok(books)
}

/// Load the member map; a missing file yields an empty map
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a members document,
/// has a newer format version, or holds a malformed record.
pub fn load_members(path: &Path) -> Result<BTreeMap<MemberId, Member>> {
    let records: Vec<MemberRecord> = read_records(path, MEMBERS_FORMAT)?;
    let mut members = BTreeMap::new();
    for record in records {
        let member = Member::from(record);
        if let Some(previous) = members.insert(member.id(), member) {
            let id = previous.id();
            warn!(path = %path.display(), id, "duplicate member record, keeping the last");
        }
    }
    debug!(path = %path.display(), count = members.len(), "loaded members");
    Ok(members)
}

/// Overwrite the books file with the full map
///
/// # Errors
///
/// Returns `LibraryError::Persistence` if the file cannot be written.
pub fn save_books(path: &Path, books: &BTreeMap<BookId, Book>) -> Result<()> {
    let records = books.values().map(BookRecord::from).collect();
    write_records(path, BOOKS_FORMAT, records)?;
    debug!(path = %path.display(), count = books.len(), "saved books");
    Ok(())
}

/// Overwrite the members file with the full map
///
/// # Errors
///
/// Returns `LibraryError::Persistence` if the file cannot be written.
pub fn save_members(path: &Path, members: &BTreeMap<MemberId, Member>) -> Result<()> {
    let records = members.values().map(MemberRecord::from).collect();
    write_records(path, MEMBERS_FORMAT, records)?;
    debug!(path = %path.display(), count = members.len(), "saved members");
    Ok(())
}

/// Read and decode every record of a document
fn read_records<T: DeserializeOwned>(path: &Path, format: &str) -> Result<Vec<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no data file, starting empty");
            return Ok(Vec::new());
        }
        Err(source) => return Err(LibraryError::Persistence { path: path.to_path_buf(), source }),
    };

    let corrupt =
        |source: serde_json::Error| LibraryError::Corrupt { path: path.to_path_buf(), source };

    let envelope: RawEnvelope = serde_json::from_str(&contents).map_err(corrupt)?;
    if envelope.format != format {
        return Err(corrupt(serde::de::Error::custom(format!(
            "expected format {format:?}, found {:?}",
            envelope.format
        ))));
    }
    if envelope.version > FORMAT_VERSION {
        return Err(LibraryError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: envelope.version,
        });
    }

    envelope
        .records
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(corrupt))
        .collect()
}

/// Encode records into a document and replace the file atomically
fn write_records<T: Serialize>(path: &Path, format: &'static str, records: Vec<T>) -> Result<()> {
    let envelope = Envelope { format, version: FORMAT_VERSION, records };
    let serialized = serde_json::to_string_pretty(&envelope)
        .map_err(|source| LibraryError::Corrupt { path: path.to_path_buf(), source })?;
    write_atomic(path, serialized.as_bytes())
        .map_err(|source| LibraryError::Persistence { path: path.to_path_buf(), source })
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    let result = written.and_then(|()| fs::rename(&tmp, path));

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            debug!(path = %tmp.display(), error = %e, "could not remove temporary file");
        }
    }
    result
}

/// Rename an undecodable data file to an unused `<name>.corrupt` sibling.
///
/// Returns where the file now lives.
///
/// # Errors
///
/// Returns an error if the rename fails.
pub fn quarantine(path: &Path) -> io::Result<PathBuf> {
    let target = (0_u32..)
        .map(|n| {
            if n == 0 {
                sibling(path, ".corrupt")
            } else {
                sibling(path, &format!(".corrupt.{n}"))
            }
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| sibling(path, ".corrupt"));
    fs::rename(path, &target)?;
    Ok(target)
}

/// `books.json` becomes `books.json.tmp`
fn tmp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

/// Same directory, file name extended by `suffix`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let books = load_books(&dir.path().join("absent.json")).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn save_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        let mut books = BTreeMap::new();
        books.insert(101, Book::new(101, "T1", "A1", "C1"));

        save_books(&path, &books).unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("members.json");
        save_members(&path, &BTreeMap::new()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unknown_fields_and_missing_defaults_are_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(
            &path,
            r#"{"format":"city-library/books","version":1,"records":[
                {"id":101,"title":"T","author":"A","shelf":"B4"}
            ]}"#,
        )
        .unwrap();

        let books = load_books(&path).unwrap();
        let book = books.get(&101).unwrap();
        assert_eq!(book.category(), "");
        assert!(!book.is_issued());
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, r#"{"format":"city-library/books","version":2,"records":[]}"#).unwrap();

        let err = load_books(&path).unwrap_err();
        assert!(matches!(err, LibraryError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn wrong_document_kind_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("members.json");
        save_books(&path, &BTreeMap::new()).unwrap();

        let err = load_members(&path).unwrap_err();
        assert!(matches!(err, LibraryError::Corrupt { .. }));
    }

    #[test]
    fn quarantine_picks_an_unused_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");

        fs::write(&path, "first").unwrap();
        let first = quarantine(&path).unwrap();
        fs::write(&path, "second").unwrap();
        let second = quarantine(&path).unwrap();

        assert_eq!(first, dir.path().join("books.json.corrupt"));
        assert_eq!(second, dir.path().join("books.json.corrupt.1"));
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
        assert!(!path.exists());
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, "\u{ac}\u{ed}\0\u{5}sr").unwrap();

        assert!(matches!(load_books(&path), Err(LibraryError::Corrupt { .. })));
    }
}
