use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{book::BookId, member::MemberId};

/// Coarse classification of failures, as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A book or member id is unknown
    NotFound,
    /// The operation does not apply to the current state
    InvalidState,
    /// Text could not be parsed where a number was expected
    InputFormat,
    /// Reading or writing the data files failed
    Persistence,
}

/// Custom error type for library operations
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("book {0} not found")]
    BookNotFound(BookId),

    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    #[error("book {0} is already issued")]
    AlreadyIssued(BookId),

    #[error("book {book} is not issued to member {member}")]
    NotIssuedToMember { book: BookId, member: MemberId },

    #[error("no ids left to assign")]
    IdSpaceExhausted,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed data in {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} has format version {found}, newer than supported", path.display())]
    UnsupportedVersion { path: PathBuf, found: u32 },
}

impl LibraryError {
    /// Coarse kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound(_) | Self::MemberNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyIssued(_) | Self::NotIssuedToMember { .. } | Self::IdSpaceExhausted => {
                ErrorKind::InvalidState
            }
            Self::InvalidInput(_) => ErrorKind::InputFormat,
            Self::Persistence { .. } | Self::Corrupt { .. } | Self::UnsupportedVersion { .. } => {
                ErrorKind::Persistence
            }
        }
    }
}

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;
