//! Error types surfaced by the catalog manager. Every failing operation
//! reports one of these before touching any state, so callers can show the
//! message and carry on without having to repair anything.

use std::fmt;

use thiserror::Error;

/// Which collection an id was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Book,
    BorrowRecord,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Book => "Book",
            EntityKind::BorrowRecord => "Borrow record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The referenced id is not registered.
    #[error("{kind} with id {id} not found.")]
    NotFound { kind: EntityKind, id: i64 },

    /// The id is already taken.
    #[error("{kind} with id {id} already exists.")]
    DuplicateKey { kind: EntityKind, id: i64 },

    /// A caller-supplied value breaks a precondition.
    #[error("{0}")]
    InvalidArgument(String),

    /// Every copy of the book is out on loan.
    #[error("Book '{title}' is not available.")]
    Unavailable { book_id: i64, title: String },

    #[error("Book already returned for record {0}.")]
    AlreadyReturned(i64),

    /// An internal consistency check failed. Unreachable when operations are
    /// sequenced through the manager.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
