//! The catalog manager: sole owner of users, books and borrow records. Each
//! submodule adds one group of operations to [`Library`]; all of them check
//! every precondition first and only then mutate, so a returned error always
//! means nothing changed.

mod books;
mod clock;
mod loans;
mod users;

use std::fmt;

use indexmap::IndexMap;

use crate::models::{Book, BorrowRecord, User};

pub use books::{BookQuery, BookUpdate, NewBook};
pub use clock::{Clock, ManualClock, SystemClock};

/// Loan period applied to every borrow.
pub const LOAN_DAYS: i64 = 14;

/// In-memory library catalog. One instance is built at startup and handed to
/// whoever needs it; nothing in the crate keeps a global copy.
pub struct Library {
    users: IndexMap<i64, User>,
    books: IndexMap<i64, Book>,
    records: IndexMap<i64, BorrowRecord>,
    /// Next borrow record id. Only advances when a record is stored.
    next_record_id: i64,
    clock: Box<dyn Clock>,
}

impl Library {
    /// Empty catalog dated by the local calendar.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// Empty catalog that reads today's date from `clock`.
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            users: IndexMap::new(),
            books: IndexMap::new(),
            records: IndexMap::new(),
            next_record_id: 1,
            clock,
        }
    }

    /// The day the catalog considers "today".
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("users", &self.users.len())
            .field("books", &self.books.len())
            .field("records", &self.records.len())
            .field("next_record_id", &self.next_record_id)
            .field("today", &self.clock.today())
            .finish()
    }
}
