//! Core library surface for the Library Catalog application.
//!
//! The catalog manager and its entities are usable on their own; the `ui`
//! module is a terminal front end that drives them, and `config`/`logging`
//! hold the startup plumbing used by the binary.
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// The catalog manager and its input types.
pub use catalog::{
    BookQuery, BookUpdate, Clock, Library, ManualClock, NewBook, SystemClock, LOAN_DAYS,
};

pub use error::{CatalogError, CatalogResult, EntityKind};

/// The three entities the manager owns.
pub use models::{Book, BorrowRecord, User};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
