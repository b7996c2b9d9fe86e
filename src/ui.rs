//! Ratatui front end for the library catalog. It is a thin shell: every
//! change goes through the `Library` the app owns, and the screens only keep
//! snapshots that are re-read after each successful operation.
//!
//! Layout:
//! - `app`: screen/mode state machine, key handling and drawing.
//! - `forms`: modal form state and input validation.
//! - `screens`: list screens for books, users and loans.
//! - `helpers`: layout and formatting utilities.
//! - `terminal`: raw-mode setup and the event loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
