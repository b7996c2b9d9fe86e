//! Domain entities owned by the catalog manager. They stay light-weight data
//! holders with only the checks that concern a single record; anything that
//! spans users, books and loans lives in `catalog`.

use std::fmt;

use chrono::NaiveDate;

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A registered library member. Identity never changes after registration.
pub struct User {
    /// Caller-assigned key, unique across users.
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.id, self.name, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A catalog title together with its copy accounting. The manager keeps
/// `available_copies <= total_copies` at all times; the copy helpers below
/// refuse any step that would break it.
pub struct Book {
    /// Caller-assigned key, unique across books.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Number of physical copies the library owns. Always positive.
    pub total_copies: u32,
    /// Copies currently on the shelf.
    pub available_copies: u32,
}

impl Book {
    /// Whether at least one copy is on the shelf.
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently out on loan.
    pub fn borrowed_copies(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }

    /// Take one copy off the shelf.
    pub fn borrow_copy(&mut self) -> CatalogResult<()> {
        self.available_copies = self.available_copies.checked_sub(1).ok_or_else(|| {
            CatalogError::InvariantViolation(format!(
                "No available copies for '{}'.",
                self.title
            ))
        })?;
        Ok(())
    }

    /// Put one copy back on the shelf. Should never trip when returns go
    /// through the manager, since every open record accounts for one copy.
    pub fn return_copy(&mut self) -> CatalogResult<()> {
        if self.available_copies >= self.total_copies {
            return Err(CatalogError::InvariantViolation(format!(
                "All copies of '{}' are already in library.",
                self.title
            )));
        }
        self.available_copies += 1;
        Ok(())
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} by {} [{}] (Available: {}/{})",
            self.id,
            self.title,
            self.author,
            self.category,
            self.available_copies,
            self.total_copies
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One loan of one copy. A record is open while `return_date` is `None` and
/// closes exactly once; records are never removed, so their ids stay valid
/// for as long as the process runs.
pub struct BorrowRecord {
    /// Assigned by the manager from a counter that never goes backwards.
    pub id: i64,
    /// Weak reference into the user collection.
    pub user_id: i64,
    /// Weak reference into the book collection. The book may have been
    /// deleted since the loan was made.
    pub book_id: i64,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl BorrowRecord {
    /// True until the book is returned.
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Close the record. The manager guarantees this only runs on open
    /// records.
    pub fn mark_returned(&mut self, date: NaiveDate) {
        self.return_date = Some(date);
    }

    /// A returned record is never overdue; an open one is overdue once the
    /// reference day is strictly past the due date.
    pub fn is_overdue(&self, reference: NaiveDate) -> bool {
        self.is_open() && reference > self.due_date
    }
}

impl fmt::Display for BorrowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_open() { "Borrowed" } else { "Returned" };
        write!(
            f,
            "Record {}: User {}, Book {}, Borrowed {}, Due {}, Status: {}",
            self.id, self.user_id, self.book_id, self.borrow_date, self.due_date, status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(total: u32, available: u32) -> Book {
        Book {
            id: 100,
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            category: "Fiction".to_string(),
            total_copies: total,
            available_copies: available,
        }
    }

    fn open_record() -> BorrowRecord {
        BorrowRecord {
            id: 1,
            user_id: 1,
            book_id: 100,
            borrow_date: day(2024, 3, 1),
            due_date: day(2024, 3, 15),
            return_date: None,
        }
    }

    #[test]
    fn borrow_copy_stops_at_zero() {
        let mut book = book(1, 1);
        book.borrow_copy().unwrap();
        assert_eq!(book.available_copies, 0);
        assert!(!book.is_available());

        let err = book.borrow_copy().unwrap_err();
        assert!(matches!(err, CatalogError::InvariantViolation(_)));
        assert_eq!(book.available_copies, 0);
    }

    #[test]
    fn return_copy_refuses_to_exceed_total() {
        let mut book = book(2, 1);
        book.return_copy().unwrap();
        assert_eq!(book.available_copies, 2);

        let err = book.return_copy().unwrap_err();
        assert!(matches!(err, CatalogError::InvariantViolation(_)));
        assert_eq!(book.available_copies, 2);
    }

    #[test]
    fn borrowed_copies_counts_what_is_out() {
        assert_eq!(book(5, 2).borrowed_copies(), 3);
        assert_eq!(book(5, 5).borrowed_copies(), 0);
    }

    #[test]
    fn overdue_only_after_due_date() {
        let record = open_record();
        assert!(!record.is_overdue(day(2024, 3, 2)));
        assert!(!record.is_overdue(day(2024, 3, 15)));
        assert!(record.is_overdue(day(2024, 3, 16)));
    }

    #[test]
    fn returned_record_is_never_overdue() {
        let mut record = open_record();
        record.mark_returned(day(2024, 4, 30));
        assert!(!record.is_open());
        assert!(!record.is_overdue(day(2030, 1, 1)));
    }

    #[test]
    fn display_matches_listing_format() {
        assert_eq!(
            book(2, 1).to_string(),
            "100 - 1984 by George Orwell [Fiction] (Available: 1/2)"
        );

        let user = User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        assert_eq!(user.to_string(), "1 - Alice (alice@example.com)");

        let mut record = open_record();
        assert_eq!(
            record.to_string(),
            "Record 1: User 1, Book 100, Borrowed 2024-03-01, Due 2024-03-15, Status: Borrowed"
        );
        record.mark_returned(day(2024, 3, 4));
        assert!(record.to_string().ends_with("Status: Returned"));
    }
}
