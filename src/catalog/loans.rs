use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult, EntityKind};
use crate::models::BorrowRecord;

use super::{Library, LOAN_DAYS};

impl Library {
    /// Lend one copy of a book to a user, due back [`LOAN_DAYS`] from today.
    pub fn borrow_book(&mut self, user_id: i64, book_id: i64) -> CatalogResult<BorrowRecord> {
        self.get_user(user_id)?;

        let book = self.books.get_mut(&book_id).ok_or(CatalogError::NotFound {
            kind: EntityKind::Book,
            id: book_id,
        })?;
        if !book.is_available() {
            warn!(user_id, book_id, "borrow refused: no copies on the shelf");
            return Err(CatalogError::Unavailable {
                book_id,
                title: book.title.clone(),
            });
        }

        let today = self.clock.today();
        let due_date = today
            .checked_add_signed(Duration::days(LOAN_DAYS))
            .ok_or_else(|| {
                CatalogError::InvariantViolation(format!("due date after {today} is out of range"))
            })?;
        book.borrow_copy()?;

        let record = BorrowRecord {
            id: self.next_record_id,
            user_id,
            book_id,
            borrow_date: today,
            due_date,
            return_date: None,
        };
        self.records.insert(record.id, record.clone());
        self.next_record_id += 1;

        info!(
            record_id = record.id,
            user_id,
            book_id,
            due = %record.due_date,
            "book borrowed"
        );
        Ok(record)
    }

    /// Close an open record and put its copy back on the shelf.
    pub fn return_book(&mut self, record_id: i64) -> CatalogResult<BorrowRecord> {
        let record = self.records.get_mut(&record_id).ok_or(CatalogError::NotFound {
            kind: EntityKind::BorrowRecord,
            id: record_id,
        })?;
        if !record.is_open() {
            warn!(record_id, "return refused: record already closed");
            return Err(CatalogError::AlreadyReturned(record_id));
        }

        let book = self.books.get_mut(&record.book_id).ok_or_else(|| {
            warn!(record_id, book_id = record.book_id, "return refused: book no longer exists");
            CatalogError::NotFound {
                kind: EntityKind::Book,
                id: record.book_id,
            }
        })?;

        let today = self.clock.today();
        if today < record.borrow_date {
            return Err(CatalogError::InvariantViolation(format!(
                "return date {today} precedes borrow date {}",
                record.borrow_date
            )));
        }

        book.return_copy()?;
        record.mark_returned(today);

        info!(record_id, book_id = record.book_id, "book returned");
        Ok(record.clone())
    }

    /// Look up a borrow record by id.
    pub fn get_record(&self, id: i64) -> CatalogResult<&BorrowRecord> {
        self.records.get(&id).ok_or(CatalogError::NotFound {
            kind: EntityKind::BorrowRecord,
            id,
        })
    }

    /// Every record ever created, open or closed, oldest first.
    pub fn list_records(&self) -> Vec<BorrowRecord> {
        self.records.values().cloned().collect()
    }

    /// Open loans held by one user.
    pub fn list_user_borrowed_books(&self, user_id: i64) -> CatalogResult<Vec<BorrowRecord>> {
        self.get_user(user_id)?;
        Ok(self
            .records
            .values()
            .filter(|record| record.user_id == user_id && record.is_open())
            .cloned()
            .collect())
    }

    /// Open loans past their due date as of `reference`, or as of today when
    /// no date is given.
    pub fn list_overdue_records(&self, reference: Option<NaiveDate>) -> Vec<BorrowRecord> {
        let reference = reference.unwrap_or_else(|| self.clock.today());
        self.records
            .values()
            .filter(|record| record.is_overdue(reference))
            .cloned()
            .collect()
    }
}
