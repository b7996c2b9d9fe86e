use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult, EntityKind};
use crate::models::Book;

use super::Library;

/// Everything needed to register a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub total_copies: u32,
}

/// Partial edit of a book. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub total_copies: Option<u32>,
}

impl BookUpdate {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn total_copies(mut self, total_copies: u32) -> Self {
        self.total_copies = Some(total_copies);
        self
    }

    /// True when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.category.is_none()
            && self.total_copies.is_none()
    }
}

/// Search filters. Each supplied filter must appear, ignoring case, somewhere
/// in the matching field; empty filters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

impl BookQuery {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// True when no filter would constrain the result.
    pub fn is_empty(&self) -> bool {
        [&self.title, &self.author, &self.category]
            .into_iter()
            .all(|filter| active_filter(filter).is_none())
    }

    /// Whether `book` satisfies every non-empty filter.
    pub fn matches(&self, book: &Book) -> bool {
        field_matches(&self.title, &book.title)
            && field_matches(&self.author, &book.author)
            && field_matches(&self.category, &book.category)
    }
}

fn active_filter(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|needle| !needle.is_empty())
}

fn field_matches(filter: &Option<String>, value: &str) -> bool {
    match active_filter(filter) {
        Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

impl Library {
    /// Add a title with every copy on the shelf.
    pub fn add_book(&mut self, new: NewBook) -> CatalogResult<Book> {
        if self.books.contains_key(&new.id) {
            return Err(CatalogError::DuplicateKey {
                kind: EntityKind::Book,
                id: new.id,
            });
        }
        if new.total_copies == 0 {
            return Err(CatalogError::InvalidArgument(
                "total_copies must be positive.".to_string(),
            ));
        }

        let book = Book {
            id: new.id,
            title: new.title,
            author: new.author,
            category: new.category,
            total_copies: new.total_copies,
            available_copies: new.total_copies,
        };
        self.books.insert(book.id, book.clone());
        info!(book_id = book.id, copies = book.total_copies, "added book");
        Ok(book)
    }

    /// Look up a book by id.
    pub fn get_book(&self, id: i64) -> CatalogResult<&Book> {
        self.books.get(&id).ok_or(CatalogError::NotFound {
            kind: EntityKind::Book,
            id,
        })
    }

    /// Apply a partial edit. A new copy count keeps the number of copies on
    /// loan fixed and moves the shelf count by the difference; it may not
    /// drop below what is currently borrowed.
    pub fn update_book(&mut self, id: i64, update: BookUpdate) -> CatalogResult<Book> {
        let book = self.books.get_mut(&id).ok_or(CatalogError::NotFound {
            kind: EntityKind::Book,
            id,
        })?;

        if let Some(total) = update.total_copies {
            if total == 0 {
                return Err(CatalogError::InvalidArgument(
                    "total_copies must be positive.".to_string(),
                ));
            }
            if total < book.borrowed_copies() {
                return Err(CatalogError::InvalidArgument(
                    "total_copies less than borrowed count.".to_string(),
                ));
            }
        }

        if let Some(title) = update.title {
            book.title = title;
        }
        if let Some(author) = update.author {
            book.author = author;
        }
        if let Some(category) = update.category {
            book.category = category;
        }
        if let Some(total) = update.total_copies {
            let borrowed = book.borrowed_copies();
            book.total_copies = total;
            book.available_copies = total - borrowed;
        }

        info!(book_id = id, "updated book");
        Ok(book.clone())
    }

    /// Remove a title. Open loans against it are left in place; returning one
    /// afterwards fails with `NotFound`.
    pub fn delete_book(&mut self, id: i64) -> CatalogResult<()> {
        let book = self.books.shift_remove(&id).ok_or(CatalogError::NotFound {
            kind: EntityKind::Book,
            id,
        })?;
        info!(
            book_id = id,
            copies_on_loan = book.borrowed_copies(),
            "deleted book"
        );
        Ok(())
    }

    /// Books matching `query`, in insertion order.
    pub fn search_books(&self, query: &BookQuery) -> Vec<Book> {
        let results: Vec<Book> = self
            .books
            .values()
            .filter(|book| query.matches(book))
            .cloned()
            .collect();
        debug!(?query, hits = results.len(), "searched books");
        results
    }

    /// Every book in the catalog, in insertion order.
    pub fn list_all_books(&self) -> Vec<Book> {
        self.books.values().cloned().collect()
    }

    /// Books with at least one copy on the shelf.
    pub fn list_available_books(&self) -> Vec<Book> {
        self.books
            .values()
            .filter(|book| book.is_available())
            .cloned()
            .collect()
    }
}
