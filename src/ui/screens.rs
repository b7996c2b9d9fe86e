use chrono::NaiveDate;

use crate::catalog::{BookQuery, Library};
use crate::error::CatalogResult;
use crate::models::{Book, BorrowRecord, User};

use super::helpers::clamp_step;

/// The book catalog list with its active filters.
pub(crate) struct BookListScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) query: BookQuery,
    pub(crate) available_only: bool,
    pub(crate) selected: usize,
}

impl BookListScreen {
    pub(crate) fn load(library: &Library) -> Self {
        let mut screen = Self {
            books: Vec::new(),
            query: BookQuery::default(),
            available_only: false,
            selected: 0,
        };
        screen.refresh(library);
        screen
    }

    /// Re-read the catalog through the current filters.
    pub(crate) fn refresh(&mut self, library: &Library) {
        self.books = match (self.query.is_empty(), self.available_only) {
            (true, false) => library.list_all_books(),
            (true, true) => library.list_available_books(),
            (false, available_only) => library
                .search_books(&self.query)
                .into_iter()
                .filter(|book| !available_only || book.is_available())
                .collect(),
        };
        self.ensure_in_bounds();
    }

    /// Keep the cursor on `id` if it is still listed.
    pub(crate) fn focus(&mut self, id: i64) {
        if let Some(idx) = self.books.iter().position(|book| book.id == id) {
            self.selected = idx;
        }
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = clamp_step(self.selected, offset, self.books.len());
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.books.len().saturating_sub(1);
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        self.selected = clamp_step(self.selected, 0, self.books.len());
    }

    /// Block title describing the active filters.
    pub(crate) fn title(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.query.title {
            parts.push(format!("title~\"{title}\""));
        }
        if let Some(author) = &self.query.author {
            parts.push(format!("author~\"{author}\""));
        }
        if let Some(category) = &self.query.category {
            parts.push(format!("category~\"{category}\""));
        }
        if self.available_only {
            parts.push("available only".to_string());
        }
        if parts.is_empty() {
            format!("Books ({})", self.books.len())
        } else {
            format!("Books ({}) - {}", self.books.len(), parts.join(", "))
        }
    }
}

/// Registered users.
pub(crate) struct UserListScreen {
    pub(crate) users: Vec<User>,
    pub(crate) selected: usize,
}

impl UserListScreen {
    pub(crate) fn load(library: &Library) -> Self {
        Self {
            users: library.list_users(),
            selected: 0,
        }
    }

    pub(crate) fn refresh(&mut self, library: &Library, focus_id: Option<i64>) {
        self.users = library.list_users();
        if let Some(idx) = focus_id.and_then(|id| self.users.iter().position(|u| u.id == id)) {
            self.selected = idx;
        }
        self.selected = clamp_step(self.selected, 0, self.users.len());
    }

    pub(crate) fn current_user(&self) -> Option<&User> {
        self.users.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = clamp_step(self.selected, offset, self.users.len());
    }
}

/// Which set of loans the loan screen shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LoanSource {
    /// Open loans of one user.
    User(User),
    /// Open loans past due as of the given day.
    Overdue(NaiveDate),
}

/// A loan plus the title of its book, if the book still exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LoanRow {
    pub(crate) record: BorrowRecord,
    pub(crate) book_title: Option<String>,
}

impl LoanRow {
    fn resolve(library: &Library, record: BorrowRecord) -> Self {
        let book_title = library
            .get_book(record.book_id)
            .ok()
            .map(|book| book.title.clone());
        Self { record, book_title }
    }

    pub(crate) fn describe(&self) -> String {
        let title = self.book_title.as_deref().unwrap_or("<deleted book>");
        format!("{} | {}", self.record, title)
    }
}

pub(crate) struct LoanListScreen {
    pub(crate) source: LoanSource,
    pub(crate) rows: Vec<LoanRow>,
    pub(crate) selected: usize,
}

impl LoanListScreen {
    pub(crate) fn for_user(library: &Library, user: User) -> CatalogResult<Self> {
        let mut screen = Self {
            source: LoanSource::User(user),
            rows: Vec::new(),
            selected: 0,
        };
        screen.refresh(library)?;
        Ok(screen)
    }

    pub(crate) fn overdue(library: &Library) -> Self {
        let as_of = library.today();
        let rows = library
            .list_overdue_records(Some(as_of))
            .into_iter()
            .map(|record| LoanRow::resolve(library, record))
            .collect();
        Self {
            source: LoanSource::Overdue(as_of),
            rows,
            selected: 0,
        }
    }

    pub(crate) fn refresh(&mut self, library: &Library) -> CatalogResult<()> {
        let records = match &self.source {
            LoanSource::User(user) => library.list_user_borrowed_books(user.id)?,
            LoanSource::Overdue(as_of) => library.list_overdue_records(Some(*as_of)),
        };
        self.rows = records
            .into_iter()
            .map(|record| LoanRow::resolve(library, record))
            .collect();
        self.selected = clamp_step(self.selected, 0, self.rows.len());
        Ok(())
    }

    pub(crate) fn current_row(&self) -> Option<&LoanRow> {
        self.rows.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = clamp_step(self.selected, offset, self.rows.len());
    }

    pub(crate) fn title(&self) -> String {
        match &self.source {
            LoanSource::User(user) => {
                format!("Open loans of {} ({})", user.name, self.rows.len())
            }
            LoanSource::Overdue(as_of) => {
                format!("Overdue as of {as_of} ({})", self.rows.len())
            }
        }
    }

    pub(crate) fn empty_message(&self) -> &'static str {
        match self.source {
            LoanSource::User(_) => "No active borrowed books.",
            LoanSource::Overdue(_) => "No overdue records.",
        }
    }
}
