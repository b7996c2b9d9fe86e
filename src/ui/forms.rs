use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::catalog::{BookQuery, BookUpdate, NewBook};
use crate::models::{Book, BorrowRecord};

use super::helpers::input_line;

/// What the app needs to render any modal form.
pub(crate) trait FormView {
    /// Text rows shown above the error/hint line.
    fn lines(&self) -> Vec<Line<'static>>;
    /// Cursor position relative to the form's inner area, as (column, row).
    fn cursor(&self) -> (u16, u16);
    fn error(&self) -> Option<&str>;
}

/// Move focus forward or backward through `fields`, wrapping at either end.
fn cycle<T: Copy + PartialEq>(fields: &[T], current: T, forward: bool) -> T {
    let Some(pos) = fields.iter().position(|field| *field == current) else {
        return fields.first().copied().unwrap_or(current);
    };
    let next = if forward {
        (pos + 1) % fields.len()
    } else {
        (pos + fields.len() - 1) % fields.len()
    };
    fields[next]
}

/// Accept a character for a numeric field.
fn push_digit(target: &mut String, ch: char) -> bool {
    if ch.is_ascii_digit() {
        target.push(ch);
        true
    } else {
        false
    }
}

/// Accept a character for a free-text field.
fn push_text(target: &mut String, ch: char) -> bool {
    if ch.is_control() {
        false
    } else {
        target.push(ch);
        true
    }
}

fn required_text(value: &str, message: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(anyhow!(message))
    } else {
        Ok(trimmed.to_string())
    }
}

fn required_id(value: &str, label: &str) -> Result<i64> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err(anyhow!("{label} is required."));
    }
    raw.parse::<i64>()
        .map_err(|_| anyhow!("{label} must be an integer."))
}

fn optional_filter(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Cursor for a `Label: value` row.
fn cursor_after(field_name: &str, value_len: usize, row: usize) -> (u16, u16) {
    let prefix = field_name.len() + 2;
    ((prefix + value_len) as u16, row as u16)
}

/// Fields of the book form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum BookField {
    #[default]
    Id,
    Title,
    Author,
    Category,
    Copies,
}

impl BookField {
    fn label(self) -> &'static str {
        match self {
            BookField::Id => "Book ID",
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Category => "Category",
            BookField::Copies => "Total copies",
        }
    }
}

const NEW_BOOK_FIELDS: &[BookField] = &[
    BookField::Id,
    BookField::Title,
    BookField::Author,
    BookField::Category,
    BookField::Copies,
];
const EDIT_BOOK_FIELDS: &[BookField] = &[
    BookField::Title,
    BookField::Author,
    BookField::Category,
    BookField::Copies,
];

/// Form state for adding a book or editing an existing one. When editing,
/// the id is fixed and shown as a header row instead of an input.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) category: String,
    pub(crate) copies: String,
    pub(crate) active: BookField,
    pub(crate) editing: Option<i64>,
    pub(crate) error: Option<String>,
}

impl BookForm {
    /// Populate the form from an existing book when entering edit mode.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            copies: book.total_copies.to_string(),
            active: BookField::Title,
            editing: Some(book.id),
            error: None,
        }
    }

    fn fields(&self) -> &'static [BookField] {
        if self.editing.is_some() {
            EDIT_BOOK_FIELDS
        } else {
            NEW_BOOK_FIELDS
        }
    }

    pub(crate) fn toggle_field(&mut self, forward: bool) {
        self.active = cycle(self.fields(), self.active, forward);
    }

    fn value(&self, field: BookField) -> &String {
        match field {
            BookField::Id => &self.id,
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Category => &self.category,
            BookField::Copies => &self.copies,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Id => &mut self.id,
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Category => &mut self.category,
            BookField::Copies => &mut self.copies,
        }
    }

    /// Append a character to the active field. Id and copy count only take
    /// digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = self.active;
        match field {
            BookField::Id | BookField::Copies => push_digit(self.value_mut(field), ch),
            _ => push_text(self.value_mut(field), ch),
        }
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    fn parse_copies(&self) -> Result<u32> {
        let raw = self.copies.trim();
        if raw.is_empty() {
            return Err(anyhow!("Total copies is required."));
        }
        raw.parse::<u32>()
            .map_err(|_| anyhow!("Total copies must be a whole number."))
    }

    /// Validate the inputs for a brand new book.
    pub(crate) fn parse_new(&self) -> Result<NewBook> {
        Ok(NewBook {
            id: required_id(&self.id, "Book ID")?,
            title: required_text(&self.title, "Title is required.")?,
            author: required_text(&self.author, "Author is required.")?,
            category: required_text(&self.category, "Category is required.")?,
            total_copies: self.parse_copies()?,
        })
    }

    /// Validate the inputs and keep only the fields that differ from
    /// `current`.
    pub(crate) fn parse_update(&self, current: &Book) -> Result<BookUpdate> {
        let title = required_text(&self.title, "Title is required.")?;
        let author = required_text(&self.author, "Author is required.")?;
        let category = required_text(&self.category, "Category is required.")?;
        let copies = self.parse_copies()?;

        let mut update = BookUpdate::default();
        if title != current.title {
            update = update.title(title);
        }
        if author != current.author {
            update = update.author(author);
        }
        if category != current.category {
            update = update.category(category);
        }
        if copies != current.total_copies {
            update = update.total_copies(copies);
        }
        Ok(update)
    }

    fn header_rows(&self) -> usize {
        usize::from(self.editing.is_some())
    }
}

impl FormView for BookForm {
    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if let Some(id) = self.editing {
            lines.push(Line::from(Span::styled(
                format!("Book ID: {id}"),
                Style::default().fg(Color::Gray),
            )));
        }
        for field in self.fields() {
            let placeholder = "<required>";
            lines.push(input_line(
                field.label(),
                self.value(*field),
                placeholder,
                *field == self.active,
            ));
        }
        lines
    }

    fn cursor(&self) -> (u16, u16) {
        let row = self
            .fields()
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0);
        cursor_after(
            self.active.label(),
            self.value(self.active).chars().count(),
            row + self.header_rows(),
        )
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Fields of the user registration form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum UserField {
    #[default]
    Id,
    Name,
    Email,
}

impl UserField {
    fn label(self) -> &'static str {
        match self {
            UserField::Id => "User ID",
            UserField::Name => "Name",
            UserField::Email => "Email",
        }
    }
}

const USER_FIELDS: &[UserField] = &[UserField::Id, UserField::Name, UserField::Email];

/// Form state for registering a user.
#[derive(Default, Clone, Debug)]
pub(crate) struct UserForm {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) active: UserField,
    pub(crate) error: Option<String>,
}

impl UserForm {
    pub(crate) fn toggle_field(&mut self, forward: bool) {
        self.active = cycle(USER_FIELDS, self.active, forward);
    }

    fn value(&self, field: UserField) -> &String {
        match field {
            UserField::Id => &self.id,
            UserField::Name => &self.name,
            UserField::Email => &self.email,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            UserField::Id => push_digit(&mut self.id, ch),
            UserField::Name => push_text(&mut self.name, ch),
            UserField::Email => push_text(&mut self.email, ch),
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            UserField::Id => {
                self.id.pop();
            }
            UserField::Name => {
                self.name.pop();
            }
            UserField::Email => {
                self.email.pop();
            }
        }
    }

    /// Validate and return `(id, name, email)`.
    pub(crate) fn parse_inputs(&self) -> Result<(i64, String, String)> {
        Ok((
            required_id(&self.id, "User ID")?,
            required_text(&self.name, "Name is required.")?,
            required_text(&self.email, "Email is required.")?,
        ))
    }
}

impl FormView for UserForm {
    fn lines(&self) -> Vec<Line<'static>> {
        USER_FIELDS
            .iter()
            .map(|field| {
                input_line(
                    field.label(),
                    self.value(*field),
                    "<required>",
                    *field == self.active,
                )
            })
            .collect()
    }

    fn cursor(&self) -> (u16, u16) {
        let row = USER_FIELDS
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0);
        cursor_after(
            self.active.label(),
            self.value(self.active).chars().count(),
            row,
        )
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Prompt for the borrower when lending the selected book.
#[derive(Clone, Debug)]
pub(crate) struct BorrowForm {
    pub(crate) book_id: i64,
    pub(crate) book_title: String,
    pub(crate) user_id: String,
    pub(crate) error: Option<String>,
}

impl BorrowForm {
    pub(crate) fn for_book(book: &Book) -> Self {
        Self {
            book_id: book.id,
            book_title: book.title.clone(),
            user_id: String::new(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_digit(&mut self.user_id, ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.user_id.pop();
    }

    pub(crate) fn parse_user_id(&self) -> Result<i64> {
        required_id(&self.user_id, "User ID")
    }
}

impl FormView for BorrowForm {
    fn lines(&self) -> Vec<Line<'static>> {
        vec![
            Line::from(format!("Book {}: {}", self.book_id, self.book_title)),
            input_line("User ID", &self.user_id, "<required>", true),
        ]
    }

    fn cursor(&self) -> (u16, u16) {
        cursor_after("User ID", self.user_id.chars().count(), 1)
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Fields of the search form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum SearchField {
    #[default]
    Title,
    Author,
    Category,
}

impl SearchField {
    fn label(self) -> &'static str {
        match self {
            SearchField::Title => "Title",
            SearchField::Author => "Author",
            SearchField::Category => "Category",
        }
    }
}

const SEARCH_FIELDS: &[SearchField] = &[
    SearchField::Title,
    SearchField::Author,
    SearchField::Category,
];

/// Book search filters. Every field is optional.
#[derive(Default, Clone, Debug)]
pub(crate) struct SearchForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) category: String,
    pub(crate) active: SearchField,
}

impl SearchForm {
    /// Reopen the form with the filters currently applied.
    pub(crate) fn from_query(query: &BookQuery) -> Self {
        Self {
            title: query.title.clone().unwrap_or_default(),
            author: query.author.clone().unwrap_or_default(),
            category: query.category.clone().unwrap_or_default(),
            active: SearchField::Title,
        }
    }

    pub(crate) fn toggle_field(&mut self, forward: bool) {
        self.active = cycle(SEARCH_FIELDS, self.active, forward);
    }

    fn value(&self, field: SearchField) -> &String {
        match field {
            SearchField::Title => &self.title,
            SearchField::Author => &self.author,
            SearchField::Category => &self.category,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            SearchField::Title => push_text(&mut self.title, ch),
            SearchField::Author => push_text(&mut self.author, ch),
            SearchField::Category => push_text(&mut self.category, ch),
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SearchField::Title => {
                self.title.pop();
            }
            SearchField::Author => {
                self.author.pop();
            }
            SearchField::Category => {
                self.category.pop();
            }
        }
    }

    /// Blank fields become "no constraint".
    pub(crate) fn to_query(&self) -> BookQuery {
        BookQuery {
            title: optional_filter(&self.title),
            author: optional_filter(&self.author),
            category: optional_filter(&self.category),
        }
    }
}

impl FormView for SearchForm {
    fn lines(&self) -> Vec<Line<'static>> {
        SEARCH_FIELDS
            .iter()
            .map(|field| {
                input_line(
                    field.label(),
                    self.value(*field),
                    "<any>",
                    *field == self.active,
                )
            })
            .collect()
    }

    fn cursor(&self) -> (u16, u16) {
        let row = SEARCH_FIELDS
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0);
        cursor_after(
            self.active.label(),
            self.value(self.active).chars().count(),
            row,
        )
    }

    fn error(&self) -> Option<&str> {
        None
    }
}

/// State for confirming removal of a book from the catalog.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) on_loan: u32,
}

impl From<&Book> for ConfirmBookDelete {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            on_loan: book.borrowed_copies(),
        }
    }
}

/// State for confirming the return of a loan.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmReturn {
    pub(crate) record: BorrowRecord,
    pub(crate) book_title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::helpers::surface_error;

    fn sample_book() -> Book {
        Book {
            id: 100,
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            category: "Fiction".to_string(),
            total_copies: 2,
            available_copies: 1,
        }
    }

    fn type_into(form: &mut BookForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn numeric_fields_reject_letters() {
        let mut form = BookForm::default();
        assert!(form.push_char('4'));
        assert!(!form.push_char('x'));
        assert_eq!(form.id, "4");

        form.active = BookField::Title;
        assert!(form.push_char('x'));
        assert_eq!(form.title, "x");
    }

    #[test]
    fn new_book_form_parses_all_fields() {
        let mut form = BookForm::default();
        type_into(&mut form, "100");
        form.toggle_field(true);
        type_into(&mut form, " Dune ");
        form.toggle_field(true);
        type_into(&mut form, "Frank Herbert");
        form.toggle_field(true);
        type_into(&mut form, "Sci-Fi");
        form.toggle_field(true);
        type_into(&mut form, "3");

        let parsed = form.parse_new().unwrap();
        assert_eq!(
            parsed,
            NewBook {
                id: 100,
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                category: "Sci-Fi".to_string(),
                total_copies: 3,
            }
        );
    }

    #[test]
    fn new_book_form_requires_title() {
        let form = BookForm {
            id: "1".to_string(),
            author: "A".to_string(),
            category: "C".to_string(),
            copies: "1".to_string(),
            ..BookForm::default()
        };
        let err = form.parse_new().unwrap_err();
        assert_eq!(err.to_string(), "Title is required.");
    }

    #[test]
    fn edit_form_skips_id_and_sends_only_changes() {
        let book = sample_book();
        let mut form = BookForm::from_book(&book);
        assert_eq!(form.active, BookField::Title);

        form.toggle_field(false);
        assert_eq!(form.active, BookField::Copies);
        form.backspace();
        form.push_char('4');

        let update = form.parse_update(&book).unwrap();
        assert_eq!(update, BookUpdate::default().total_copies(4));
    }

    #[test]
    fn unchanged_edit_form_is_an_empty_update() {
        let book = sample_book();
        let form = BookForm::from_book(&book);
        assert!(form.parse_update(&book).unwrap().is_empty());
    }

    #[test]
    fn edit_form_cursor_accounts_for_header_row() {
        let form = BookForm::from_book(&sample_book());
        assert_eq!(form.cursor(), (("Title: ".len() + 4) as u16, 1));
        assert_eq!(form.lines().len(), 5);
    }

    #[test]
    fn user_form_validates_id() {
        let form = UserForm {
            id: String::new(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            ..UserForm::default()
        };
        assert_eq!(form.parse_inputs().unwrap_err().to_string(), "User ID is required.");

        let form = UserForm {
            id: "99999999999999999999".to_string(),
            ..form
        };
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn search_form_blank_fields_become_none() {
        let form = SearchForm {
            title: "  ".to_string(),
            author: "orwell".to_string(),
            ..SearchForm::default()
        };
        let query = form.to_query();
        assert_eq!(query, BookQuery::default().author("orwell"));

        let reopened = SearchForm::from_query(&query);
        assert_eq!(reopened.author, "orwell");
        assert!(reopened.title.is_empty());
    }

    #[test]
    fn borrow_form_needs_a_user() {
        let mut form = BorrowForm::for_book(&sample_book());
        assert!(form.parse_user_id().is_err());
        form.push_char('7');
        assert_eq!(form.parse_user_id().unwrap(), 7);
    }

    #[test]
    fn oversized_user_id_reports_the_form_message() {
        let mut form = BorrowForm::for_book(&sample_book());
        for ch in "99999999999999999999999".chars() {
            form.push_char(ch);
        }
        let err = form.parse_user_id().unwrap_err();
        assert_eq!(surface_error(&err), "User ID must be an integer.");
    }

    #[test]
    fn delete_confirmation_counts_copies_on_loan() {
        let confirm = ConfirmBookDelete::from(&sample_book());
        assert_eq!(confirm.id, 100);
        assert_eq!(confirm.title, "1984");
        assert_eq!(confirm.on_loan, 1);
    }
}
