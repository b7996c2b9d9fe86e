use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::catalog::Library;

use super::forms::{
    BookForm, BorrowForm, ConfirmBookDelete, ConfirmReturn, FormView, SearchForm, UserForm,
};
use super::helpers::{centered_rect, key_hints, surface_error};
use super::screens::{BookListScreen, LoanListScreen, LoanSource, UserListScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// High-level navigation states. The book list is always kept around in
/// `App::books` so its filters survive trips to the other screens.
enum Screen {
    Books,
    Users(UserListScreen),
    Loans(LoanListScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook(BookForm),
    ConfirmBookDelete(ConfirmBookDelete),
    Searching(SearchForm),
    Borrowing(BorrowForm),
    AddingUser(UserForm),
    ConfirmReturn(ConfirmReturn),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Outcome of a key press inside a modal form.
enum FormStep {
    Keep,
    Submit,
    Cancel,
}

/// Central application state. Owns the one catalog instance of the process.
pub struct App {
    library: Library,
    books: BookListScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library) -> Self {
        let books = BookListScreen::load(&library);
        Self {
            library,
            books,
            screen: Screen::Books,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Read access to the catalog behind the UI.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::EditingBook(form) => self.handle_edit_book(code, form),
            Mode::ConfirmBookDelete(confirm) => self.handle_confirm_book_delete(code, confirm),
            Mode::Searching(form) => self.handle_search(code, form),
            Mode::Borrowing(form) => self.handle_borrow(code, form),
            Mode::AddingUser(form) => self.handle_add_user(code, form),
            Mode::ConfirmReturn(confirm) => self.handle_confirm_return(code, confirm),
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if code == KeyCode::Char('q') {
            *exit = true;
            return Ok(Mode::Normal);
        }
        match self.screen {
            Screen::Books => Ok(self.handle_books_key(code, exit)),
            Screen::Users(_) => self.handle_users_key(code),
            Screen::Loans(_) => Ok(self.handle_loans_key(code)),
        }
    }

    fn handle_books_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Up => self.books.move_selection(-1),
            KeyCode::Down => self.books.move_selection(1),
            KeyCode::PageUp => self.books.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.books.move_selection(PAGE_STEP),
            KeyCode::Home => self.books.selected = 0,
            KeyCode::End => self.books.select_last(),
            KeyCode::Char('+') => {
                self.clear_status();
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(book) = self.books.current_book() {
                    let form = BookForm::from_book(book);
                    self.clear_status();
                    return Mode::EditingBook(form);
                }
                self.set_status("No book selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                if let Some(book) = self.books.current_book() {
                    let confirm = ConfirmBookDelete::from(book);
                    self.clear_status();
                    return Mode::ConfirmBookDelete(confirm);
                }
                self.set_status("No book selected to remove.", StatusKind::Error);
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                if let Some(book) = self.books.current_book() {
                    let form = BorrowForm::for_book(book);
                    self.clear_status();
                    return Mode::Borrowing(form);
                }
                self.set_status("No book selected to borrow.", StatusKind::Error);
            }
            KeyCode::Char('f') => {
                self.clear_status();
                return Mode::Searching(SearchForm::from_query(&self.books.query));
            }
            KeyCode::Char('c') => {
                self.books.query = Default::default();
                self.books.refresh(&self.library);
                self.set_status("Search cleared.", StatusKind::Info);
            }
            KeyCode::Char('a') => {
                self.books.available_only = !self.books.available_only;
                self.books.refresh(&self.library);
                let message = if self.books.available_only {
                    "Showing available books."
                } else {
                    "Showing all books."
                };
                self.set_status(message, StatusKind::Info);
            }
            KeyCode::Char('u') | KeyCode::Char('U') => {
                self.clear_status();
                self.screen = Screen::Users(UserListScreen::load(&self.library));
            }
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_overdue(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_users_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Users(users) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Esc => {
                self.clear_status();
                self.screen = Screen::Books;
            }
            KeyCode::Up => users.move_selection(-1),
            KeyCode::Down => users.move_selection(1),
            KeyCode::PageUp => users.move_selection(-PAGE_STEP),
            KeyCode::PageDown => users.move_selection(PAGE_STEP),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingUser(UserForm::default()));
            }
            KeyCode::Enter => match users.current_user().cloned() {
                Some(user) => {
                    let loans = LoanListScreen::for_user(&self.library, user)?;
                    self.clear_status();
                    self.screen = Screen::Loans(loans);
                }
                None => self.set_status("No user selected.", StatusKind::Error),
            },
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_overdue(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_loans_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Loans(loans) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Esc => {
                let previous = match &loans.source {
                    LoanSource::User(user) => {
                        let mut users = UserListScreen::load(&self.library);
                        users.refresh(&self.library, Some(user.id));
                        Screen::Users(users)
                    }
                    LoanSource::Overdue(_) => Screen::Books,
                };
                self.clear_status();
                self.screen = previous;
            }
            KeyCode::Up => loans.move_selection(-1),
            KeyCode::Down => loans.move_selection(1),
            KeyCode::PageUp => loans.move_selection(-PAGE_STEP),
            KeyCode::PageDown => loans.move_selection(PAGE_STEP),
            KeyCode::Char('r') | KeyCode::Char('R') => match loans.current_row() {
                Some(row) => {
                    let confirm = ConfirmReturn {
                        record: row.record.clone(),
                        book_title: row.book_title.clone(),
                    };
                    self.clear_status();
                    return Mode::ConfirmReturn(confirm);
                }
                None => self.set_status("No loan selected to return.", StatusKind::Error),
            },
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_overdue(),
            _ => {}
        }
        Mode::Normal
    }

    /// Shared key handling for text forms: Esc cancels, Enter submits, Tab
    /// moves focus, everything else edits the active field.
    fn form_step(code: KeyCode, mut edit: impl FnMut(FormKey)) -> FormStep {
        match code {
            KeyCode::Esc => FormStep::Cancel,
            KeyCode::Enter => FormStep::Submit,
            KeyCode::Tab | KeyCode::Down => {
                edit(FormKey::Next);
                FormStep::Keep
            }
            KeyCode::BackTab | KeyCode::Up => {
                edit(FormKey::Previous);
                FormStep::Keep
            }
            KeyCode::Backspace => {
                edit(FormKey::Backspace);
                FormStep::Keep
            }
            KeyCode::Char(ch) => {
                edit(FormKey::Char(ch));
                FormStep::Keep
            }
            _ => FormStep::Keep,
        }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        let step = Self::form_step(code, |key| match key {
            FormKey::Next => form.toggle_field(true),
            FormKey::Previous => form.toggle_field(false),
            FormKey::Backspace => form.backspace(),
            FormKey::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
        });
        match step {
            FormStep::Keep => Mode::AddingBook(form),
            FormStep::Cancel => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                Mode::Normal
            }
            FormStep::Submit => match self.save_new_book(&form) {
                Ok(()) => Mode::Normal,
                Err(err) => {
                    form.error = Some(self.report_error(&err));
                    Mode::AddingBook(form)
                }
            },
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        let step = Self::form_step(code, |key| match key {
            FormKey::Next => form.toggle_field(true),
            FormKey::Previous => form.toggle_field(false),
            FormKey::Backspace => form.backspace(),
            FormKey::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
        });
        match step {
            FormStep::Keep => Mode::EditingBook(form),
            FormStep::Cancel => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Mode::Normal
            }
            FormStep::Submit => match self.save_book_edits(&form) {
                Ok(()) => Mode::Normal,
                Err(err) => {
                    form.error = Some(self.report_error(&err));
                    Mode::EditingBook(form)
                }
            },
        }
    }

    fn handle_confirm_book_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_delete(&confirm) {
                    self.report_error(&err);
                }
                Mode::Normal
            }
            _ => Mode::ConfirmBookDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut form: SearchForm) -> Mode {
        let step = Self::form_step(code, |key| match key {
            FormKey::Next => form.toggle_field(true),
            FormKey::Previous => form.toggle_field(false),
            FormKey::Backspace => form.backspace(),
            FormKey::Char(ch) => {
                form.push_char(ch);
            }
        });
        match step {
            FormStep::Keep => Mode::Searching(form),
            FormStep::Cancel => {
                self.set_status("Search cancelled.", StatusKind::Info);
                Mode::Normal
            }
            FormStep::Submit => {
                self.books.query = form.to_query();
                self.books.selected = 0;
                self.books.refresh(&self.library);
                self.screen = Screen::Books;
                let found = self.books.books.len();
                if found == 0 {
                    self.set_status("No matching books.", StatusKind::Info);
                } else {
                    self.set_status(format!("{found} matching book(s)."), StatusKind::Info);
                }
                Mode::Normal
            }
        }
    }

    fn handle_borrow(&mut self, code: KeyCode, mut form: BorrowForm) -> Mode {
        let step = Self::form_step(code, |key| match key {
            FormKey::Backspace => form.backspace(),
            FormKey::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            FormKey::Next | FormKey::Previous => {}
        });
        match step {
            FormStep::Keep => Mode::Borrowing(form),
            FormStep::Cancel => {
                self.set_status("Borrow cancelled.", StatusKind::Info);
                Mode::Normal
            }
            FormStep::Submit => match self.perform_borrow(&form) {
                Ok(()) => Mode::Normal,
                Err(err) => {
                    form.error = Some(self.report_error(&err));
                    Mode::Borrowing(form)
                }
            },
        }
    }

    fn handle_add_user(&mut self, code: KeyCode, mut form: UserForm) -> Mode {
        let step = Self::form_step(code, |key| match key {
            FormKey::Next => form.toggle_field(true),
            FormKey::Previous => form.toggle_field(false),
            FormKey::Backspace => form.backspace(),
            FormKey::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
        });
        match step {
            FormStep::Keep => Mode::AddingUser(form),
            FormStep::Cancel => {
                self.set_status("Add user cancelled.", StatusKind::Info);
                Mode::Normal
            }
            FormStep::Submit => match self.save_new_user(&form) {
                Ok(()) => Mode::Normal,
                Err(err) => {
                    form.error = Some(self.report_error(&err));
                    Mode::AddingUser(form)
                }
            },
        }
    }

    fn handle_confirm_return(&mut self, code: KeyCode, confirm: ConfirmReturn) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Return cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_return(&confirm) {
                    self.report_error(&err);
                }
                Mode::Normal
            }
            _ => Mode::ConfirmReturn(confirm),
        }
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let new = form.parse_new()?;
        let book = self.library.add_book(new)?;
        self.books.refresh(&self.library);
        self.books.focus(book.id);
        self.set_status(format!("Added book: {book}"), StatusKind::Info);
        Ok(())
    }

    fn save_book_edits(&mut self, form: &BookForm) -> Result<()> {
        let Some(id) = form.editing else {
            return self.save_new_book(form);
        };
        let current = self.library.get_book(id)?.clone();
        let update = form.parse_update(&current)?;
        if update.is_empty() {
            self.set_status("No changes to save.", StatusKind::Info);
            return Ok(());
        }
        let book = self.library.update_book(id, update)?;
        self.books.refresh(&self.library);
        self.books.focus(id);
        self.set_status(format!("Updated book: {book}"), StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmBookDelete) -> Result<()> {
        self.library.delete_book(confirm.id)?;
        self.books.refresh(&self.library);
        let message = if confirm.on_loan > 0 {
            format!(
                "Deleted '{}'. {} loan(s) against it stay open.",
                confirm.title, confirm.on_loan
            )
        } else {
            format!("Deleted '{}'.", confirm.title)
        };
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn perform_borrow(&mut self, form: &BorrowForm) -> Result<()> {
        let user_id = form.parse_user_id()?;
        let record = self.library.borrow_book(user_id, form.book_id)?;
        self.books.refresh(&self.library);
        self.books.focus(form.book_id);
        self.set_status(format!("Borrowed: {record}"), StatusKind::Info);
        Ok(())
    }

    fn save_new_user(&mut self, form: &UserForm) -> Result<()> {
        let (id, name, email) = form.parse_inputs()?;
        let user = self.library.add_user(id, &name, &email)?;
        if let Screen::Users(users) = &mut self.screen {
            users.refresh(&self.library, Some(user.id));
        }
        self.set_status(format!("Added user: {user}"), StatusKind::Info);
        Ok(())
    }

    fn perform_return(&mut self, confirm: &ConfirmReturn) -> Result<()> {
        let record = self.library.return_book(confirm.record.id)?;
        if let Screen::Loans(loans) = &mut self.screen {
            loans.refresh(&self.library)?;
        }
        self.books.refresh(&self.library);
        self.set_status(format!("Returned: {record}"), StatusKind::Info);
        Ok(())
    }

    fn open_overdue(&mut self) {
        let overdue = LoanListScreen::overdue(&self.library);
        if overdue.rows.is_empty() {
            self.set_status("No overdue records.", StatusKind::Info);
        } else {
            self.clear_status();
        }
        self.screen = Screen::Loans(overdue);
    }

    /// Put the error in the footer and hand back its message for inline
    /// display.
    fn report_error(&mut self, err: &anyhow::Error) -> String {
        let message = surface_error(err);
        debug!("action failed: {err:#}");
        self.set_status(message.clone(), StatusKind::Error);
        message
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Books => self.draw_books(frame, content_area),
            Screen::Users(users) => self.draw_users(frame, content_area, users),
            Screen::Loans(loans) => self.draw_loans(frame, content_area, loans),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_form(frame, area, "Add Book", form),
            Mode::EditingBook(form) => self.draw_form(frame, area, "Edit Book", form),
            Mode::Searching(form) => self.draw_form(frame, area, "Search Books", form),
            Mode::Borrowing(form) => self.draw_form(frame, area, "Borrow Book", form),
            Mode::AddingUser(form) => self.draw_form(frame, area, "Add User", form),
            Mode::ConfirmBookDelete(confirm) => {
                let mut lines = vec![Line::from(format!(
                    "Delete book {} ('{}')?",
                    confirm.id, confirm.title
                ))];
                if confirm.on_loan > 0 {
                    lines.push(Line::from(Span::styled(
                        format!(
                            "{} cop(ies) are on loan; those loans can no longer be returned.",
                            confirm.on_loan
                        ),
                        Style::default().fg(Color::Yellow),
                    )));
                }
                self.draw_confirm(frame, area, "Confirm Removal", lines);
            }
            Mode::ConfirmReturn(confirm) => {
                let title = confirm.book_title.as_deref().unwrap_or("<deleted book>");
                let lines = vec![
                    Line::from(format!("Return '{title}'?")),
                    Line::from(confirm.record.to_string()),
                ];
                self.draw_confirm(frame, area, "Confirm Return", lines);
            }
            Mode::Normal => {}
        }
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect) {
        let items = self
            .books
            .books
            .iter()
            .map(|book| {
                let style = if book.is_available() {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Line::from(Span::styled(book.to_string(), style)))
            })
            .collect();
        let empty = if self.books.query.is_empty() && !self.books.available_only {
            "No books yet. Press '+' to add one."
        } else {
            "No matching books."
        };
        self.draw_list(frame, area, self.books.title(), items, self.books.selected, empty);
    }

    fn draw_users(&self, frame: &mut Frame, area: Rect, users: &UserListScreen) {
        let items = users
            .users
            .iter()
            .map(|user| ListItem::new(Line::from(user.to_string())))
            .collect();
        self.draw_list(
            frame,
            area,
            format!("Users ({})", users.users.len()),
            items,
            users.selected,
            "No users yet. Press '+' to add one.",
        );
    }

    fn draw_loans(&self, frame: &mut Frame, area: Rect, loans: &LoanListScreen) {
        let today = self.library.today();
        let items = loans
            .rows
            .iter()
            .map(|row| {
                let style = if row.record.is_overdue(today) {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(row.describe(), style)))
            })
            .collect();
        self.draw_list(
            frame,
            area,
            loans.title(),
            items,
            loans.selected,
            loans.empty_message(),
        );
    }

    fn draw_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        items: Vec<ListItem<'static>>,
        selected: usize,
        empty_message: &str,
    ) {
        let block = Block::default().title(title).borders(Borders::ALL);
        if items.is_empty() {
            let message = Paragraph::new(empty_message.to_string())
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::ConfirmBookDelete(_) | Mode::ConfirmReturn(_)) => {
                key_hints(&[("y", "Confirm"), ("n/Esc", "Cancel")])
            }
            (_, Mode::Borrowing(_)) => key_hints(&[("Enter", "Borrow"), ("Esc", "Cancel")]),
            (_, Mode::Searching(_)) => key_hints(&[
                ("Tab", "Next Field"),
                ("Enter", "Search"),
                ("Esc", "Cancel"),
            ]),
            (_, Mode::AddingBook(_) | Mode::EditingBook(_) | Mode::AddingUser(_)) => key_hints(&[
                ("Tab", "Next Field"),
                ("Enter", "Save"),
                ("Esc", "Cancel"),
            ]),
            (Screen::Users(_), _) => key_hints(&[
                ("↑↓", "Select"),
                ("Enter", "Loans"),
                ("+", "Add"),
                ("o", "Overdue"),
                ("Esc", "Books"),
                ("q", "Quit"),
            ]),
            (Screen::Loans(_), _) => key_hints(&[
                ("↑↓", "Select"),
                ("r", "Return"),
                ("o", "Overdue"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ]),
            (Screen::Books, _) => key_hints(&[
                ("↑↓", "Select"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("b", "Borrow"),
                ("f", "Search"),
                ("c", "Clear"),
                ("a", "Available"),
                ("u", "Users"),
                ("o", "Overdue"),
                ("q", "Quit"),
            ]),
        }
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &dyn FormView) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        if let Some(error) = form.error() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to confirm • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (column, row) = form.cursor();
        frame.set_cursor_position((inner.x + column, inner.y + row));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

/// Field-level edit requested by a key press in a form.
enum FormKey {
    Next,
    Previous,
    Backspace,
    Char(char),
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::catalog::{ManualClock, NewBook};

    fn seeded_app() -> (App, ManualClock) {
        let clock = ManualClock::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut library = Library::with_clock(Box::new(clock.clone()));
        library.add_user(1, "Alice", "alice@example.com").unwrap();
        library
            .add_book(NewBook {
                id: 100,
                title: "1984".to_string(),
                author: "George Orwell".to_string(),
                category: "Fiction".to_string(),
                total_copies: 2,
            })
            .unwrap();
        (App::new(library), clock)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn render(app: &App) {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
    }

    #[test]
    fn q_quits_from_list_screens() {
        let (mut app, _) = seeded_app();
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn q_inside_a_form_is_just_text() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('f'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(matches!(&app.mode, Mode::Searching(form) if form.title == "q"));
    }

    #[test]
    fn add_book_through_form() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('+'));
        type_text(&mut app, "200");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Dune");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Frank Herbert");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Sci-Fi");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "3");
        render(&app);
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        let book = app.library().get_book(200).unwrap();
        assert_eq!(book.available_copies, 3);
        assert_eq!(app.books.current_book().map(|b| b.id), Some(200));
    }

    #[test]
    fn duplicate_book_id_keeps_form_open_with_error() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('+'));
        type_text(&mut app, "100");
        for value in ["Copy", "Someone", "Misc", "1"] {
            press(&mut app, KeyCode::Tab);
            type_text(&mut app, value);
        }
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::AddingBook(form) => {
                assert_eq!(form.error.as_deref(), Some("Book with id 100 already exists."));
            }
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.library().list_all_books().len(), 1);
    }

    #[test]
    fn borrow_then_return_from_user_loans() {
        let (mut app, clock) = seeded_app();
        press(&mut app, KeyCode::Char('b'));
        type_text(&mut app, "1");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.library().get_book(100).unwrap().available_copies, 1);
        assert_eq!(app.books.books[0].available_copies, 1);

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Enter);
        match &app.screen {
            Screen::Loans(loans) => assert_eq!(loans.rows.len(), 1),
            _ => panic!("expected the loan screen"),
        }
        render(&app);

        clock.advance(2);
        press(&mut app, KeyCode::Char('r'));
        render(&app);
        press(&mut app, KeyCode::Char('y'));

        match &app.screen {
            Screen::Loans(loans) => assert!(loans.rows.is_empty()),
            _ => panic!("expected the loan screen"),
        }
        let record = app.library().get_record(1).unwrap();
        assert_eq!(record.return_date, NaiveDate::from_ymd_opt(2024, 3, 3));
        assert_eq!(app.library().get_book(100).unwrap().available_copies, 2);

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.screen, Screen::Users(_)));
    }

    #[test]
    fn borrow_for_unknown_user_reports_error() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('b'));
        type_text(&mut app, "9");
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::Borrowing(form) => {
                assert_eq!(form.error.as_deref(), Some("User with id 9 not found."));
            }
            _ => panic!("borrow form should stay open"),
        }
        assert!(app.library().list_records().is_empty());
    }

    #[test]
    fn search_filters_book_list() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "tolkien");
        press(&mut app, KeyCode::Enter);
        assert!(app.books.books.is_empty());
        render(&app);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.books.books.len(), 1);
    }

    #[test]
    fn delete_requires_confirmation() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('-'));
        render(&app);
        press(&mut app, KeyCode::Char('n'));
        assert!(app.library().get_book(100).is_ok());

        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.library().get_book(100).is_err());
        assert!(app.books.books.is_empty());
        render(&app);
    }

    #[test]
    fn edit_book_updates_copy_count() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "5");
        render(&app);
        press(&mut app, KeyCode::Enter);

        let book = app.library().get_book(100).unwrap();
        assert_eq!(book.total_copies, 5);
        assert_eq!(book.available_copies, 5);
    }

    #[test]
    fn overdue_screen_lists_late_loans() {
        let (mut app, clock) = seeded_app();
        press(&mut app, KeyCode::Char('b'));
        type_text(&mut app, "1");
        press(&mut app, KeyCode::Enter);

        clock.advance(15);
        press(&mut app, KeyCode::Char('o'));
        match &app.screen {
            Screen::Loans(loans) => {
                assert_eq!(loans.rows.len(), 1);
                assert_eq!(loans.rows[0].book_title.as_deref(), Some("1984"));
            }
            _ => panic!("expected the overdue screen"),
        }
        render(&app);

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.screen, Screen::Books));
    }

    #[test]
    fn add_user_from_user_screen() {
        let (mut app, _) = seeded_app();
        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('+'));
        type_text(&mut app, "2");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Bob");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "bob@example.com");
        render(&app);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.library().get_user(2).unwrap().name, "Bob");
        match &app.screen {
            Screen::Users(users) => {
                assert_eq!(users.users.len(), 2);
                assert_eq!(users.current_user().map(|u| u.id), Some(2));
            }
            _ => panic!("expected the user screen"),
        }
    }
}
