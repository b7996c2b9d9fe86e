use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use chrono::{Days, Local, NaiveDate};

/// Source of "today" for loan dates and overdue checks.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A settable date. Clones share the same day, so a test can hand one clone
/// to the library and keep another to move time forward.
#[derive(Clone)]
pub struct ManualClock {
    day: Rc<Cell<NaiveDate>>,
}

impl ManualClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Rc::new(Cell::new(day)),
        }
    }

    /// Move every handle sharing this clock to `day`.
    pub fn set(&self, day: NaiveDate) {
        self.day.set(day);
    }

    /// Move the clock forward by whole days. Saturates at the last
    /// representable date.
    pub fn advance(&self, days: u64) {
        let current = self.day.get();
        self.day
            .set(current.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX));
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        self.day.get()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("day", &self.day.get())
            .finish()
    }
}
