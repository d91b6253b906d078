//! Calendar months and the month filter used by the event list.

use std::fmt;

use chrono::{Datelike, Local, Months, NaiveDate};

use crate::event::Event;

/// A month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth(NaiveDate);

impl CalendarMonth {
    /// `None` when `month` is not 1-12 or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(CalendarMonth)
    }

    pub fn containing(date: NaiveDate) -> Self {
        CalendarMonth(date.with_day(1).unwrap_or(date))
    }

    /// The month of today's local date.
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn next(&self) -> Self {
        self.0
            .checked_add_months(Months::new(1))
            .map(CalendarMonth)
            .unwrap_or(*self)
    }

    pub fn previous(&self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .map(CalendarMonth)
            .unwrap_or(*self)
    }

    /// Same month of the same year; not a rolling 30-day window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%B %Y"))
    }
}

/// Events scheduled in `month`, in their original order.
pub fn events_in_month(events: &[Event], month: CalendarMonth) -> Vec<&Event> {
    events.iter().filter(|e| month.contains(e.date())).collect()
}
