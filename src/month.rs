//! Calendar month windows used to scope budgets, reports and recurring transactions.

use serde::Deserialize;
use time::{Date, Month};

use crate::Error;

/// The month and year query parameters used by month-scoped endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MonthQuery {
    /// The month number, 1 is January.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
}

impl MonthQuery {
    /// Validate the query and build the month window it refers to.
    pub fn window(self) -> Result<MonthWindow, Error> {
        MonthWindow::new(self.month, self.year)
    }
}

/// The first to the last day of a calendar month, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// The first day of the month.
    pub start: Date,
    /// The last day of the month.
    pub end: Date,
}

impl MonthWindow {
    /// Create the window for `month` (1 is January) of `year`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if `month` is not between 1 and 12 or `year`
    /// is out of the supported date range.
    pub fn new(month: u8, year: i32) -> Result<Self, Error> {
        let invalid_month = || Error::InvalidMonth { month, year };

        let month_value = Month::try_from(month).map_err(|_| invalid_month())?;
        let start = Date::from_calendar_date(year, month_value, 1).map_err(|_| invalid_month())?;
        let next_month_start = match month_value {
            Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
            other => Date::from_calendar_date(year, other.next(), 1),
        }
        .map_err(|_| invalid_month())?;
        let end = next_month_start.previous_day().ok_or_else(invalid_month)?;

        Ok(Self { start, end })
    }

    /// The window of the month that `date` falls in.
    pub fn containing(date: Date) -> Self {
        // The first and last day of the month of a valid date are always valid,
        // except at the very end of the supported range.
        Self::new(date.month() as u8, date.year()).unwrap_or(Self {
            start: date,
            end: date,
        })
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// A sortable key for the month, e.g. "2025-01".
    pub fn period_key(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month() as u8)
    }

    /// The month number, 1 is January.
    pub fn month_number(&self) -> u8 {
        self.start.month() as u8
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

/// Formats a month as a three-letter abbreviation, e.g. "Jan".
pub fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
