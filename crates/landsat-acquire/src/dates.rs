//! Monthly date windows.
//!
//! The imagery service filters by an inclusive start and an exclusive end, so
//! a window is half-open: `[first day of month, first day of next month)`.

use crate::{AcquireError, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Date format used on the wire and in archive names.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar-month window, start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Window covering `month` (1-12) of `year`.
    pub fn for_month(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(AcquireError::InvalidDate(format!(
                "month {} is outside 1-12",
                month
            )));
        }

        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            AcquireError::InvalidDate(format!("{}-{:02} is not a valid date", year, month))
        })?;

        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| {
            AcquireError::InvalidDate(format!(
                "{}-{:02} is not a valid date",
                next_year, next_month
            ))
        })?;

        Ok(Self { start, end })
    }

    /// Like [`DateWindow::for_month`] with the year given as a numeric string.
    pub fn parse(year: &str, month: u32) -> Result<Self> {
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| AcquireError::InvalidDate(format!("year '{}' is not numeric", year)))?;
        Self::for_month(year, month)
    }

    /// First day of the month, `YYYY-MM-DD`.
    pub fn start(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// First day of the following month, `YYYY-MM-DD`.
    pub fn end(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start(), self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_month() {
        let window = DateWindow::for_month(2010, 5).unwrap();
        assert_eq!(window.start(), "2010-05-01");
        assert_eq!(window.end(), "2010-06-01");
        assert_eq!(window.year(), 2010);
        assert_eq!(window.month(), 5);
    }

    #[test]
    fn test_december_rolls_over() {
        let window = DateWindow::for_month(1999, 12).unwrap();
        assert_eq!(window.start(), "1999-12-01");
        assert_eq!(window.end(), "2000-01-01");
    }

    #[test]
    fn test_leap_february_is_half_open() {
        let window = DateWindow::for_month(2016, 2).unwrap();
        assert_eq!(window.end(), "2016-03-01");
        assert!(window.contains(NaiveDate::from_ymd_opt(2016, 2, 29).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2016, 3, 1).unwrap()));
    }

    #[test]
    fn test_every_month_is_ordered_and_adjacent() {
        for year in [1984, 2000, 2013, 2023] {
            for month in 1..=12 {
                let window = DateWindow::for_month(year, month).unwrap();
                assert!(window.start_date() < window.end_date());
                assert_eq!(window.start_date().month(), month);
                assert_eq!(window.end_date().day(), 1);
                // End is exactly one month after start.
                let days = (window.end_date() - window.start_date()).num_days();
                assert!((28..=31).contains(&days), "{year}-{month}: {days} days");
            }
        }
    }

    #[test]
    fn test_invalid_month() {
        assert!(matches!(
            DateWindow::for_month(2010, 0),
            Err(AcquireError::InvalidDate(_))
        ));
        assert!(matches!(
            DateWindow::for_month(2010, 13),
            Err(AcquireError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_year_string() {
        let window = DateWindow::parse(" 2015 ", 7).unwrap();
        assert_eq!(window.start(), "2015-07-01");
        assert!(DateWindow::parse("20x5", 7).is_err());
    }

    #[test]
    fn test_display() {
        let window = DateWindow::for_month(2010, 5).unwrap();
        assert_eq!(window.to_string(), "2010-05-01 to 2010-06-01");
    }
}
