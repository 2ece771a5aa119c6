use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::records::DomainError;

/// A calendar month, e.g. March 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    year: i32,
    month: u32,
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl MonthRange {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(MonthRange { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        MonthRange {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn as_date_range(self) -> DateRange {
        DateRange::new(self.first_day(), self.last_day())
    }
}

/// Parses `YYYY-MM`.
impl FromStr for MonthRange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        MonthRange::new(year, month).ok_or_else(invalid)
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// `days` calendar days either side of `center`, inclusive.
    pub fn around(center: NaiveDate, days: u32) -> Self {
        let span = Duration::days(i64::from(days));
        DateRange {
            start: center.checked_sub_signed(span).unwrap_or(NaiveDate::MIN),
            end: center.checked_add_signed(span).unwrap_or(NaiveDate::MAX),
        }
    }

    /// Smallest range covering every date in `dates`, or `None` when empty.
    pub fn spanning<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Self> {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(DateRange::new(d, d)),
            Some(r) => Some(DateRange::new(r.start.min(d), r.end.max(d))),
        })
    }
}
