//! Date handling for application and effective periods

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date formats accepted in source templates, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d", "%m-%d-%Y"];

/// Closed date interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, returning `None` if `end` precedes `start`
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// January 1st through December 31st of a calendar year
    #[must_use]
    pub fn calendar_year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self { start, end })
    }

    /// Whether the date falls inside the range
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the two ranges share at least one day
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether this range lies entirely inside `other`
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// Year of the first day
    #[must_use]
    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parse a template date in any of the accepted formats
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    // Some exports append a time component
    let value = value.split(['T', ' ']).next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Calendar quarter of a date, `ceil(month / 3)`
#[must_use]
pub fn quarter_of(date: NaiveDate) -> u32 {
    (f64::from(date.month()) / 3.0).ceil() as u32
}
