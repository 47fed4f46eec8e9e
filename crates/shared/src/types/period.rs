//! Year-month booking period.
//!
//! Every entry is booked to a `Period` (`YYYY-MM`). Series advance one
//! calendar month per step, so month arithmetic lives here.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a period string is not a valid `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodParseError {
    /// The string is not shaped like `YYYY-MM`.
    #[error("Invalid period '{0}': expected YYYY-MM")]
    Malformed(String),

    /// The month component is outside 1..=12.
    #[error("Invalid period month {0}: expected 01-12")]
    MonthOutOfRange(u32),

    /// The year component is outside 1..=9999.
    #[error("Invalid period year {0}")]
    YearOutOfRange(i32),
}

/// A calendar month an entry is booked to.
///
/// Field order matters: the derived `Ord` compares year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period, validating its components.
    ///
    /// # Errors
    ///
    /// Returns an error if the month is not 1..=12 or the year is not 1..=9999.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodParseError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodParseError::MonthOutOfRange(month));
        }
        if !(1..=9999).contains(&year) {
            return Err(PeriodParseError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing the given date.
    ///
    /// # Errors
    ///
    /// Returns an error if the date's year is outside 1..=9999.
    pub fn from_date(date: NaiveDate) -> Result<Self, PeriodParseError> {
        Self::new(date.year(), date.month())
    }

    /// Year component.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month component (1..=12).
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Returns the period `months` calendar months later, or `None` past 9999-12.
    #[must_use]
    pub fn checked_add_months(self, months: u32) -> Option<Self> {
        let zero_based = (self.month - 1).checked_add(months)?;
        let years = i32::try_from(zero_based / 12).ok()?;
        let year = self.year.checked_add(years)?;
        Self::new(year, zero_based % 12 + 1).ok()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodParseError::Malformed(s.to_string());

        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|b| b.is_ascii_digit())
            || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}
