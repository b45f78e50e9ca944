use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Month, NaiveDate};

use crate::error::GridError;

/// A calendar month, the unit of navigation in the gallery.
///
/// Ordering is chronological (year first, then month), so sorting a list of
/// `YearMonth` ascending yields oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, GridError> {
        if !(1..=12).contains(&month) {
            return Err(GridError::InvalidYearMonth(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    /// Extracts the month from an ISO `YYYY-MM-DD` date key.
    ///
    /// Returns `None` for anything chrono cannot parse as a calendar date.
    pub fn from_date_key(key: &str) -> Option<Self> {
        let date = parse_date_key(key)?;
        Some(Self {
            year: date.year(),
            month: date.month(),
        })
    }

    /// Canonical `YYYY-MM` key used by the index and persistence.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// English month label such as `March 2024`.
    pub fn label(&self) -> String {
        EnglishLabeler.label(*self)
    }
}

/// Parses a strict `YYYY-MM-DD` bucket key.
///
/// Keys must be exactly ten characters so that lexicographic order of valid
/// keys equals chronological order.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = GridError;

    /// Accepts `YYYY-MM` and full `YYYY-MM-DD` dates.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(ym) = Self::from_date_key(s) {
            return Ok(ym);
        }
        // Parse as the first of the month so chrono validates both parts.
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(|date| Self {
                year: date.year(),
                month: date.month(),
            })
            .map_err(|_| GridError::InvalidYearMonth(s.to_string()))
    }
}

/// Produces the human-readable label stored on separators and shown in the
/// month banner. Plug in a localized implementation from the UI layer.
pub trait MonthLabeler {
    fn label(&self, ym: YearMonth) -> String;
}

impl<F> MonthLabeler for F
where
    F: Fn(YearMonth) -> String,
{
    fn label(&self, ym: YearMonth) -> String {
        self(ym)
    }
}

/// Default labeler: `"<Month name> <year>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLabeler;

impl MonthLabeler for EnglishLabeler {
    fn label(&self, ym: YearMonth) -> String {
        match u8::try_from(ym.month).ok().and_then(|m| Month::try_from(m).ok()) {
            Some(month) => format!("{} {}", month.name(), ym.year),
            None => ym.to_string(),
        }
    }
}
