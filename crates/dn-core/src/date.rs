//! Calendar-day keys.
//!
//! A [`DateKey`] is a plain civil date with no timezone attached. Parsing
//! builds the date from its year/month/day fields directly and never passes
//! through an instant type, so `2025-06-10` stays `2025-06-10` whatever the
//! host timezone is.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date parsing and construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The input is not a strict `YYYY-MM-DD` string naming a real day.
    #[error("invalid date format: {input:?} (expected YYYY-MM-DD)")]
    InvalidFormat { input: String },

    /// A year/month/day triple outside the calendar.
    #[error("invalid calendar date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// A timezone-naive calendar day.
///
/// Equality and ordering follow the `(year, month, day)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Builds a key from its calendar fields.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a strict `YYYY-MM-DD` string.
    ///
    /// Leading/trailing whitespace, missing zero padding and any time or
    /// offset suffix are rejected.
    pub fn parse_iso(input: &str) -> Result<Self, DateError> {
        let invalid = || DateError::InvalidFormat {
            input: input.to_string(),
        };

        let bytes = input.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(invalid());
        }
        let digits_ok = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !digits_ok {
            return Err(invalid());
        }

        let year: i32 = input[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = input[5..7].parse().map_err(|_| invalid())?;
        let day: u32 = input[8..10].parse().map_err(|_| invalid())?;

        Self::from_ymd(year, month, day).map_err(|_| invalid())
    }

    /// Today's date in the local civil calendar.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Formats the key as `YYYY-MM-DD`.
    pub fn to_iso(self) -> String {
        format!("{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// The following calendar day, if representable.
    pub fn next_day(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Weekday index with Monday as 0.
    pub fn weekday_from_monday(self) -> u32 {
        self.0.weekday().num_days_from_monday()
    }

    /// Human-readable long form, e.g. `Tuesday, June 10, 2025`.
    pub fn long_display(self) -> String {
        self.0.format("%A, %B %-d, %Y").to_string()
    }

    pub const fn as_naive(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl FromStr for DateKey {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_iso(s)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_iso(&value)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_iso()
    }
}

/// Parses every input independently, keeping the valid keys.
///
/// Malformed entries are logged and returned separately so one bad value
/// never aborts the rest.
pub fn parse_many<I, S>(inputs: I) -> (Vec<DateKey>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        match DateKey::parse_iso(input.trim()) {
            Ok(key) => valid.push(key),
            Err(err) => {
                tracing::warn!(%err, "skipping malformed date");
                rejected.push(input.to_string());
            }
        }
    }
    (valid, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    #[test]
    fn parse_iso_roundtrips_calendar_dates() {
        for s in ["2025-01-01", "2024-02-29", "1999-12-31", "0001-01-01", "9999-12-31"] {
            assert_eq!(key(s).to_iso(), s);
        }
    }

    #[test]
    fn parse_iso_rejects_bad_patterns() {
        for s in [
            "",
            "2025-1-01",
            "2025/01/01",
            "20250101",
            " 2025-01-01",
            "2025-01-01T00:00:00Z",
            "2025-01-0a",
            "+025-01-01",
        ] {
            assert!(
                matches!(DateKey::parse_iso(s), Err(DateError::InvalidFormat { .. })),
                "{s:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_iso_rejects_impossible_days() {
        for s in ["2025-13-01", "2025-02-30", "2023-02-29", "2025-00-10", "2025-04-31"] {
            assert!(matches!(
                DateKey::parse_iso(s),
                Err(DateError::InvalidFormat { .. })
            ));
        }
    }

    #[test]
    fn from_ymd_reports_invalid_date() {
        assert_eq!(
            DateKey::from_ymd(2025, 2, 30),
            Err(DateError::InvalidDate {
                year: 2025,
                month: 2,
                day: 30
            })
        );
    }

    #[test]
    fn ordering_follows_calendar() {
        assert!(key("2024-12-31") < key("2025-01-01"));
        assert!(key("2025-01-09") < key("2025-01-10"));
        assert!(key("2025-02-01") > key("2025-01-31"));
        assert_eq!(key("2025-06-10"), DateKey::from_ymd(2025, 6, 10).unwrap());
    }

    #[test]
    fn serde_uses_iso_strings() {
        let json = serde_json::to_string(&key("2025-06-15")).unwrap();
        assert_eq!(json, "\"2025-06-15\"");
        let parsed: DateKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key("2025-06-15"));
        assert!(serde_json::from_str::<DateKey>("\"2025-02-30\"").is_err());
    }

    #[test]
    fn next_day_crosses_month_and_year() {
        assert_eq!(key("2025-01-31").next_day(), Some(key("2025-02-01")));
        assert_eq!(key("2024-12-31").next_day(), Some(key("2025-01-01")));
    }

    #[test]
    fn long_display_spells_out_the_day() {
        assert_eq!(key("2025-06-10").long_display(), "Tuesday, June 10, 2025");
    }

    #[test]
    fn parse_many_skips_malformed_entries() {
        let (valid, rejected) = parse_many(["2025-06-10", "tomorrow", " 2025-06-11 "]);
        assert_eq!(valid, vec![key("2025-06-10"), key("2025-06-11")]);
        assert_eq!(rejected, vec!["tomorrow".to_string()]);
    }
}
