//! Date input normalization.
//!
//! Callers may pass dates as structured chrono values or as loosely formatted
//! strings. Everything is reduced to a calendar day and rendered as
//! `YYYY-MM-DD`, which is what the feed and the cache file names use.

use super::provider::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

const DAY_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d.%m.%Y",
    // chrono reads both short and long month names for %b and %B
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%a, %B %d, %Y",
    "%A %d %B %Y",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A date as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::DateTime(dt)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(dt: DateTime<Tz>) -> Self {
        DateInput::DateTime(dt.naive_local())
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<&String> for DateInput {
    fn from(s: &String) -> Self {
        DateInput::Text(s.clone())
    }
}

/// Resolve a date input to a calendar day, dropping any time component.
pub fn parse_date(input: impl Into<DateInput>) -> Result<NaiveDate, DataError> {
    match input.into() {
        DateInput::Date(d) => Ok(d),
        DateInput::DateTime(dt) => Ok(dt.date()),
        DateInput::Text(s) => parse_date_str(&s),
    }
}

/// Canonical `YYYY-MM-DD` form of a date input.
pub fn normalize_date(input: impl Into<DateInput>) -> Result<String, DataError> {
    parse_date(input).map(format_day)
}

/// Render a day the way the feed and the cache expect it.
pub fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn parse_date_str(raw: &str) -> Result<NaiveDate, DataError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.date_naive());
    }

    for fmt in DAY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(DataError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_common_string_layouts() {
        for s in [
            "2024-03-05",
            " 2024-03-05 ",
            "2024/03/05",
            "20240305",
            "05.03.2024",
            "2024-03-05T16:30:00",
            "2024-03-05 16:30",
            "2024-03-05T16:30:00.250",
            "2024-03-05T16:30:00+02:00",
            "2024-03-05T16:30:00Z",
            "2024-3-5",
            "2024-03-05 16:30:00+02:00",
        ] {
            assert_eq!(normalize_date(s).unwrap(), "2024-03-05", "input {s:?}");
        }
    }

    #[test]
    fn accepts_month_names_and_mail_style_dates() {
        for s in [
            "March 5, 2024",
            "Mar 5, 2024",
            "Mar 5 2024",
            "5 Mar 2024",
            "05 March 2024",
            "5 March, 2024",
            "Tuesday 5 March 2024",
            "Tuesday, March 5, 2024",
            "Tue, 05 Mar 2024 16:30:00 GMT",
            "Tue, 5 Mar 2024 16:30:00 +0200",
        ] {
            assert_eq!(normalize_date(s).unwrap(), "2024-03-05", "input {s:?}");
        }
    }

    #[test]
    fn mail_style_date_keeps_its_own_calendar_day() {
        // 23:30 at -0500 is already the next day in UTC; the written day wins.
        assert_eq!(
            normalize_date("Tue, 05 Mar 2024 23:30:00 -0500").unwrap(),
            "2024-03-05"
        );
    }

    #[test]
    fn structured_values_truncate_time() {
        let dt = day(2023, 12, 31).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(normalize_date(dt).unwrap(), "2023-12-31");
        assert_eq!(normalize_date(day(2023, 1, 2)).unwrap(), "2023-01-02");
        assert_eq!(normalize_date(dt.and_utc()).unwrap(), "2023-12-31");
    }

    #[test]
    fn rejects_garbage_and_names_the_value() {
        match normalize_date("next tuesday") {
            Err(DataError::InvalidDate(v)) => assert_eq!(v, "next tuesday"),
            other => panic!("expected InvalidDate, got {other:?}"),
        }
        assert!(normalize_date("").is_err());
        assert!(normalize_date("2024-02-30").is_err());
    }
}
