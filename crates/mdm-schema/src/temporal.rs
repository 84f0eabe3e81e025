//! Date, datetime, and time parsing shared by config and value checks

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}:\d{2}(:\d{2})?$").expect("time pattern is a valid regex")
});

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a date or datetime string into a UTC timestamp
///
/// Accepts RFC 3339 (with offset), `YYYY-MM-DD`, and `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]`.
/// Strings without an offset are read as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an `HH:MM` or `HH:MM:SS` time of day
#[must_use]
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    if !TIME_RE.is_match(value) {
        return None;
    }
    let format = if value.len() == 5 { "%H:%M" } else { "%H:%M:%S" };
    NaiveTime::parse_from_str(value, format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_only() {
        let ts = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 15);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-01-15T10:00:00+02:00").unwrap();
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    fn test_parse_naive_datetime_variants() {
        assert!(parse_timestamp("2024-01-15T10:30").is_some());
        assert!(parse_timestamp("2024-01-15T10:30:45").is_some());
        assert!(parse_timestamp("2024-01-15T10:30:45.123").is_some());
        assert!(parse_timestamp("2024-01-15 10:30:45").is_some());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_time() {
        assert!(parse_time("14:30").is_some());
        assert!(parse_time("00:00:59").is_some());
        assert!(parse_time("2:30").is_none());
        assert!(parse_time("14:30:00.5").is_none());
        assert!(parse_time("25:00").is_none());
    }
}
