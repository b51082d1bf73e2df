//! Timestamp parsing for log exports.
//!
//! Exports mix PAN-OS (`2024/01/15 10:00:00`), ISO-8601, US-style dates and
//! raw epoch values. Naive values are taken as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Accepted naive formats, tried in order. `%.f` also matches no fraction.
const NAIVE_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Parse a timestamp value, `None` if no format matches
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    parse_epoch(value)
}

/// Epoch seconds (10 digits) or milliseconds (13 digits)
fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let raw: i64 = value.parse().ok()?;
    match value.len() {
        9 | 10 => Utc.timestamp_opt(raw, 0).single(),
        13 => Utc.timestamp_millis_opt(raw).single(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panos_format() {
        let ts = parse_timestamp("2024/01/15 10:00:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T10:00:00+00:00");
    }

    #[test]
    fn test_iso_and_fraction() {
        let a = parse_timestamp("2024-01-15 10:00:00").unwrap();
        let b = parse_timestamp("2024-01-15T10:00:00.500").unwrap();
        assert_eq!((b - a).num_milliseconds(), 500);
    }

    #[test]
    fn test_rfc3339_offset_normalised() {
        let ts = parse_timestamp("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(ts, parse_timestamp("2024-01-15 10:00:00").unwrap());
    }

    #[test]
    fn test_epoch_values() {
        assert_eq!(parse_timestamp("1700000000").unwrap().timestamp(), 1_700_000_000);
        assert_eq!(parse_timestamp("1700000000123").unwrap().timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a time").is_none());
        assert!(parse_timestamp("12345").is_none());
    }
}
