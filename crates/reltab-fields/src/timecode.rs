//! Numeric time encoding: dates and datetimes are stored as epoch
//! seconds in `f64`, NaN meaning empty.
//!
//! Parsing is lenient (declared format first, then common fallbacks) so a
//! `Date` column can still compare against a reference carrying a time
//! part; `Date` semantics floor to whole days at operation time, not here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

const DATETIME_FALLBACKS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FALLBACKS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Floor an epoch-second encoding to midnight of its day.
pub fn floor_day(secs: f64) -> f64 {
    if secs.is_nan() {
        secs
    } else {
        (secs / SECONDS_PER_DAY).floor() * SECONDS_PER_DAY
    }
}

fn encode(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64
}

/// Parse a timestamp string: declared format first, then datetime
/// fallbacks, then date-only fallbacks (midnight). `None` means the
/// string is not a timestamp at all.
pub fn parse_timestamp(s: &str, preferred: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, preferred) {
        return Some(encode(dt));
    }
    for fmt in DATETIME_FALLBACKS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(encode(dt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, preferred) {
        return d.and_hms_opt(0, 0, 0).map(encode);
    }
    for fmt in DATE_FALLBACKS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(encode);
        }
    }
    None
}

/// Strict date-only parse, used by type inference so that samples with a
/// time part fall through to `DateTime`.
pub fn parse_date_strict(s: &str, preferred: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, preferred) {
        return d.and_hms_opt(0, 0, 0).map(encode);
    }
    for fmt in DATE_FALLBACKS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(encode);
        }
    }
    None
}

/// Render an epoch-second encoding with the given chrono format.
/// NaN renders as the empty string.
pub fn format_timestamp(secs: f64, fmt: &str) -> String {
    if secs.is_nan() {
        return String::new();
    }
    match DateTime::from_timestamp(secs as i64, 0) {
        Some(dt) => dt.naive_utc().format(fmt).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_parses_to_midnight() {
        let secs = parse_timestamp("2020-01-01", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(secs, floor_day(secs));
    }

    #[test]
    fn time_part_survives_lenient_parse() {
        let noon = parse_timestamp("2020-01-01 12:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let midnight = parse_timestamp("2020-01-01", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_ne!(noon, midnight);
        assert_eq!(floor_day(noon), midnight);
    }

    #[test]
    fn strict_rejects_time_part() {
        assert!(parse_date_strict("2020-01-01 12:00", "%Y-%m-%d").is_none());
        assert!(parse_date_strict("2020-01-01", "%Y-%m-%d").is_some());
    }

    #[test]
    fn roundtrip_format() {
        let secs = parse_timestamp("2021-06-15", "%Y-%m-%d").unwrap();
        assert_eq!(format_timestamp(secs, "%Y-%m-%d"), "2021-06-15");
        assert_eq!(format_timestamp(f64::NAN, "%Y-%m-%d"), "");
    }
}
