//! # Temporal Codecs — `date` and `date-time`
//!
//! Strict and lenient codecs for the two temporal formats.
//!
//! ## Wire Grammar
//!
//! - `date`: `YYYY-MM-DD`.
//! - `date-time`: `YYYY-MM-DDThh:mm:ss[.f{1,3}]Z`, UTC only.
//!
//! Strict parsing rejects text that does not follow the grammar with `FRMT`
//! and well-formed text naming a non-existent instant (Feb 30, hour 24)
//! with `DATE`. Canonical output always carries millisecond precision and
//! a `Z` suffix, so `2000-01-01T00:00:00Z` is rendered as
//! `2000-01-01T00:00:00.000Z`.
//!
//! Lenient conversion additionally accepts epoch milliseconds, date-only
//! text (taken as midnight UTC), and RFC 3339 text with a numeric offset,
//! which is normalized to UTC.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::error::FormatError;
use crate::value::Value;

const DATE_EXPECTED: &str = "a date string of the form YYYY-MM-DD";
const DATE_TIME_EXPECTED: &str = "a date-time string of the form YYYY-MM-DDThh:mm:ss.sssZ";

/// Parse a fixed-width run of ASCII digits.
fn digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')),
    )
}

/// Split `YYYY-MM-DD` into its numeric parts without checking the calendar.
fn date_parts(bytes: &[u8]) -> Option<(i32, u32, u32)> {
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let year = digits(&bytes[0..4])?;
    let month = digits(&bytes[5..7])?;
    let day = digits(&bytes[8..10])?;
    Some((year as i32, month, day))
}

fn calendar_date(
    (year, month, day): (i32, u32, u32),
    expected: &'static str,
) -> Result<NaiveDate, FormatError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        FormatError::calendar(
            expected,
            format!("Date {year:04}-{month:02}-{day:02} does not exist on the calendar."),
        )
    })
}

/// Strictly parse a `date` string.
pub fn parse_date(text: &str) -> Result<NaiveDate, FormatError> {
    let parts = date_parts(text.as_bytes())
        .ok_or_else(|| FormatError::syntax(DATE_EXPECTED, format!("{text:?}")))?;
    calendar_date(parts, DATE_EXPECTED)
}

/// Strictly parse a `date-time` string.
pub fn parse_date_time(text: &str) -> Result<DateTime<Utc>, FormatError> {
    let syntax = || FormatError::syntax(DATE_TIME_EXPECTED, format!("{text:?}"));
    let bytes = text.as_bytes();
    if bytes.len() < 20 || bytes[bytes.len() - 1] != b'Z' {
        return Err(syntax());
    }
    let parts = date_parts(&bytes[0..10]).ok_or_else(syntax)?;
    if bytes[10] != b'T' || bytes[13] != b':' || bytes[16] != b':' {
        return Err(syntax());
    }
    let hour = digits(&bytes[11..13]).ok_or_else(syntax)?;
    let minute = digits(&bytes[14..16]).ok_or_else(syntax)?;
    let second = digits(&bytes[17..19]).ok_or_else(syntax)?;

    let fraction = &bytes[19..bytes.len() - 1];
    let millis = match fraction {
        [] => 0,
        [b'.', rest @ ..] if (1..=3).contains(&rest.len()) => {
            let raw = digits(rest).ok_or_else(syntax)?;
            raw * 10u32.pow(3 - rest.len() as u32)
        }
        _ => return Err(syntax()),
    };

    let date = calendar_date(parts, DATE_TIME_EXPECTED)?;
    if hour > 23 {
        return Err(FormatError::calendar(
            DATE_TIME_EXPECTED,
            format!("Hour {hour} is out of range."),
        ));
    }
    if minute > 59 {
        return Err(FormatError::calendar(
            DATE_TIME_EXPECTED,
            format!("Minute {minute} is out of range."),
        ));
    }
    if second > 59 {
        return Err(FormatError::calendar(
            DATE_TIME_EXPECTED,
            format!("Second {second} is out of range."),
        ));
    }
    date.and_hms_milli_opt(hour, minute, second, millis)
        .map(|naive| naive.and_utc())
        .ok_or_else(syntax)
}

/// Canonical `date` rendering.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Canonical `date-time` rendering: millisecond precision with `Z` suffix.
pub fn format_date_time(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Midnight UTC on `date`.
pub fn midnight(date: &NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Interpret milliseconds since the Unix epoch.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Leniently convert a value to an instant.
///
/// Accepts typed dates and instants, epoch milliseconds, strict
/// `date`/`date-time` text, and RFC 3339 text with an offset.
/// Instants outside years 0000 through 9999 have no wire form and are rejected.
pub fn coerce_instant(value: &Value) -> Result<DateTime<Utc>, FormatError> {
    let instant = lenient_instant(value)?;
    if (0..=9999).contains(&instant.year()) {
        Ok(instant)
    } else {
        Err(FormatError::conversion("a date-time", value))
    }
}

fn lenient_instant(value: &Value) -> Result<DateTime<Utc>, FormatError> {
    let fail = || FormatError::conversion("a date-time", value);
    match value {
        Value::DateTime(instant) => Ok(*instant),
        Value::Date(date) => Ok(midnight(date)),
        Value::Integer(millis) => from_epoch_millis(*millis).ok_or_else(fail),
        Value::Number(millis) if millis.is_finite() => {
            from_epoch_millis(millis.trunc() as i64).ok_or_else(fail)
        }
        Value::String(text) => {
            if let Ok(instant) = parse_date_time(text) {
                return Ok(instant);
            }
            if let Ok(date) = parse_date(text) {
                return Ok(midnight(&date));
            }
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                // leap seconds have no canonical rendering
                .filter(|dt| dt.nanosecond() < 1_000_000_000)
                .ok_or_else(fail)
        }
        _ => Err(fail()),
    }
}

/// Leniently convert a value to a calendar date.
pub fn coerce_date(value: &Value) -> Result<NaiveDate, FormatError> {
    match value {
        Value::Date(date) => Ok(*date),
        other => coerce_instant(other)
            .map(|instant| instant.date_naive())
            .map_err(|_| FormatError::conversion("a date", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_date_valid() {
        let d = parse_date("2000-01-01").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2000, 1, 1));
    }

    #[test]
    fn test_parse_date_bad_syntax_is_frmt() {
        for text in ["2000-1-01", "20000101", "2000-01-01T00:00:00Z", "", "abcd-ef-gh"] {
            assert_eq!(parse_date(text).unwrap_err().code, ErrorCode::Format, "{text}");
        }
    }

    #[test]
    fn test_parse_date_impossible_is_date() {
        assert_eq!(parse_date("2000-02-30").unwrap_err().code, ErrorCode::Date);
        assert_eq!(parse_date("2001-13-01").unwrap_err().code, ErrorCode::Date);
    }

    #[test]
    fn test_parse_date_accepts_leap_day() {
        assert!(parse_date("2000-02-29").is_ok());
        assert_eq!(parse_date("1900-02-29").unwrap_err().code, ErrorCode::Date);
    }

    #[test]
    fn test_parse_date_time_without_fraction() {
        let dt = parse_date_time("2000-01-01T12:34:56Z").unwrap();
        assert_eq!(dt.hour(), 12);
        assert_eq!(format_date_time(&dt), "2000-01-01T12:34:56.000Z");
    }

    #[test]
    fn test_parse_date_time_short_fraction_is_scaled() {
        let dt = parse_date_time("2000-01-01T00:00:00.5Z").unwrap();
        assert_eq!(dt.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_parse_date_time_rejects_offsets() {
        let err = parse_date_time("2000-01-01T00:00:00+00:00").unwrap_err();
        assert_eq!(err.code, ErrorCode::Format);
    }

    #[test]
    fn test_parse_date_time_rejects_long_fraction() {
        let err = parse_date_time("2000-01-01T00:00:00.1234Z").unwrap_err();
        assert_eq!(err.code, ErrorCode::Format);
    }

    #[test]
    fn test_parse_date_time_out_of_range_is_date() {
        assert_eq!(
            parse_date_time("2000-01-01T24:00:00Z").unwrap_err().code,
            ErrorCode::Date
        );
        assert_eq!(
            parse_date_time("2000-02-30T00:00:00Z").unwrap_err().code,
            ErrorCode::Date
        );
    }

    #[test]
    fn test_parse_date_time_non_ascii_does_not_panic() {
        assert!(parse_date_time("2000-01-01T00:00:0éZ").is_err());
    }

    #[test]
    fn test_coerce_instant_from_epoch_millis() {
        let dt = coerce_instant(&Value::Integer(0)).unwrap();
        assert_eq!(format_date_time(&dt), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_coerce_instant_converts_offset() {
        let dt = coerce_instant(&Value::from("2000-01-01T05:00:00+05:00")).unwrap();
        assert_eq!(format_date_time(&dt), "2000-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_coerce_instant_rejects_garbage() {
        let err = coerce_instant(&Value::from("not a date")).unwrap_err();
        assert_eq!(err.code, ErrorCode::Type);
        assert_eq!(coerce_instant(&Value::Bool(true)).unwrap_err().code, ErrorCode::Type);
    }

    #[test]
    fn test_coerce_instant_rejects_five_digit_years() {
        let err = coerce_instant(&Value::Integer(300_000_000_000_000)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Type);
    }

    #[test]
    fn test_coerce_date_takes_date_part() {
        let d = coerce_date(&Value::from("2000-01-01T23:59:59.999Z")).unwrap();
        assert_eq!(format_date(&d), "2000-01-01");
    }
}
