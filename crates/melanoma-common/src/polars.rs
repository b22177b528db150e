//! Polars AnyValue utility functions.
//!
//! This module provides helper functions for working with Polars `AnyValue` types,
//! including string conversions, numeric parsing and temporal decoding.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;

/// Days between 0001-01-01 (CE) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null`, properly formats numeric types without
/// unnecessary trailing zeros.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use melanoma_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::String("PR")), "PR");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Converts `AnyValue` to `String`, returning `None` if the result is empty.
pub fn any_to_string_non_empty(value: AnyValue<'_>) -> Option<String> {
    let s = any_to_string(value);
    if s.trim().is_empty() { None } else { Some(s.trim().to_string()) }
}

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use melanoma_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.5), "1.5");
/// assert_eq!(format_numeric(0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Formats a floating-point number with a fixed number of decimals.
///
/// ```
/// use melanoma_common::format_fixed;
///
/// assert_eq!(format_fixed(33.3333, 1), "33.3");
/// assert_eq!(format_fixed(2.0, 2), "2.00");
/// ```
pub fn format_fixed(v: f64, decimals: usize) -> String {
    format!("{v:.decimals$}")
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
///
/// Handles integer types, floating-point types, and string parsing. NaN is
/// treated as missing.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    let number = match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    };
    number.filter(|v| !v.is_nan())
}

/// Converts an `AnyValue` to `i64`, returning `None` for non-integer or null values.
///
/// Handles integer types, floating-point types (truncated), and string parsing.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        AnyValue::Float32(v) if !v.is_nan() => Some(v as i64),
        AnyValue::Float64(v) if !v.is_nan() => Some(v as i64),
        AnyValue::String(s) => parse_i64(s),
        AnyValue::StringOwned(s) => parse_i64(&s),
        _ => None,
    }
}

/// Converts typed boolean-like values (booleans and 0/1 integers) to `bool`.
///
/// Text tokens are not interpreted here; their meaning is configuration
/// dependent.
pub fn any_to_bool(value: AnyValue<'_>) -> Option<bool> {
    match value {
        AnyValue::Boolean(b) => Some(b),
        AnyValue::Float32(_)
        | AnyValue::Float64(_)
        | AnyValue::String(_)
        | AnyValue::StringOwned(_) => None,
        other => match any_to_i64(other) {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
    }
}

/// Decodes Polars temporal values (`Date`, `Datetime`) into a `NaiveDateTime`.
///
/// Returns `None` for nulls and for non-temporal values; text parsing is left
/// to callers that know the expected formats.
pub fn any_to_datetime(value: AnyValue<'_>) -> Option<NaiveDateTime> {
    match value {
        AnyValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        AnyValue::Datetime(v, unit, _) => timestamp_to_datetime(v, unit),
        _ => None,
    }
}

fn timestamp_to_datetime(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(value)?,
        TimeUnit::Microseconds => DateTime::<Utc>::from_timestamp_micros(value)?,
        TimeUnit::Nanoseconds => DateTime::<Utc>::from_timestamp_nanos(value),
    };
    Some(datetime.naive_utc())
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
///
/// A decimal comma (`"3,5"`) is accepted when no dot is present.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) => Some(parsed),
        Err(_) if trimmed.contains(',') && !trimmed.contains('.') => {
            trimmed.replace(',', ".").parse::<f64>().ok()
        }
        Err(_) => None,
    }
}

/// Parses a string as `i64`, returning `None` for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_integers() {
        assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::UInt32(0)), "0");
    }

    #[test]
    fn test_any_to_string_floats() {
        assert_eq!(any_to_string(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(any_to_string(AnyValue::Float64(1.0)), "1");
        assert_eq!(any_to_string(AnyValue::Float64(10.0)), "10");
    }

    #[test]
    fn test_any_to_string_boolean() {
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
        assert_eq!(any_to_string(AnyValue::Boolean(false)), "false");
    }

    #[test]
    fn test_any_to_string_non_empty() {
        assert_eq!(any_to_string_non_empty(AnyValue::Null), None);
        assert_eq!(any_to_string_non_empty(AnyValue::String("  ")), None);
        assert_eq!(
            any_to_string_non_empty(AnyValue::String(" CR ")),
            Some("CR".to_string())
        );
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1.0), "1");
        assert_eq!(format_numeric(1.50), "1.5");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(-0.0), "-0");
    }

    #[test]
    fn test_any_to_f64() {
        assert_eq!(any_to_f64(AnyValue::Null), None);
        assert_eq!(any_to_f64(AnyValue::Int32(42)), Some(42.0));
        assert_eq!(any_to_f64(AnyValue::String("2.5")), Some(2.5));
        assert_eq!(any_to_f64(AnyValue::String("2,5")), Some(2.5));
        assert_eq!(any_to_f64(AnyValue::Float64(f64::NAN)), None);
        assert_eq!(any_to_f64(AnyValue::String("invalid")), None);
    }

    #[test]
    fn test_any_to_i64() {
        assert_eq!(any_to_i64(AnyValue::Null), None);
        assert_eq!(any_to_i64(AnyValue::Float64(3.9)), Some(3)); // truncated
        assert_eq!(any_to_i64(AnyValue::String("100")), Some(100));
    }

    #[test]
    fn test_any_to_bool() {
        assert_eq!(any_to_bool(AnyValue::Boolean(true)), Some(true));
        assert_eq!(any_to_bool(AnyValue::Int64(0)), Some(false));
        assert_eq!(any_to_bool(AnyValue::Int64(1)), Some(true));
        assert_eq!(any_to_bool(AnyValue::Int64(2)), None);
        assert_eq!(any_to_bool(AnyValue::String("1")), None);
    }

    #[test]
    fn test_any_to_datetime_from_date() {
        let parsed = any_to_datetime(AnyValue::Date(0)).unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        let later = any_to_datetime(AnyValue::Date(31)).unwrap();
        assert_eq!(later.date(), NaiveDate::from_ymd_opt(1970, 2, 1).unwrap());
        assert_eq!(any_to_datetime(AnyValue::String("2024-01-01")), None);
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("  3.14  "), Some(3.14));
        assert_eq!(parse_f64("1,000.5"), None);
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("  -100  "), Some(-100));
        assert_eq!(parse_i64("invalid"), None);
    }
}
