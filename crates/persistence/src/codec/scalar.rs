//! Lenient scalar parsing.
//!
//! Spreadsheet cells arrive as strings and older relational rows hold loosely
//! typed values, so every reader accepts the handful of spellings seen in
//! practice and reports anything else as `None`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use serde_json::{Number, Value};

/// Epoch values above this are treated as milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Parses a finite number from a JSON number or a numeric string.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Parses a whole number, truncating fractional input.
pub(crate) fn parse_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    parse_number(value).map(|n| n.trunc() as i64)
}

pub(crate) fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Some(true),
            "false" | "0" | "no" | "n" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parses epoch seconds from integers, numeric strings, millisecond epochs,
/// RFC 3339 strings and SQL `YYYY-MM-DD HH:MM:SS` strings.
pub(crate) fn parse_timestamp(value: &Value) -> Option<i64> {
    if let Some(number) = parse_number(value) {
        let seconds = if number.abs() > MILLIS_THRESHOLD {
            number / 1000.0
        } else {
            number
        };
        return Some(seconds.trunc() as i64);
    }

    let text = value.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

/// Formats epoch seconds for a spreadsheet cell.
pub(crate) fn format_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| seconds.to_string())
}

/// Reads a text value, stringifying scalars.
pub(crate) fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Picks the stored spelling of a choice, falling back to the default.
pub(crate) fn parse_choice(value: &Value, allowed: &'static [&'static str]) -> Option<&'static str> {
    let text = value.as_str()?.trim().to_ascii_lowercase();
    allowed.iter().copied().find(|candidate| *candidate == text)
}

pub(crate) fn number_value(number: f64) -> Value {
    Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&json!(12.5)), Some(12.5));
        assert_eq!(parse_number(&json!(" 350000 ")), Some(350_000.0));
        assert_eq!(parse_number(&json!("1,200")), Some(1200.0));
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(null)), None);
    }

    #[test]
    fn test_parse_bool_spellings() {
        assert_eq!(parse_bool(&json!("TRUE")), Some(true));
        assert_eq!(parse_bool(&json!("yes")), Some(true));
        assert_eq!(parse_bool(&json!("1")), Some(true));
        assert_eq!(parse_bool(&json!(0)), Some(false));
        assert_eq!(parse_bool(&json!("")), Some(false));
        assert_eq!(parse_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp(&json!(1_700_000_000)), Some(1_700_000_000));
        assert_eq!(parse_timestamp(&json!("1700000000")), Some(1_700_000_000));
        assert_eq!(
            parse_timestamp(&json!(1_700_000_000_123_i64)),
            Some(1_700_000_000)
        );
        assert_eq!(
            parse_timestamp(&json!("2023-11-14T22:13:20Z")),
            Some(1_700_000_000)
        );
        assert_eq!(
            parse_timestamp(&json!("2023-11-14 22:13:20")),
            Some(1_700_000_000)
        );
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
    }

    #[test]
    fn test_format_timestamp_round_trips() {
        let cell = format_timestamp(1_700_000_000);
        assert_eq!(cell, "2023-11-14T22:13:20Z");
        assert_eq!(parse_timestamp(&json!(cell)), Some(1_700_000_000));
    }

    #[test]
    fn test_parse_text_stringifies_numeric_cells() {
        assert_eq!(parse_text(&json!(42)), Some("42".to_string()));
        assert_eq!(parse_text(&json!(42.0)), Some("42".to_string()));
        assert_eq!(parse_text(&json!("p-1")), Some("p-1".to_string()));
        assert_eq!(parse_text(&json!(null)), None);
    }

    #[test]
    fn test_parse_choice() {
        let allowed: &'static [&'static str] = &["pending", "approved"];
        assert_eq!(parse_choice(&json!("Approved"), allowed), Some("approved"));
        assert_eq!(parse_choice(&json!("archived"), allowed), None);
    }
}
