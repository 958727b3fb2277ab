//! Lenient field decoders for external records.
//!
//! Upstream systems send dates as ISO or French strings, flags as booleans,
//! integers or strings, and use empty strings for unset values. Each decoder
//! here maps those encodings onto an `Option` of the typed value.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY`. Blank strings and the zero date mean unset.
///
/// # Example
///
/// ```
/// use ij_engine::input::parse_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(parse_date("2024-03-15"), Ok(Some(expected)));
/// assert_eq!(parse_date("15/03/2024"), Ok(Some(expected)));
/// assert_eq!(parse_date(""), Ok(None));
/// assert!(parse_date("March 15th").is_err());
/// ```
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0000-00-00" {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map(Some)
        .map_err(|_| format!("'{}' is not a YYYY-MM-DD or DD/MM/YYYY date", raw))
}

pub(crate) fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_date(&s).map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!("expected a date string, got {}", other))),
    }
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(de::Error::custom(format!("expected 0 or 1, got {}", n))),
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "0" | "false" | "non" => Ok(Some(false)),
            "1" | "true" | "oui" => Ok(Some(true)),
            other => Err(de::Error::custom(format!("'{}' is not a flag", other))),
        },
        Some(other) => Err(de::Error::custom(format!("expected a flag, got {}", other))),
    }
}

pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a day count, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("'{}' is not a day count", s))),
        Some(other) => Err(de::Error::custom(format!("expected a day count, got {}", other))),
    }
}

pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("'{}' is not a number", s))),
        Some(Value::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("'{}' is not a number", n))),
        Some(other) => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected a string, got {}", other))),
    }
}
