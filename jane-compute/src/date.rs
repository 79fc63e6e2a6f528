//! Datetime coercion to epoch milliseconds.
//!
//! Temporal columns are ordered by their epoch value. Values may arrive as
//! epoch milliseconds or as text in one of the layouts accepted by
//! [`parse_datetime`].

use jane_result::{Error, Result};
use jane_types::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Parse datetime text into milliseconds since the Unix epoch.
///
/// Accepted layouts, tried in order:
/// - RFC 3339 (`2024-03-01T12:30:00Z`, `2024-03-01T12:30:00.5+02:00`)
/// - `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`, read as UTC
/// - `YYYY-MM-DD`, read as UTC midnight
pub fn parse_datetime(text: &str) -> Result<i64> {
    let text = text.trim();

    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(to_millis(dt));
    }

    let spaced = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let t_separated = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(text, spaced)
        .or_else(|_| PrimitiveDateTime::parse(text, t_separated))
    {
        return Ok(to_millis(dt.assume_utc()));
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(text, date_only) {
        return Ok(to_millis(date.midnight().assume_utc()));
    }

    Err(Error::InvalidArgumentError(format!(
        "invalid datetime literal '{text}'"
    )))
}

/// Epoch milliseconds of a value stored in a temporal column.
///
/// Numbers are taken as epoch milliseconds already; text is parsed with
/// [`parse_datetime`]. Anything else, including unparseable text, yields
/// `None`.
pub fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(ms) => Some(*ms),
        Value::Float(ms) if ms.is_finite() => Some(*ms as i64),
        Value::String(text) => parse_datetime(text).ok(),
        _ => None,
    }
}

#[inline]
fn to_millis(dt: OffsetDateTime) -> i64 {
    (dt.unix_timestamp_nanos() / NANOS_PER_MILLI) as i64
}
