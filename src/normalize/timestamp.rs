//! Best-effort timestamp parsing for client-supplied `timestamp` values

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Above this an epoch count is taken to be microseconds (or finer) and is
/// scaled down by 1000 until it drops below.
const MICROS_THRESHOLD: i64 = 100_000_000_000_000;

/// Above this an epoch count is taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Normalize a raw `timestamp` field into an ISO-8601 UTC string.
///
/// Numbers and all-digit strings are epoch counts whose unit is inferred from
/// magnitude; any other string goes through [`parse_datetime`]. Anything that
/// does not parse yields `None`.
pub fn normalize_timestamp(raw: &Value) -> Option<String> {
    let parsed = match raw {
        Value::Number(n) => {
            let count = n
                .as_i64()
                .or_else(|| n.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
                .or_else(|| n.as_f64().map(|v| v as i64))?;
            from_epoch(count)
        }
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                from_epoch(s.parse::<i64>().ok()?)
            } else {
                parse_datetime(s)
            }
        }
        _ => None,
    };

    parsed.map(|dt| to_iso(&dt))
}

/// Interpret an epoch count whose unit is unknown.
pub fn from_epoch(count: i64) -> Option<DateTime<Utc>> {
    let mut value = count;
    while value > MICROS_THRESHOLD {
        value /= 1000;
    }

    if value > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// Parse a free-form date/time string. Values without an offset are taken to
/// be UTC; bare dates resolve to midnight.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render as RFC 3339 with a `Z` suffix and only as many fractional digits as
/// needed.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
