//! Ingestion normalizer
//!
//! Turns an untrusted [`VisitorEvent`] into the canonical [`VisitorRecord`]
//! persisted per session. The transformation is pure: the only lookups are
//! the embedded country table and the user-agent parser, and neither can fail
//! the pipeline.

pub mod country;
pub mod timestamp;
pub mod user_agent;

use serde_json::Value;
use thiserror::Error;

use crate::models::{VisitorEvent, VisitorRecord};

pub use user_agent::UserAgentInfo;

/// Upper bound for `time_spent_seconds` (one day).
pub const MAX_TIME_SPENT_SECONDS: i64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Missing {0}")]
    MissingField(&'static str),
    #[error("invalid timeSpentSeconds: {0}")]
    InvalidDuration(String),
}

/// Normalize one beacon into the record written to storage.
pub fn normalize_event(event: &VisitorEvent) -> Result<VisitorRecord, NormalizeError> {
    let session_id = required_session_id(event.session_id.as_deref())?;

    let ua = event.user_agent.as_deref().unwrap_or_default();
    let ua_info = UserAgentInfo::parse(ua);

    let mut country = clean_location(event.country.as_deref());
    let country_code = match non_empty(event.country_code.as_deref()) {
        Some(code) => Some(code.to_string()),
        None => country.as_deref().and_then(country::lookup_code).map(str::to_string),
    };
    if country.is_none() {
        country = country_code
            .as_deref()
            .and_then(country::name_for_code)
            .map(str::to_string);
    }

    let time_spent_seconds = match &event.time_spent_seconds {
        None | Some(Value::Null) => None,
        Some(raw) => Some(coerce_duration(raw)?),
    };

    Ok(VisitorRecord {
        session_id,
        public_ip: clean_location(event.public_ip.as_deref()),
        country,
        country_code,
        region: clean_location(event.region.as_deref()),
        city: clean_location(event.city.as_deref()),
        isp: clean_location(event.isp.as_deref()),
        page_visited: non_empty(event.page_visited.as_deref()).map(str::to_string),
        user_agent: non_empty(Some(ua)).map(str::to_string),
        device_type: ua_info.device_type(),
        browser: ua_info.browser_family,
        operating_system: ua_info.os_family,
        first_seen: event
            .timestamp
            .as_ref()
            .and_then(timestamp::normalize_timestamp),
        time_spent_seconds,
    })
}

/// `sessionId` must be present and non-empty.
pub fn required_session_id(session_id: Option<&str>) -> Result<String, NormalizeError> {
    non_empty(session_id)
        .map(str::to_string)
        .ok_or(NormalizeError::MissingField("sessionId"))
}

/// Empty strings and the `"unknown"` sentinel (any case) mean absent.
pub fn clean_location(value: Option<&str>) -> Option<String> {
    let value = non_empty(value)?;
    if value.eq_ignore_ascii_case("unknown") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Coerce a JSON duration to whole seconds and clamp it to `[0, 86400]`.
pub fn coerce_duration(raw: &Value) -> Result<i64, NormalizeError> {
    let seconds = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|v| v as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
        }
        _ => None,
    }
    .ok_or_else(|| NormalizeError::InvalidDuration(raw.to_string()))?;

    Ok(clamp_duration(seconds))
}

pub fn clamp_duration(seconds: i64) -> i64 {
    seconds.clamp(0, MAX_TIME_SPENT_SECONDS)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
