use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt;

/// Beacon payload posted by the tracking script.
///
/// Everything except `session_id` is optional, and the script is free to send
/// extra keys (`deviceOs`, `osVersion`, ...) which are ignored. Text fields
/// take any JSON scalar: numbers and booleans are kept in string form, arrays
/// and objects are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub isp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub public_ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub page_visited: Option<String>,
    /// Epoch count (seconds, milliseconds or microseconds) or a date string
    pub timestamp: Option<Value>,
    pub time_spent_seconds: Option<Value>,
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "Desktop",
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical per-session row written to the `visitors` table.
///
/// `None` fields are omitted from the serialized form and merged with
/// `COALESCE` by the SQL backends, so an upsert never clears a stored value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitorRecord {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_visited: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub device_type: DeviceType,
    pub browser: String,
    pub operating_system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
}

/// A visitor row as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredVisitor {
    pub session_id: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub page_visited: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub operating_system: Option<String>,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub time_spent_seconds: Option<i64>,
}

/// Parameters of the `get_filtered_analytics_visual` procedure.
///
/// Serialized with explicit nulls: the procedure takes every argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsFilters {
    pub country_filter: Option<String>,
    pub start_date_filter: Option<String>,
    pub end_date_filter: Option<String>,
    pub visitor_type_filter: Option<String>,
    pub device_filter: Option<String>,
    pub url_filter: Option<String>,
    pub browser_filter: Option<String>,
    pub ip_filter: Option<String>,
    pub isp_filter: Option<String>,
    pub region_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_record() -> VisitorRecord {
        VisitorRecord {
            session_id: "s-1".to_string(),
            public_ip: None,
            country: Some("France".to_string()),
            country_code: Some("FR".to_string()),
            region: None,
            city: None,
            isp: None,
            page_visited: None,
            user_agent: None,
            device_type: DeviceType::Mobile,
            browser: "Safari".to_string(),
            operating_system: "iPhone".to_string(),
            first_seen: None,
            time_spent_seconds: None,
        }
    }

    #[test]
    fn test_record_omits_absent_fields() {
        let json = serde_json::to_value(minimal_record()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["session_id"], "s-1");
        assert_eq!(obj["device_type"], "Mobile");
        assert!(!obj.contains_key("public_ip"));
        assert!(!obj.contains_key("first_seen"));
        assert!(!obj.contains_key("time_spent_seconds"));
        assert!(obj.values().all(|v| !v.is_null()));
    }

    #[test]
    fn test_event_accepts_camel_case_and_extra_keys() {
        let event: VisitorEvent = serde_json::from_str(
            r#"{"sessionId":"abc","publicIp":"1.2.3.4","deviceOs":"MacOS","timestamp":1700000000}"#,
        )
        .unwrap();

        assert_eq!(event.session_id.as_deref(), Some("abc"));
        assert_eq!(event.public_ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(event.timestamp, Some(Value::from(1_700_000_000_i64)));
        assert!(event.user_agent.is_none());
    }

    #[test]
    fn test_event_tolerates_non_string_scalars() {
        let event: VisitorEvent = serde_json::from_str(
            r#"{"sessionId":12345,"userId":42,"isp":true,"city":{"name":"Oslo"},"region":null}"#,
        )
        .unwrap();

        assert_eq!(event.session_id.as_deref(), Some("12345"));
        assert_eq!(event.user_id.as_deref(), Some("42"));
        assert_eq!(event.isp.as_deref(), Some("true"));
        assert!(event.city.is_none());
        assert!(event.region.is_none());
    }

    #[test]
    fn test_filters_serialize_with_nulls() {
        let filters = AnalyticsFilters {
            country_filter: Some("US".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&filters).unwrap();

        assert_eq!(json["country_filter"], "US");
        assert!(json["isp_filter"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 10);
    }
}
