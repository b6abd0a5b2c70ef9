//! Analytics API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use super::handlers::AppState;
use crate::models::AnalyticsFilters;
use crate::normalize::timestamp::{normalize_timestamp, parse_datetime, to_iso};

/// Filters accepted on `GET /api/analytics`. Unrecognised parameters are
/// ignored.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQueryParams {
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

impl AnalyticsQueryParams {
    /// Empty values become `None`; date bounds are re-rendered as ISO-8601
    /// and dropped when they do not parse.
    pub fn into_filters(self) -> AnalyticsFilters {
        AnalyticsFilters {
            country_filter: present(self.country_filter),
            start_date_filter: present(self.start_date_filter).and_then(iso_date),
            end_date_filter: present(self.end_date_filter).and_then(iso_date),
            visitor_type_filter: present(self.visitor_type_filter),
            device_filter: present(self.device_filter),
            url_filter: present(self.url_filter),
            browser_filter: present(self.browser_filter),
            ip_filter: present(self.ip_filter),
            isp_filter: present(self.isp_filter),
            region_filter: present(self.region_filter),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Calendar forms (including compact `YYYYMMDD`) win over the epoch reading
/// used for beacon timestamps.
fn iso_date(value: String) -> Option<String> {
    parse_datetime(&value)
        .map(|dt| to_iso(&dt))
        .or_else(|| normalize_timestamp(&Value::String(value)))
}

/// Add `stats.repeated_visitors = max(0, total_visitors - unique_visitors)`
/// when the result carries a `stats` object.
pub fn inject_repeated_visitors(data: &mut Value) {
    let Some(stats) = data.get_mut("stats").and_then(Value::as_object_mut) else {
        return;
    };

    let count = |key: &str| {
        stats
            .get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0)
    };
    let repeated = count("total_visitors")
        .saturating_sub(count("unique_visitors"))
        .max(0);

    stats.insert("repeated_visitors".to_string(), Value::from(repeated));
}

/// Run the filtered aggregation and return it with `repeated_visitors`
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQueryParams>,
) -> Result<Json<Value>, ApiError> {
    let filters = params.into_filters();

    let mut data = state
        .storage
        .filtered_analytics(&filters)
        .await
        .map_err(|e| {
            tracing::error!(filters = ?filters, "Failed to run analytics procedure");
            ApiError::from(e).logged("/api/analytics")
        })?;

    inject_repeated_visitors(&mut data);
    Ok(Json(data))
}
