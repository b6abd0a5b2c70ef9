use axum::{
    body::Bytes,
    extract::{MatchedPath, Query, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use crate::models::{StoredVisitor, VisitorEvent};
use crate::normalize::{coerce_duration, normalize_event, required_session_id};
use crate::storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_logged: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTimeRequest {
    #[serde(default, deserialize_with = "crate::models::visitor::lenient_string")]
    pub session_id: Option<String>,
    pub time_spent_seconds: Option<Value>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct VisitorsResponse {
    pub visitors: Vec<StoredVisitor>,
    pub total: usize,
}

/// Parse a JSON request body regardless of the declared content type.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("Missing JSON body".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

/// Record a visitor beacon (upsert keyed by session)
pub async fn track(
    State(state): State<Arc<AppState>>,
    path: MatchedPath,
    body: Bytes,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    async {
        let event: VisitorEvent = parse_body(&body)?;
        let record = normalize_event(&event)?;
        debug!(
            session_id = %record.session_id,
            device_type = %record.device_type,
            "Upserting visitor"
        );
        state.storage.upsert_visitor(&record).await?;
        Ok::<_, ApiError>(())
    }
    .await
    .map_err(|e| e.logged(path.as_str()))?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            time_logged: None,
        }),
    ))
}

/// Record time spent on the page for an existing session
pub async fn log_time(
    State(state): State<Arc<AppState>>,
    path: MatchedPath,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let seconds = async {
        let request: LogTimeRequest = parse_body(&body)?;
        let session_id = required_session_id(request.session_id.as_deref())?;
        let seconds = match &request.time_spent_seconds {
            None | Some(Value::Null) => 0,
            Some(raw) => coerce_duration(raw)?,
        };

        let matched = state.storage.update_time_spent(&session_id, seconds).await?;
        if !matched {
            debug!(session_id = %session_id, "No visitor row to attach time to");
        }
        Ok::<_, ApiError>(seconds)
    }
    .await
    .map_err(|e| e.logged(path.as_str()))?;

    Ok(Json(SuccessResponse {
        success: true,
        time_logged: Some(seconds),
    }))
}

/// List stored visitors, newest first
pub async fn list_visitors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<VisitorsResponse>, ApiError> {
    let limit = query.limit.clamp(1, 1000);

    let visitors = state
        .storage
        .list_visitors(limit)
        .await
        .map_err(|e| ApiError::from(e).logged("/api/visitors"))?;

    let total = visitors.len();
    Ok(Json(VisitorsResponse { visitors, total }))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
