use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::storage::StorageError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Normalize(NormalizeError::MissingField(_)) => StatusCode::BAD_REQUEST,
            ApiError::Normalize(NormalizeError::InvalidDuration(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the failure against the route that produced it.
    pub fn logged(self, route: &str) -> Self {
        if self.status().is_server_error() {
            tracing::error!(route, error = %self, "Request failed");
        } else {
            tracing::warn!(route, error = %self, "Rejected request");
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(NormalizeError::MissingField("sessionId")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(NormalizeError::InvalidDuration("\"x\"".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let storage = StorageError::Http {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(
            ApiError::from(storage).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_error_text() {
        let err = ApiError::from(NormalizeError::MissingField("sessionId"));
        assert_eq!(err.to_string(), "Missing sessionId");
    }
}
