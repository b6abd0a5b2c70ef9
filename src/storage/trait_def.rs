use crate::models::{AnalyticsFilters, StoredVisitor, VisitorRecord};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Other(err.into())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Other(err.into())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, install the aggregation procedure)
    async fn init(&self) -> Result<()>;

    /// Insert a visitor row, or merge into the existing row with the same
    /// `session_id`. Absent fields never overwrite stored values.
    async fn upsert_visitor(&self, record: &VisitorRecord) -> StorageResult<()>;

    /// Set `time_spent_seconds` on the row for `session_id`.
    /// Returns whether a row matched, where the backend can tell.
    async fn update_time_spent(&self, session_id: &str, seconds: i64) -> StorageResult<bool>;

    /// Run the filtered aggregation procedure and return its JSON result
    async fn filtered_analytics(&self, filters: &AnalyticsFilters) -> StorageResult<Value>;

    /// List stored visitors, most recently inserted first
    async fn list_visitors(&self, limit: i64) -> StorageResult<Vec<StoredVisitor>>;
}
