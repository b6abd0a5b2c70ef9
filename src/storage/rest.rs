//! Hosted backend speaking the PostgREST dialect (as exposed by Supabase)
//!
//! Tables live under `{base}/rest/v1/{table}` and stored procedures under
//! `{base}/rest/v1/rpc/{name}`. Every request carries the access key both as
//! `apikey` and as a bearer token.

use crate::models::{AnalyticsFilters, StoredVisitor, VisitorRecord};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, Url};
use serde_json::Value;

pub struct RestStorage {
    client: Client,
    base_url: Url,
    table: String,
    procedure: String,
}

impl RestStorage {
    pub fn new(endpoint: &str, api_key: &str, table: &str, procedure: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).context("storage access key is not a valid header value")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .context("storage access key is not a valid header value")?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        let base = format!("{}/rest/v1/", endpoint.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).with_context(|| format!("invalid storage endpoint URL: {endpoint}"))?;

        Ok(Self {
            client,
            base_url,
            table: table.to_string(),
            procedure: procedure.to_string(),
        })
    }

    fn table_url(&self) -> StorageResult<Url> {
        self.base_url
            .join(&self.table)
            .map_err(|e| StorageError::Other(e.into()))
    }
}

/// Turn a non-2xx response into [`StorageError::Http`] carrying the body.
async fn check(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Storage for RestStorage {
    async fn init(&self) -> Result<()> {
        tracing::debug!(
            "Hosted storage at {} needs no local initialization",
            self.base_url
        );
        Ok(())
    }

    async fn upsert_visitor(&self, record: &VisitorRecord) -> StorageResult<()> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("on_conflict", "session_id");

        let response = self
            .client
            .post(url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await?;
        check(response).await?;

        Ok(())
    }

    async fn update_time_spent(&self, session_id: &str, seconds: i64) -> StorageResult<bool> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("session_id", &format!("eq.{session_id}"));

        let response = self
            .client
            .patch(url)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "time_spent_seconds": seconds }))
            .send()
            .await?;
        check(response).await?;

        Ok(true)
    }

    async fn filtered_analytics(&self, filters: &AnalyticsFilters) -> StorageResult<Value> {
        let url = self
            .base_url
            .join(&format!("rpc/{}", self.procedure))
            .map_err(|e| StorageError::Other(e.into()))?;

        let response = self.client.post(url).json(filters).send().await?;
        let body = check(response).await?.text().await?;

        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| StorageError::Other(anyhow::Error::new(e).context("invalid procedure result")))?;

        Ok(match data {
            Value::Null => Value::Object(Default::default()),
            other => other,
        })
    }

    async fn list_visitors(&self, limit: i64) -> StorageResult<Vec<StoredVisitor>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc")
            .append_pair("limit", &limit.to_string());

        let response = self.client.get(url).send().await?;
        let visitors = check(response).await?.json::<Vec<StoredVisitor>>().await?;

        Ok(visitors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        assert!(RestStorage::new("not a url", "key", "visitors", "proc").is_err());
    }

    #[test]
    fn test_table_url() {
        let storage =
            RestStorage::new("https://example.supabase.co/", "key", "visitors", "proc").unwrap();
        assert_eq!(
            storage.table_url().unwrap().as_str(),
            "https://example.supabase.co/rest/v1/visitors"
        );
    }
}
