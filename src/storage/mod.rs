pub mod postgres;
pub mod rest;
pub mod sqlite;
pub mod trait_def;

pub use postgres::PostgresStorage;
pub use rest::RestStorage;
pub use sqlite::SqliteStorage;
pub use trait_def::{Storage, StorageError, StorageResult};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

/// Build the configured backend. Schema initialization is left to the caller.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::Rest => {
            let endpoint = config
                .rest_url
                .as_deref()
                .context("SUPABASE_URL must be set when STORAGE_BACKEND=rest")?;
            let api_key = config
                .rest_key
                .as_deref()
                .context("SUPABASE_KEY must be set when STORAGE_BACKEND=rest")?;
            info!("Using hosted REST storage: {}", endpoint);
            Arc::new(RestStorage::new(
                endpoint,
                api_key,
                &config.table,
                &config.procedure,
            )?)
        }
        StorageBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database_url);
            Arc::new(SqliteStorage::new(&config.database_url, config.max_connections).await?)
        }
        StorageBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database_url);
            Arc::new(PostgresStorage::new(&config.database_url, config.max_connections).await?)
        }
    };

    Ok(storage)
}
