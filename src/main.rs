use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use beacon::api;
use beacon::config::{Config, StorageBackend};
use beacon::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage = storage::connect(&config.storage).await?;
    info!("Initializing storage...");
    storage.init().await?;
    info!("Storage initialized successfully");

    if matches!(config.storage.backend, StorageBackend::Rest) {
        info!(
            "📊 Analytics served by procedure '{}' on table '{}'",
            config.storage.procedure, config.storage.table
        );
    }

    let app = api::create_api_router(Arc::clone(&storage), &config.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Beacon listening on http://{}", addr);
    info!("   - Tracking endpoint at http://{}/track", addr);
    info!("   - Dashboard available at http://{}/dashboard", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
