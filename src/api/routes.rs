use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::storage::Storage;

use super::analytics::get_analytics;
use super::handlers::{health_check, list_visitors, log_time, track, AppState};
use super::static_files::{dashboard, embed_script};

/// Beacon endpoints; the tracking script has used each of these names.
pub const TRACK_PATHS: &[&str] = &["/track", "/track-pageview", "/api/log", "/api/event"];

/// Duration endpoints
pub const TIME_PATHS: &[&str] = &["/log/time", "/track_duration"];

pub fn create_api_router(storage: Arc<dyn Storage>, cors: &CorsConfig) -> Router {
    let state = Arc::new(AppState { storage });

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(dashboard))
        .route("/embed.js", get(embed_script))
        .route("/api/analytics", get(get_analytics))
        .route("/api/visitors", get(list_visitors));

    for path in TRACK_PATHS {
        router = router.route(path, post(track));
    }
    for path in TIME_PATHS {
        router = router.route(path, post(log_time));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Preflight (`OPTIONS`) requests are answered here with an empty 200.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{origin}'");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
