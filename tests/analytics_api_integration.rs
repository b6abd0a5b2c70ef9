//! Integration tests for analytics API endpoints
//!
//! Visitors are ingested through the tracking endpoint and read back through
//! `GET /api/analytics`, so the aggregation sees exactly what the normalizer
//! wrote.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use beacon::api::create_api_router;
use beacon::config::CorsConfig;
use beacon::storage::{SqliteStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_test_app(storage: Arc<dyn Storage>) -> Router {
    create_api_router(
        storage,
        &CorsConfig {
            allowed_origins: vec![],
        },
    )
}

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";

async fn track(app: &Router, payload: Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/track")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn get_analytics(app: &Router, query: &str) -> Value {
    let uri = if query.is_empty() {
        "/api/analytics".to_string()
    } else {
        format!("/api/analytics?{query}")
    };
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Three sessions from one address plus one from another
async fn seed(app: &Router) {
    for (session, page) in [("a-1", "/home"), ("a-2", "/pricing"), ("a-3", "/home")] {
        track(
            app,
            json!({
                "sessionId": session,
                "publicIp": "198.51.100.1",
                "country": "United States",
                "region": "California",
                "isp": "Example Fiber",
                "userAgent": DESKTOP_UA,
                "pageVisited": format!("https://example.com{page}"),
                "timestamp": "2024-01-10T12:00:00Z",
                "timeSpentSeconds": 30
            }),
        )
        .await;
    }
    track(
        app,
        json!({
            "sessionId": "b-1",
            "publicIp": "192.0.2.9",
            "countryCode": "JP",
            "region": "Tokyo",
            "userAgent": IPHONE_UA,
            "pageVisited": "https://example.com/home",
            "timestamp": 1_705_320_000_000_i64,
            "timeSpentSeconds": 90
        }),
    )
    .await;
}

#[tokio::test]
async fn test_analytics_includes_repeated_visitors() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage);
    seed(&app).await;

    let data = get_analytics(&app, "").await;
    let stats = &data["stats"];

    assert_eq!(stats["total_visitors"], 4);
    assert_eq!(stats["unique_visitors"], 2);
    assert_eq!(stats["repeated_visitors"], 2);
    assert_eq!(stats["avg_time_spent_seconds"].as_f64(), Some(45.0));
}

#[tokio::test]
async fn test_analytics_breakdowns() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage);
    seed(&app).await;

    let data = get_analytics(&app, "").await;

    let countries = data["countries"].as_array().unwrap();
    assert_eq!(countries[0]["country_code"], "US");
    assert_eq!(countries[0]["visitors"], 3);
    assert_eq!(countries[1]["country"], "Japan");

    let devices = data["devices"].as_array().unwrap();
    assert_eq!(devices[0], json!({"device_type": "Desktop", "visitors": 3}));
    assert_eq!(devices[1], json!({"device_type": "Mobile", "visitors": 1}));

    let daily = data["daily"].as_array().unwrap();
    assert_eq!(
        daily,
        &vec![
            json!({"date": "2024-01-10", "visitors": 3}),
            json!({"date": "2024-01-15", "visitors": 1}),
        ]
    );
}

#[tokio::test]
async fn test_analytics_filters() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage);
    seed(&app).await;

    let data = get_analytics(&app, "device_filter=Mobile").await;
    assert_eq!(data["stats"]["total_visitors"], 1);

    let data = get_analytics(&app, "country_filter=us").await;
    assert_eq!(data["stats"]["total_visitors"], 3);
    assert_eq!(data["stats"]["repeated_visitors"], 2);

    let data = get_analytics(&app, "url_filter=pricing").await;
    assert_eq!(data["stats"]["total_visitors"], 1);

    let data = get_analytics(&app, "region_filter=tokyo&isp_filter=").await;
    assert_eq!(data["stats"]["total_visitors"], 1);

    let data = get_analytics(&app, "start_date_filter=2024-01-12").await;
    assert_eq!(data["stats"]["total_visitors"], 1);

    let data = get_analytics(&app, "end_date_filter=2024-01-12&ip_filter=198.51.100.1").await;
    assert_eq!(data["stats"]["total_visitors"], 3);
}

#[tokio::test]
async fn test_visitor_type_filter() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage);
    seed(&app).await;

    let data = get_analytics(&app, "visitor_type_filter=returning").await;
    assert_eq!(data["stats"]["total_visitors"], 3);
    assert_eq!(data["stats"]["unique_visitors"], 1);

    let data = get_analytics(&app, "visitor_type_filter=new").await;
    assert_eq!(data["stats"]["total_visitors"], 1);
    assert_eq!(data["stats"]["repeated_visitors"], 0);
}

#[tokio::test]
async fn test_empty_store_and_unknown_params() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage);

    let data = get_analytics(&app, "utm_source=newsletter").await;

    assert_eq!(data["stats"]["total_visitors"], 0);
    assert_eq!(data["stats"]["repeated_visitors"], 0);
    assert!(data["stats"]["avg_time_spent_seconds"].is_null());
    assert_eq!(data["countries"], json!([]));
}
