//! Integration tests for the hosted REST backend against a mock server

use beacon::models::{AnalyticsFilters, DeviceType, VisitorRecord};
use beacon::storage::{RestStorage, Storage, StorageError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-service-key";

fn storage_for(server: &MockServer) -> RestStorage {
    RestStorage::new(
        &server.uri(),
        KEY,
        "visitors",
        "get_filtered_analytics_visual",
    )
    .unwrap()
}

fn record() -> VisitorRecord {
    VisitorRecord {
        session_id: "rest-1".to_string(),
        public_ip: Some("203.0.113.7".to_string()),
        country: None,
        country_code: Some("NL".to_string()),
        region: None,
        city: None,
        isp: None,
        page_visited: None,
        user_agent: None,
        device_type: DeviceType::Desktop,
        browser: "Firefox".to_string(),
        operating_system: "Linux".to_string(),
        first_seen: None,
        time_spent_seconds: None,
    }
}

#[tokio::test]
async fn test_upsert_merges_on_session_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .and(query_param("on_conflict", "session_id"))
        .and(header("Prefer", "resolution=merge-duplicates,return=minimal"))
        .and(header("apikey", KEY))
        .and(header("Authorization", "Bearer test-service-key"))
        .and(body_json(json!({
            "session_id": "rest-1",
            "public_ip": "203.0.113.7",
            "country_code": "NL",
            "device_type": "Desktop",
            "browser": "Firefox",
            "operating_system": "Linux"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    storage_for(&server).upsert_visitor(&record()).await.unwrap();
}

#[tokio::test]
async fn test_update_time_spent_patches_matching_row() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/visitors"))
        .and(query_param("session_id", "eq.rest-1"))
        .and(body_json(json!({ "time_spent_seconds": 75 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let matched = storage_for(&server)
        .update_time_spent("rest-1", 75)
        .await
        .unwrap();
    assert!(matched);
}

#[tokio::test]
async fn test_filtered_analytics_calls_procedure() {
    let server = MockServer::start().await;

    let filters = AnalyticsFilters {
        device_filter: Some("Mobile".to_string()),
        ..Default::default()
    };
    let result = json!({
        "stats": { "total_visitors": 12, "unique_visitors": 9 },
        "countries": []
    });

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_filtered_analytics_visual"))
        .and(body_json(serde_json::to_value(&filters).unwrap()))
        .respond_with(ResponseTemplate::new(200).set_body_json(result.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let data = storage_for(&server)
        .filtered_analytics(&filters)
        .await
        .unwrap();
    assert_eq!(data, result);
}

#[tokio::test]
async fn test_null_procedure_result_is_empty_object() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_filtered_analytics_visual"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let data = storage_for(&server)
        .filtered_analytics(&AnalyticsFilters::default())
        .await
        .unwrap();
    assert_eq!(data, json!({}));
}

#[tokio::test]
async fn test_error_status_surfaces_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .respond_with(
            ResponseTemplate::new(409).set_body_string(r#"{"message":"duplicate key"}"#),
        )
        .mount(&server)
        .await;

    let err = storage_for(&server)
        .upsert_visitor(&record())
        .await
        .unwrap_err();

    match err {
        StorageError::Http { status, body } => {
            assert_eq!(status, 409);
            assert!(body.contains("duplicate key"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_visitors_newest_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visitors"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "session_id": "newer", "country_code": "NL", "id": 7 },
            { "session_id": "older", "time_spent_seconds": 12 }
        ])))
        .mount(&server)
        .await;

    let visitors = storage_for(&server).list_visitors(2).await.unwrap();

    assert_eq!(visitors.len(), 2);
    assert_eq!(visitors[0].session_id, "newer");
    assert_eq!(visitors[0].country_code.as_deref(), Some("NL"));
    assert_eq!(visitors[1].time_spent_seconds, Some(12));
}
