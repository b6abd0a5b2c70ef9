//! Integration tests for the SQL storage backends
//!
//! Tests can be filtered by database backend using the DATABASE_BACKEND environment variable:
//! - `DATABASE_BACKEND=sqlite cargo test` - Run only SQLite tests
//! - `DATABASE_BACKEND=postgres cargo test` - Run only PostgreSQL tests
//! - By default, both backends are tested; PostgreSQL also needs DATABASE_URL

use beacon::models::{AnalyticsFilters, DeviceType, VisitorRecord};
use beacon::storage::{PostgresStorage, SqliteStorage, Storage};
use std::sync::Arc;

/// Get the database backend to test from environment variable
fn should_test_backend(backend: &str) -> bool {
    match std::env::var("DATABASE_BACKEND") {
        Ok(val) => val.to_lowercase() == backend.to_lowercase(),
        Err(_) => true,
    }
}

/// Helper to create SQLite test storage
async fn create_sqlite_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Helper to create PostgreSQL test storage
async fn create_postgres_storage() -> Option<Arc<dyn Storage>> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    let storage = PostgresStorage::new(&db_url, 5).await.ok()?;
    storage.init().await.ok()?;
    Some(Arc::new(storage))
}

/// Session ids unique per run so repeated Postgres runs do not collide
fn unique_session(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

fn record(session_id: &str) -> VisitorRecord {
    VisitorRecord {
        session_id: session_id.to_string(),
        public_ip: None,
        country: None,
        country_code: None,
        region: None,
        city: None,
        isp: None,
        page_visited: None,
        user_agent: None,
        device_type: DeviceType::Desktop,
        browser: "Other".to_string(),
        operating_system: "Other".to_string(),
        first_seen: None,
        time_spent_seconds: None,
    }
}

async fn check_upsert_merges(storage: Arc<dyn Storage>) {
    let session = unique_session("merge");

    let mut first = record(&session);
    first.public_ip = Some("203.0.113.50".to_string());
    first.country = Some("Canada".to_string());
    first.country_code = Some("CA".to_string());
    first.first_seen = Some("2024-02-01T08:30:00Z".to_string());
    storage.upsert_visitor(&first).await.unwrap();

    let mut second = record(&session);
    second.city = Some("Toronto".to_string());
    second.device_type = DeviceType::Tablet;
    storage.upsert_visitor(&second).await.unwrap();

    let visitors = storage.list_visitors(50).await.unwrap();
    let rows: Vec<_> = visitors.iter().filter(|v| v.session_id == session).collect();
    assert_eq!(rows.len(), 1);

    let row = rows[0];
    assert_eq!(row.public_ip.as_deref(), Some("203.0.113.50"));
    assert_eq!(row.country_code.as_deref(), Some("CA"));
    assert_eq!(row.city.as_deref(), Some("Toronto"));
    assert_eq!(row.device_type.as_deref(), Some("Tablet"));
    assert!(row.first_seen.as_deref().unwrap().starts_with("2024-02-01"));
}

async fn check_time_spent_update(storage: Arc<dyn Storage>) {
    let session = unique_session("timed");
    storage.upsert_visitor(&record(&session)).await.unwrap();

    assert!(storage.update_time_spent(&session, 120).await.unwrap());
    assert!(!storage
        .update_time_spent(&unique_session("missing"), 5)
        .await
        .unwrap());

    // A later beacon without a duration keeps the stored one
    storage.upsert_visitor(&record(&session)).await.unwrap();

    let visitors = storage.list_visitors(50).await.unwrap();
    let row = visitors.iter().find(|v| v.session_id == session).unwrap();
    assert_eq!(row.time_spent_seconds, Some(120));
}

#[tokio::test]
async fn test_upsert_merges_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_upsert_merges(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_time_spent_update_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_time_spent_update(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_upsert_merges_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };
    check_upsert_merges(storage).await;
}

#[tokio::test]
async fn test_time_spent_update_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };
    check_time_spent_update(storage).await;
}

#[tokio::test]
async fn test_list_visitors_newest_first_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    let storage = create_sqlite_storage().await;

    for id in ["one", "two", "three"] {
        storage.upsert_visitor(&record(id)).await.unwrap();
    }
    // Re-tracking keeps the original position
    storage.upsert_visitor(&record("one")).await.unwrap();

    let visitors = storage.list_visitors(10).await.unwrap();
    let ids: Vec<_> = visitors.iter().map(|v| v.session_id.as_str()).collect();
    assert_eq!(ids, vec!["three", "two", "one"]);

    let visitors = storage.list_visitors(1).await.unwrap();
    assert_eq!(visitors.len(), 1);
}

#[tokio::test]
async fn test_init_is_idempotent_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    storage.init().await.unwrap();

    storage.upsert_visitor(&record("after-init")).await.unwrap();
    assert_eq!(storage.list_visitors(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_filtered_analytics_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };

    let ip = format!("10.{}.0.1", std::process::id() % 250);
    for n in 0..2 {
        let mut r = record(&unique_session(&format!("pg-agg-{n}")));
        r.public_ip = Some(ip.clone());
        r.device_type = DeviceType::Mobile;
        storage.upsert_visitor(&r).await.unwrap();
    }

    let filters = AnalyticsFilters {
        ip_filter: Some(ip),
        ..Default::default()
    };
    let data = storage.filtered_analytics(&filters).await.unwrap();

    assert_eq!(data["stats"]["total_visitors"], 2);
    assert_eq!(data["stats"]["unique_visitors"], 1);
    assert_eq!(data["devices"][0]["device_type"], "Mobile");
}
