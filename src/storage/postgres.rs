use crate::models::{AnalyticsFilters, StoredVisitor, VisitorRecord};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

/// Server-side aggregation invoked by `filtered_analytics`. Mirrors the
/// procedure a hosted deployment exposes over `/rpc/`.
const ANALYTICS_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION get_filtered_analytics_visual(
    country_filter TEXT DEFAULT NULL,
    start_date_filter TEXT DEFAULT NULL,
    end_date_filter TEXT DEFAULT NULL,
    visitor_type_filter TEXT DEFAULT NULL,
    device_filter TEXT DEFAULT NULL,
    url_filter TEXT DEFAULT NULL,
    browser_filter TEXT DEFAULT NULL,
    ip_filter TEXT DEFAULT NULL,
    isp_filter TEXT DEFAULT NULL,
    region_filter TEXT DEFAULT NULL
) RETURNS JSON
LANGUAGE SQL STABLE
AS $fn$
WITH visitor_sessions AS (
    SELECT COALESCE(public_ip, session_id) AS visitor_key, COUNT(*) AS sessions
    FROM visitors
    GROUP BY 1
),
f AS (
    SELECT v.*
    FROM visitors v
    JOIN visitor_sessions s ON s.visitor_key = COALESCE(v.public_ip, v.session_id)
    WHERE (country_filter IS NULL
           OR upper(v.country_code) = upper(country_filter)
           OR lower(v.country) = lower(country_filter))
      AND (start_date_filter IS NULL OR v.first_seen::timestamptz >= start_date_filter::timestamptz)
      AND (end_date_filter IS NULL OR v.first_seen::timestamptz <= end_date_filter::timestamptz)
      AND (visitor_type_filter IS NULL
           OR lower(visitor_type_filter) NOT IN ('new', 'returning')
           OR (lower(visitor_type_filter) = 'new' AND s.sessions = 1)
           OR (lower(visitor_type_filter) = 'returning' AND s.sessions > 1))
      AND (device_filter IS NULL OR lower(v.device_type) = lower(device_filter))
      AND (url_filter IS NULL OR v.page_visited ILIKE '%' || url_filter || '%')
      AND (browser_filter IS NULL OR lower(v.browser) = lower(browser_filter))
      AND (ip_filter IS NULL OR v.public_ip = ip_filter)
      AND (isp_filter IS NULL OR v.isp ILIKE '%' || isp_filter || '%')
      AND (region_filter IS NULL OR lower(v.region) = lower(region_filter))
)
SELECT json_build_object(
    'stats', (
        SELECT json_build_object(
            'total_visitors', COUNT(*),
            'unique_visitors', COUNT(DISTINCT COALESCE(public_ip, session_id)),
            'avg_time_spent_seconds', AVG(time_spent_seconds)::float8
        ) FROM f
    ),
    'countries', COALESCE((
        SELECT json_agg(c) FROM (
            SELECT country, country_code, COUNT(*) AS visitors FROM f
            WHERE country IS NOT NULL OR country_code IS NOT NULL
            GROUP BY country, country_code ORDER BY visitors DESC LIMIT 10
        ) c
    ), '[]'::json),
    'devices', COALESCE((
        SELECT json_agg(d) FROM (
            SELECT device_type, COUNT(*) AS visitors FROM f
            WHERE device_type IS NOT NULL
            GROUP BY device_type ORDER BY visitors DESC, device_type LIMIT 10
        ) d
    ), '[]'::json),
    'browsers', COALESCE((
        SELECT json_agg(b) FROM (
            SELECT browser, COUNT(*) AS visitors FROM f
            WHERE browser IS NOT NULL
            GROUP BY browser ORDER BY visitors DESC, browser LIMIT 10
        ) b
    ), '[]'::json),
    'operating_systems', COALESCE((
        SELECT json_agg(o) FROM (
            SELECT operating_system, COUNT(*) AS visitors FROM f
            WHERE operating_system IS NOT NULL
            GROUP BY operating_system ORDER BY visitors DESC, operating_system LIMIT 10
        ) o
    ), '[]'::json),
    'pages', COALESCE((
        SELECT json_agg(p) FROM (
            SELECT page_visited, COUNT(*) AS visitors FROM f
            WHERE page_visited IS NOT NULL
            GROUP BY page_visited ORDER BY visitors DESC, page_visited LIMIT 10
        ) p
    ), '[]'::json),
    'daily', COALESCE((
        SELECT json_agg(t) FROM (
            SELECT to_char(first_seen::timestamptz AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS date,
                   COUNT(*) AS visitors
            FROM f
            WHERE first_seen IS NOT NULL
            GROUP BY 1 ORDER BY 1
        ) t
    ), '[]'::json)
)
$fn$
"#;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitors (
                id BIGSERIAL PRIMARY KEY,
                session_id TEXT NOT NULL UNIQUE,
                public_ip TEXT,
                country TEXT,
                country_code TEXT,
                region TEXT,
                city TEXT,
                isp TEXT,
                page_visited TEXT,
                user_agent TEXT,
                device_type TEXT,
                browser TEXT,
                operating_system TEXT,
                first_seen TEXT,
                time_spent_seconds BIGINT,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visitors_public_ip ON visitors(public_ip)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(ANALYTICS_FUNCTION)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn upsert_visitor(&self, record: &VisitorRecord) -> StorageResult<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO visitors (
                session_id, public_ip, country, country_code, region, city, isp,
                page_visited, user_agent, device_type, browser, operating_system,
                first_seen, time_spent_seconds, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            ON CONFLICT (session_id) DO UPDATE SET
                public_ip = COALESCE(EXCLUDED.public_ip, visitors.public_ip),
                country = COALESCE(EXCLUDED.country, visitors.country),
                country_code = COALESCE(EXCLUDED.country_code, visitors.country_code),
                region = COALESCE(EXCLUDED.region, visitors.region),
                city = COALESCE(EXCLUDED.city, visitors.city),
                isp = COALESCE(EXCLUDED.isp, visitors.isp),
                page_visited = COALESCE(EXCLUDED.page_visited, visitors.page_visited),
                user_agent = COALESCE(EXCLUDED.user_agent, visitors.user_agent),
                device_type = COALESCE(EXCLUDED.device_type, visitors.device_type),
                browser = COALESCE(EXCLUDED.browser, visitors.browser),
                operating_system = COALESCE(EXCLUDED.operating_system, visitors.operating_system),
                first_seen = COALESCE(EXCLUDED.first_seen, visitors.first_seen),
                time_spent_seconds = COALESCE(EXCLUDED.time_spent_seconds, visitors.time_spent_seconds),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.public_ip)
        .bind(&record.country)
        .bind(&record.country_code)
        .bind(&record.region)
        .bind(&record.city)
        .bind(&record.isp)
        .bind(&record.page_visited)
        .bind(&record.user_agent)
        .bind(record.device_type.as_str())
        .bind(&record.browser)
        .bind(&record.operating_system)
        .bind(&record.first_seen)
        .bind(record.time_spent_seconds)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn update_time_spent(&self, session_id: &str, seconds: i64) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE visitors
            SET time_spent_seconds = $1, updated_at = $2
            WHERE session_id = $3
            "#,
        )
        .bind(seconds)
        .bind(chrono::Utc::now().timestamp())
        .bind(session_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn filtered_analytics(&self, filters: &AnalyticsFilters) -> StorageResult<Value> {
        let result = sqlx::query_scalar::<_, Option<Value>>(
            r#"
            SELECT get_filtered_analytics_visual(
                country_filter => $1,
                start_date_filter => $2,
                end_date_filter => $3,
                visitor_type_filter => $4,
                device_filter => $5,
                url_filter => $6,
                browser_filter => $7,
                ip_filter => $8,
                isp_filter => $9,
                region_filter => $10
            )
            "#,
        )
        .bind(&filters.country_filter)
        .bind(&filters.start_date_filter)
        .bind(&filters.end_date_filter)
        .bind(&filters.visitor_type_filter)
        .bind(&filters.device_filter)
        .bind(&filters.url_filter)
        .bind(&filters.browser_filter)
        .bind(&filters.ip_filter)
        .bind(&filters.isp_filter)
        .bind(&filters.region_filter)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(result.unwrap_or_else(|| Value::Object(Default::default())))
    }

    async fn list_visitors(&self, limit: i64) -> StorageResult<Vec<StoredVisitor>> {
        let visitors = sqlx::query_as::<_, StoredVisitor>(
            r#"
            SELECT session_id, public_ip, country, country_code, region, city, isp,
                   page_visited, user_agent, device_type, browser, operating_system,
                   first_seen, time_spent_seconds
            FROM visitors
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visitors)
    }
}
