use crate::models::{AnalyticsFilters, StoredVisitor, VisitorRecord};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;

/// Number of rows returned per breakdown in the aggregation result
const BREAKDOWN_LIMIT: i64 = 10;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn stats(&self, filters: &AnalyticsFilters) -> StorageResult<Value> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*),
                   COUNT(DISTINCT COALESCE(public_ip, session_id)),
                   AVG(time_spent_seconds)
            FROM visitors
            "#,
        );
        push_filters(&mut qb, filters);

        let (total, unique, avg): (i64, i64, Option<f64>) = qb
            .build_query_as()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(json!({
            "total_visitors": total,
            "unique_visitors": unique,
            "avg_time_spent_seconds": avg,
        }))
    }

    /// Visitors per distinct value of `column`, largest first
    async fn breakdown(
        &self,
        column: &'static str,
        filters: &AnalyticsFilters,
    ) -> StorageResult<Vec<Value>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {column}, COUNT(*) AS visitors FROM visitors"
        ));
        push_filters(&mut qb, filters);
        qb.push(format!(
            " AND {column} IS NOT NULL GROUP BY {column} ORDER BY visitors DESC, {column} ASC LIMIT "
        ));
        qb.push_bind(BREAKDOWN_LIMIT);

        let rows: Vec<(String, i64)> = qb
            .build_query_as()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(label, visitors)| json!({ column: label, "visitors": visitors }))
            .collect())
    }

    async fn countries(&self, filters: &AnalyticsFilters) -> StorageResult<Vec<Value>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT country, country_code, COUNT(*) AS visitors FROM visitors",
        );
        push_filters(&mut qb, filters);
        qb.push(
            " AND (country IS NOT NULL OR country_code IS NOT NULL) \
             GROUP BY country, country_code ORDER BY visitors DESC LIMIT ",
        );
        qb.push_bind(BREAKDOWN_LIMIT);

        let rows: Vec<(Option<String>, Option<String>, i64)> = qb
            .build_query_as()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(country, country_code, visitors)| {
                json!({ "country": country, "country_code": country_code, "visitors": visitors })
            })
            .collect())
    }

    async fn daily(&self, filters: &AnalyticsFilters) -> StorageResult<Vec<Value>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT date(first_seen) AS day, COUNT(*) AS visitors FROM visitors",
        );
        push_filters(&mut qb, filters);
        qb.push(" AND date(first_seen) IS NOT NULL GROUP BY day ORDER BY day ASC");

        let rows: Vec<(String, i64)> = qb
            .build_query_as()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(date, visitors)| json!({ "date": date, "visitors": visitors }))
            .collect())
    }
}

/// Append `WHERE ...` for every filter that is set. Always leaves the builder
/// ready for further `AND` clauses.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &AnalyticsFilters) {
    qb.push(" WHERE 1 = 1");

    if let Some(country) = &filters.country_filter {
        qb.push(" AND (UPPER(country_code) = UPPER(")
            .push_bind(country.clone())
            .push(") OR LOWER(country) = LOWER(")
            .push_bind(country.clone())
            .push("))");
    }
    if let Some(start) = &filters.start_date_filter {
        qb.push(" AND julianday(first_seen) >= julianday(")
            .push_bind(start.clone())
            .push(")");
    }
    if let Some(end) = &filters.end_date_filter {
        qb.push(" AND julianday(first_seen) <= julianday(")
            .push_bind(end.clone())
            .push(")");
    }
    if let Some(visitor_type) = &filters.visitor_type_filter {
        let having = match visitor_type.to_ascii_lowercase().as_str() {
            "new" => Some("= 1"),
            "returning" => Some("> 1"),
            _ => None,
        };
        if let Some(having) = having {
            qb.push(format!(
                " AND COALESCE(public_ip, session_id) IN (\
                 SELECT COALESCE(public_ip, session_id) FROM visitors \
                 GROUP BY COALESCE(public_ip, session_id) HAVING COUNT(*) {having})"
            ));
        }
    }
    if let Some(device) = &filters.device_filter {
        qb.push(" AND LOWER(device_type) = LOWER(")
            .push_bind(device.clone())
            .push(")");
    }
    if let Some(url) = &filters.url_filter {
        qb.push(" AND page_visited LIKE '%' || ")
            .push_bind(url.clone())
            .push(" || '%'");
    }
    if let Some(browser) = &filters.browser_filter {
        qb.push(" AND LOWER(browser) = LOWER(")
            .push_bind(browser.clone())
            .push(")");
    }
    if let Some(ip) = &filters.ip_filter {
        qb.push(" AND public_ip = ").push_bind(ip.clone());
    }
    if let Some(isp) = &filters.isp_filter {
        qb.push(" AND isp LIKE '%' || ")
            .push_bind(isp.clone())
            .push(" || '%'");
    }
    if let Some(region) = &filters.region_filter {
        qb.push(" AND LOWER(region) = LOWER(")
            .push_bind(region.clone())
            .push(")");
    }
}

fn now_secs() -> Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
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
                time_spent_seconds INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visitors_first_seen ON visitors(first_seen)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visitors_public_ip ON visitors(public_ip)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn upsert_visitor(&self, record: &VisitorRecord) -> StorageResult<()> {
        let now = now_secs()?;

        sqlx::query(
            r#"
            INSERT INTO visitors (
                session_id, public_ip, country, country_code, region, city, isp,
                page_visited, user_agent, device_type, browser, operating_system,
                first_seen, time_spent_seconds, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                public_ip = COALESCE(excluded.public_ip, visitors.public_ip),
                country = COALESCE(excluded.country, visitors.country),
                country_code = COALESCE(excluded.country_code, visitors.country_code),
                region = COALESCE(excluded.region, visitors.region),
                city = COALESCE(excluded.city, visitors.city),
                isp = COALESCE(excluded.isp, visitors.isp),
                page_visited = COALESCE(excluded.page_visited, visitors.page_visited),
                user_agent = COALESCE(excluded.user_agent, visitors.user_agent),
                device_type = COALESCE(excluded.device_type, visitors.device_type),
                browser = COALESCE(excluded.browser, visitors.browser),
                operating_system = COALESCE(excluded.operating_system, visitors.operating_system),
                first_seen = COALESCE(excluded.first_seen, visitors.first_seen),
                time_spent_seconds = COALESCE(excluded.time_spent_seconds, visitors.time_spent_seconds),
                updated_at = excluded.updated_at
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
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn update_time_spent(&self, session_id: &str, seconds: i64) -> StorageResult<bool> {
        let now = now_secs()?;

        let result = sqlx::query(
            r#"
            UPDATE visitors
            SET time_spent_seconds = ?, updated_at = ?
            WHERE session_id = ?
            "#,
        )
        .bind(seconds)
        .bind(now)
        .bind(session_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn filtered_analytics(&self, filters: &AnalyticsFilters) -> StorageResult<Value> {
        Ok(json!({
            "stats": self.stats(filters).await?,
            "countries": self.countries(filters).await?,
            "devices": self.breakdown("device_type", filters).await?,
            "browsers": self.breakdown("browser", filters).await?,
            "operating_systems": self.breakdown("operating_system", filters).await?,
            "pages": self.breakdown("page_visited", filters).await?,
            "daily": self.daily(filters).await?,
        }))
    }

    async fn list_visitors(&self, limit: i64) -> StorageResult<Vec<StoredVisitor>> {
        let visitors = sqlx::query_as::<_, StoredVisitor>(
            r#"
            SELECT session_id, public_ip, country, country_code, region, city, isp,
                   page_visited, user_agent, device_type, browser, operating_system,
                   first_seen, time_spent_seconds
            FROM visitors
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visitors)
    }
}
