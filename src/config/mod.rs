use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Hosted endpoint (REST backend)
    pub rest_url: Option<String>,
    /// Access key for the hosted endpoint
    #[serde(skip_serializing)]
    pub rest_key: Option<String>,
    /// sqlx connection URL (SQL backends)
    pub database_url: String,
    pub max_connections: u32,
    /// Table name on the hosted endpoint
    pub table: String,
    /// Aggregation procedure name on the hosted endpoint
    pub procedure: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Rest,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

impl StorageConfig {
    pub const DEFAULT_TABLE: &'static str = "visitors";
    pub const DEFAULT_PROCEDURE: &'static str = "get_filtered_analytics_visual";
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let rest_url = non_empty_var("SUPABASE_URL");
        let rest_key = non_empty_var("SUPABASE_KEY");

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "rest" | "supabase" => StorageBackend::Rest,
            "postgres" | "postgresql" => StorageBackend::Postgres,
            "sqlite" => StorageBackend::Sqlite,
            "" if rest_url.is_some() => StorageBackend::Rest,
            "" => StorageBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown STORAGE_BACKEND '{other}', falling back to 'sqlite'. Supported values: rest, postgres, sqlite"
                );
                StorageBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./beacon.db?mode=rwc".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let table = non_empty_var("VISITORS_TABLE")
            .unwrap_or_else(|| StorageConfig::DEFAULT_TABLE.to_string());
        let procedure = non_empty_var("ANALYTICS_PROCEDURE")
            .unwrap_or_else(|| StorageConfig::DEFAULT_PROCEDURE.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()?;

        let allowed_origins = parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        Ok(Config {
            storage: StorageConfig {
                backend,
                rest_url,
                rest_key,
                database_url,
                max_connections,
                table,
                procedure,
            },
            server: ServerConfig { host, port },
            cors: CorsConfig { allowed_origins },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `*` or an empty value allows any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}
