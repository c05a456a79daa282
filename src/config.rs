//! Application configuration loaded from environment variables.
//!
//! Built once at startup and passed by reference; nothing in the sync core
//! reads the environment.

use std::env;
use std::time::Duration;

const DEFAULT_DRY_RUN_SAMPLE_SIZE: usize = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Ryot ---
    /// GraphQL endpoint URL
    pub graphql_api_url: String,
    /// Static bearer token
    pub auth_token: String,

    // --- InfluxDB ---
    /// Base URL (e.g. http://localhost:8086)
    pub influxdb_url: String,
    /// API token
    pub influxdb_token: String,
    /// Organization name
    pub influxdb_org: String,
    /// Target bucket
    pub influxdb_bucket: String,

    // --- Behaviour ---
    /// Compute points without touching the store
    pub dry_run: bool,
    /// How many computed points a dry run keeps for display
    pub dry_run_sample_size: usize,
    /// Per-request timeout for both HTTP clients
    pub http_timeout: Duration,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            graphql_api_url: "http://localhost:8000/backend/graphql".to_string(),
            auth_token: "test_auth_token".to_string(),
            influxdb_url: "http://localhost:8086".to_string(),
            influxdb_token: "test_influx_token".to_string(),
            influxdb_org: "test-org".to_string(),
            influxdb_bucket: "fitness".to_string(),
            dry_run: false,
            dry_run_sample_size: DEFAULT_DRY_RUN_SAMPLE_SIZE,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            graphql_api_url: parse_url("GRAPHQL_API_URL", required("GRAPHQL_API_URL")?)?,
            auth_token: required("AUTH_TOKEN")?,
            influxdb_url: parse_url("INFLUXDB_URL", required("INFLUXDB_URL")?)?,
            influxdb_token: required("INFLUXDB_TOKEN")?,
            influxdb_org: required("INFLUXDB_ORG")?,
            influxdb_bucket: required("INFLUXDB_BUCKET")?,
            dry_run: match get("DRY_RUN") {
                Some(v) => parse_bool("DRY_RUN", &v)?,
                None => false,
            },
            dry_run_sample_size: match get("DRY_RUN_SAMPLE_SIZE") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::Invalid("DRY_RUN_SAMPLE_SIZE", v))?,
                None => DEFAULT_DRY_RUN_SAMPLE_SIZE,
            },
            http_timeout: match get("HTTP_TIMEOUT_SECS") {
                Some(v) => v
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::Invalid("HTTP_TIMEOUT_SECS", v))?,
                None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            },
        })
    }
}

fn parse_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    match reqwest::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(ConfigError::Invalid(key, value)),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key, value.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
