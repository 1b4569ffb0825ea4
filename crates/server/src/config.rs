//! Server configuration

use std::time::Duration;

/// Which document store backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: String,
    pub bind_address: String,
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let storage = match lookup("STORAGE_BACKEND").as_deref() {
            Some("memory") => StorageBackend::Memory,
            _ => StorageBackend::Postgres,
        };

        Self {
            storage,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "host=localhost user=postgres dbname=medrec".into()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            api_key: lookup("API_KEY").filter(|k| !k.is_empty()),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| parse_list(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or_else(|| vec!["*".to_string()]),
            rate_limit_rps: lookup("RATE_LIMIT_RPS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(100),
            request_timeout: Duration::from_secs(
                lookup("REQUEST_TIMEOUT_SECS")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
