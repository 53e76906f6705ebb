use std::time::Duration;

use intervue_core::retry::{
    RetryPolicy, DEFAULT_FACTOR, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Backoff policy for quota store queries.
    pub retry: RetryPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `RETRY_MAX_ATTEMPTS`     | `3`                     |
    /// | `RETRY_INITIAL_DELAY_MS` | `300`                   |
    /// | `RETRY_MAX_DELAY_MS`     | `3000`                  |
    /// | `RETRY_FACTOR`           | `2.0`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_retries: u32 = std::env::var("RETRY_MAX_ATTEMPTS")
            .map(|v| v.parse().expect("RETRY_MAX_ATTEMPTS must be a valid u32"))
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let initial_delay = std::env::var("RETRY_INITIAL_DELAY_MS")
            .map(|v| {
                Duration::from_millis(v.parse().expect("RETRY_INITIAL_DELAY_MS must be a valid u64"))
            })
            .unwrap_or(DEFAULT_INITIAL_DELAY);

        let max_delay = std::env::var("RETRY_MAX_DELAY_MS")
            .map(|v| {
                Duration::from_millis(v.parse().expect("RETRY_MAX_DELAY_MS must be a valid u64"))
            })
            .unwrap_or(DEFAULT_MAX_DELAY);

        let factor: f64 = std::env::var("RETRY_FACTOR")
            .map(|v| v.parse().expect("RETRY_FACTOR must be a number"))
            .unwrap_or(DEFAULT_FACTOR);

        let retry = RetryPolicy {
            max_retries,
            initial_delay,
            max_delay,
            factor,
            on_retry: None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            retry,
        }
    }
}
