//! Configuration module for the explorer.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

const DEFAULT_MEASUREMENTS_URL: &str = "https://api.ooni.io";

/// Explorer configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// HTTP port for the web server (default: 3100)
    pub http_port: u16,
    /// Base URL of the measurements API, also used for raw measurement downloads
    pub measurements_url: String,
    /// Base URL of the aggregation API serving the app statistics
    pub api_url: String,
    /// Timeout applied to every outbound request (default: 30s)
    pub request_timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            http_port: 3100,
            measurements_url: DEFAULT_MEASUREMENTS_URL.to_string(),
            api_url: DEFAULT_MEASUREMENTS_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ExplorerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `EXPLORER_HTTP_PORT`: HTTP port (default: 3100)
    /// - `MEASUREMENTS_URL`: measurements API base URL (default: "https://api.ooni.io")
    /// - `EXPLORER_API_URL`: statistics API base URL (default: same as `MEASUREMENTS_URL`)
    /// - `EXPLORER_REQUEST_TIMEOUT_SECS`: outbound request timeout (default: 30)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port_str) = lookup("EXPLORER_HTTP_PORT") {
            match port_str.parse() {
                Ok(port) => cfg.http_port = port,
                Err(_) => tracing::warn!("Ignoring invalid EXPLORER_HTTP_PORT {:?}", port_str),
            }
        }

        if let Some(url) = lookup("MEASUREMENTS_URL") {
            cfg.measurements_url = trim_base_url(&url);
        }

        cfg.api_url = match lookup("EXPLORER_API_URL") {
            Some(url) => trim_base_url(&url),
            None => cfg.measurements_url.clone(),
        };

        if let Some(secs_str) = lookup("EXPLORER_REQUEST_TIMEOUT_SECS") {
            match secs_str.parse::<u64>() {
                Ok(secs) if secs > 0 => cfg.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring invalid EXPLORER_REQUEST_TIMEOUT_SECS {:?}",
                    secs_str
                ),
            }
        }

        cfg
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
