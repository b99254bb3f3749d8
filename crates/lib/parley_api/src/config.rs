//! API server configuration.

use std::time::Duration;

use parley_core::generation::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, GeminiConfig};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:5000").
    pub bind_addr: String,
    /// Upstream generation API settings.
    pub gemini: GeminiConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable              | Default                                      |
    /// |-----------------------|----------------------------------------------|
    /// | `HOST`                | `0.0.0.0`                                    |
    /// | `PORT`                | `5000`                                       |
    /// | `GEMINI_API_KEY`      | unset (chat requests fail with a config error) |
    /// | `GEMINI_MODEL`        | `gemini-2.0-flash`                           |
    /// | `GEMINI_BASE_URL`     | `https://generativelanguage.googleapis.com`  |
    /// | `GEMINI_TIMEOUT_SECS` | `30`                                         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("PORT").unwrap_or_else(|_| "5000".into());
        Self {
            bind_addr: format!("{host}:{port}"),
            gemini: GeminiConfig {
                api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
                model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
                base_url: std::env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
                timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_TIMEOUT),
            },
        }
    }
}
