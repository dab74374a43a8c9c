//! Configuration for the mirror relay service.

use anyhow::{bail, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Default monday.com GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.monday.com/v2/";

/// API version pinned on every request.
pub const DEFAULT_API_VERSION: &str = "2024-01";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Relay service configuration.
///
/// Loaded once at start-up and shared read-only with every request.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// monday.com API token sent in the `Authorization` header.
    pub api_token: String,
    /// GraphQL endpoint URL.
    pub api_url: String,
    /// Value of the `API-Version` header.
    pub api_version: String,
    /// Timeout applied to each outbound API call.
    pub request_timeout: Duration,
    /// Maximum accepted webhook body size.
    pub max_body_bytes: usize,
}

impl Config {
    /// Create a configuration with defaults for everything but the token.
    #[must_use]
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            api_token: api_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `MONDAY_API_TOKEN` is required. Unparseable numeric values fall back
    /// to their defaults.
    pub fn from_env() -> Result<Self> {
        let Some(api_token) = env::var("MONDAY_API_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
        else {
            bail!("MONDAY_API_TOKEN must be set");
        };

        Ok(Self {
            port: env::var("MIRROR_RELAY_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            api_token,
            api_url: env::var("MONDAY_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_version: env::var("MONDAY_API_VERSION")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            request_timeout: Duration::from_secs(
                env::var("MONDAY_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_body_bytes: env::var("MIRROR_RELAY_MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        })
    }

    /// Point the client at a different endpoint (mock servers, proxies).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
