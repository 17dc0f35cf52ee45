//! Fetch gateway connection settings.

use std::time::Duration;

use serde::Deserialize;

/// Environment variable holding the static auth header value.
pub const API_KEY_ENV: &str = "WHEELDESK_API_KEY";

/// Gateway configuration.
///
/// The auth value is loaded from [`API_KEY_ENV`], never from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL every partition path is resolved against.
    pub base_url: String,

    /// Header name carrying the API key, e.g. `X-API-Key`.
    ///
    /// When unset no auth header is sent.
    #[serde(default)]
    pub auth_header: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// API key read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_timeout_secs() -> u64 {
    15
}

impl GatewayConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Header name and value to attach to every request, if configured.
    #[must_use]
    pub fn auth(&self) -> Option<(&str, &str)> {
        match (&self.auth_header, &self.api_key) {
            (Some(header), Some(key)) => Some((header.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            auth_header: None,
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}
