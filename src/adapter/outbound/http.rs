//! HTTP implementation of the fetch gateway.
//!
//! Resolves partition paths against a fixed base URL, attaches an optional
//! static auth header, and maps non-2xx responses to [`FetchError::Http`].
//! Retries are not attempted here or in the cache layer.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{ConfigError, FetchError, Result};
use crate::infrastructure::config::gateway::GatewayConfig;
use crate::port::outbound::gateway::FetchGateway;

/// Dashboard server client.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Build a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or auth header is invalid, or the
    /// HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Keep a trailing slash so joins append instead of replacing the last segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some((name, value)) = config.auth() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "auth_header",
                    reason: e.to_string(),
                }
            })?;
            let mut value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
                field: "WHEELDESK_API_KEY",
                reason: e.to_string(),
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(FetchError::from)?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a partition or mutation path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the joined URL is invalid.
    pub fn url(&self, path: &str) -> std::result::Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Network(format!("invalid path '{path}': {e}")))
    }

    async fn decode(response: Response) -> std::result::Result<Value, FetchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    async fn get(&self, path: &str) -> std::result::Result<Value, FetchError> {
        let url = self.url(path)?;
        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        let value = Self::decode(response).await;
        trace!(path, ok = value.is_ok(), "GET completed");
        value
    }

    async fn post(&self, path: &str, body: &Value) -> std::result::Result<Value, FetchError> {
        let url = self.url(path)?;
        debug!(url = %url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        let value = Self::decode(response).await;
        trace!(path, ok = value.is_ok(), "POST completed");
        value
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
