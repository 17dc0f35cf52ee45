use thiserror::Error;

use crate::domain::mutation::MutationKind;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors returned by the fetch gateway.
///
/// Cloneable so a single coalesced fetch can hand the same failure to every
/// waiter and keep a copy on the cache entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Gateway unreachable, timed out, or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The fetch task ended without producing a result.
    #[error("fetch aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// True for an HTTP 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A mutation fired with no invalidation table entry.
    #[error("no invalidation entry for mutation '{mutation}'")]
    InvalidationTableGap { mutation: MutationKind },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
