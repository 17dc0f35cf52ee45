//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with environment variable overrides
//! for sensitive values like `WHEELDESK_API_KEY`.
//!
//! # Example
//!
//! ```no_run
//! use wheeldesk::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::gateway::{GatewayConfig, API_KEY_ENV};
use super::logging::LoggingConfig;
use crate::application::cache::store::DEFAULT_EVENT_CAPACITY;
use crate::application::view::rank::SortKey;
use crate::domain::id::Mode;
use crate::error::{ConfigError, Result};

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Capacity of the cache event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

/// Defaults for the merged/ranked view.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// Evaluation mode whose decision artifact is merged by default.
    #[serde(default = "default_mode")]
    pub default_mode: Mode,

    /// Sort key used when none is given.
    #[serde(default)]
    pub default_sort: SortKey,
}

fn default_mode() -> Mode {
    Mode::new("balanced")
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            default_sort: SortKey::default(),
        }
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Dashboard server connection.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Partition cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Merged view defaults.
    #[serde(default)]
    pub view: ViewConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Loads the API key from the `WHEELDESK_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Never from the config file.
        config.gateway.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize logging from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "base_url" }.into());
        }
        let url = url::Url::parse(&self.gateway.base_url).map_err(|e| {
            ConfigError::InvalidValue {
                field: "base_url",
                reason: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }
            .into());
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if matches!(&self.gateway.auth_header, Some(h) if h.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "auth_header",
                reason: "must not be empty when set".to_string(),
            }
            .into());
        }
        if self.cache.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.view.default_mode.as_str().trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "default_mode",
            }
            .into());
        }
        Ok(())
    }
}
