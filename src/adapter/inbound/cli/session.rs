//! Per-invocation wiring: configuration, HTTP gateway and dashboard.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::adapter::outbound::http::HttpGateway;
use crate::application::dashboard::Dashboard;
use crate::infrastructure::config::settings::Config;

/// Everything a command handler needs.
pub struct Session {
    pub config: Config,
    pub dashboard: Dashboard,
}

impl Session {
    /// Load configuration from `path` and connect the dashboard to its gateway.
    ///
    /// Initializes logging as a side effect.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let config = Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        config.init_logging();
        Self::with_config(config)
    }

    /// Connect the dashboard for an already loaded configuration.
    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        let gateway = HttpGateway::new(&config.gateway).context("failed to build HTTP gateway")?;
        debug!(base_url = %gateway.base_url(), "gateway ready");
        let dashboard = Dashboard::new(Arc::new(gateway), config.cache.event_capacity);
        Ok(Self { config, dashboard })
    }
}
