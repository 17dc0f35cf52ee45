use std::path::Path;

use anyhow::Context;
use serde_json::json;

use crate::adapter::inbound::cli::output::Output;
use crate::infrastructure::config::gateway::API_KEY_ENV;
use crate::infrastructure::config::settings::Config;

/// Validate the configuration file without contacting the server.
pub fn execute_config(config_path: &Path, out: Output) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("invalid configuration in {}", config_path.display()))?;
    let gateway = &config.gateway;
    let missing_key = gateway.auth_header.is_some() && gateway.api_key.is_none();

    if out.is_json() {
        out.document(&json!({
            "command": "check-config",
            "path": config_path.display().to_string(),
            "base_url": gateway.base_url,
            "timeout_secs": gateway.timeout_secs,
            "default_mode": config.view.default_mode,
            "default_sort": config.view.default_sort,
            "auth_header": gateway.auth_header,
            "api_key_set": gateway.api_key.is_some(),
        }))?;
    }

    out.title("check config");
    out.field("file", config_path.display());
    out.field("base url", &gateway.base_url);
    out.field("timeout", format!("{}s", gateway.timeout_secs));
    out.field("mode", &config.view.default_mode);
    out.field("sort", config.view.default_sort);
    out.field("log level", &config.logging.level);

    out.field("auth", gateway.auth_header.as_deref().unwrap_or("disabled"));
    if missing_key {
        out.warn(&format!(
            "auth_header is set but {API_KEY_ENV} is missing; requests go out unauthenticated"
        ));
    }

    out.done("configuration is valid");
    Ok(())
}
