use std::time::Instant;

use anyhow::Context;
use serde_json::json;

use crate::adapter::inbound::cli::output::Output;
use crate::adapter::inbound::cli::session::Session;
use crate::domain::partition::PartitionKey;

/// Fetch the health partition once and report the round trip.
pub async fn execute_connection(session: &Session, out: Output) -> anyhow::Result<()> {
    out.title("check connection");
    out.field("base url", &session.config.gateway.base_url);

    let key = PartitionKey::SystemHealth;
    let started = Instant::now();
    let health = session
        .dashboard
        .load(&key)
        .await
        .context("dashboard server did not answer")?;
    let elapsed = started.elapsed();
    let status = health.get("status").and_then(|s| s.as_str());

    if out.is_json() {
        out.document(&json!({
            "command": "check-connection",
            "base_url": session.config.gateway.base_url,
            "latency_ms": u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "status": status,
        }))?;
        return Ok(());
    }

    out.field("latency", format!("{} ms", elapsed.as_millis()));
    if let Some(status) = status {
        out.field("server", status);
    }
    out.entry(&key, session.dashboard.store().status(&key));
    out.done("dashboard server reachable");
    Ok(())
}
