//! `wheeldesk mutate`: send one mutation and report what it invalidated.

use serde_json::json;

use super::command::MutateCommand;
use super::output::{self, Output};
use super::session::Session;

/// Send the mutation and print the server response and invalidated keys.
pub async fn execute(session: &Session, command: &MutateCommand, out: Output) -> anyhow::Result<()> {
    let dashboard = &session.dashboard;
    let mutation = command.to_mutation();
    let patterns = dashboard.dispatcher().patterns(&mutation)?;
    let outcome = dashboard.mutate(&mutation).await?;

    if out.is_json() {
        out.document(&json!({
            "command": "mutate",
            "mutation": mutation.kind(),
            "response": outcome.response,
            "patterns": patterns.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "invalidated": outcome.invalidated,
            "refetches": outcome.refetches,
        }))?;
        return Ok(());
    }

    out.title("mutate");
    out.field("mutation", mutation.kind());
    out.done("server accepted the mutation");

    out.section("Invalidation patterns");
    for pattern in &patterns {
        out.field("pattern", pattern);
    }

    out.section("Cached entries");
    if outcome.invalidated.is_empty() {
        out.field("entries", output::muted("none cached"));
    }
    for key in &outcome.invalidated {
        out.entry(key, dashboard.store().status(key));
    }
    out.field("refetches", outcome.refetches);

    if out.is_verbose() {
        out.section("Response");
        out.block(&serde_json::to_string_pretty(&outcome.response)?);
    }
    Ok(())
}
