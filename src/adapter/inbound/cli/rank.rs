//! `wheeldesk rank`: the merged universe and decision view, ranked.

use std::fmt::Display;

use anyhow::Context;
use serde_json::json;
use tabled::{Table, Tabled};

use super::command::RankArgs;
use super::output::{self, Output};
use super::session::Session;
use crate::domain::id::Mode;
use crate::domain::merged::MergedRecord;
use crate::domain::partition::PartitionKey;

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Verdict")]
    verdict: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Strike")]
    strike: String,
    #[tabled(rename = "Expiry")]
    expiry: String,
    #[tabled(rename = "Yield")]
    premium_yield: String,
    #[tabled(rename = "Capital")]
    capital: String,
    #[tabled(rename = "Src")]
    source: String,
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Where the record came from: universe, evaluated, selected.
fn source_flags(record: &MergedRecord) -> String {
    let mut flags = String::with_capacity(3);
    flags.push(if record.in_universe { 'U' } else { '.' });
    flags.push(if record.evaluated { 'E' } else { '.' });
    flags.push(if record.selected { 'S' } else { '.' });
    flags
}

impl RankRow {
    fn new(position: usize, record: &MergedRecord) -> Self {
        Self {
            position,
            symbol: record.symbol.to_string(),
            band: cell(record.band),
            score: cell(record.score.map(|s| format!("{s:.1}"))),
            verdict: cell(record.verdict.as_deref()),
            strategy: cell(record.strategy.as_deref()),
            strike: cell(record.strike),
            expiry: cell(record.expiration.as_deref()),
            premium_yield: cell(record.premium_yield.map(|y| format!("{:.2}%", y * 100.0))),
            capital: cell(record.capital_required.map(|c| c.round_dp(0))),
            source: source_flags(record),
        }
    }
}

/// Fetch the universe and decision partitions and print the ranking.
pub async fn execute(session: &Session, args: &RankArgs, out: Output) -> anyhow::Result<()> {
    let view = &session.config.view;
    let mode = args
        .mode
        .as_deref()
        .map_or_else(|| view.default_mode.clone(), Mode::new);
    let sort = args.sort(view.default_sort);

    let dashboard = &session.dashboard;
    let universe_key = PartitionKey::Universe;
    let decision_key = PartitionKey::Decision { mode: mode.clone() };
    let (universe, decision) = tokio::join!(
        dashboard.load(&universe_key),
        dashboard.load(&decision_key)
    );
    universe.context("failed to load universe")?;
    let decision = decision.context("failed to load latest decision")?;

    let mut records = dashboard.ranked_view(&mode, sort)?;
    if args.selected {
        records.retain(|record| record.selected);
    }
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if out.is_json() {
        out.document(&json!({
            "command": "rank",
            "mode": mode,
            "sort": sort,
            "decision": !decision.is_null(),
            "records": records,
        }))?;
        return Ok(());
    }

    out.title("rank");
    out.field("mode", &mode);
    out.field("sort", format!("{} ({:?})", sort.key, sort.order));
    if decision.is_null() {
        out.warn("no decision artifact for this mode yet; showing universe only");
    }

    if records.is_empty() {
        out.field("symbols", output::muted("none"));
        return Ok(());
    }

    out.section("Ranked candidates");
    let rows: Vec<_> = records
        .iter()
        .enumerate()
        .map(|(i, record)| RankRow::new(i + 1, record))
        .collect();
    out.block(&Table::new(rows).to_string());
    out.field("symbols", output::highlight(records.len()));
    Ok(())
}
