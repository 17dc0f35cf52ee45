//! Command-line interface definitions.
//!
//! Defines the CLI structure for the wheeldesk binary using `clap`: a ranked
//! view of the candidate universe, the mutation catalogue, and configuration
//! checks.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::application::view::rank::{Sort, SortKey, SortOrder};
use crate::domain::id::{AccountId, Mode, Symbol};
use crate::domain::mutation::Mutation;

/// Trading dashboard read layer
#[derive(Parser, Debug)]
#[command(name = "wheeldesk")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the merged universe and decision, ranked
    Rank(RankArgs),

    /// Send a mutation and report what it invalidated
    #[command(subcommand)]
    Mutate(MutateCommand),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Arguments for `wheeldesk rank`.
#[derive(Parser, Debug)]
pub struct RankArgs {
    /// Evaluation mode [default: from config]
    #[arg(long)]
    pub mode: Option<String>,

    /// Sort key [default: from config]
    #[arg(long, value_parser = parse_sort_key)]
    pub sort: Option<SortKey>,

    /// Sort direction [default: best first]
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only symbols selected by the latest decision
    #[arg(long)]
    pub selected: bool,
}

impl RankArgs {
    /// Resolve the sort, falling back to `default_key` and its natural order.
    #[must_use]
    pub fn sort(&self, default_key: SortKey) -> Sort {
        let key = self.sort.unwrap_or(default_key);
        let order = self.order.map_or_else(|| key.default_order(), SortOrder::from);
        Sort::new(key, order)
    }
}

/// Sort direction flag.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => Self::Ascending,
            OrderArg::Desc => Self::Descending,
        }
    }
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    s.replace('-', "_").parse()
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Subcommands for `wheeldesk mutate`.
#[derive(Subcommand, Debug)]
pub enum MutateCommand {
    /// Run the decision pipeline for a mode
    RunEvaluation {
        #[arg(long, default_value = "balanced")]
        mode: String,
    },
    /// Recompute diagnostics for one symbol
    RecomputeDiagnostics { symbol: String },
    /// Rebuild the universe catalog
    RefreshUniverse,
    /// Record a new position
    OpenPosition {
        symbol: String,
        /// Position fields as a JSON object
        #[arg(long, value_parser = parse_json, default_value = "{}")]
        details: Value,
    },
    /// Close a tracked position
    ClosePosition {
        position_id: String,
        #[arg(long)]
        symbol: String,
    },
    /// Edit a tracked position
    UpdatePosition {
        position_id: String,
        #[arg(long)]
        symbol: String,
        /// Fields to change as a JSON object
        #[arg(long, value_parser = parse_json)]
        details: Value,
    },
    /// Pull fresh balances for an account
    SyncPortfolio { account_id: String },
    /// Move a symbol to the next wheel stage
    AdvanceWheel { symbol: String },
    /// Acknowledge an alert
    AckAlert { alert_id: String },
    /// Mark one notification read
    MarkRead { notification_id: String },
    /// Mark every notification read
    MarkAllRead,
}

impl MutateCommand {
    /// The mutation this command sends.
    #[must_use]
    pub fn to_mutation(&self) -> Mutation {
        match self {
            Self::RunEvaluation { mode } => Mutation::RunEvaluation {
                mode: Mode::new(mode.as_str()),
            },
            Self::RecomputeDiagnostics { symbol } => Mutation::RecomputeSymbolDiagnostics {
                symbol: Symbol::new(symbol),
            },
            Self::RefreshUniverse => Mutation::RefreshUniverse,
            Self::OpenPosition { symbol, details } => Mutation::OpenPosition {
                symbol: Symbol::new(symbol),
                details: details.clone(),
            },
            Self::ClosePosition {
                position_id,
                symbol,
            } => Mutation::ClosePosition {
                position_id: position_id.clone(),
                symbol: Symbol::new(symbol),
            },
            Self::UpdatePosition {
                position_id,
                symbol,
                details,
            } => Mutation::UpdatePosition {
                position_id: position_id.clone(),
                symbol: Symbol::new(symbol),
                details: details.clone(),
            },
            Self::SyncPortfolio { account_id } => Mutation::SyncPortfolio {
                account_id: AccountId::new(account_id.as_str()),
            },
            Self::AdvanceWheel { symbol } => Mutation::AdvanceWheel {
                symbol: Symbol::new(symbol),
            },
            Self::AckAlert { alert_id } => Mutation::AcknowledgeAlert {
                alert_id: alert_id.clone(),
            },
            Self::MarkRead { notification_id } => Mutation::MarkNotificationRead {
                notification_id: notification_id.clone(),
            },
            Self::MarkAllRead => Mutation::MarkAllNotificationsRead,
        }
    }
}

/// Subcommands for `wheeldesk check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file syntax and semantics
    Config,
    /// Check that the dashboard server answers its health endpoint
    Connection,
}
