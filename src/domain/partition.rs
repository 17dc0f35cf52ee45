//! The closed partition key space.
//!
//! Every independently-fetched slice of server state is addressed by a
//! [`PartitionKey`]: a partition name plus zero or more scalar parameters.
//! Keys compare structurally, so two keys built from the same tuple address
//! the same cache entry.
//!
//! [`KeyPattern`] selects a set of keys for invalidation. A pattern is either
//! fully bound ([`KeyPattern::Exact`]), bound only by partition name
//! ([`KeyPattern::Partition`]), or bound by partition name and symbol with the
//! remaining parameters left open ([`KeyPattern::Symbol`]).
//!
//! # Examples
//!
//! ```
//! use wheeldesk::domain::id::{Mode, Symbol, RunId};
//! use wheeldesk::domain::partition::{KeyPattern, PartitionKey, PartitionName};
//!
//! let balanced = PartitionKey::Decision { mode: Mode::new("balanced") };
//! assert!(KeyPattern::Partition(PartitionName::Decision).matches(&balanced));
//!
//! let diagnostics = PartitionKey::SymbolDiagnostics {
//!     symbol: Symbol::new("spy"),
//!     run_id: Some(RunId::new("run-1")),
//! };
//! let pattern = KeyPattern::Symbol(PartitionName::SymbolDiagnostics, Symbol::new("SPY"));
//! assert!(pattern.matches(&diagnostics));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{AccountId, Mode, RunId, Symbol};
use super::path::ApiPath;

/// Names of every partition the read layer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartitionName {
    /// Latest decision artifact for one evaluation mode.
    Decision,
    /// Full symbol universe catalog.
    Universe,
    /// Per-symbol diagnostics, optionally pinned to a run.
    SymbolDiagnostics,
    /// Positions tracked by the server.
    TrackedPositions,
    /// Portfolio metrics for one account.
    PortfolioMetrics,
    /// Notification feed, bounded by a limit.
    Notifications,
    /// Active alerts.
    Alerts,
    /// Pipeline and data-source health.
    SystemHealth,
    /// Wheel strategy state (put/call cycle per symbol).
    WheelState,
}

impl PartitionName {
    /// Every partition name, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Decision,
        Self::Universe,
        Self::SymbolDiagnostics,
        Self::TrackedPositions,
        Self::PortfolioMetrics,
        Self::Notifications,
        Self::Alerts,
        Self::SystemHealth,
        Self::WheelState,
    ];

    /// Whether keys of this partition carry a symbol parameter.
    #[must_use]
    pub const fn is_symbol_scoped(self) -> bool {
        matches!(self, Self::SymbolDiagnostics)
    }

    /// Stable wire name of the partition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Universe => "universe",
            Self::SymbolDiagnostics => "symbolDiagnostics",
            Self::TrackedPositions => "trackedPositions",
            Self::PortfolioMetrics => "portfolioMetrics",
            Self::Notifications => "notifications",
            Self::Alerts => "alerts",
            Self::SystemHealth => "systemHealth",
            Self::WheelState => "wheelState",
        }
    }
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite cache key: partition name plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "partition", rename_all = "camelCase")]
pub enum PartitionKey {
    Decision {
        mode: Mode,
    },
    Universe,
    SymbolDiagnostics {
        symbol: Symbol,
        run_id: Option<RunId>,
    },
    TrackedPositions,
    PortfolioMetrics {
        account_id: AccountId,
    },
    Notifications {
        limit: u32,
    },
    Alerts,
    SystemHealth,
    WheelState,
}

impl PartitionKey {
    /// The partition this key belongs to.
    #[must_use]
    pub const fn name(&self) -> PartitionName {
        match self {
            Self::Decision { .. } => PartitionName::Decision,
            Self::Universe => PartitionName::Universe,
            Self::SymbolDiagnostics { .. } => PartitionName::SymbolDiagnostics,
            Self::TrackedPositions => PartitionName::TrackedPositions,
            Self::PortfolioMetrics { .. } => PartitionName::PortfolioMetrics,
            Self::Notifications { .. } => PartitionName::Notifications,
            Self::Alerts => PartitionName::Alerts,
            Self::SystemHealth => PartitionName::SystemHealth,
            Self::WheelState => PartitionName::WheelState,
        }
    }

    /// The symbol parameter, for symbol-scoped partitions.
    #[must_use]
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Self::SymbolDiagnostics { symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    /// Gateway path that reads this partition, parameters percent-encoded.
    #[must_use]
    pub fn path(&self) -> String {
        let path = match self {
            Self::Decision { mode } => ApiPath::new("/api/decision/latest").query("mode", mode),
            Self::Universe => ApiPath::new("/api/universe"),
            Self::SymbolDiagnostics { symbol, run_id } => {
                let path = ApiPath::new("/api/symbols")
                    .segment(symbol)
                    .literal("diagnostics");
                match run_id {
                    Some(run_id) => path.query("run_id", run_id),
                    None => path,
                }
            }
            Self::TrackedPositions => ApiPath::new("/api/positions"),
            Self::PortfolioMetrics { account_id } => ApiPath::new("/api/portfolio")
                .segment(account_id)
                .literal("metrics"),
            Self::Notifications { limit } => ApiPath::new("/api/notifications").query("limit", limit),
            Self::Alerts => ApiPath::new("/api/alerts"),
            Self::SystemHealth => ApiPath::new("/api/health"),
            Self::WheelState => ApiPath::new("/api/wheel"),
        };
        path.build()
    }

    /// Whether a 404 from the gateway means "nothing yet" rather than an error.
    ///
    /// Applies to "latest"-style endpoints, where the server answers 404 until
    /// the first run exists.
    #[must_use]
    pub const fn absent_on_not_found(&self) -> bool {
        matches!(self, Self::Decision { .. })
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decision { mode } => write!(f, "(decision, {mode})"),
            Self::SymbolDiagnostics { symbol, run_id } => match run_id {
                Some(run_id) => write!(f, "(symbolDiagnostics, {symbol}, {run_id})"),
                None => write!(f, "(symbolDiagnostics, {symbol}, -)"),
            },
            Self::PortfolioMetrics { account_id } => {
                write!(f, "(portfolioMetrics, {account_id})")
            }
            Self::Notifications { limit } => write!(f, "(notifications, {limit})"),
            other => write!(f, "({})", other.name()),
        }
    }
}

/// Selector over partition keys, used by invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    /// Exactly one key.
    Exact(PartitionKey),
    /// Every key of a partition, regardless of parameters.
    Partition(PartitionName),
    /// Every key of a partition carrying the given symbol.
    Symbol(PartitionName, Symbol),
}

impl KeyPattern {
    /// Whether `key` is selected by this pattern.
    #[must_use]
    pub fn matches(&self, key: &PartitionKey) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::Partition(name) => key.name() == *name,
            Self::Symbol(name, symbol) => key.name() == *name && key.symbol() == Some(symbol),
        }
    }
}

impl From<PartitionKey> for KeyPattern {
    fn from(key: PartitionKey) -> Self {
        Self::Exact(key)
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "{key}"),
            Self::Partition(name) => write!(f, "({name}, *)"),
            Self::Symbol(name, symbol) => write!(f, "({name}, {symbol}, *)"),
        }
    }
}
