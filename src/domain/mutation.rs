//! Mutation catalogue.
//!
//! Every write the UI can issue is a [`Mutation`] variant. Its
//! [`MutationKind`] is the key into the invalidation table, and its params
//! bind symbol- or account-scoped invalidation patterns.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use super::id::{AccountId, Mode, Symbol};
use super::path::ApiPath;

/// Discriminant of a [`Mutation`], without params.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    RunEvaluation,
    RecomputeSymbolDiagnostics,
    RefreshUniverse,
    OpenPosition,
    ClosePosition,
    UpdatePosition,
    SyncPortfolio,
    AdvanceWheel,
    AcknowledgeAlert,
    MarkNotificationRead,
    MarkAllNotificationsRead,
}

impl MutationKind {
    /// Every mutation kind the read layer defines.
    pub const ALL: [Self; 11] = [
        Self::RunEvaluation,
        Self::RecomputeSymbolDiagnostics,
        Self::RefreshUniverse,
        Self::OpenPosition,
        Self::ClosePosition,
        Self::UpdatePosition,
        Self::SyncPortfolio,
        Self::AdvanceWheel,
        Self::AcknowledgeAlert,
        Self::MarkNotificationRead,
        Self::MarkAllNotificationsRead,
    ];

    /// Stable identifier used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunEvaluation => "runEvaluation",
            Self::RecomputeSymbolDiagnostics => "recomputeSymbolDiagnostics",
            Self::RefreshUniverse => "refreshUniverse",
            Self::OpenPosition => "openPosition",
            Self::ClosePosition => "closePosition",
            Self::UpdatePosition => "updatePosition",
            Self::SyncPortfolio => "syncPortfolio",
            Self::AdvanceWheel => "advanceWheel",
            Self::AcknowledgeAlert => "acknowledgeAlert",
            Self::MarkNotificationRead => "markNotificationRead",
            Self::MarkAllNotificationsRead => "markAllNotificationsRead",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write against the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Run the decision pipeline for a mode.
    RunEvaluation { mode: Mode },
    /// Recompute diagnostics for one symbol.
    RecomputeSymbolDiagnostics { symbol: Symbol },
    /// Rebuild the universe catalog.
    RefreshUniverse,
    /// Record a new position; `details` is forwarded verbatim.
    OpenPosition { symbol: Symbol, details: Value },
    /// Close a tracked position.
    ClosePosition { position_id: String, symbol: Symbol },
    /// Edit a tracked position; `details` is forwarded verbatim.
    UpdatePosition {
        position_id: String,
        symbol: Symbol,
        details: Value,
    },
    /// Pull fresh balances for an account.
    SyncPortfolio { account_id: AccountId },
    /// Move a symbol to the next wheel stage.
    AdvanceWheel { symbol: Symbol },
    /// Acknowledge an alert.
    AcknowledgeAlert { alert_id: String },
    /// Mark one notification read.
    MarkNotificationRead { notification_id: String },
    /// Mark every notification read.
    MarkAllNotificationsRead,
}

impl Mutation {
    /// Table key for this mutation.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::RunEvaluation { .. } => MutationKind::RunEvaluation,
            Self::RecomputeSymbolDiagnostics { .. } => MutationKind::RecomputeSymbolDiagnostics,
            Self::RefreshUniverse => MutationKind::RefreshUniverse,
            Self::OpenPosition { .. } => MutationKind::OpenPosition,
            Self::ClosePosition { .. } => MutationKind::ClosePosition,
            Self::UpdatePosition { .. } => MutationKind::UpdatePosition,
            Self::SyncPortfolio { .. } => MutationKind::SyncPortfolio,
            Self::AdvanceWheel { .. } => MutationKind::AdvanceWheel,
            Self::AcknowledgeAlert { .. } => MutationKind::AcknowledgeAlert,
            Self::MarkNotificationRead { .. } => MutationKind::MarkNotificationRead,
            Self::MarkAllNotificationsRead => MutationKind::MarkAllNotificationsRead,
        }
    }

    /// Symbol the mutation targets, if any.
    #[must_use]
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Self::RecomputeSymbolDiagnostics { symbol }
            | Self::OpenPosition { symbol, .. }
            | Self::ClosePosition { symbol, .. }
            | Self::UpdatePosition { symbol, .. }
            | Self::AdvanceWheel { symbol } => Some(symbol),
            _ => None,
        }
    }

    /// Account the mutation targets, if any.
    #[must_use]
    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            Self::SyncPortfolio { account_id } => Some(account_id),
            _ => None,
        }
    }

    /// Gateway path and JSON body for the POST. Ids and symbols in the path
    /// are percent-encoded.
    #[must_use]
    pub fn request(&self) -> (String, Value) {
        match self {
            Self::RunEvaluation { mode } => {
                ("/api/evaluation/run".to_string(), json!({ "mode": mode }))
            }
            Self::RecomputeSymbolDiagnostics { symbol } => (
                ApiPath::new("/api/symbols")
                    .segment(symbol)
                    .literal("diagnostics")
                    .literal("recompute")
                    .build(),
                json!({}),
            ),
            Self::RefreshUniverse => ("/api/universe/refresh".to_string(), json!({})),
            Self::OpenPosition { symbol, details } => {
                let mut body = details.clone();
                if let Value::Object(map) = &mut body {
                    map.insert("symbol".to_string(), json!(symbol));
                } else {
                    body = json!({ "symbol": symbol });
                }
                ("/api/positions".to_string(), body)
            }
            Self::ClosePosition { position_id, .. } => (
                ApiPath::new("/api/positions")
                    .segment(position_id)
                    .literal("close")
                    .build(),
                json!({}),
            ),
            Self::UpdatePosition {
                position_id,
                details,
                ..
            } => (
                ApiPath::new("/api/positions").segment(position_id).build(),
                details.clone(),
            ),
            Self::SyncPortfolio { account_id } => (
                ApiPath::new("/api/portfolio")
                    .segment(account_id)
                    .literal("sync")
                    .build(),
                json!({}),
            ),
            Self::AdvanceWheel { symbol } => (
                ApiPath::new("/api/wheel")
                    .segment(symbol)
                    .literal("advance")
                    .build(),
                json!({}),
            ),
            Self::AcknowledgeAlert { alert_id } => (
                ApiPath::new("/api/alerts").segment(alert_id).literal("ack").build(),
                json!({}),
            ),
            Self::MarkNotificationRead { notification_id } => (
                ApiPath::new("/api/notifications")
                    .segment(notification_id)
                    .literal("read")
                    .build(),
                json!({}),
            ),
            Self::MarkAllNotificationsRead => {
                ("/api/notifications/read-all".to_string(), json!({}))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_kinds_are_unique() {
        let mut kinds = MutationKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), MutationKind::ALL.len());
    }

    #[test]
    fn open_position_injects_symbol_into_body() {
        let mutation = Mutation::OpenPosition {
            symbol: Symbol::new("spy"),
            details: json!({ "contracts": 2 }),
        };
        let (path, body) = mutation.request();
        assert_eq!(path, "/api/positions");
        assert_eq!(body, json!({ "contracts": 2, "symbol": "SPY" }));
    }

    #[test]
    fn ids_cannot_escape_their_segment() {
        let close = Mutation::ClosePosition {
            position_id: "7/../../admin".into(),
            symbol: Symbol::new("SPY"),
        };
        assert_eq!(close.request().0, "/api/positions/7%2F..%2F..%2Fadmin/close");

        let ack = Mutation::AcknowledgeAlert {
            alert_id: "a1?force=true".into(),
        };
        assert_eq!(ack.request().0, "/api/alerts/a1%3Fforce%3Dtrue/ack");

        let advance = Mutation::AdvanceWheel {
            symbol: Symbol::new("brk/b"),
        };
        assert_eq!(advance.request().0, "/api/wheel/BRK%2FB/advance");

        let recompute = Mutation::RecomputeSymbolDiagnostics {
            symbol: Symbol::new("spy"),
        };
        assert_eq!(recompute.request().0, "/api/symbols/SPY/diagnostics/recompute");
    }

    #[test]
    fn scoped_params_are_exposed() {
        let recompute = Mutation::RecomputeSymbolDiagnostics {
            symbol: Symbol::new("SPY"),
        };
        assert_eq!(recompute.symbol().map(Symbol::as_str), Some("SPY"));
        assert!(recompute.account_id().is_none());

        let sync = Mutation::SyncPortfolio {
            account_id: AccountId::new("acct-1"),
        };
        assert_eq!(sync.account_id().map(AccountId::as_str), Some("acct-1"));
        assert_eq!(sync.kind(), MutationKind::SyncPortfolio);
    }
}
