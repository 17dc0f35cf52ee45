//! The mutation → invalidation table.
//!
//! One row per [`MutationKind`]. Rows are conservative: when a mutation's
//! blast radius is unclear, every partition it could touch is listed.
//! Templates are bound against the concrete mutation to produce
//! [`KeyPattern`]s; a template whose param the mutation does not carry
//! widens to the whole partition.

use crate::domain::mutation::{Mutation, MutationKind};
use crate::domain::partition::{KeyPattern, PartitionKey, PartitionName};

/// Unbound invalidation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternTemplate {
    /// Every key of the partition.
    Partition(PartitionName),
    /// Keys of the partition carrying the mutation's symbol.
    SymbolOf(PartitionName),
    /// The partition key for the mutation's account.
    AccountOf(PartitionName),
}

impl PatternTemplate {
    /// Partition the template refers to.
    #[must_use]
    pub const fn partition(self) -> PartitionName {
        match self {
            Self::Partition(name) | Self::SymbolOf(name) | Self::AccountOf(name) => name,
        }
    }

    /// Bind the template to a concrete mutation.
    #[must_use]
    pub fn bind(self, mutation: &Mutation) -> KeyPattern {
        match self {
            Self::Partition(name) => KeyPattern::Partition(name),
            Self::SymbolOf(name) => match mutation.symbol() {
                Some(symbol) if name.is_symbol_scoped() => {
                    KeyPattern::Symbol(name, symbol.clone())
                }
                _ => KeyPattern::Partition(name),
            },
            Self::AccountOf(name) => match (name, mutation.account_id()) {
                (PartitionName::PortfolioMetrics, Some(account_id)) => {
                    KeyPattern::Exact(PartitionKey::PortfolioMetrics {
                        account_id: account_id.clone(),
                    })
                }
                _ => KeyPattern::Partition(name),
            },
        }
    }
}

use PartitionName::{
    Alerts, Decision, Notifications, PortfolioMetrics, SymbolDiagnostics, SystemHealth,
    TrackedPositions, Universe, WheelState,
};
use PatternTemplate::{AccountOf, Partition, SymbolOf};

const POSITION_WRITE: &[PatternTemplate] = &[
    Partition(TrackedPositions),
    Partition(PortfolioMetrics),
    Partition(WheelState),
    Partition(Notifications),
];

/// Partitions each mutation marks stale on success.
pub static INVALIDATION_TABLE: &[(MutationKind, &[PatternTemplate])] = &[
    (
        MutationKind::RunEvaluation,
        &[
            Partition(Decision),
            Partition(Universe),
            Partition(Alerts),
            Partition(SystemHealth),
        ],
    ),
    (
        MutationKind::RecomputeSymbolDiagnostics,
        &[
            SymbolOf(SymbolDiagnostics),
            Partition(Universe),
            Partition(Decision),
        ],
    ),
    (
        MutationKind::RefreshUniverse,
        &[
            Partition(Universe),
            Partition(Decision),
            Partition(SystemHealth),
        ],
    ),
    (MutationKind::OpenPosition, POSITION_WRITE),
    (MutationKind::ClosePosition, POSITION_WRITE),
    (MutationKind::UpdatePosition, POSITION_WRITE),
    (
        MutationKind::SyncPortfolio,
        &[
            AccountOf(PortfolioMetrics),
            Partition(TrackedPositions),
            Partition(WheelState),
        ],
    ),
    (
        MutationKind::AdvanceWheel,
        &[
            Partition(WheelState),
            Partition(TrackedPositions),
            Partition(PortfolioMetrics),
        ],
    ),
    (
        MutationKind::AcknowledgeAlert,
        &[Partition(Alerts), Partition(Notifications)],
    ),
    (MutationKind::MarkNotificationRead, &[Partition(Notifications)]),
    (
        MutationKind::MarkAllNotificationsRead,
        &[Partition(Notifications)],
    ),
];

/// Look up the row for `kind` in `table`.
#[must_use]
pub fn lookup(
    table: &'static [(MutationKind, &'static [PatternTemplate])],
    kind: MutationKind,
) -> Option<&'static [PatternTemplate]> {
    table
        .iter()
        .find(|(row_kind, _)| *row_kind == kind)
        .map(|(_, templates)| *templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{AccountId, Mode, Symbol};
    use std::collections::BTreeSet;

    #[test]
    fn table_covers_exactly_the_defined_mutations() {
        let defined: BTreeSet<_> = MutationKind::ALL.iter().copied().collect();
        let covered: BTreeSet<_> = INVALIDATION_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(defined, covered);
    }

    #[test]
    fn every_mutation_appears_once() {
        for kind in MutationKind::ALL {
            let rows = INVALIDATION_TABLE
                .iter()
                .filter(|(row_kind, _)| *row_kind == kind)
                .count();
            assert_eq!(rows, 1, "{kind} should have exactly one row");
        }
    }

    #[test]
    fn every_row_is_non_empty_and_uses_known_partitions() {
        for (kind, templates) in INVALIDATION_TABLE {
            assert!(!templates.is_empty(), "{kind} has an empty row");
            for template in *templates {
                assert!(PartitionName::ALL.contains(&template.partition()));
            }
        }
    }

    #[test]
    fn symbol_templates_only_target_symbol_partitions() {
        for (kind, templates) in INVALIDATION_TABLE {
            for template in *templates {
                if let SymbolOf(name) = template {
                    assert!(name.is_symbol_scoped(), "{kind} binds a symbol on {name}");
                }
            }
        }
    }

    #[test]
    fn run_evaluation_invalidates_the_whole_blast_radius() {
        let row = lookup(INVALIDATION_TABLE, MutationKind::RunEvaluation).unwrap();
        let mutation = Mutation::RunEvaluation {
            mode: Mode::new("balanced"),
        };
        let patterns: Vec<_> = row.iter().map(|t| t.bind(&mutation)).collect();
        assert_eq!(
            patterns,
            vec![
                KeyPattern::Partition(Decision),
                KeyPattern::Partition(Universe),
                KeyPattern::Partition(Alerts),
                KeyPattern::Partition(SystemHealth),
            ]
        );
    }

    #[test]
    fn symbol_template_binds_mutation_symbol() {
        let mutation = Mutation::RecomputeSymbolDiagnostics {
            symbol: Symbol::new("spy"),
        };
        assert_eq!(
            SymbolOf(SymbolDiagnostics).bind(&mutation),
            KeyPattern::Symbol(SymbolDiagnostics, Symbol::new("SPY"))
        );
    }

    #[test]
    fn unbound_templates_widen_to_the_partition() {
        let mutation = Mutation::RefreshUniverse;
        assert_eq!(
            SymbolOf(SymbolDiagnostics).bind(&mutation),
            KeyPattern::Partition(SymbolDiagnostics)
        );
        assert_eq!(
            AccountOf(PortfolioMetrics).bind(&mutation),
            KeyPattern::Partition(PortfolioMetrics)
        );
    }

    #[test]
    fn account_template_binds_exact_key() {
        let mutation = Mutation::SyncPortfolio {
            account_id: AccountId::new("acct-1"),
        };
        assert_eq!(
            AccountOf(PortfolioMetrics).bind(&mutation),
            KeyPattern::Exact(PartitionKey::PortfolioMetrics {
                account_id: AccountId::new("acct-1"),
            })
        );
    }
}
