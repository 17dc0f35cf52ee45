//! Resolves a successful mutation to the cache keys it must mark stale.

use tracing::{error, info};

use super::table::{lookup, PatternTemplate, INVALIDATION_TABLE};
use crate::application::cache::store::CacheStore;
use crate::domain::mutation::{Mutation, MutationKind};
use crate::domain::partition::{KeyPattern, PartitionKey};
use crate::error::{Error, Result};

type Table = &'static [(MutationKind, &'static [PatternTemplate])];

/// Runs the invalidation table against the cache store.
///
/// Only called on a mutation's success path; a failed mutation invalidates
/// nothing.
#[derive(Debug, Clone, Copy)]
pub struct InvalidationDispatcher {
    table: Table,
}

impl InvalidationDispatcher {
    /// Dispatcher over the built-in table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            table: INVALIDATION_TABLE,
        }
    }

    /// Dispatcher over a custom table.
    #[must_use]
    pub const fn with_table(table: Table) -> Self {
        Self { table }
    }

    /// Mutation kinds with no row in this dispatcher's table.
    #[must_use]
    pub fn uncovered(&self) -> Vec<MutationKind> {
        MutationKind::ALL
            .into_iter()
            .filter(|kind| lookup(self.table, *kind).is_none())
            .collect()
    }

    /// Patterns `mutation` invalidates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidationTableGap`] when the table has no row for
    /// the mutation's kind.
    pub fn patterns(&self, mutation: &Mutation) -> Result<Vec<KeyPattern>> {
        let kind = mutation.kind();
        let templates =
            lookup(self.table, kind).ok_or(Error::InvalidationTableGap { mutation: kind })?;
        Ok(templates.iter().map(|t| t.bind(mutation)).collect())
    }

    /// Mark every cached key affected by `mutation` stale.
    ///
    /// Returns the affected keys, sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidationTableGap`] when the table has no row for
    /// the mutation's kind. Nothing is invalidated in that case.
    pub fn on_success<T>(&self, mutation: &Mutation, store: &CacheStore<T>) -> Result<Vec<PartitionKey>>
    where
        T: Send + Sync + 'static,
    {
        let patterns = match self.patterns(mutation) {
            Ok(patterns) => patterns,
            Err(err) => {
                error!(mutation = %mutation.kind(), error = %err, "invalidation table gap");
                return Err(err);
            }
        };

        let mut affected: Vec<_> = patterns
            .iter()
            .flat_map(|pattern| store.invalidate(pattern))
            .collect();
        affected.sort();
        affected.dedup();

        info!(
            mutation = %mutation.kind(),
            patterns = patterns.len(),
            invalidated = affected.len(),
            "mutation dispatched"
        );
        Ok(affected)
    }
}

impl Default for InvalidationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::store::EntryStatus;
    use crate::domain::id::{Mode, Symbol};
    use crate::domain::partition::PartitionName;
    use crate::error::FetchError;

    async fn fresh(store: &CacheStore<u32>, key: PartitionKey) {
        store
            .request(&key, || async { Ok::<_, FetchError>(1) })
            .await
            .unwrap();
    }

    fn diagnostics(symbol: &str) -> PartitionKey {
        PartitionKey::SymbolDiagnostics {
            symbol: Symbol::new(symbol),
            run_id: None,
        }
    }

    #[test]
    fn builtin_table_has_no_gaps() {
        assert!(InvalidationDispatcher::new().uncovered().is_empty());
    }

    #[test]
    fn missing_row_is_reported() {
        static PARTIAL: &[(MutationKind, &[PatternTemplate])] = &[(
            MutationKind::RefreshUniverse,
            &[PatternTemplate::Partition(PartitionName::Universe)],
        )];
        let dispatcher = InvalidationDispatcher::with_table(PARTIAL);

        assert_eq!(dispatcher.uncovered().len(), MutationKind::ALL.len() - 1);
        let err = dispatcher
            .patterns(&Mutation::MarkAllNotificationsRead)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidationTableGap {
                mutation: MutationKind::MarkAllNotificationsRead
            }
        ));
    }

    #[tokio::test]
    async fn recompute_diagnostics_stays_symbol_scoped() {
        let store = CacheStore::<u32>::default();
        let balanced = PartitionKey::Decision {
            mode: Mode::new("balanced"),
        };
        fresh(&store, diagnostics("SPY")).await;
        fresh(&store, diagnostics("NVDA")).await;
        fresh(&store, PartitionKey::Universe).await;
        fresh(&store, balanced.clone()).await;
        fresh(&store, PartitionKey::TrackedPositions).await;

        let affected = InvalidationDispatcher::new()
            .on_success(
                &Mutation::RecomputeSymbolDiagnostics {
                    symbol: Symbol::new("SPY"),
                },
                &store,
            )
            .unwrap();

        let mut expected = vec![balanced, PartitionKey::Universe, diagnostics("SPY")];
        expected.sort();
        assert_eq!(affected, expected);
        assert_eq!(store.status(&diagnostics("NVDA")), EntryStatus::Fresh);
        assert_eq!(store.status(&PartitionKey::TrackedPositions), EntryStatus::Fresh);
    }

    #[tokio::test]
    async fn gap_invalidates_nothing() {
        static EMPTY: &[(MutationKind, &[PatternTemplate])] = &[];
        let store = CacheStore::<u32>::default();
        fresh(&store, PartitionKey::Universe).await;

        let result =
            InvalidationDispatcher::with_table(EMPTY).on_success(&Mutation::RefreshUniverse, &store);

        assert!(result.is_err());
        assert_eq!(store.status(&PartitionKey::Universe), EntryStatus::Fresh);
    }
}
