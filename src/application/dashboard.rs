//! Dashboard facade.
//!
//! Wires the cache store, subscription registry and invalidation dispatcher
//! around one fetch gateway. UI consumers subscribe through it, mutations go
//! through [`Dashboard::mutate`], and the merged/ranked views are derived
//! from whatever the store last fetched successfully.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::cache::store::{CacheEntry, CacheStore};
use super::cache::subscription::SubscriptionRegistry;
use super::invalidation::dispatcher::InvalidationDispatcher;
use super::view::merge::{build_merged_symbols, decode_decision, decode_universe, MergedSymbols};
use super::view::rank::{rank, Sort};
use crate::domain::id::{ConsumerId, Mode};
use crate::domain::merged::MergedRecord;
use crate::domain::mutation::Mutation;
use crate::domain::partition::PartitionKey;
use crate::error::Result;
use crate::port::outbound::gateway::FetchGateway;

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Server response body.
    pub response: Value,
    /// Cached keys marked stale, sorted.
    pub invalidated: Vec<PartitionKey>,
    /// Refetches scheduled for subscribed keys among `invalidated`.
    pub refetches: usize,
}

/// Read-layer entry point.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct Dashboard {
    gateway: Arc<dyn FetchGateway>,
    registry: SubscriptionRegistry,
    dispatcher: InvalidationDispatcher,
}

impl Dashboard {
    /// Build a dashboard over `gateway` with a fresh cache.
    pub fn new(gateway: Arc<dyn FetchGateway>, event_capacity: usize) -> Self {
        debug!(gateway = gateway.name(), event_capacity, "dashboard ready");
        let store = CacheStore::new(event_capacity);
        Self {
            registry: SubscriptionRegistry::new(store, Arc::clone(&gateway)),
            gateway,
            dispatcher: InvalidationDispatcher::new(),
        }
    }

    /// Replace the invalidation dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: InvalidationDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    #[must_use]
    pub fn store(&self) -> &CacheStore<Value> {
        self.registry.store()
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn dispatcher(&self) -> &InvalidationDispatcher {
        &self.dispatcher
    }

    /// See [`SubscriptionRegistry::subscribe`].
    pub fn subscribe(&self, key: &PartitionKey, consumer: &ConsumerId) -> CacheEntry<Value> {
        self.registry.subscribe(key, consumer)
    }

    /// See [`SubscriptionRegistry::unsubscribe`].
    pub fn unsubscribe(&self, key: &PartitionKey, consumer: &ConsumerId) -> bool {
        self.registry.unsubscribe(key, consumer)
    }

    /// Evict entries that have no subscribers and no fetch outstanding.
    ///
    /// Unsubscribed entries keep their last payload until this runs, so a
    /// consumer that comes back before the next sweep renders immediately.
    /// Returns the evicted keys.
    pub fn sweep(&self) -> Vec<PartitionKey> {
        self.registry.sweep()
    }

    /// Drop every subscription `consumer` holds, then sweep.
    ///
    /// Call when a consumer goes away for good. Returns the evicted keys.
    pub fn release(&self, consumer: &ConsumerId) -> Vec<PartitionKey> {
        let dropped = self.registry.unsubscribe_all(consumer);
        debug!(consumer = %consumer, dropped, "consumer released");
        self.sweep()
    }

    /// Fetch `key` if it is not fresh and wait for the payload.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the gateway call fails.
    pub async fn load(&self, key: &PartitionKey) -> Result<Arc<Value>> {
        Ok(self.registry.load(key).await?)
    }

    /// Send `mutation` to the server, then invalidate what it touched.
    ///
    /// Invalidation runs only after the server accepted the write. A failed
    /// POST leaves every cache entry as it was.
    ///
    /// # Errors
    ///
    /// Returns the fetch error of a failed POST, or
    /// [`crate::error::Error::InvalidationTableGap`] when the mutation has no
    /// table row.
    pub async fn mutate(&self, mutation: &Mutation) -> Result<MutationOutcome> {
        let (path, body) = mutation.request();
        let response = match self.gateway.post(&path, &body).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    gateway = self.gateway.name(),
                    mutation = %mutation.kind(),
                    error = %err,
                    "mutation failed"
                );
                return Err(err.into());
            }
        };

        let invalidated = self.dispatcher.on_success(mutation, self.store())?;
        let refetches = self.registry.refresh(&invalidated);
        debug!(mutation = %mutation.kind(), refetches, "refetches scheduled");

        Ok(MutationOutcome {
            response,
            invalidated,
            refetches,
        })
    }

    /// Merged universe/decision records for `mode`.
    ///
    /// Uses the last successful payloads only, so a stale or failed refetch
    /// still yields the previous view. A partition never fetched counts as
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Json`] when a cached payload does not
    /// decode.
    pub fn merged_view(&self, mode: &Mode) -> Result<MergedSymbols> {
        let universe = match self.store().peek_payload(&PartitionKey::Universe) {
            Some(payload) => decode_universe(&payload)?,
            None => Vec::new(),
        };
        let decision_key = PartitionKey::Decision { mode: mode.clone() };
        let decision = match self.store().peek_payload(&decision_key) {
            Some(payload) => decode_decision(&payload)?,
            None => None,
        };
        Ok(build_merged_symbols(&universe, decision.as_ref()))
    }

    /// Merged records for `mode`, ordered by `sort`.
    ///
    /// # Errors
    ///
    /// See [`Dashboard::merged_view`].
    pub fn ranked_view(&self, mode: &Mode, sort: impl Into<Sort>) -> Result<Vec<MergedRecord>> {
        let merged = self.merged_view(mode)?;
        let records: Vec<_> = merged.into_values().collect();
        Ok(rank(&records, sort))
    }
}
