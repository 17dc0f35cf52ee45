//! Subscription registry.
//!
//! Tracks which consumers are interested in which partition keys and drives
//! fetches from that interest:
//!
//! - Subscribing to a key that is not fresh starts (or joins) a fetch.
//! - Invalidated keys are refetched only while they have a subscriber.
//!   Keys without subscribers keep their `stale` status until someone
//!   subscribes again.
//! - Entries nobody subscribes to are evicted lazily by [`SubscriptionRegistry::sweep`].
//!
//! Refetches for different keys are independent tasks with no ordering
//! between them.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::store::{CacheEntry, CacheStore, EntryStatus};
use crate::domain::id::ConsumerId;
use crate::domain::partition::PartitionKey;
use crate::error::FetchError;
use crate::port::outbound::gateway::FetchGateway;

/// Read one partition through the gateway.
///
/// A 404 on a "latest"-style partition means "nothing yet" and resolves to
/// JSON `null`.
pub async fn fetch_partition(
    gateway: Arc<dyn FetchGateway>,
    key: PartitionKey,
) -> Result<Value, FetchError> {
    match gateway.get(&key.path()).await {
        Err(err) if err.is_not_found() && key.absent_on_not_found() => {
            debug!(key = %key, "partition absent");
            Ok(Value::Null)
        }
        other => other,
    }
}

struct Inner {
    store: CacheStore<Value>,
    gateway: Arc<dyn FetchGateway>,
    subscribers: Mutex<HashMap<PartitionKey, BTreeSet<ConsumerId>>>,
}

/// Consumer interest in partition keys.
///
/// Cheap to clone; clones share the same subscriptions.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<Inner>,
}

impl SubscriptionRegistry {
    /// Create a registry over `store` that fetches through `gateway`.
    pub fn new(store: CacheStore<Value>, gateway: Arc<dyn FetchGateway>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                gateway,
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The underlying cache store.
    #[must_use]
    pub fn store(&self) -> &CacheStore<Value> {
        &self.inner.store
    }

    /// Register `consumer`'s interest in `key`.
    ///
    /// Returns the current entry. If it is not fresh and nothing is loading,
    /// a fetch is started in the background; the returned snapshot then
    /// reads `loading` while still carrying any previous payload.
    pub fn subscribe(&self, key: &PartitionKey, consumer: &ConsumerId) -> CacheEntry<Value> {
        let added = self
            .inner
            .subscribers
            .lock()
            .entry(key.clone())
            .or_default()
            .insert(consumer.clone());
        if added {
            debug!(key = %key, consumer = %consumer, "subscribed");
        }

        let status = self.inner.store.status(key);
        if status != EntryStatus::Fresh && !self.inner.store.is_in_flight(key) {
            // Dropping the handle does not cancel the fetch.
            drop(self.start_fetch(key));
        }
        self.inner.store.get(key)
    }

    /// Drop `consumer`'s interest in `key`. Returns whether it was subscribed.
    ///
    /// The cache entry is kept; an outstanding fetch still completes.
    pub fn unsubscribe(&self, key: &PartitionKey, consumer: &ConsumerId) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let Some(consumers) = subscribers.get_mut(key) else {
            return false;
        };
        let removed = consumers.remove(consumer);
        if consumers.is_empty() {
            subscribers.remove(key);
        }
        drop(subscribers);

        if removed {
            debug!(key = %key, consumer = %consumer, "unsubscribed");
        }
        removed
    }

    /// Drop every subscription held by `consumer`. Returns how many were dropped.
    pub fn unsubscribe_all(&self, consumer: &ConsumerId) -> usize {
        let mut subscribers = self.inner.subscribers.lock();
        let mut dropped = 0;
        subscribers.retain(|_, consumers| {
            if consumers.remove(consumer) {
                dropped += 1;
            }
            !consumers.is_empty()
        });
        dropped
    }

    /// Number of consumers subscribed to `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: &PartitionKey) -> usize {
        self.inner
            .subscribers
            .lock()
            .get(key)
            .map_or(0, BTreeSet::len)
    }

    /// True when at least one consumer is subscribed to `key`.
    #[must_use]
    pub fn has_subscribers(&self, key: &PartitionKey) -> bool {
        self.subscriber_count(key) > 0
    }

    /// Keys with at least one subscriber, sorted.
    #[must_use]
    pub fn subscribed_keys(&self) -> Vec<PartitionKey> {
        let mut keys: Vec<_> = self.inner.subscribers.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Read `key`, fetching if it is not fresh, and wait for the result.
    ///
    /// Does not register a subscription.
    pub async fn load(&self, key: &PartitionKey) -> Result<Arc<Value>, FetchError> {
        self.start_fetch(key).await
    }

    /// Schedule refetches for invalidated keys that still have subscribers.
    ///
    /// Returns the number of refetches scheduled. Keys without subscribers
    /// are skipped and stay `stale`.
    pub fn refresh(&self, keys: &[PartitionKey]) -> usize {
        let mut scheduled = 0;
        for key in keys {
            if !self.has_subscribers(key) {
                trace!(key = %key, "stale without subscribers, deferring refetch");
                continue;
            }
            scheduled += 1;
            let registry = self.clone();
            let key = key.clone();
            tokio::spawn(async move { registry.refetch(key).await });
        }
        scheduled
    }

    /// Evict entries with no subscribers and no outstanding fetch.
    ///
    /// Returns the evicted keys.
    pub fn sweep(&self) -> Vec<PartitionKey> {
        let store = &self.inner.store;
        let evicted: Vec<_> = store
            .keys()
            .into_iter()
            .filter(|key| !self.has_subscribers(key) && !store.is_in_flight(key))
            .filter(|key| store.evict(key))
            .collect();
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "swept idle cache entries");
        }
        evicted
    }

    fn start_fetch(
        &self,
        key: &PartitionKey,
    ) -> futures_util::future::BoxFuture<'static, Result<Arc<Value>, FetchError>> {
        let gateway = Arc::clone(&self.inner.gateway);
        let fetch_key = key.clone();
        self.inner
            .store
            .request(key, move || fetch_partition(gateway, fetch_key))
    }

    async fn refetch(&self, key: PartitionKey) {
        loop {
            let result = self.start_fetch(&key).await;
            let subscribed = self.has_subscribers(&key);
            if let Err(err) = result {
                if subscribed {
                    warn!(key = %key, error = %err, "refetch failed");
                }
                return;
            }
            // A fetch that was already running when the key was invalidated
            // lands stale; go around once more for its subscribers.
            if !(subscribed && self.inner.store.status(&key) == EntryStatus::Stale) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::partition::KeyPattern;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FetchGateway for CountingGateway {
        async fn get(&self, path: &str) -> Result<Value, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if path.starts_with("/api/decision") {
                return Err(FetchError::Http {
                    status: 404,
                    body: "no run".into(),
                });
            }
            Ok(json!({ "path": path, "n": n }))
        }

        async fn post(&self, _path: &str, _body: &Value) -> Result<Value, FetchError> {
            Ok(Value::Null)
        }
    }

    fn registry() -> (SubscriptionRegistry, Arc<CountingGateway>) {
        let gateway = Arc::new(CountingGateway {
            calls: AtomicUsize::new(0),
        });
        let registry = SubscriptionRegistry::new(CacheStore::default(), gateway.clone());
        (registry, gateway)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_subscribe_starts_fetch() {
        let (registry, gateway) = registry();
        let entry = registry.subscribe(&PartitionKey::Universe, &ConsumerId::new("grid"));
        assert_eq!(entry.status, EntryStatus::Loading);

        settle().await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            registry.store().status(&PartitionKey::Universe),
            EntryStatus::Fresh
        );
    }

    #[tokio::test]
    async fn test_second_subscriber_reuses_fresh_entry() {
        let (registry, gateway) = registry();
        registry.subscribe(&PartitionKey::Universe, &ConsumerId::new("a"));
        registry.subscribe(&PartitionKey::Universe, &ConsumerId::new("b"));
        settle().await;
        registry.subscribe(&PartitionKey::Universe, &ConsumerId::new("c"));
        settle().await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriber_count(&PartitionKey::Universe), 3);
    }

    #[tokio::test]
    async fn test_refresh_skips_keys_without_subscribers() {
        let (registry, gateway) = registry();
        registry.load(&PartitionKey::Alerts).await.unwrap();
        let stale = registry
            .store()
            .invalidate(&KeyPattern::Exact(PartitionKey::Alerts));

        assert_eq!(registry.refresh(&stale), 0);
        settle().await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.store().status(&PartitionKey::Alerts), EntryStatus::Stale);

        // A new subscriber picks the stale entry up.
        registry.subscribe(&PartitionKey::Alerts, &ConsumerId::new("bell"));
        settle().await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.store().status(&PartitionKey::Alerts), EntryStatus::Fresh);
    }

    #[tokio::test]
    async fn test_missing_latest_decision_is_absent_not_error() {
        let (registry, _) = registry();
        let key = PartitionKey::Decision {
            mode: crate::domain::id::Mode::new("balanced"),
        };
        let payload = registry.load(&key).await.unwrap();
        assert!(payload.is_null());
        assert_eq!(registry.store().status(&key), EntryStatus::Fresh);
    }

    #[tokio::test]
    async fn test_unsubscribe_and_sweep() {
        let (registry, _) = registry();
        let grid = ConsumerId::new("grid");
        registry.subscribe(&PartitionKey::Universe, &grid);
        registry.subscribe(&PartitionKey::Alerts, &grid);
        registry.subscribe(&PartitionKey::Alerts, &ConsumerId::new("bell"));
        settle().await;

        assert!(registry.unsubscribe(&PartitionKey::Universe, &grid));
        assert!(!registry.unsubscribe(&PartitionKey::Universe, &grid));
        assert_eq!(registry.unsubscribe_all(&grid), 1);

        let evicted = registry.sweep();
        assert_eq!(evicted, vec![PartitionKey::Universe]);
        assert_eq!(registry.subscribed_keys(), vec![PartitionKey::Alerts]);
        assert_eq!(registry.store().len(), 1);
    }
}
