//! Partition cache with request coalescing and stale retention.
//!
//! [`CacheStore`] is the single owner of mutable read state. It exposes a
//! narrow API: [`CacheStore::request`], [`CacheStore::invalidate`] and
//! [`CacheStore::evict`]. Nothing else writes into entries.
//!
//! Per key there is at most one outstanding fetch. Concurrent requests for a
//! key that is already loading attach to the running fetch and resolve with
//! the same result. Fetches run as spawned tasks, so a caller that goes away
//! does not cancel the network call; the result still lands in the cache for
//! the next subscriber.
//!
//! Invalidation marks `fresh` entries `stale` but keeps their payload, so
//! consumers can keep rendering the old value until the refetch lands.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::{self, BoxFuture, Shared};
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::domain::partition::{KeyPattern, PartitionKey};
use crate::error::FetchError;

/// Default capacity of the cache event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Freshness of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Never fetched.
    Idle,
    /// A fetch is outstanding. Any previous payload is still readable.
    Loading,
    /// Holds the latest successful payload.
    Fresh,
    /// Holds a payload known to be outdated.
    Stale,
    /// The last fetch failed. Any previous payload is still readable.
    Error,
}

impl EntryStatus {
    /// Short label for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Error => "error",
        }
    }
}

/// Snapshot of one cache entry.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: PartitionKey,
    pub payload: Option<Arc<T>>,
    pub status: EntryStatus,
    pub error: Option<FetchError>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    fn idle(key: PartitionKey) -> Self {
        Self {
            key,
            payload: None,
            status: EntryStatus::Idle,
            error: None,
            last_fetched_at: None,
        }
    }

    /// True when the payload can be served without a fetch.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.status == EntryStatus::Fresh
    }

    /// True when a previous fetch succeeded at least once.
    ///
    /// Distinguishes "had data, refresh failed" from "no data".
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

// Manual impl: `Arc<T>` is `Clone` for any `T`.
impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            payload: self.payload.clone(),
            status: self.status,
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
        }
    }
}

/// Notification sent when an entry changes status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: PartitionKey,
    pub status: EntryStatus,
}

type FetchResult<T> = Result<Arc<T>, FetchError>;
type SharedFetch<T> = Shared<BoxFuture<'static, FetchResult<T>>>;

struct InFlight<T> {
    id: u64,
    fetch: SharedFetch<T>,
    /// Set when an invalidation hit the key while this fetch was outstanding.
    invalidated: bool,
    /// Set when the key was evicted while this fetch was outstanding.
    evicted: bool,
}

struct Slot<T> {
    entry: CacheEntry<T>,
    in_flight: Option<InFlight<T>>,
}

struct Inner<T> {
    slots: Mutex<HashMap<PartitionKey, Slot<T>>>,
    next_fetch_id: AtomicU64,
    tx: broadcast::Sender<CacheEvent>,
}

impl<T> Inner<T> {
    fn notify(&self, key: &PartitionKey, status: EntryStatus) {
        // No receivers is fine.
        let _ = self.tx.send(CacheEvent {
            key: key.clone(),
            status,
        });
    }

    fn complete(&self, key: &PartitionKey, fetch_id: u64, result: &FetchResult<T>) {
        let status = {
            let mut slots = self.slots.lock();
            let Some(slot) = slots.get_mut(key) else {
                trace!(key = %key, "fetch resolved for evicted key");
                return;
            };
            let (invalidated, evicted) = match &slot.in_flight {
                Some(in_flight) if in_flight.id == fetch_id => {
                    (in_flight.invalidated, in_flight.evicted)
                }
                _ => {
                    trace!(key = %key, "fetch resolved after being superseded");
                    return;
                }
            };
            if evicted {
                slots.remove(key);
                debug!(key = %key, "cache entry evicted after fetch settled");
                return;
            }
            slot.in_flight = None;

            let entry = &mut slot.entry;
            match result {
                Ok(payload) => {
                    entry.payload = Some(Arc::clone(payload));
                    entry.error = None;
                    entry.last_fetched_at = Some(Utc::now());
                    entry.status = if invalidated {
                        EntryStatus::Stale
                    } else {
                        EntryStatus::Fresh
                    };
                }
                Err(err) => {
                    trace!(key = %key, error = %err, "fetch failed");
                    entry.error = Some(err.clone());
                    entry.status = EntryStatus::Error;
                }
            }
            entry.status
        };

        trace!(key = %key, status = status.as_str(), "cache entry updated");
        self.notify(key, status);
    }
}

/// In-memory partition cache.
///
/// Cheap to clone; clones share the same entries.
pub struct CacheStore<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> CacheStore<T>
where
    T: Send + Sync + 'static,
{
    /// Create an empty store whose event channel holds `event_capacity` events.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(1),
                tx,
            }),
        }
    }

    /// Subscribe to entry status changes.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.tx.subscribe()
    }

    /// Snapshot of the entry for `key`. Unknown keys read as `idle`.
    #[must_use]
    pub fn get(&self, key: &PartitionKey) -> CacheEntry<T> {
        self.inner
            .slots
            .lock()
            .get(key)
            .map_or_else(|| CacheEntry::idle(key.clone()), |slot| slot.entry.clone())
    }

    /// Last successful payload for `key`, whatever the entry status.
    #[must_use]
    pub fn peek_payload(&self, key: &PartitionKey) -> Option<Arc<T>> {
        self.inner
            .slots
            .lock()
            .get(key)
            .and_then(|slot| slot.entry.payload.clone())
    }

    /// Status of `key`; unknown keys read as `idle`.
    #[must_use]
    pub fn status(&self, key: &PartitionKey) -> EntryStatus {
        self.inner
            .slots
            .lock()
            .get(key)
            .map_or(EntryStatus::Idle, |slot| slot.entry.status)
    }

    /// True when a fetch for `key` is outstanding.
    #[must_use]
    pub fn is_in_flight(&self, key: &PartitionKey) -> bool {
        self.inner
            .slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Read `key`, fetching only if needed.
    ///
    /// Returns the cached payload immediately when the entry is fresh. If a
    /// fetch is already outstanding the returned future attaches to it;
    /// otherwise `fetcher` is invoked exactly once and its future is spawned.
    /// The fetch is registered before this method returns, so every request
    /// issued in the same tick shares one gateway call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn request<F, Fut>(&self, key: &PartitionKey, fetcher: F) -> BoxFuture<'static, FetchResult<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let mut slots = self.inner.slots.lock();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            entry: CacheEntry::idle(key.clone()),
            in_flight: None,
        });

        if slot.entry.status == EntryStatus::Fresh {
            if let Some(payload) = &slot.entry.payload {
                trace!(key = %key, "cache hit");
                return future::ready(Ok(Arc::clone(payload))).boxed();
            }
        }

        if let Some(in_flight) = &mut slot.in_flight {
            trace!(key = %key, fetch_id = in_flight.id, "attaching to in-flight fetch");
            // A new reader wants the result, so keep it.
            in_flight.evicted = false;
            return in_flight.fetch.clone().boxed();
        }

        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let fetch = fetcher();
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(FetchError::Aborted("fetcher panicked".to_string())),
            };
            inner.complete(&task_key, fetch_id, &result);
            result
        });
        let shared = handle
            .map(|joined| {
                joined.unwrap_or_else(|err| Err(FetchError::Aborted(err.to_string())))
            })
            .boxed()
            .shared();

        slot.in_flight = Some(InFlight {
            id: fetch_id,
            fetch: shared.clone(),
            invalidated: false,
            evicted: false,
        });
        slot.entry.status = EntryStatus::Loading;
        drop(slots);

        debug!(key = %key, fetch_id, "fetch started");
        self.inner.notify(key, EntryStatus::Loading);
        shared.boxed()
    }

    /// Mark every entry matching `pattern` as outdated.
    ///
    /// `fresh` entries become `stale` and keep their payload. Entries with a
    /// fetch outstanding are flagged so that the fetch lands as `stale`.
    /// Returns the affected keys, sorted; `idle`, `stale` and `error` entries
    /// are left as they are and not returned.
    pub fn invalidate(&self, pattern: &KeyPattern) -> Vec<PartitionKey> {
        let mut affected = Vec::new();
        let mut newly_stale = Vec::new();
        {
            let mut slots = self.inner.slots.lock();
            for (key, slot) in slots.iter_mut().filter(|(key, _)| pattern.matches(key)) {
                if let Some(in_flight) = &mut slot.in_flight {
                    in_flight.invalidated = true;
                    affected.push(key.clone());
                } else if slot.entry.status == EntryStatus::Fresh {
                    slot.entry.status = EntryStatus::Stale;
                    newly_stale.push(key.clone());
                    affected.push(key.clone());
                }
            }
        }

        for key in &newly_stale {
            debug!(key = %key, pattern = %pattern, "cache entry invalidated");
            self.inner.notify(key, EntryStatus::Stale);
        }
        affected.sort();
        affected
    }

    /// Remove the entry for `key`. Returns whether it existed.
    ///
    /// If a fetch is outstanding the entry is kept until that fetch settles
    /// and removed then, so a later request attaches to the running fetch
    /// instead of starting a second one. Such a request also cancels the
    /// pending removal. The result is handed to waiters either way.
    pub fn evict(&self, key: &PartitionKey) -> bool {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(key) else {
            return false;
        };
        if let Some(in_flight) = &mut slot.in_flight {
            in_flight.evicted = true;
            drop(slots);
            debug!(key = %key, "cache entry evicted once its fetch settles");
        } else {
            slots.remove(key);
            drop(slots);
            debug!(key = %key, "cache entry evicted");
        }
        true
    }

    /// Keys currently held, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<PartitionKey> {
        let mut keys: Vec<_> = self.inner.slots.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.lock().len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for CacheStore<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
