//! Partition cache and subscription tracking.
//!
//! - [`store::CacheStore`]: per-key payloads with coalesced fetches and stale retention
//! - [`subscription::SubscriptionRegistry`]: consumer interest and refetch scheduling

pub mod store;
pub mod subscription;

pub use store::{CacheEntry, CacheEvent, CacheStore, EntryStatus};
pub use subscription::{fetch_partition, SubscriptionRegistry};
