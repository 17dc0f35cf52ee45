//! Wheeldesk - client-side read layer for a trading-decision dashboard.
//!
//! Fetches partitioned server state, caches it by logical partition, keeps
//! subscribers consistent as mutations land, and derives a merged, ranked
//! view of the candidate universe.
//!
//! # Architecture
//!
//! - **`domain`** - Partition keys, payload shapes, merged records, mutations
//! - **`port`** - The fetch gateway trait
//! - **`application`** - Cache store, subscription registry, invalidation,
//!   merge/rank views and the [`application::Dashboard`] facade
//! - **`adapter`** - reqwest gateway and the clap CLI
//! - **`infrastructure`** - TOML configuration and logging
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wheeldesk::adapter::outbound::HttpGateway;
//! use wheeldesk::application::view::Sort;
//! use wheeldesk::application::Dashboard;
//! use wheeldesk::domain::{ConsumerId, Mode, PartitionKey};
//! use wheeldesk::infrastructure::config::settings::Config;
//!
//! # async fn run() -> wheeldesk::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let gateway = Arc::new(HttpGateway::new(&config.gateway)?);
//! let dashboard = Dashboard::new(gateway, config.cache.event_capacity);
//!
//! dashboard.subscribe(&PartitionKey::Universe, &ConsumerId::new("grid"));
//! let ranked = dashboard.ranked_view(&Mode::new("balanced"), Sort::default())?;
//! println!("{} symbols", ranked.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
