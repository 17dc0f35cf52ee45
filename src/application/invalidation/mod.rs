//! Mutation-driven invalidation.
//!
//! - [`table`]: the static mutation → partition pattern table
//! - [`dispatcher::InvalidationDispatcher`]: applies a row to the cache store

pub mod dispatcher;
pub mod table;

pub use dispatcher::InvalidationDispatcher;
pub use table::{PatternTemplate, INVALIDATION_TABLE};
