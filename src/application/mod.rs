//! Application services (use cases).
//!
//! These services coordinate the domain types and the fetch gateway port to
//! keep cached partitions consistent and derive views from them.

pub mod cache;
pub mod dashboard;
pub mod invalidation;
pub mod view;

pub use dashboard::{Dashboard, MutationOutcome};
