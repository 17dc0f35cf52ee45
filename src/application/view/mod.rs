//! Derived views over the decision and universe partitions.
//!
//! - [`merge`]: per-symbol reconciliation of universe and decision records
//! - [`rank`]: deterministic ordering of merged records

pub mod merge;
pub mod rank;

pub use merge::{build_merged_symbols, decode_decision, decode_universe, MergedSymbols};
pub use rank::{rank, Sort, SortKey, SortOrder};
