//! Domain types for the dashboard read layer: partition keys, server
//! payloads, merged records and mutations.

pub mod candidate;
pub mod id;
pub mod merged;
pub mod mutation;
pub mod partition;
mod path;

pub use candidate::{Band, Candidate, DecisionArtifact, UniverseRecord};
pub use id::{AccountId, ConsumerId, Mode, RunId, Symbol};
pub use merged::{MergedRecord, RankScore};
pub use mutation::{Mutation, MutationKind};
pub use partition::{KeyPattern, PartitionKey, PartitionName};
