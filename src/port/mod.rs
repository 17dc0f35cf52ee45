//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  cache · invalidation   │
//!                    │  view · dashboard       │
//!                    └────────────┬────────────┘
//!                                 │ FetchGateway
//!                                 ▼
//!                         ┌───────────────┐
//!                         │ HTTP Adapter  │
//!                         └───────────────┘
//! ```

pub mod outbound;

pub use outbound::gateway::FetchGateway;
