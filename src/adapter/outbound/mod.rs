//! Outbound adapters (driven side).

pub mod http;

pub use http::HttpGateway;
