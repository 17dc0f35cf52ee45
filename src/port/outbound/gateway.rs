//! Fetch gateway port.
//!
//! The gateway performs the actual network reads and writes. The read layer
//! treats it as a pure async function: it does not know about transports,
//! headers, or retry policy, and any `Err` is terminal for that attempt.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// Read/write access to the dashboard server.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; fetches for different partitions
/// run as independent tasks.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// GET `path` relative to the gateway's base URL.
    ///
    /// Fails with [`FetchError::Http`] on a non-2xx status.
    async fn get(&self, path: &str) -> Result<Value, FetchError>;

    /// POST `body` to `path` relative to the gateway's base URL.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, FetchError>;

    /// Gateway name for logging.
    fn name(&self) -> &'static str {
        "gateway"
    }
}
