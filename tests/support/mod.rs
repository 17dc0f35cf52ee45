#![allow(dead_code)]

pub mod gateway;

use wheeldesk::domain::{Mode, PartitionKey, Symbol};

/// Let spawned fetch tasks run to completion on the current-thread runtime.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

pub fn diagnostics(symbol: &str) -> PartitionKey {
    PartitionKey::SymbolDiagnostics {
        symbol: Symbol::new(symbol),
        run_id: None,
    }
}

pub fn decision(mode: &str) -> PartitionKey {
    PartitionKey::Decision {
        mode: Mode::new(mode),
    }
}
