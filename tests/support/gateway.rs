use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;
use wheeldesk::error::FetchError;
use wheeldesk::port::FetchGateway;

/// Deterministic in-memory dashboard server.
///
/// GETs answer from canned responses (a generic `{"path": ..}` object when
/// none is set) and are counted per path. GETs can be held open until
/// [`ScriptedGateway::release_gets`] is called.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
    post_error: Mutex<Option<FetchError>>,
    get_calls: Mutex<HashMap<String, usize>>,
    posts: Mutex<Vec<(String, Value)>>,
    held: AtomicBool,
    gate: Notify,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, value: Value) {
        self.responses.lock().insert(path.to_string(), Ok(value));
    }

    pub fn fail(&self, path: &str, error: FetchError) {
        self.responses.lock().insert(path.to_string(), Err(error));
    }

    pub fn fail_posts(&self, error: FetchError) {
        *self.post_error.lock() = Some(error);
    }

    /// Hold every GET issued from now on until released.
    pub fn hold_gets(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_gets(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    pub fn calls(&self, path: &str) -> usize {
        self.get_calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls.lock().values().sum()
    }

    pub fn reset_calls(&self) {
        self.get_calls.lock().clear();
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl FetchGateway for ScriptedGateway {
    async fn get(&self, path: &str) -> Result<Value, FetchError> {
        *self.get_calls.lock().entry(path.to_string()).or_default() += 1;

        loop {
            let released = self.gate.notified();
            if !self.held.load(Ordering::SeqCst) {
                break;
            }
            released.await;
        }

        self.responses
            .lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Ok(json!({ "path": path })))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, FetchError> {
        self.posts.lock().push((path.to_string(), body.clone()));
        match self.post_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(json!({ "ok": true })),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
