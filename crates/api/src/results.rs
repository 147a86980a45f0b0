//! Extraction results parked between the two workitem callbacks.
//!
//! A workitem first uploads its `result.json` (PUT, keyed by the callback
//! key chosen at submission) and then reports completion (POST, same key).
//! The upload is held here until the completion arrives and attaches it to
//! the notification.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Uploads older than this are dropped on the next insert. Covers
/// workitems whose completion callback never arrives.
const RESULT_TTL: Duration = Duration::from_secs(60 * 60);

struct PendingResult {
    payload: serde_json::Value,
    received_at: Instant,
}

/// Result uploads waiting for their completion callback.
pub struct PendingResults {
    entries: RwLock<HashMap<String, PendingResult>>,
    ttl: Duration,
}

impl PendingResults {
    pub fn new() -> Self {
        Self::with_ttl(RESULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Park `payload` under `key`, replacing an earlier upload for it.
    pub async fn insert(&self, key: String, payload: serde_json::Value) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, pending| pending.received_at.elapsed() < ttl);
        let expired = before - entries.len();
        if expired > 0 {
            tracing::warn!(expired, "Dropped result uploads with no completion callback");
        }
        entries.insert(
            key,
            PendingResult {
                payload,
                received_at: Instant::now(),
            },
        );
    }

    /// Remove and return the upload for `key`.
    pub async fn take(&self, key: &str) -> Option<serde_json::Value> {
        self.entries
            .write()
            .await
            .remove(key)
            .map(|pending| pending.payload)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for PendingResults {
    fn default() -> Self {
        Self::new()
    }
}
