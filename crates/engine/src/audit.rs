//! Request-payload audit trail.
//!
//! Every constructed submit body is appended here by the transport
//! before the network call executes, regardless of outcome, so a
//! failed or retried submission can always be reconstructed. The trail
//! grows until explicitly cleared and can be snapshotted through any
//! [`SnapshotStore`].

use lumen_core::{CoreError, SnapshotStore};
use tokio::sync::Mutex;

/// Namespace key used when persisting the audit trail.
pub const PAYLOAD_HISTORY_KEY: &str = "payload-history";

/// Append-only record of outbound request bodies.
#[derive(Default)]
pub struct PayloadAudit {
    entries: Mutex<Vec<String>>,
}

impl PayloadAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one request body. Non-UTF-8 bytes are recorded lossily.
    pub async fn record(&self, body: &[u8]) {
        let entry = String::from_utf8_lossy(body).into_owned();
        self.entries.lock().await.push(entry);
    }

    /// All recorded bodies, oldest first.
    pub async fn snapshot(&self) -> Vec<String> {
        self.entries.lock().await.clone()
    }

    /// Drop every recorded body.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Write the current trail to `store` under [`PAYLOAD_HISTORY_KEY`].
    pub async fn persist_to(&self, store: &dyn SnapshotStore) -> Result<(), CoreError> {
        let entries = self.snapshot().await;
        store.save(PAYLOAD_HISTORY_KEY, &entries)
    }

    /// Replace the in-memory trail with the persisted one.
    pub async fn load_from(&self, store: &dyn SnapshotStore) -> Result<usize, CoreError> {
        let entries = store.load(PAYLOAD_HISTORY_KEY)?;
        let count = entries.len();
        *self.entries.lock().await = entries;
        Ok(count)
    }
}
