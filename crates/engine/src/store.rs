//! In-memory job store and response history.
//!
//! The store is the single serialization point for all remote-state
//! mutation: the submit path and every poll watcher funnel their
//! observations through [`JobStore::upsert`], which replaces the whole
//! record atomically. History is append-only, deduplicated by
//! server-assigned id, and cleared only by explicit request.

use std::collections::{HashMap, HashSet};

use lumen_core::{CoreError, RemoteJobState, SnapshotStore};
use tokio::sync::RwLock;

/// Namespace key used when persisting the response history.
pub const RESPONSE_HISTORY_KEY: &str = "response-history";

#[derive(Default)]
struct StoreInner {
    /// Latest known state per server-assigned id.
    jobs: HashMap<String, RemoteJobState>,
    /// Ordered terminal-or-latest states, oldest first.
    history: Vec<RemoteJobState>,
}

/// Shared job state, guarded by one lock.
#[derive(Default)]
pub struct JobStore {
    inner: RwLock<StoreInner>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a fresh observation, replacing any previous state for the
    /// same id wholesale.
    ///
    /// Updates apply in arrival order with no sequence numbers, so a
    /// slow submit acknowledgment can overwrite a faster first poll
    /// response. Known race, kept as-is.
    pub async fn upsert(&self, state: RemoteJobState) {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(state.id.clone(), state);
    }

    /// Latest known state for a server-assigned id.
    pub async fn get(&self, id: &str) -> Option<RemoteJobState> {
        self.inner.read().await.jobs.get(id).cloned()
    }

    /// Ids of every job the store has seen since the last reset.
    pub async fn all_ids(&self) -> HashSet<String> {
        self.inner.read().await.jobs.keys().cloned().collect()
    }

    /// Number of tracked (non-history) jobs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }

    /// Append a state to history unless an entry with the same
    /// server-assigned id already exists. Returns whether it appended.
    pub async fn append_history(&self, state: &RemoteJobState) -> bool {
        let mut inner = self.inner.write().await;
        if inner.history.iter().any(|entry| entry.id == state.id) {
            tracing::debug!(job_id = %state.id, "Skipping duplicate history entry");
            return false;
        }
        inner.history.push(state.clone());
        true
    }

    /// All history entries, oldest first.
    pub async fn history(&self) -> Vec<RemoteJobState> {
        self.inner.read().await.history.clone()
    }

    /// Drop every history entry.
    pub async fn clear_history(&self) {
        self.inner.write().await.history.clear();
    }

    /// Drop terminal entries from the active map.
    ///
    /// Invoked before a new submission so a fresh batch never renders
    /// stale finished responses. Active (still-polling) jobs survive.
    pub async fn clear_completed(&self) {
        let mut inner = self.inner.write().await;
        inner.jobs.retain(|_, state| !state.is_terminal());
    }

    // ---- persistence ----

    /// History serialized to one JSON string per entry, oldest first.
    pub async fn history_snapshot(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .history
            .iter()
            .map(|state| {
                serde_json::to_string(state).expect("RemoteJobState is always serialisable")
            })
            .collect()
    }

    /// Replace history from serialized entries.
    ///
    /// Entries that no longer decode are skipped with a warning rather
    /// than poisoning the whole load. Returns how many were restored.
    pub async fn restore_history(&self, entries: &[String]) -> usize {
        let mut restored = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_str::<RemoteJobState>(entry) {
                Ok(state) => {
                    if !restored
                        .iter()
                        .any(|existing: &RemoteJobState| existing.id == state.id)
                    {
                        restored.push(state);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable history entry");
                }
            }
        }
        let count = restored.len();
        self.inner.write().await.history = restored;
        count
    }

    /// Write history to `store` under [`RESPONSE_HISTORY_KEY`].
    pub async fn persist_history(&self, store: &dyn SnapshotStore) -> Result<(), CoreError> {
        let snapshot = self.history_snapshot().await;
        store.save(RESPONSE_HISTORY_KEY, &snapshot)
    }

    /// Load history from `store`, replacing the in-memory list.
    pub async fn load_history(&self, store: &dyn SnapshotStore) -> Result<usize, CoreError> {
        let entries = store.load(RESPONSE_HISTORY_KEY)?;
        Ok(self.restore_history(&entries).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{JobStatus, MemorySnapshotStore};

    fn state(id: &str, status: JobStatus) -> RemoteJobState {
        RemoteJobState {
            id: id.into(),
            request_id: None,
            status,
            outputs: vec![],
            error_message: None,
            progress_percent: None,
            logs: None,
            poll_uri: format!("https://x/predictions/{id}"),
            cancel_uri: format!("https://x/predictions/{id}/cancel"),
            last_updated: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let store = JobStore::new();
        store.upsert(state("a", JobStatus::Queued)).await;
        store.upsert(state("a", JobStatus::Processing)).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("a").await.unwrap().status,
            JobStatus::Processing
        );
    }

    #[tokio::test]
    async fn upsert_is_last_writer_wins() {
        let store = JobStore::new();
        store.upsert(state("a", JobStatus::Processing)).await;
        // A stale observation arriving late still replaces the record.
        store.upsert(state("a", JobStatus::Starting)).await;
        assert_eq!(store.get("a").await.unwrap().status, JobStatus::Starting);
    }

    #[tokio::test]
    async fn duplicate_history_append_is_skipped() {
        let store = JobStore::new();
        let finished = state("a", JobStatus::Succeeded);
        assert!(store.append_history(&finished).await);
        assert!(!store.append_history(&finished).await);
        assert_eq!(store.history().await.len(), 1);
    }

    #[tokio::test]
    async fn history_preserves_order() {
        let store = JobStore::new();
        store.append_history(&state("a", JobStatus::Succeeded)).await;
        store.append_history(&state("b", JobStatus::Failed)).await;
        let ids: Vec<String> = store.history().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn clear_completed_keeps_active_jobs() {
        let store = JobStore::new();
        store.upsert(state("done", JobStatus::Succeeded)).await;
        store.upsert(state("running", JobStatus::Processing)).await;

        store.clear_completed().await;

        assert!(store.get("done").await.is_none());
        assert!(store.get("running").await.is_some());
    }

    #[tokio::test]
    async fn clear_completed_leaves_history_alone() {
        let store = JobStore::new();
        let finished = state("done", JobStatus::Succeeded);
        store.upsert(finished.clone()).await;
        store.append_history(&finished).await;

        store.clear_completed().await;

        assert_eq!(store.history().await.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_and_restore_round_trip() {
        let store = JobStore::new();
        store.append_history(&state("a", JobStatus::Succeeded)).await;
        store.append_history(&state("b", JobStatus::Canceled)).await;

        let persist = MemorySnapshotStore::new();
        store.persist_history(&persist).await.unwrap();

        let fresh = JobStore::new();
        let count = fresh.load_history(&persist).await.unwrap();
        assert_eq!(count, 2);
        let ids: Vec<String> = fresh.history().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn restore_skips_undecodable_entries() {
        let store = JobStore::new();
        let good = serde_json::to_string(&state("a", JobStatus::Succeeded)).unwrap();
        let count = store
            .restore_history(&[good, "{broken".to_string()])
            .await;
        assert_eq!(count, 1);
        assert_eq!(store.history().await.len(), 1);
    }

    #[tokio::test]
    async fn restore_deduplicates_by_id() {
        let store = JobStore::new();
        let entry = serde_json::to_string(&state("a", JobStatus::Succeeded)).unwrap();
        let count = store.restore_history(&[entry.clone(), entry]).await;
        assert_eq!(count, 1);
    }
}
