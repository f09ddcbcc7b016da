//! Snapshot persistence for ordered string lists.
//!
//! The engine persists two independent namespaces this way: the
//! request-payload audit trail and the response history. Each snapshot
//! is an ordered list of JSON strings; the store neither inspects nor
//! rewrites entries.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::CoreError;

/// Save/load an ordered list of strings under a namespace key.
///
/// Implementations must replace the whole list on `save`; partial
/// appends are the caller's job.
pub trait SnapshotStore: Send + Sync {
    /// Replace the snapshot stored under `key`.
    fn save(&self, key: &str, entries: &[String]) -> Result<(), CoreError>;

    /// Load the snapshot stored under `key`, empty if none exists.
    fn load(&self, key: &str) -> Result<Vec<String>, CoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and dry runs.
#[derive(Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<HashMap<String, Vec<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, key: &str, entries: &[String]) -> Result<(), CoreError> {
        self.inner
            .lock()
            .expect("snapshot map lock poisoned")
            .insert(key.to_string(), entries.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<String>, CoreError> {
        Ok(self
            .inner
            .lock()
            .expect("snapshot map lock poisoned")
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Durable store writing one JSON document per namespace key.
///
/// Keys map to `<dir>/<key>.json` containing a JSON array of strings.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| CoreError::Persistence(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, key: &str, entries: &[String]) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let body = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::Persistence(format!("encode {key}: {e}")))?;
        std::fs::write(&path, body)
            .map_err(|e| CoreError::Persistence(format!("write {}: {e}", path.display())))
    }

    fn load(&self, key: &str) -> Result<Vec<String>, CoreError> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CoreError::Persistence(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::Persistence(format!("decode {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        store.save("history", &["a".into(), "b".into()]).unwrap();
        assert_eq!(store.load("history").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn memory_store_missing_key_is_empty() {
        let store = MemorySnapshotStore::new();
        assert!(store.load("nothing").unwrap().is_empty());
    }

    #[test]
    fn memory_store_save_replaces() {
        let store = MemorySnapshotStore::new();
        store.save("k", &["old".into()]).unwrap();
        store.save("k", &["new".into()]).unwrap();
        assert_eq!(store.load("k").unwrap(), vec!["new"]);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path()).unwrap();
        store
            .save("payloads", &[r#"{"n":1}"#.into(), r#"{"n":2}"#.into()])
            .unwrap();
        let loaded = store.load("payloads").unwrap();
        assert_eq!(loaded, vec![r#"{"n":1}"#, r#"{"n":2}"#]);
    }

    #[test]
    fn file_store_missing_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path()).unwrap();
        assert!(store.load("never-saved").unwrap().is_empty());
    }

    #[test]
    fn file_store_namespaces_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path()).unwrap();
        store.save("payloads", &["p".into()]).unwrap();
        store.save("responses", &["r".into()]).unwrap();
        assert_eq!(store.load("payloads").unwrap(), vec!["p"]);
        assert_eq!(store.load("responses").unwrap(), vec!["r"]);
    }
}
