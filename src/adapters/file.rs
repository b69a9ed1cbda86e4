//! File-backed parameter store
//!
//! Persists the parameter map as a single JSON document on disk. This is the
//! durable binding the CLI uses when no managed parameter service is wired
//! in; it keeps workflow markers across process restarts, which is all the
//! controller needs from its store.

use crate::adapters::traits::ParameterStore;
use crate::domain::errors::ParamStoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Parameter store persisted as a JSON file
///
/// The whole map is rewritten on every mutation. Parameter sets are tiny
/// (five keys per table), so this stays well within reason.
#[derive(Debug)]
pub struct FileParameterStore {
    path: PathBuf,
    // Serializes read-modify-write sequences within this process.
    lock: Mutex<()>,
}

impl FileParameterStore {
    /// Create a store backed by the JSON file at `path`
    ///
    /// The file is created on first write; a missing file reads as empty.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, ParamStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ParamStoreError::Other(format!(
                    "Corrupt parameter file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ParamStoreError::Other(format!(
                "Failed to read parameter file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), ParamStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ParamStoreError::Other(format!(
                        "Failed to create parameter directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let contents = serde_json::to_string_pretty(map)
            .map_err(|e| ParamStoreError::Other(format!("Failed to encode parameters: {}", e)))?;
        std::fs::write(&self.path, contents).map_err(|e| {
            ParamStoreError::Other(format!(
                "Failed to write parameter file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ParameterStore for FileParameterStore {
    async fn get(&self, key: &str) -> Result<String, ParamStoreError> {
        let _guard = self.lock.lock().expect("file store mutex poisoned");
        self.read_map()?
            .get(key)
            .cloned()
            .ok_or_else(|| ParamStoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ParamStoreError> {
        let _guard = self.lock.lock().expect("file store mutex poisoned");
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    async fn delete(&self, key: &str) -> Result<(), ParamStoreError> {
        let _guard = self.lock.lock().expect("file store mutex poisoned");
        let mut map = self.read_map()?;
        if map.remove(key).is_none() {
            return Err(ParamStoreError::NotFound(key.to_string()));
        }
        self.write_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");

        let store = FileParameterStore::new(&path);
        store
            .put("/tidemark/orders/workflow-state", "PITR_GAP")
            .await
            .unwrap();

        // A fresh store over the same file sees the value
        let reopened = FileParameterStore::new(&path);
        assert_eq!(
            reopened
                .get("/tidemark/orders/workflow-state")
                .await
                .unwrap(),
            "PITR_GAP"
        );
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(dir.path().join("nope.json"));
        assert!(store.get("/k").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(dir.path().join("params.json"));
        store.put("/a", "1").await.unwrap();
        assert!(store.delete("/b").await.unwrap_err().is_not_found());
        store.delete("/a").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileParameterStore::new(&path);
        let err = store.get("/k").await.unwrap_err();
        assert!(matches!(err, ParamStoreError::Other(_)));
        assert!(err.to_string().contains("Corrupt parameter file"));
    }
}
