//! JSON-file backend.
//!
//! The whole keyspace lives in memory and is rewritten to a single JSON
//! object on disk after every mutation. Writes go to a sibling temp file
//! which is then renamed over the target, so a crash never leaves a
//! half-written store behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::memory::prefix_range;
use crate::traits::RecordStore;

#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing entries if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
                key: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        tracing::debug!(path = %path.display(), records = entries.len(), "opened json file store");
        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Encode {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        // The write guard is held across the flush so file contents follow
        // mutation order. Memory only changes once the file is written.
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.flush(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next).await?;
        *entries = next;
        Ok(true)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError> {
        let entries = self.entries.read().await;
        Ok(prefix_range(&entries, prefix)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(prefix_range(&entries, prefix)
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn set_many(&self, batch: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.extend(batch);
        self.flush(&next).await?;
        *entries = next;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elix.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.set("asset:HM-001", json!({"id": "HM-001"})).await.unwrap();
        store.set("asset:HM-002", json!({"id": "HM-002"})).await.unwrap();
        assert!(store.delete("asset:HM-002").await.unwrap());
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.keys_with_prefix("asset:").await.unwrap(),
            vec!["asset:HM-001".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nested/new.json"))
            .await
            .unwrap();
        assert!(store.scan_prefix("").await.unwrap().is_empty());
        store.set("k", json!(1)).await.unwrap();
        assert!(dir.path().join("nested/new.json").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = JsonFileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn failed_flush_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let store = JsonFileStore::open(sub.join("elix.json")).await.unwrap();
        store.set("asset:A", json!({"id": "A"})).await.unwrap();

        // A plain file where the directory was makes every flush fail.
        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, b"not a directory").unwrap();

        let err = store.set("asset:B", json!({"id": "B"})).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "{err}");
        assert_eq!(store.get("asset:B").await.unwrap(), None);

        assert!(store.delete("asset:A").await.is_err());
        assert_eq!(store.get("asset:A").await.unwrap(), Some(json!({"id": "A"})));

        let batch = vec![("asset:C".to_string(), json!({"id": "C"}))];
        assert!(store.set_many(batch).await.is_err());
        assert_eq!(
            store.keys_with_prefix("asset:").await.unwrap(),
            vec!["asset:A".to_string()]
        );
    }
}
