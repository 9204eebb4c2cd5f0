//! In-memory backend, used for development servers and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::traits::RecordStore;

/// Ordered map behind an async lock. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `entries`.
    pub fn with_entries(entries: BTreeMap<String, Value>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Copy of every entry, in key order.
    pub async fn dump(&self) -> BTreeMap<String, Value> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Collect `(key, value)` pairs under `prefix` from an ordered map.
pub(crate) fn prefix_range<'a>(
    map: &'a BTreeMap<String, Value>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
    map.range(prefix.to_string()..)
        .take_while(move |(k, _)| k.starts_with(prefix))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
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
        entries.extend(batch);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn clone_shares_storage() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.set("asset:1", json!({"id": "1"})).await.unwrap();
        assert_eq!(clone.get("asset:1").await.unwrap(), Some(json!({"id": "1"})));
    }

    #[tokio::test]
    async fn prefix_scan_stops_at_prefix_boundary() {
        let store = MemoryStore::new();
        store.set("alert:a", json!(1)).await.unwrap();
        store.set("alerts", json!(2)).await.unwrap();
        store.set("asset:a", json!(3)).await.unwrap();
        store.set("alert:b", json!(4)).await.unwrap();

        let values = store.scan_prefix("alert:").await.unwrap();
        assert_eq!(values, vec![json!(1), json!(4)]);
    }

    #[tokio::test]
    async fn with_entries_and_dump() {
        let mut seed = BTreeMap::new();
        seed.insert("user:1".to_string(), json!({"id": "1"}));
        let store = MemoryStore::with_entries(seed.clone());
        assert_eq!(store.len().await, 1);
        assert_eq!(store.dump().await, seed);
    }
}
