use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// The key-value contract every Elix backend provides.
///
/// Records are JSON values stored under string keys of the form
/// `<collection prefix><id>` (e.g. `asset:HM-001`). Operations are
/// single-key reads and writes plus a prefix scan.
///
/// ## Consistency
///
/// Each `get`, `set` and `delete` is atomic for its own key. Nothing is
/// atomic across keys: a read-modify-write sequence issued by a caller can
/// interleave with another caller's writes, and the last write wins.
///
/// ## Scans
///
/// `scan_prefix` returns every record whose key starts with the prefix, in
/// ascending key order. There is no pagination; callers assume the whole
/// prefix set fits in memory.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can live behind
/// an `Arc<dyn RecordStore>` in axum application state.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove `key`. Returns `true` if a value was present.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Return all values whose key starts with `prefix`, ordered by key.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError>;

    /// Return all keys starting with `prefix`, ordered.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Store several entries. Not atomic: a failure part-way leaves the
    /// earlier entries written.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(&key, value).await?;
        }
        Ok(())
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &str;
}
