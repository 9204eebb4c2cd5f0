//! Typed access to the key-value store.

use std::sync::Arc;

use elix_store::{RecordStore, StoreError};
use serde_json::Value;

use crate::record::Collection;

/// Wraps an injected [`RecordStore`] and converts between JSON values and
/// record types. Cheap to clone.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn RecordStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Repository { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Every record of type `R`, in key order.
    ///
    /// A stored value that does not decode as `R` fails the whole scan.
    pub async fn all<R: Collection>(&self) -> Result<Vec<R>, StoreError> {
        let values = self.store.scan_prefix(R::PREFIX).await?;
        values
            .into_iter()
            .map(|value| decode::<R>(R::PREFIX, value))
            .collect()
    }

    pub async fn get<R: Collection>(&self, id: &str) -> Result<Option<R>, StoreError> {
        let key = R::key_for(id);
        match self.store.get(&key).await? {
            Some(value) => decode::<R>(&key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Whether any value, decodable or not, is stored for `id`.
    pub async fn contains<R: Collection>(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&R::key_for(id)).await?.is_some())
    }

    pub async fn put<R: Collection>(&self, record: &R) -> Result<(), StoreError> {
        let key = record.key();
        let value = encode(&key, record)?;
        self.store.set(&key, value).await
    }

    /// Write several records of one type.
    pub async fn put_all<R: Collection>(&self, records: &[R]) -> Result<(), StoreError> {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let key = record.key();
            entries.push((key.clone(), encode(&key, record)?));
        }
        self.store.set_many(entries).await
    }

    pub async fn remove<R: Collection>(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(&R::key_for(id)).await
    }

    /// Delete every record of type `R`. Returns how many were removed.
    pub async fn clear<R: Collection>(&self) -> Result<usize, StoreError> {
        let keys = self.store.keys_with_prefix(R::PREFIX).await?;
        let mut removed = 0;
        for key in keys {
            if self.store.delete(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn decode<R: Collection>(key: &str, value: Value) -> Result<R, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn encode<R: Collection>(key: &str, record: &R) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        message: e.to_string(),
    })
}
