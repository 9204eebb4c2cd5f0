/// All errors that can be returned by a RecordStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A stored value could not be decoded into the requested record type.
    #[error("failed to decode record {key}: {message}")]
    Decode { key: String, message: String },

    /// A value could not be serialized for storage.
    #[error("failed to encode record {key}: {message}")]
    Encode { key: String, message: String },

    /// Reading or writing the backing file failed.
    #[error("store i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A backend-specific storage error (connection, corruption, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
