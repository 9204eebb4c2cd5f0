use elix_store::StoreError;

/// Errors returned by [`crate::MaintenanceService`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No record with the given id in the collection.
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// The request payload could not be turned into a record.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A work order status change out of a terminal state.
    #[error("work order {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub(crate) fn not_found(collection: &'static str, id: &str) -> Self {
        ServiceError::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}
