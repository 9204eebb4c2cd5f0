use thiserror::Error;

/// Failures surfaced by [`crate::DashboardClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (connection refused, DNS, TLS).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("task join error: {0}")]
    Join(String),
}

impl ClientError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
