//! Mapping from domain failures to JSON error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use elix_core::ServiceError;

use crate::identity::AuthError;
use crate::json_error;

/// Every error a handler can return. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Malformed input and store failures. The message is passed through.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ServiceError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            ServiceError::InvalidInput(_) | ServiceError::Store(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::SignUpRejected(_) => ApiError::BadRequest(err.to_string()),
            AuthError::Unavailable(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Internal(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        json_error(status, &self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elix_store::StoreError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                ServiceError::NotFound {
                    collection: "asset",
                    id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::InvalidInput("asset type is required".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::InvalidTransition {
                    id: "WO-1".into(),
                    from: "completed".into(),
                    to: "pending".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Store(StoreError::Backend("disk full".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn auth_messages_are_preserved() {
        let err = ApiError::from(AuthError::MissingToken);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "No access token provided");
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).to_string(),
            "Invalid or expired token"
        );
    }
}
