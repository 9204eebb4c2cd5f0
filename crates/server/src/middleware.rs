//! HTTP middleware: rate limiting and bearer authentication.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ApiError;
use crate::identity::AuthError;
use crate::state::AppState;

/// Rate limiting middleware. Checks per-IP request rate before routing.
///
/// Requests without connection info (in-process test clients) are not
/// limited.
pub(crate) async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let Some(ip) = ip else {
        return next.run(request).await;
    };

    match state.rate_limiter.check(ip).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(%ip, retry_after, "rate limit exceeded");
            let body = serde_json::json!({
                "error": "rate limit exceeded",
                "retry_after": retry_after,
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
    }
}

/// The token part of an `Authorization` header: the second
/// whitespace-separated word, whatever the scheme.
fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().nth(1))
}

/// Bearer authentication for protected routes.
///
/// Verifies the token with the configured identity provider and stores the
/// resulting [`crate::identity::Identity`] in the request extensions.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request).map(str::to_string) else {
        return ApiError::from(AuthError::MissingToken).into_response();
    };

    match state.identity.verify(&token).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(AuthError::Unavailable(message)) => {
            tracing::error!(%message, "identity provider unavailable");
            ApiError::from(AuthError::InvalidToken).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
