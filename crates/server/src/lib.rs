//! elix-server: HTTP JSON API for the Elix asset dashboard.
//!
//! Built on `axum` + `tokio`. Every route is a thin wrapper over one
//! [`elix_core::MaintenanceService`] operation.
//!
//! Security features:
//! - Bearer authentication on every data route, verified by an
//!   [`identity::IdentityProvider`]
//! - CORS headers on all responses (any origin)
//! - Per-IP rate limiting (default: 120 req/min, 0 disables)
//! - Request body cap (default: 10 MB)
//!
//! Public endpoints:
//! - GET  /health
//! - POST /auth/signup
//! - POST /create-demo-user
//! - GET  /demo/performance-metrics
//! - GET  /demo/realtime-updates
//!
//! Authenticated endpoints:
//! - GET  /auth/profile
//! - GET  /assets, POST /assets
//! - GET|PUT|DELETE /assets/{id}, PUT /assets/{id}/status
//! - GET  /alerts, POST /alerts
//! - POST /work-orders, GET /work-orders/asset/{assetId}
//! - PUT  /work-orders/{id}/status
//! - GET  /performance/overview, GET /performance/categories
//! - POST /init-sample-data, POST /init-enhanced-demo (the latter also
//!   provisions the demo account)
//!
//! All responses use Content-Type: application/json; errors are
//! `{"error": "<message>"}`.

pub mod config;
mod error;
mod handlers;
pub mod identity;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use self::config::{ConfigError, ServerConfig};
pub use self::error::ApiError;
pub use self::state::{AppState, RateLimiter};

use self::handlers::*;
use self::middleware::{auth_middleware, rate_limit_middleware};

/// Construct a JSON error response with the given status code and message.
pub(crate) fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({ "error": message })))
}

/// Assemble the full router: public and authenticated routes, fallback,
/// rate limiting, request tracing, CORS and the body cap.
pub fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let public = Router::new()
        .route("/health", get(handle_health))
        .route("/auth/signup", post(handle_signup))
        .route("/create-demo-user", post(handle_create_demo_user))
        .route("/demo/performance-metrics", get(handle_demo_metrics))
        .route("/demo/realtime-updates", get(handle_realtime_updates));

    let protected = Router::new()
        .route("/auth/profile", get(handle_profile))
        .route("/assets", get(handle_list_assets).post(handle_create_asset))
        .route(
            "/assets/{id}",
            get(handle_get_asset)
                .put(handle_update_asset)
                .delete(handle_delete_asset),
        )
        .route("/assets/{id}/status", put(handle_update_asset_status))
        .route("/alerts", get(handle_list_alerts).post(handle_create_alert))
        .route("/work-orders", post(handle_create_work_order))
        .route("/work-orders/asset/{asset_id}", get(handle_asset_work_orders))
        .route(
            "/work-orders/{id}/status",
            put(handle_update_work_order_status),
        )
        .route("/performance/overview", get(handle_performance_overview))
        .route("/performance/categories", get(handle_performance_categories))
        .route("/init-sample-data", post(handle_init_sample_data))
        .route("/init-enhanced-demo", post(handle_init_enhanced_demo))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Start the HTTP server described by `config` and run until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(&config).await?);
    if config.rate_limit == 0 {
        tracing::info!("rate limiting disabled");
    } else {
        tracing::info!(
            "rate limit: {} requests per minute per IP",
            config.rate_limit
        );
    }

    let app = build_router(state, config.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!("elix listening on http://{}", listener.local_addr()?);

    serve(listener, app).await?;
    tracing::info!("server shut down");
    Ok(())
}

/// Serve `app` on an already bound listener until Ctrl+C. Client IPs are
/// exposed to the rate limiter through connection info.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
