//! Route handlers. Each one unpacks the request, calls a single
//! [`elix_core::MaintenanceService`] operation and wraps the result.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use elix_core::record::{timestamp, DEFAULT_ROLE};
use elix_core::{Snapshot, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::identity::{Identity, SignUpRequest, DEMO_EMAIL};
use crate::json_error;
use crate::state::AppState;

type ApiResult = Result<Json<Value>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(ApiError::from)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = json!({
        "status": "healthy",
        "timestamp": timestamp(OffsetDateTime::now_utc()),
    });
    (StatusCode::OK, Json(response))
}

// ── Auth ─────────────────────────────────────────────────────────────────────

/// POST /auth/signup
pub(crate) async fn handle_signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let signed = state.identity.sign_up(&request).await?;
    store_profile(&state, &signed.user, &request).await?;
    tracing::info!(user_id = %signed.user.id, "user signed up");

    let mut response = json!({
        "user": signed.user,
        "message": "User created successfully",
    });
    if let Some(token) = signed.access_token {
        response["access_token"] = Value::String(token);
    }
    Ok(Json(response))
}

async fn store_profile(
    state: &AppState,
    user: &Identity,
    request: &SignUpRequest,
) -> Result<UserProfile, ApiError> {
    let profile = UserProfile {
        id: user.id.clone(),
        email: request.email.clone(),
        name: request.name.clone().unwrap_or_default(),
        role: request
            .role
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        created_at: None,
    };
    Ok(state.service.put_profile(profile).await?)
}

/// Make sure the demo account exists. Returns the account and whether this
/// call created it.
async fn ensure_demo_user(state: &AppState) -> Result<(Identity, bool), ApiError> {
    if let Some(user) = state.identity.find_by_email(DEMO_EMAIL).await? {
        return Ok((user, false));
    }
    let request = SignUpRequest::demo();
    let signed = state.identity.sign_up(&request).await?;
    store_profile(state, &signed.user, &request).await?;
    tracing::info!(user_id = %signed.user.id, "demo user created");
    Ok((signed.user, true))
}

/// POST /create-demo-user
pub(crate) async fn handle_create_demo_user(State(state): State<Arc<AppState>>) -> ApiResult {
    let (user, created) = ensure_demo_user(&state).await.map_err(|e| match e {
        ApiError::BadRequest(msg) => {
            ApiError::BadRequest(format!("Failed to create demo user: {msg}"))
        }
        other => other,
    })?;
    let message = if created {
        "Demo user created successfully"
    } else {
        "Demo user already exists"
    };
    Ok(Json(json!({ "message": message, "user": user })))
}

/// GET /auth/profile
pub(crate) async fn handle_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<Identity>,
) -> ApiResult {
    let profile = state.service.get_profile(&user.id).await?;
    Ok(Json(json!({ "profile": profile })))
}

// ── Assets ───────────────────────────────────────────────────────────────────

/// GET /assets
pub(crate) async fn handle_list_assets(State(state): State<Arc<AppState>>) -> ApiResult {
    let assets = state.service.list_assets().await?;
    Ok(Json(json!({ "assets": assets })))
}

/// GET /assets/{id}
pub(crate) async fn handle_get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let asset = state.service.get_asset(&id).await?;
    Ok(Json(json!({ "asset": asset })))
}

/// POST /assets
pub(crate) async fn handle_create_asset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<Identity>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let asset = state.service.create_asset(body(payload)?, &user.id).await?;
    Ok(Json(json!({ "asset": asset, "message": "Asset created successfully" })))
}

/// PUT /assets/{id}
pub(crate) async fn handle_update_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let asset = state.service.update_asset(&id, body(payload)?).await?;
    Ok(Json(json!({ "asset": asset, "message": "Asset updated successfully" })))
}

/// PUT /assets/{id}/status
pub(crate) async fn handle_update_asset_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult {
    let change = body(payload)?;
    let asset = state.service.update_asset_status(&id, &change.status).await?;
    Ok(Json(json!({ "asset": asset, "message": "Asset status updated successfully" })))
}

/// DELETE /assets/{id}
pub(crate) async fn handle_delete_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.service.delete_asset(&id).await?;
    Ok(Json(json!({ "deleted": true, "message": "Asset deleted successfully" })))
}

// ── Alerts & work orders ─────────────────────────────────────────────────────

/// GET /alerts
pub(crate) async fn handle_list_alerts(State(state): State<Arc<AppState>>) -> ApiResult {
    let alerts = state.service.list_alerts().await?;
    Ok(Json(json!({ "alerts": alerts })))
}

/// POST /alerts
pub(crate) async fn handle_create_alert(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<Identity>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let alert = state.service.create_alert(body(payload)?, &user.id).await?;
    Ok(Json(json!({ "alert": alert, "message": "Alert created successfully" })))
}

/// POST /work-orders
pub(crate) async fn handle_create_work_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<Identity>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let order = state.service.create_work_order(body(payload)?, &user.id).await?;
    Ok(Json(json!({ "workOrder": order, "message": "Work order created successfully" })))
}

/// GET /work-orders/asset/{assetId}
pub(crate) async fn handle_asset_work_orders(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> ApiResult {
    let orders = state.service.work_orders_for_asset(&asset_id).await?;
    Ok(Json(json!({ "workOrders": orders })))
}

/// PUT /work-orders/{id}/status
pub(crate) async fn handle_update_work_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult {
    let change = body(payload)?;
    let order = state
        .service
        .update_work_order_status(&id, &change.status, change.notes)
        .await?;
    Ok(Json(json!({
        "workOrder": order,
        "message": "Work order status updated successfully",
    })))
}

// ── Performance ──────────────────────────────────────────────────────────────

/// GET /performance/overview
pub(crate) async fn handle_performance_overview(State(state): State<Arc<AppState>>) -> ApiResult {
    let overview = state.service.performance_overview().await?;
    Ok(Json(to_json(&overview)?))
}

/// GET /performance/categories
pub(crate) async fn handle_performance_categories(State(state): State<Arc<AppState>>) -> ApiResult {
    let categories = state.service.category_performance().await?;
    Ok(Json(json!({ "categoryPerformance": categories })))
}

// ── Demo data ────────────────────────────────────────────────────────────────

/// POST /init-sample-data
pub(crate) async fn handle_init_sample_data(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = state.service.seed_sample_data().await?;
    Ok(Json(json!({
        "message": "Basic sample data initialized successfully",
        "stats": stats,
    })))
}

/// POST /init-enhanced-demo
pub(crate) async fn handle_init_enhanced_demo(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Snapshot>, JsonRejection>,
) -> ApiResult {
    // A failed demo account setup is logged and the import goes ahead.
    if let Err(e) = ensure_demo_user(&state).await {
        tracing::warn!(error = %e, "could not provision demo user");
    }
    let stats = state.service.import_snapshot(body(payload)?).await?;
    Ok(Json(json!({
        "message": "Enhanced demo data initialized successfully",
        "stats": stats,
    })))
}

/// GET /demo/performance-metrics
pub(crate) async fn handle_demo_metrics(State(state): State<Arc<AppState>>) -> ApiResult {
    let metrics = state.service.demo_performance_metrics().await?;
    Ok(Json(to_json(&metrics)?))
}

/// GET /demo/realtime-updates
pub(crate) async fn handle_realtime_updates(State(state): State<Arc<AppState>>) -> ApiResult {
    let feed = state.service.realtime_updates().await?;
    Ok(Json(to_json(&feed)?))
}
