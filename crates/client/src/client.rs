//! HTTP client for the Elix API.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so calls never
//! block the async runtime.

use std::time::Duration;

use elix_core::metrics::{CategoryPerformance, DemoMetrics, PerformanceOverview};
use elix_core::realtime::RealtimeFeed;
use elix_core::sample::SnapshotStats;
use elix_core::{Asset, PredictiveAlert, Snapshot, UserProfile, WorkOrder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::demo::DemoData;
use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// The account created by a sign-up.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignedUpUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignUpOutcome {
    pub user: SignedUpUser,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Typed access to every Elix route.
///
/// ```no_run
/// # async fn demo() -> Result<(), elix_client::ClientError> {
/// let client = elix_client::DashboardClient::new("http://localhost:8080").with_token("dev-token");
/// let assets = client.assets().await?;
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct DashboardClient {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
    demo: DemoData,
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(REQUEST_TIMEOUT))
                .build(),
        );
        DashboardClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            agent,
            demo: DemoData::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replace the record set the `*_or_demo` calls fall back to.
    pub fn with_demo_data(mut self, demo: DemoData) -> Self {
        self.demo = demo;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn demo_data(&self) -> &DemoData {
        &self.demo
    }

    async fn send(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let agent = self.agent.clone();
        let token = self.token.clone();

        tracing::debug!(?verb, %url, "elix request");
        tokio::task::spawn_blocking(move || execute(&agent, verb, &url, token.as_deref(), body))
            .await
            .map_err(|e| ClientError::Join(e.to_string()))?
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Value>,
        field: Option<&str>,
    ) -> Result<T, ClientError> {
        let mut value = self.send(verb, path, body).await?;
        let value = match field {
            Some(key) => value.get_mut(key).map(Value::take).unwrap_or(Value::Null),
            None => value,
        };
        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    // Public routes

    /// `GET /health`, returning the server timestamp.
    pub async fn health(&self) -> Result<String, ClientError> {
        self.fetch(Verb::Get, "/health", None, Some("timestamp")).await
    }

    pub async fn sign_up(&self, request: &SignUp) -> Result<SignUpOutcome, ClientError> {
        let body = serde_json::to_value(request).map_err(|e| ClientError::Decode {
            path: "/auth/signup".into(),
            message: e.to_string(),
        })?;
        self.fetch(Verb::Post, "/auth/signup", Some(body), None).await
    }

    /// `POST /create-demo-user`. Succeeds whether or not the account existed.
    pub async fn create_demo_user(&self) -> Result<SignedUpUser, ClientError> {
        self.fetch(Verb::Post, "/create-demo-user", None, Some("user")).await
    }

    pub async fn demo_performance_metrics(&self) -> Result<DemoMetrics, ClientError> {
        self.fetch(Verb::Get, "/demo/performance-metrics", None, None).await
    }

    pub async fn realtime_updates(&self) -> Result<RealtimeFeed, ClientError> {
        self.fetch(Verb::Get, "/demo/realtime-updates", None, None).await
    }

    // Authenticated routes

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.fetch(Verb::Get, "/auth/profile", None, Some("profile")).await
    }

    pub async fn assets(&self) -> Result<Vec<Asset>, ClientError> {
        self.fetch(Verb::Get, "/assets", None, Some("assets")).await
    }

    pub async fn asset(&self, id: &str) -> Result<Asset, ClientError> {
        self.fetch(Verb::Get, &format!("/assets/{}", segment(id)), None, Some("asset")).await
    }

    /// Create an asset from a partial record; `type` is required.
    pub async fn create_asset(&self, asset: Value) -> Result<Asset, ClientError> {
        self.fetch(Verb::Post, "/assets", Some(asset), Some("asset")).await
    }

    pub async fn update_asset(&self, id: &str, patch: Value) -> Result<Asset, ClientError> {
        self.fetch(Verb::Put, &format!("/assets/{}", segment(id)), Some(patch), Some("asset")).await
    }

    pub async fn update_asset_status(&self, id: &str, status: &str) -> Result<Asset, ClientError> {
        let path = format!("/assets/{}/status", segment(id));
        let body = json!({ "status": status });
        self.fetch(Verb::Put, &path, Some(body), Some("asset")).await
    }

    pub async fn delete_asset(&self, id: &str) -> Result<(), ClientError> {
        self.send(Verb::Delete, &format!("/assets/{}", segment(id)), None).await?;
        Ok(())
    }

    pub async fn alerts(&self) -> Result<Vec<PredictiveAlert>, ClientError> {
        self.fetch(Verb::Get, "/alerts", None, Some("alerts")).await
    }

    pub async fn create_alert(&self, alert: Value) -> Result<PredictiveAlert, ClientError> {
        self.fetch(Verb::Post, "/alerts", Some(alert), Some("alert")).await
    }

    /// Create a work order. An `alertId` in the body marks that alert addressed.
    pub async fn create_work_order(&self, order: Value) -> Result<WorkOrder, ClientError> {
        self.fetch(Verb::Post, "/work-orders", Some(order), Some("workOrder")).await
    }

    pub async fn work_orders_for_asset(&self, asset_id: &str) -> Result<Vec<WorkOrder>, ClientError> {
        let path = format!("/work-orders/asset/{}", segment(asset_id));
        self.fetch(Verb::Get, &path, None, Some("workOrders")).await
    }

    pub async fn update_work_order_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<WorkOrder, ClientError> {
        let path = format!("/work-orders/{}/status", segment(id));
        let mut body = json!({ "status": status });
        if let Some(notes) = notes {
            body["notes"] = Value::String(notes.to_string());
        }
        self.fetch(Verb::Put, &path, Some(body), Some("workOrder")).await
    }

    pub async fn performance_overview(&self) -> Result<PerformanceOverview, ClientError> {
        self.fetch(Verb::Get, "/performance/overview", None, None).await
    }

    pub async fn category_performance(&self) -> Result<Vec<CategoryPerformance>, ClientError> {
        let path = "/performance/categories";
        self.fetch(Verb::Get, path, None, Some("categoryPerformance")).await
    }

    /// Seed the server with the built-in sample records.
    pub async fn init_sample_data(&self) -> Result<SnapshotStats, ClientError> {
        self.fetch(Verb::Post, "/init-sample-data", None, Some("stats")).await
    }

    /// Replace the server's records with `snapshot`.
    pub async fn init_enhanced_demo(&self, snapshot: &Snapshot) -> Result<SnapshotStats, ClientError> {
        let body = serde_json::to_value(snapshot).map_err(|e| ClientError::Decode {
            path: "/init-enhanced-demo".into(),
            message: e.to_string(),
        })?;
        self.fetch(Verb::Post, "/init-enhanced-demo", Some(body), Some("stats")).await
    }

    // Degrade-to-demo variants

    pub async fn assets_or_demo(&self) -> Vec<Asset> {
        or_demo("assets", self.assets().await, || self.demo.assets())
    }

    pub async fn alerts_or_demo(&self) -> Vec<PredictiveAlert> {
        or_demo("alerts", self.alerts().await, || self.demo.alerts())
    }

    pub async fn performance_overview_or_demo(&self) -> PerformanceOverview {
        or_demo("performance overview", self.performance_overview().await, || {
            self.demo.performance_overview(OffsetDateTime::now_utc())
        })
    }

    pub async fn category_performance_or_demo(&self) -> Vec<CategoryPerformance> {
        or_demo("category performance", self.category_performance().await, || {
            self.demo.category_performance()
        })
    }

    pub async fn demo_performance_metrics_or_demo(&self) -> DemoMetrics {
        or_demo("demo metrics", self.demo_performance_metrics().await, || {
            self.demo
                .demo_performance_metrics(OffsetDateTime::now_utc(), &mut rand::thread_rng())
        })
    }

    pub async fn realtime_updates_or_demo(&self) -> RealtimeFeed {
        or_demo("realtime updates", self.realtime_updates().await, || {
            self.demo
                .realtime_updates(OffsetDateTime::now_utc(), &mut rand::thread_rng())
        })
    }
}

/// Percent-encode a record id for use as one path segment. Generated ids
/// embed the asset type, which may contain spaces.
fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

fn or_demo<T>(what: &str, result: Result<T, ClientError>, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "{what} unavailable, using demo data");
            fallback()
        }
    }
}

fn authorized<B>(request: ureq::RequestBuilder<B>, auth: Option<&str>) -> ureq::RequestBuilder<B> {
    match auth {
        Some(value) => request.header("Authorization", value),
        None => request,
    }
}

fn with_body(
    request: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<Value>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => request.send_json(&body),
        None => request.send_empty(),
    }
}

fn execute(
    agent: &ureq::Agent,
    verb: Verb,
    url: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<Value, ClientError> {
    let auth = token.map(|t| format!("Bearer {t}"));
    let auth = auth.as_deref();

    let sent = match verb {
        Verb::Get => authorized(agent.get(url), auth).call(),
        Verb::Delete => authorized(agent.delete(url), auth).call(),
        Verb::Post => with_body(authorized(agent.post(url), auth), body),
        Verb::Put => with_body(authorized(agent.put(url), auth), body),
    };
    let mut response = sent.map_err(|e| ClientError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let status = response.status().as_u16();
    let value: Value = response.body_mut().read_json().unwrap_or(Value::Null);
    if !(200..300).contains(&status) {
        return Err(ClientError::Status {
            status,
            message: error_message(&value, status),
        });
    }
    Ok(value)
}

fn error_message(body: &Value, status: u16) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = DashboardClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            error_message(&json!({ "error": "Asset not found" }), 404),
            "Asset not found"
        );
        assert_eq!(
            error_message(&Value::Null, 502),
            "request failed with status 502"
        );
    }

    #[test]
    fn sign_up_omits_absent_fields() {
        let body = serde_json::to_value(SignUp {
            email: "ops@example.com".into(),
            password: "hunter22".into(),
            name: None,
            role: Some("technician".into()),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "email": "ops@example.com", "password": "hunter22", "role": "technician" })
        );
    }

    #[test]
    fn generated_ids_become_valid_path_segments() {
        assert_eq!(segment("HM-001"), "HM-001");
        assert_eq!(segment("heavy machinery-1700000000000"), "heavy%20machinery-1700000000000");
        assert_eq!(segment("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn or_demo_falls_back_on_error() {
        let failed: Result<u32, ClientError> = Err(ClientError::Join("boom".into()));
        assert_eq!(or_demo("number", failed, || 7), 7);
        assert_eq!(or_demo("number", Ok(3), || 7), 3);
    }
}
