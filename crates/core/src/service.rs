//! Use cases behind the HTTP surface.
//!
//! Every handler in the server is a thin wrapper over one method here. The
//! service owns no state besides the injected store and the KPI settings;
//! aggregations scan the collections and hand the slices to [`crate::metrics`].

use std::cmp::Ordering;
use std::sync::Arc;

use elix_store::RecordStore;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::ServiceError;
use crate::metrics::{self, CategoryPerformance, DemoMetrics, KpiSettings, PerformanceOverview};
use crate::realtime::{self, RealtimeFeed};
use crate::record::{
    parse_timestamp, timestamp, unix_millis, AlertStatus, Asset, AssetStatus, Collection,
    PredictiveAlert, UserProfile, WorkOrder, WorkOrderStatus,
};
use crate::repository::Repository;
use crate::sample::{Snapshot, SnapshotStats};
use crate::trends::Trends;

/// Source of "now". Swapped out in tests to pin timestamps and ids.
pub type Clock = fn() -> OffsetDateTime;

#[derive(Clone)]
pub struct MaintenanceService {
    repo: Repository,
    settings: KpiSettings,
    clock: Clock,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        MaintenanceService {
            repo: Repository::new(store),
            settings: KpiSettings::default(),
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_settings(mut self, settings: KpiSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &KpiSettings {
        &self.settings
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    /// `<stem><unix millis>`, bumped forward while the key is taken so two
    /// creations in the same millisecond do not overwrite each other.
    async fn fresh_id<R: Collection>(&self, stem: &str, now: OffsetDateTime) -> Result<String, ServiceError> {
        let mut millis = unix_millis(now);
        loop {
            let id = format!("{stem}{millis}");
            if !self.repo.contains::<R>(&id).await? {
                return Ok(id);
            }
            millis += 1;
        }
    }

    async fn require<R: Collection>(&self, id: &str) -> Result<R, ServiceError> {
        self.repo
            .get::<R>(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(R::NAME, id))
    }

    // Assets

    pub async fn list_assets(&self) -> Result<Vec<Asset>, ServiceError> {
        Ok(self.repo.all().await?)
    }

    pub async fn get_asset(&self, id: &str) -> Result<Asset, ServiceError> {
        self.require(id).await
    }

    /// Create an asset from a partial JSON body. `type` is required; any
    /// `id` in the body is replaced by a generated one.
    pub async fn create_asset(&self, body: Value, created_by: &str) -> Result<Asset, ServiceError> {
        let mut fields = into_object(body)?;
        let kind = match fields.get("type").and_then(Value::as_str) {
            Some(kind) if !kind.trim().is_empty() => kind.to_lowercase(),
            _ => return Err(ServiceError::InvalidInput("asset type is required".into())),
        };

        let now = self.now();
        let id = self.fresh_id::<Asset>(&format!("{kind}-"), now).await?;
        let stamp = timestamp(now);
        fields.insert("id".into(), Value::String(id));
        fields
            .entry("status")
            .or_insert_with(|| Value::String(AssetStatus::Operational.to_string()));
        fields.insert("created_by".into(), Value::String(created_by.to_string()));
        fields.insert("created_at".into(), Value::String(stamp.clone()));
        fields.insert("updated_at".into(), Value::String(stamp));

        let asset: Asset = from_fields(fields)?;
        self.repo.put(&asset).await?;
        tracing::info!(asset_id = %asset.id, kind = %asset.asset_type, "asset created");
        Ok(asset)
    }

    /// Merge `patch` into the stored asset. `id`, `created_by` and
    /// `created_at` cannot be changed this way.
    pub async fn update_asset(&self, id: &str, patch: Value) -> Result<Asset, ServiceError> {
        let patch = into_object(patch)?;
        let current: Asset = self.require(id).await?;
        let mut fields = to_fields(&current)?;
        for (key, value) in patch {
            if matches!(key.as_str(), "id" | "created_by" | "created_at") {
                continue;
            }
            if key == "status" {
                check_asset_status(&value)?;
            }
            fields.insert(key, value);
        }
        fields.insert("updated_at".into(), Value::String(timestamp(self.now())));

        let asset: Asset = from_fields(fields)?;
        self.repo.put(&asset).await?;
        tracing::info!(asset_id = %asset.id, "asset updated");
        Ok(asset)
    }

    /// Set an asset's status. Only the known status vocabulary is accepted.
    pub async fn update_asset_status(&self, id: &str, status: &str) -> Result<Asset, ServiceError> {
        let status = known_asset_status(status)?;
        let mut asset: Asset = self.require(id).await?;
        let previous = asset.status.replace(status);
        asset.updated_at = Some(timestamp(self.now()));
        self.repo.put(&asset).await?;
        tracing::info!(
            asset_id = %asset.id,
            from = previous.as_ref().map(AssetStatus::as_str).unwrap_or("none"),
            to = %asset.status.as_ref().map(AssetStatus::as_str).unwrap_or("none"),
            "asset status changed"
        );
        Ok(asset)
    }

    pub async fn delete_asset(&self, id: &str) -> Result<(), ServiceError> {
        if !self.repo.remove::<Asset>(id).await? {
            return Err(ServiceError::not_found(Asset::NAME, id));
        }
        tracing::info!(asset_id = %id, "asset deleted");
        Ok(())
    }

    // Alerts

    /// All alerts, most urgent first.
    pub async fn list_alerts(&self) -> Result<Vec<PredictiveAlert>, ServiceError> {
        let alerts = self.repo.all().await?;
        Ok(metrics::rank_alerts(alerts))
    }

    /// Create an alert from a partial body. New alerts are always `active`.
    pub async fn create_alert(&self, body: Value, created_by: &str) -> Result<PredictiveAlert, ServiceError> {
        let mut fields = into_object(body)?;
        let now = self.now();
        let id = self.fresh_id::<PredictiveAlert>("PA-", now).await?;
        fields.insert("id".into(), Value::String(id));
        fields.insert("status".into(), Value::String(AlertStatus::Active.to_string()));
        fields.insert("created_by".into(), Value::String(created_by.to_string()));
        fields.insert("created_at".into(), Value::String(timestamp(now)));

        let alert: PredictiveAlert = from_fields(fields)?;
        self.repo.put(&alert).await?;
        tracing::info!(alert_id = %alert.id, asset_id = %alert.asset_id, "alert created");
        Ok(alert)
    }

    // Work orders

    /// Create a work order. When it names an `alertId` that exists, that
    /// alert is marked `addressed` and linked to the new order.
    pub async fn create_work_order(&self, body: Value, created_by: &str) -> Result<WorkOrder, ServiceError> {
        let mut fields = into_object(body)?;
        let now = self.now();
        let stamp = timestamp(now);
        let id = self.fresh_id::<WorkOrder>("WO-", now).await?;
        fields.insert("id".into(), Value::String(id));
        match fields.get("status") {
            Some(Value::String(s)) if !s.is_empty() => {}
            _ => {
                fields.insert("status".into(), Value::String(WorkOrderStatus::Pending.to_string()));
            }
        }
        fields
            .entry("createdDate")
            .or_insert_with(|| Value::String(stamp.clone()));
        fields.insert("created_by".into(), Value::String(created_by.to_string()));
        fields.insert("created_at".into(), Value::String(stamp.clone()));

        let order: WorkOrder = from_fields(fields)?;
        self.repo.put(&order).await?;
        tracing::info!(work_order_id = %order.id, asset_id = %order.asset_id, "work order created");

        if let Some(alert_id) = order.alert_id.as_deref().filter(|a| !a.is_empty()) {
            if let Err(err) = self.address_alert(alert_id, &order.id, &stamp).await {
                tracing::warn!(%alert_id, work_order_id = %order.id, error = %err, "could not mark alert addressed");
            }
        }
        Ok(order)
    }

    async fn address_alert(&self, alert_id: &str, work_order_id: &str, stamp: &str) -> Result<(), ServiceError> {
        let Some(mut alert) = self.repo.get::<PredictiveAlert>(alert_id).await? else {
            tracing::debug!(%alert_id, "work order references unknown alert");
            return Ok(());
        };
        alert.status = Some(AlertStatus::Addressed);
        alert.work_order_id = Some(work_order_id.to_string());
        alert.updated_at = Some(stamp.to_string());
        self.repo.put(&alert).await?;
        Ok(())
    }

    /// Work orders for one asset, newest `created_at` first. Orders without
    /// a readable timestamp come last.
    pub async fn work_orders_for_asset(&self, asset_id: &str) -> Result<Vec<WorkOrder>, ServiceError> {
        let mut orders: Vec<WorkOrder> = self
            .repo
            .all::<WorkOrder>()
            .await?
            .into_iter()
            .filter(|wo| wo.asset_id == asset_id)
            .collect();
        orders.sort_by(newest_first);
        Ok(orders)
    }

    pub async fn update_work_order_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<String>,
    ) -> Result<WorkOrder, ServiceError> {
        let next = WorkOrderStatus::from(status);
        if let WorkOrderStatus::Other(raw) = &next {
            return Err(ServiceError::InvalidInput(format!("unknown work order status: {raw}")));
        }

        let mut order: WorkOrder = self.require(id).await?;
        let current = order.status.clone().unwrap_or(WorkOrderStatus::Pending);
        if !current.can_transition_to(&next) {
            return Err(ServiceError::InvalidTransition {
                id: id.to_string(),
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        let stamp = timestamp(self.now());
        match next {
            WorkOrderStatus::InProgress if order.started_date.is_none() => {
                order.started_date = Some(stamp.clone());
            }
            WorkOrderStatus::Completed if current != WorkOrderStatus::Completed => {
                order.completed_date = Some(stamp.clone());
            }
            _ => {}
        }
        if notes.is_some() {
            order.notes = notes;
        }
        order.status = Some(next);
        order.updated_at = Some(stamp);

        self.repo.put(&order).await?;
        tracing::info!(work_order_id = %order.id, from = %current, to = %status, "work order status changed");
        Ok(order)
    }

    // Performance

    pub async fn performance_overview(&self) -> Result<PerformanceOverview, ServiceError> {
        let snapshot = self.snapshot().await?;
        Ok(metrics::performance_overview(
            &snapshot.assets,
            &snapshot.alerts,
            &snapshot.work_orders,
            self.now(),
            &self.settings,
        ))
    }

    pub async fn category_performance(&self) -> Result<Vec<CategoryPerformance>, ServiceError> {
        let assets: Vec<Asset> = self.repo.all().await?;
        Ok(metrics::category_performance(&assets))
    }

    pub async fn demo_performance_metrics(&self) -> Result<DemoMetrics, ServiceError> {
        let snapshot = self.snapshot().await?;
        let trends = Trends::generate(self.now(), &mut rand::thread_rng());
        Ok(metrics::demo_performance_metrics(
            &snapshot.assets,
            &snapshot.alerts,
            &snapshot.work_orders,
            trends,
        ))
    }

    pub async fn realtime_updates(&self) -> Result<RealtimeFeed, ServiceError> {
        let assets: Vec<Asset> = self.repo.all().await?;
        let alerts: Vec<PredictiveAlert> = self.repo.all().await?;
        Ok(realtime::simulate(&assets, &alerts, self.now(), &mut rand::thread_rng()))
    }

    // Bulk data

    /// Every asset, alert and work order currently stored.
    pub async fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        Ok(Snapshot {
            assets: self.repo.all().await?,
            alerts: self.repo.all().await?,
            work_orders: self.repo.all().await?,
        })
    }

    /// Write the built-in sample fleet. Existing records with other ids are
    /// left alone.
    pub async fn seed_sample_data(&self) -> Result<SnapshotStats, ServiceError> {
        let sample = Snapshot::sample();
        self.repo.put_all(&sample.assets).await?;
        self.repo.put_all(&sample.alerts).await?;
        tracing::info!(assets = sample.assets.len(), alerts = sample.alerts.len(), "sample data seeded");
        Ok(sample.stats())
    }

    /// Replace every asset, alert and work order with the snapshot's.
    pub async fn import_snapshot(&self, snapshot: Snapshot) -> Result<SnapshotStats, ServiceError> {
        let removed = self.repo.clear::<Asset>().await?
            + self.repo.clear::<PredictiveAlert>().await?
            + self.repo.clear::<WorkOrder>().await?;
        self.repo.put_all(&snapshot.assets).await?;
        self.repo.put_all(&snapshot.alerts).await?;
        self.repo.put_all(&snapshot.work_orders).await?;
        let stats = snapshot.stats();
        tracing::info!(
            removed,
            assets = stats.assets,
            alerts = stats.alerts,
            work_orders = stats.work_orders,
            "demo snapshot imported"
        );
        Ok(stats)
    }

    // Profiles

    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ServiceError> {
        self.require(user_id).await
    }

    /// Store a profile, stamping `created_at` if it has none.
    pub async fn put_profile(&self, mut profile: UserProfile) -> Result<UserProfile, ServiceError> {
        if profile.created_at.is_none() {
            profile.created_at = Some(timestamp(self.now()));
        }
        self.repo.put(&profile).await?;
        Ok(profile)
    }
}

/// Only the known status vocabulary may be written to an asset.
fn known_asset_status(raw: &str) -> Result<AssetStatus, ServiceError> {
    match AssetStatus::from(raw) {
        AssetStatus::Other(raw) => Err(ServiceError::InvalidInput(format!(
            "unknown asset status: {raw}"
        ))),
        status => Ok(status),
    }
}

fn check_asset_status(value: &Value) -> Result<(), ServiceError> {
    match value {
        Value::String(raw) => known_asset_status(raw).map(|_| ()),
        Value::Null => Ok(()),
        other => Err(ServiceError::InvalidInput(format!(
            "asset status must be a string, got {}",
            json_kind(other)
        ))),
    }
}

fn newest_first(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    let ta = a.created_at.as_deref().and_then(parse_timestamp);
    let tb = b.created_at.as_deref().and_then(parse_timestamp);
    tb.cmp(&ta)
}

fn into_object(body: Value) -> Result<Map<String, Value>, ServiceError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(ServiceError::InvalidInput(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn from_fields<R: DeserializeOwned>(fields: Map<String, Value>) -> Result<R, ServiceError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| ServiceError::InvalidInput(e.to_string()))
}

fn to_fields<R: Collection>(record: &R) -> Result<Map<String, Value>, ServiceError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ServiceError::InvalidInput(format!("{} is not a JSON object", R::NAME))),
        Err(e) => Err(ServiceError::InvalidInput(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AlertPriority;
    use elix_store::MemoryStore;
    use serde_json::json;
    use time::macros::datetime;

    fn fixed_now() -> OffsetDateTime {
        datetime!(2025-03-15 10:00 UTC)
    }

    fn service() -> (MemoryStore, MaintenanceService) {
        let store = MemoryStore::new();
        let svc = MaintenanceService::new(Arc::new(store.clone())).with_clock(fixed_now);
        (store, svc)
    }

    #[tokio::test]
    async fn create_asset_assigns_id_and_audit_fields() {
        let (_, svc) = service();
        let asset = svc
            .create_asset(
                json!({"id": "ignored", "name": "Pump 7", "type": "Pump", "category": "Pumps"}),
                "user-1",
            )
            .await
            .unwrap();

        assert_eq!(asset.id, "pump-1742032800000");
        assert_eq!(asset.status, Some(AssetStatus::Operational));
        assert_eq!(asset.created_by.as_deref(), Some("user-1"));
        assert_eq!(asset.created_at.as_deref(), Some("2025-03-15T10:00:00Z"));
        assert_eq!(svc.get_asset(&asset.id).await.unwrap(), asset);
    }

    #[tokio::test]
    async fn same_millisecond_creations_get_distinct_ids() {
        let (_, svc) = service();
        let a = svc.create_asset(json!({"type": "HVAC"}), "u").await.unwrap();
        let b = svc.create_asset(json!({"type": "HVAC"}), "u").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(svc.list_assets().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_asset_requires_type() {
        let (_, svc) = service();
        let err = svc.create_asset(json!({"name": "nameless"}), "u").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{err:?}");

        let err = svc.create_asset(json!([1, 2]), "u").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{err:?}");
    }

    #[tokio::test]
    async fn update_asset_merges_fields() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();
        let updated = svc
            .update_asset("HM-001", json!({"id": "HIJACK", "efficiency": 91, "firmware": "2.1"}))
            .await
            .unwrap();
        assert_eq!(updated.id, "HM-001");
        assert_eq!(updated.efficiency, Some(91.0));
        assert_eq!(updated.model.as_deref(), Some("CAT 320GC"));
        assert_eq!(updated.extra.get("firmware"), Some(&json!("2.1")));
        assert!(svc.repository().get::<Asset>("HIJACK").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn asset_patch_validates_status() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();

        let err = svc
            .update_asset("HVAC-001", json!({"status": "exploded"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{err}");
        let err = svc
            .update_asset("HVAC-001", json!({"status": 3}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{err}");
        let stored: Asset = svc.get_asset("HVAC-001").await.unwrap();
        assert_eq!(stored.status, Some(AssetStatus::Critical));

        let patched = svc
            .update_asset("HVAC-001", json!({"status": "offline", "name": "Chiller 1"}))
            .await
            .unwrap();
        assert_eq!(patched.status, Some(AssetStatus::Offline));
    }

    #[tokio::test]
    async fn asset_status_update_validates_vocabulary() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();

        let asset = svc.update_asset_status("HVAC-001", "maintenance").await.unwrap();
        assert_eq!(asset.status, Some(AssetStatus::Maintenance));
        assert_eq!(asset.updated_at.as_deref(), Some("2025-03-15T10:00:00Z"));

        let err = svc.update_asset_status("HVAC-001", "exploded").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = svc.update_asset_status("nope", "offline").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_asset_reports_missing() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();
        svc.delete_asset("HM-001").await.unwrap();
        let err = svc.delete_asset("HM-001").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { collection: "asset", .. }));
    }

    #[tokio::test]
    async fn new_alerts_are_active_and_ranked() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();
        let alert = svc
            .create_alert(
                json!({"assetId": "HM-001", "priority": "critical", "riskPercentage": 95, "status": "resolved"}),
                "u",
            )
            .await
            .unwrap();
        assert_eq!(alert.id, "PA-1742032800000");
        assert_eq!(alert.status, Some(AlertStatus::Active));

        let ids: Vec<String> = svc.list_alerts().await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["PA-1742032800000", "PA-002", "PA-001"]);
    }

    #[tokio::test]
    async fn work_order_addresses_its_alert() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();

        let order = svc
            .create_work_order(json!({"assetId": "HM-002", "alertId": "PA-001", "cost": 1200}), "u")
            .await
            .unwrap();
        assert_eq!(order.status, Some(WorkOrderStatus::Pending));

        let alert: PredictiveAlert = svc.repository().get("PA-001").await.unwrap().unwrap();
        assert_eq!(alert.status, Some(AlertStatus::Addressed));
        assert_eq!(alert.work_order_id.as_deref(), Some(order.id.as_str()));
        assert_eq!(alert.updated_at.as_deref(), Some("2025-03-15T10:00:00Z"));
        assert_eq!(alert.priority, Some(AlertPriority::High));
    }

    #[tokio::test]
    async fn work_order_with_unknown_alert_still_succeeds() {
        let (store, svc) = service();
        let order = svc
            .create_work_order(json!({"assetId": "HM-002", "alertId": "PA-404"}), "u")
            .await
            .unwrap();
        assert!(store.get("alert:PA-404").await.unwrap().is_none());
        assert!(store.get(&format!("work_order:{}", order.id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn work_orders_for_asset_newest_first() {
        let (_, svc) = service();
        let mut old = WorkOrder::new("WO-old", "HM-001");
        old.created_at = Some("2025-01-01T00:00:00Z".into());
        let mut new = WorkOrder::new("WO-new", "HM-001");
        new.created_at = Some("2025-03-01T00:00:00Z".into());
        let undated = WorkOrder::new("WO-undated", "HM-001");
        let other = WorkOrder::new("WO-other", "HM-002");
        svc.repository().put_all(&[undated, old, other, new]).await.unwrap();

        let ids: Vec<String> = svc
            .work_orders_for_asset("HM-001")
            .await
            .unwrap()
            .into_iter()
            .map(|wo| wo.id)
            .collect();
        assert_eq!(ids, ["WO-new", "WO-old", "WO-undated"]);
    }

    #[tokio::test]
    async fn work_order_lifecycle() {
        let (_, svc) = service();
        svc.repository()
            .put(&WorkOrder::new("WO-1", "HM-001").with_status(WorkOrderStatus::Pending))
            .await
            .unwrap();

        let started = svc.update_work_order_status("WO-1", "in_progress", None).await.unwrap();
        assert_eq!(started.started_date.as_deref(), Some("2025-03-15T10:00:00Z"));

        let done = svc
            .update_work_order_status("WO-1", "completed", Some("replaced seal".into()))
            .await
            .unwrap();
        assert_eq!(done.status, Some(WorkOrderStatus::Completed));
        assert_eq!(done.completed_date.as_deref(), Some("2025-03-15T10:00:00Z"));
        assert_eq!(done.notes.as_deref(), Some("replaced seal"));

        let err = svc.update_work_order_status("WO-1", "pending", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }), "{err:?}");

        let err = svc.update_work_order_status("WO-1", "paused", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn pending_can_skip_to_completed() {
        let (_, svc) = service();
        svc.repository().put(&WorkOrder::new("WO-2", "HM-001")).await.unwrap();
        let done = svc.update_work_order_status("WO-2", "completed", None).await.unwrap();
        assert!(done.is_completed());
        assert!(done.started_date.is_none());
    }

    #[tokio::test]
    async fn overview_over_sample_data() {
        let (_, svc) = service();
        svc.seed_sample_data().await.unwrap();
        svc.create_work_order(json!({"assetId": "HVAC-001", "cost": 5000}), "u")
            .await
            .unwrap();

        let overview = svc.performance_overview().await.unwrap();
        assert_eq!(overview.kpis.fleet_readiness, 67);
        assert_eq!(overview.kpis.critical_alerts, 1);
        assert_eq!(overview.kpis.budget_status, 10);
        assert_eq!(overview.kpis.field_team_uptime, 98);
        assert_eq!(overview.totals.total_work_orders, 1);

        let categories = svc.category_performance().await.unwrap();
        assert_eq!(categories[0].category, "Heavy Machinery");
        assert_eq!(categories[0].uptime, 100);
        assert_eq!(categories[1].category, "HVAC Systems");
        assert_eq!(categories[1].uptime, 0);
    }

    #[tokio::test]
    async fn budget_setting_is_honoured() {
        let (_, svc) = service();
        let svc = svc.with_settings(KpiSettings {
            monthly_budget: 10_000.0,
            field_team_uptime: 90,
        });
        svc.create_work_order(json!({"assetId": "a", "cost": 2500}), "u")
            .await
            .unwrap();
        let overview = svc.performance_overview().await.unwrap();
        assert_eq!(overview.kpis.budget_status, 25);
        assert_eq!(overview.kpis.field_team_uptime, 90);
    }

    #[tokio::test]
    async fn import_replaces_existing_records() {
        let (store, svc) = service();
        svc.seed_sample_data().await.unwrap();
        svc.repository().put(&WorkOrder::new("WO-stale", "HM-001")).await.unwrap();

        let snapshot: Snapshot = serde_json::from_value(json!({
            "assets": [{"id": "P-1", "name": "Pump", "type": "Pump", "status": "healthy"}],
            "alerts": [],
            "workOrders": [{"id": "WO-9", "assetId": "P-1", "status": "completed"}]
        }))
        .unwrap();
        let stats = svc.import_snapshot(snapshot).await.unwrap();
        assert_eq!(stats, SnapshotStats { assets: 1, alerts: 0, work_orders: 1 });

        let keys: Vec<String> = store.dump().await.into_keys().collect();
        assert_eq!(keys, ["asset:P-1", "work_order:WO-9"]);
    }

    #[tokio::test]
    async fn demo_feeds_work_over_empty_store() {
        let (_, svc) = service();
        let metrics = svc.demo_performance_metrics().await.unwrap();
        assert_eq!(metrics.kpis.fleet_readiness, 0);
        assert_eq!(metrics.trends.cost_trends.len(), 12);

        let feed = svc.realtime_updates().await.unwrap();
        assert!(feed.updates.is_empty());
        assert_eq!(feed.system_status, "optimal");
    }

    #[tokio::test]
    async fn profiles_round_trip() {
        let (_, svc) = service();
        let err = svc.get_profile("u-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { collection: "profile", .. }));

        let stored = svc
            .put_profile(UserProfile {
                id: "u-1".into(),
                email: "ops@example.com".into(),
                name: "Ops".into(),
                role: crate::record::DEFAULT_ROLE.into(),
                created_at: None,
            })
            .await
            .unwrap();
        assert_eq!(stored.created_at.as_deref(), Some("2025-03-15T10:00:00Z"));
        assert_eq!(svc.get_profile("u-1").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn corrupt_record_surfaces_as_store_error() {
        let (store, svc) = service();
        store.set("asset:bad", json!(42)).await.unwrap();
        let err = svc.list_assets().await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)), "{err:?}");
    }
}
