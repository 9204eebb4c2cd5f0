use std::future::Future;

use serde_json::json;

use super::{asset_value, expect_eq, TestResult};
use crate::RecordStore;

pub(super) async fn run_scan_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "scan",
            "scan_empty_store_returns_nothing",
            scan_empty_store_returns_nothing(factory).await,
        ),
        TestResult::from_result(
            "scan",
            "scan_isolates_prefixes",
            scan_isolates_prefixes(factory).await,
        ),
        TestResult::from_result(
            "scan",
            "scan_orders_by_key",
            scan_orders_by_key(factory).await,
        ),
        TestResult::from_result(
            "scan",
            "scan_excludes_deleted",
            scan_excludes_deleted(factory).await,
        ),
        TestResult::from_result(
            "scan",
            "keys_match_scanned_values",
            keys_match_scanned_values(factory).await,
        ),
        TestResult::from_result(
            "scan",
            "set_many_visible_to_scan",
            set_many_visible_to_scan(factory).await,
        ),
    ]
}

async fn scan_empty_store_returns_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let values = s.scan_prefix("asset:").await.map_err(|e| e.to_string())?;
    expect_eq("scan of empty store", values.len(), 0)
}

async fn scan_isolates_prefixes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for (key, value) in [
        ("asset:HM-001", asset_value("HM-001", "operational")),
        ("alert:PA-001", json!({"id": "PA-001"})),
        ("assets-index", json!(["HM-001"])),
        ("asset:HM-002", asset_value("HM-002", "warning")),
        ("work_order:WO-1", json!({"id": "WO-1"})),
    ] {
        s.set(key, value).await.map_err(|e| e.to_string())?;
    }

    let assets = s.scan_prefix("asset:").await.map_err(|e| e.to_string())?;
    expect_eq("asset count", assets.len(), 2)?;
    for a in &assets {
        if a.get("type").is_none() {
            return Err(format!("non-asset value in asset scan: {a}"));
        }
    }
    let alerts = s.scan_prefix("alert:").await.map_err(|e| e.to_string())?;
    expect_eq("alert count", alerts.len(), 1)
}

async fn scan_orders_by_key<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for id in ["C", "A", "B"] {
        s.set(&format!("asset:{id}"), asset_value(id, "operational"))
            .await
            .map_err(|e| e.to_string())?;
    }
    let ids: Vec<String> = s
        .scan_prefix("asset:")
        .await
        .map_err(|e| e.to_string())?
        .iter()
        .filter_map(|v| v["id"].as_str().map(str::to_string))
        .collect();
    expect_eq("scan order", ids, vec!["A".into(), "B".into(), "C".into()])
}

async fn scan_excludes_deleted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.set("alert:1", json!({"id": "1"}))
        .await
        .map_err(|e| e.to_string())?;
    s.set("alert:2", json!({"id": "2"}))
        .await
        .map_err(|e| e.to_string())?;
    s.delete("alert:1").await.map_err(|e| e.to_string())?;
    let values = s.scan_prefix("alert:").await.map_err(|e| e.to_string())?;
    expect_eq("scan after delete", values, vec![json!({"id": "2"})])
}

async fn keys_match_scanned_values<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.set("user:b", json!({"id": "b"}))
        .await
        .map_err(|e| e.to_string())?;
    s.set("user:a", json!({"id": "a"}))
        .await
        .map_err(|e| e.to_string())?;
    s.set("asset:z", json!({"id": "z"}))
        .await
        .map_err(|e| e.to_string())?;
    let keys = s.keys_with_prefix("user:").await.map_err(|e| e.to_string())?;
    expect_eq(
        "user keys",
        keys,
        vec!["user:a".to_string(), "user:b".to_string()],
    )
}

async fn set_many_visible_to_scan<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let batch = (1..=5)
        .map(|i| (format!("work_order:WO-{i}"), json!({"id": format!("WO-{i}")})))
        .collect();
    s.set_many(batch).await.map_err(|e| e.to_string())?;
    let values = s
        .scan_prefix("work_order:")
        .await
        .map_err(|e| e.to_string())?;
    expect_eq("batch size", values.len(), 5)
}
