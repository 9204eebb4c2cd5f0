use std::future::Future;

use serde_json::json;

use super::{asset_value, expect_eq, TestResult};
use crate::RecordStore;

pub(super) async fn run_basic_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "basic",
            "get_missing_returns_none",
            get_missing_returns_none(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "set_then_get_returns_value",
            set_then_get_returns_value(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "set_overwrites_previous_value",
            set_overwrites_previous_value(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "delete_existing_returns_true",
            delete_existing_returns_true(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "delete_missing_returns_false",
            delete_missing_returns_false(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "nested_values_round_trip",
            nested_values_round_trip(factory).await,
        ),
    ]
}

async fn get_missing_returns_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let got = s.get("asset:missing").await.map_err(|e| e.to_string())?;
    expect_eq("get missing", got, None)
}

async fn set_then_get_returns_value<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let value = asset_value("HM-001", "operational");
    s.set("asset:HM-001", value.clone())
        .await
        .map_err(|e| e.to_string())?;
    let got = s.get("asset:HM-001").await.map_err(|e| e.to_string())?;
    expect_eq("get after set", got, Some(value))
}

async fn set_overwrites_previous_value<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.set("asset:HM-001", asset_value("HM-001", "operational"))
        .await
        .map_err(|e| e.to_string())?;
    s.set("asset:HM-001", asset_value("HM-001", "critical"))
        .await
        .map_err(|e| e.to_string())?;

    let got = s
        .get("asset:HM-001")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("value vanished after overwrite")?;
    expect_eq("status after overwrite", got["status"].clone(), json!("critical"))
}

async fn delete_existing_returns_true<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.set("work_order:WO-1", json!({"id": "WO-1"}))
        .await
        .map_err(|e| e.to_string())?;
    let existed = s.delete("work_order:WO-1").await.map_err(|e| e.to_string())?;
    expect_eq("delete result", existed, true)?;
    let got = s.get("work_order:WO-1").await.map_err(|e| e.to_string())?;
    expect_eq("get after delete", got, None)
}

async fn delete_missing_returns_false<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let existed = s.delete("alert:nope").await.map_err(|e| e.to_string())?;
    expect_eq("delete missing", existed, false)
}

async fn nested_values_round_trip<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let value = json!({
        "id": "HVAC-001",
        "location": {
            "site": "Riyadh Operations",
            "coordinates": { "lat": 24.7136, "lng": 46.6753 }
        },
        "tags": ["chiller", "critical-path"],
        "efficiency": 45.5,
        "retired": null
    });
    s.set("asset:HVAC-001", value.clone())
        .await
        .map_err(|e| e.to_string())?;
    let got = s.get("asset:HVAC-001").await.map_err(|e| e.to_string())?;
    expect_eq("nested round trip", got, Some(value))
}
