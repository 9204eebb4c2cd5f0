use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use super::{expect_eq, TestResult};
use crate::RecordStore;

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_writes_distinct_keys_all_land",
            concurrent_writes_distinct_keys_all_land(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_writes_same_key_one_survives",
            concurrent_writes_same_key_one_survives(factory).await,
        ),
    ]
}

/// N tasks each write their own key; every write must be visible afterwards.
async fn concurrent_writes_distinct_keys_all_land<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            s.set(&format!("asset:A-{i:02}"), json!({ "id": format!("A-{i:02}") }))
                .await
        }));
    }
    for h in handles {
        h.await
            .map_err(|e| format!("join: {e}"))?
            .map_err(|e| format!("set: {e}"))?;
    }

    let values = store
        .scan_prefix("asset:")
        .await
        .map_err(|e| e.to_string())?;
    expect_eq("records written", values.len(), N)
}

/// N tasks overwrite one key. Last write wins: exactly one of the written
/// values remains and it is intact.
async fn concurrent_writes_same_key_one_survives<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            s.set("alert:PA-1", json!({ "id": "PA-1", "writer": i }))
                .await
        }));
    }
    for h in handles {
        h.await
            .map_err(|e| format!("join: {e}"))?
            .map_err(|e| format!("set: {e}"))?;
    }

    let value = store
        .get("alert:PA-1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("key missing after concurrent writes")?;
    let writer = value["writer"]
        .as_u64()
        .ok_or_else(|| format!("corrupt value: {value}"))?;
    if writer as usize >= N {
        return Err(format!("unexpected writer {writer}"));
    }
    expect_eq(
        "records under prefix",
        store
            .scan_prefix("alert:")
            .await
            .map_err(|e| e.to_string())?
            .len(),
        1,
    )
}
