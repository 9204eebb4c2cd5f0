use serde::{Deserialize, Serialize};

use super::{category_performance, critical_alert_count, round_half_up, share_percent, CategoryPerformance};
use crate::record::{parse_timestamp, Asset, PredictiveAlert, WorkOrder};
use crate::trends::Trends;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoKpis {
    pub fleet_readiness: u32,
    pub critical_alerts: usize,
    pub avg_efficiency: f64,
    /// Mean days from creation to completion.
    pub avg_response_time: f64,
    pub total_asset_value: f64,
    pub potential_savings: f64,
    /// Number of completed work orders.
    pub completion_rate: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoTotals {
    pub total_assets: usize,
    pub operational_assets: usize,
    pub total_alerts: usize,
    pub total_work_orders: usize,
    pub active_alerts: usize,
}

/// Body of `GET /demo/performance-metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoMetrics {
    pub kpis: DemoKpis,
    pub totals: DemoTotals,
    pub category_performance: Vec<CategoryPerformance>,
    pub trends: Trends,
}

/// Days between `createdDate` and `completedDate` of completed orders that
/// carry both. Unparseable dates exclude the order.
fn completion_days(work_orders: &[WorkOrder]) -> Vec<f64> {
    work_orders
        .iter()
        .filter(|wo| wo.is_completed())
        .filter_map(|wo| {
            let created = wo.created_date.as_deref().and_then(parse_timestamp)?;
            let completed = wo.completed_date.as_deref().and_then(parse_timestamp)?;
            Some((completed - created).as_seconds_f64() / SECONDS_PER_DAY)
        })
        .collect()
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

pub fn demo_performance_metrics(
    assets: &[Asset],
    alerts: &[PredictiveAlert],
    work_orders: &[WorkOrder],
    trends: Trends,
) -> DemoMetrics {
    let operational = assets.iter().filter(|a| a.is_operational()).count();
    let avg_efficiency = mean(assets.iter().map(|a| a.efficiency.unwrap_or(0.0)));
    let response_days = completion_days(work_orders);
    let total_value: f64 = assets.iter().filter_map(|a| a.value).sum();
    let savings: f64 = alerts.iter().filter_map(|a| a.potential_cost_impact).sum();

    DemoMetrics {
        kpis: DemoKpis {
            fleet_readiness: share_percent(operational, assets.len()),
            critical_alerts: critical_alert_count(alerts),
            avg_efficiency: round_half_up(avg_efficiency),
            avg_response_time: round_half_up(mean(response_days.into_iter())),
            total_asset_value: round_half_up(total_value),
            potential_savings: round_half_up(savings),
            completion_rate: work_orders.iter().filter(|wo| wo.is_completed()).count(),
        },
        totals: DemoTotals {
            total_assets: assets.len(),
            operational_assets: operational,
            total_alerts: alerts.len(),
            total_work_orders: work_orders.len(),
            active_alerts: alerts.iter().filter(|a| a.is_active()).count(),
        },
        category_performance: category_performance(assets),
        trends,
    }
}
