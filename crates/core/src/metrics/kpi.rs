use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{round_half_up, share_percent};
use crate::record::{parse_timestamp, AlertPriority, Asset, PredictiveAlert, WorkOrder};

/// Tunables for the KPI calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiSettings {
    /// Spend ceiling `budgetStatus` is measured against.
    pub monthly_budget: f64,
    /// Reported as-is; there is no field-team data source yet.
    pub field_team_uptime: u32,
}

impl Default for KpiSettings {
    fn default() -> Self {
        KpiSettings {
            monthly_budget: 50_000.0,
            field_team_uptime: 98,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub fleet_readiness: u32,
    pub critical_alerts: usize,
    pub budget_status: u32,
    pub field_team_uptime: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_assets: usize,
    pub operational_assets: usize,
    pub total_alerts: usize,
    pub total_work_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceOverview {
    pub kpis: Kpis,
    pub totals: Totals,
}

/// Share of assets that are operational, 0 for an empty fleet.
pub fn fleet_readiness(assets: &[Asset]) -> u32 {
    let operational = assets.iter().filter(|a| a.is_operational()).count();
    share_percent(operational, assets.len())
}

/// Active alerts with critical priority.
pub fn critical_alert_count(alerts: &[PredictiveAlert]) -> usize {
    alerts
        .iter()
        .filter(|a| a.priority == Some(AlertPriority::Critical) && a.is_active())
        .count()
}

/// Sum of `cost` over work orders created in the same UTC month as `now`.
/// Orders with a missing or unparseable `created_at` are skipped.
pub fn monthly_work_order_cost(work_orders: &[WorkOrder], now: OffsetDateTime) -> f64 {
    let now = now.to_offset(time::UtcOffset::UTC);
    work_orders
        .iter()
        .filter(|wo| {
            wo.created_at
                .as_deref()
                .and_then(parse_timestamp)
                .map(|at| at.to_offset(time::UtcOffset::UTC))
                .is_some_and(|at| at.year() == now.year() && at.month() == now.month())
        })
        .map(WorkOrder::budget_cost)
        .sum()
}

/// `round(cost / budget * 100)`; 0 when the budget is not positive.
pub fn budget_status(monthly_cost: f64, monthly_budget: f64) -> u32 {
    if monthly_budget <= 0.0 {
        return 0;
    }
    round_half_up((monthly_cost / monthly_budget * 100.0).max(0.0)) as u32
}

pub fn performance_overview(
    assets: &[Asset],
    alerts: &[PredictiveAlert],
    work_orders: &[WorkOrder],
    now: OffsetDateTime,
    settings: &KpiSettings,
) -> PerformanceOverview {
    let operational = assets.iter().filter(|a| a.is_operational()).count();
    let monthly_cost = monthly_work_order_cost(work_orders, now);

    PerformanceOverview {
        kpis: Kpis {
            fleet_readiness: share_percent(operational, assets.len()),
            critical_alerts: critical_alert_count(alerts),
            budget_status: budget_status(monthly_cost, settings.monthly_budget),
            field_team_uptime: settings.field_team_uptime,
        },
        totals: Totals {
            total_assets: assets.len(),
            operational_assets: operational,
            total_alerts: alerts.len(),
            total_work_orders: work_orders.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AlertStatus, AssetStatus};
    use serde_json::json;
    use time::macros::datetime;

    fn assets(statuses: &[&str]) -> Vec<Asset> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| Asset::new(format!("a{i}"), "a", "Pump").with_status(AssetStatus::from(*s)))
            .collect()
    }

    fn order(created_at: &str, cost: Option<f64>) -> WorkOrder {
        let mut wo = WorkOrder::new(format!("WO-{created_at}"), "a0");
        wo.created_at = Some(created_at.to_string());
        wo.cost = cost;
        wo
    }

    #[test]
    fn readiness_two_of_three() {
        assert_eq!(fleet_readiness(&assets(&["operational", "warning", "critical"])), 67);
    }

    #[test]
    fn readiness_empty_fleet_is_zero() {
        assert_eq!(fleet_readiness(&[]), 0);
    }

    #[test]
    fn critical_alerts_must_be_active() {
        let alerts = vec![
            PredictiveAlert::new("1", "a")
                .with_priority(AlertPriority::Critical)
                .with_status(AlertStatus::Active),
            PredictiveAlert::new("2", "a")
                .with_priority(AlertPriority::Critical)
                .with_status(AlertStatus::Addressed),
            PredictiveAlert::new("3", "a")
                .with_priority(AlertPriority::High)
                .with_status(AlertStatus::Active),
        ];
        assert_eq!(critical_alert_count(&alerts), 1);
    }

    #[test]
    fn monthly_cost_only_counts_current_month() {
        let now = datetime!(2025-03-15 12:00 UTC);
        let orders = vec![
            order("2025-03-01T08:00:00Z", Some(10_000.0)),
            order("2025-03-31T23:59:59Z", Some(2_500.0)),
            order("2025-02-28T23:59:59Z", Some(99_999.0)),
            order("2024-03-10T00:00:00Z", Some(99_999.0)),
            order("2025-03-05T00:00:00Z", None),
            order("not a date", Some(99_999.0)),
        ];
        assert_eq!(monthly_work_order_cost(&orders, now), 12_500.0);
    }

    #[test]
    fn budget_percentages() {
        assert_eq!(budget_status(12_500.0, 50_000.0), 25);
        assert_eq!(budget_status(60_000.0, 50_000.0), 120);
        assert_eq!(budget_status(0.0, 50_000.0), 0);
        assert_eq!(budget_status(100.0, 0.0), 0);
    }

    #[test]
    fn overview_wire_shape() {
        let now = datetime!(2025-03-15 12:00 UTC);
        let overview = performance_overview(
            &assets(&["operational", "warning", "critical"]),
            &[],
            &[order("2025-03-02T00:00:00Z", Some(5_000.0))],
            now,
            &KpiSettings::default(),
        );
        assert_eq!(
            serde_json::to_value(&overview).unwrap(),
            json!({
                "kpis": {
                    "fleetReadiness": 67,
                    "criticalAlerts": 0,
                    "budgetStatus": 10,
                    "fieldTeamUptime": 98
                },
                "totals": {
                    "totalAssets": 3,
                    "operationalAssets": 2,
                    "totalAlerts": 0,
                    "totalWorkOrders": 1
                }
            })
        );
    }
}
