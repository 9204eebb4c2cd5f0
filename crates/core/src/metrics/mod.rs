//! Pure aggregations over record slices.
//!
//! Nothing here touches the store; callers scan the collections first and
//! hand the slices in.

mod category;
mod demo;
mod kpi;
mod ranking;

pub use category::{category_performance, CategoryPerformance};
pub use demo::{demo_performance_metrics, DemoKpis, DemoMetrics, DemoTotals};
pub use kpi::{
    budget_status, critical_alert_count, fleet_readiness, monthly_work_order_cost,
    performance_overview, KpiSettings, Kpis, PerformanceOverview, Totals,
};
pub use ranking::{compare_alerts, rank_alerts};

/// Round half away from zero for positive inputs, matching how the
/// dashboard has always rounded percentages (`floor(x + 0.5)`).
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
pub fn share_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_of_nothing_is_zero() {
        assert_eq!(share_percent(0, 0), 0);
        assert_eq!(share_percent(5, 0), 0);
    }

    #[test]
    fn share_rounds_half_up() {
        assert_eq!(share_percent(2, 3), 67);
        assert_eq!(share_percent(1, 3), 33);
        assert_eq!(share_percent(1, 8), 13);
        assert_eq!(share_percent(3, 3), 100);
    }

    #[test]
    fn round_half_up_on_ties() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.4999), 2.0);
        assert_eq!(round_half_up(0.0), 0.0);
    }
}
