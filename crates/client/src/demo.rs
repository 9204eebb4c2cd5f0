//! Locally computed stand-ins for server responses.

use elix_core::metrics::{self, CategoryPerformance, DemoMetrics, KpiSettings, PerformanceOverview};
use elix_core::realtime::{self, RealtimeFeed};
use elix_core::trends::Trends;
use elix_core::{Asset, PredictiveAlert, Snapshot};
use rand::Rng;
use time::OffsetDateTime;

/// A record set plus the settings needed to answer dashboard queries
/// without a server.
#[derive(Debug, Clone)]
pub struct DemoData {
    snapshot: Snapshot,
    settings: KpiSettings,
}

impl Default for DemoData {
    fn default() -> Self {
        DemoData::new(Snapshot::sample())
    }
}

impl DemoData {
    pub fn new(snapshot: Snapshot) -> Self {
        DemoData {
            snapshot,
            settings: KpiSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: KpiSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.snapshot.assets.clone()
    }

    /// Alerts in dashboard order.
    pub fn alerts(&self) -> Vec<PredictiveAlert> {
        metrics::rank_alerts(self.snapshot.alerts.clone())
    }

    pub fn performance_overview(&self, now: OffsetDateTime) -> PerformanceOverview {
        metrics::performance_overview(
            &self.snapshot.assets,
            &self.snapshot.alerts,
            &self.snapshot.work_orders,
            now,
            &self.settings,
        )
    }

    pub fn category_performance(&self) -> Vec<CategoryPerformance> {
        metrics::category_performance(&self.snapshot.assets)
    }

    pub fn demo_performance_metrics<R: Rng + ?Sized>(
        &self,
        now: OffsetDateTime,
        rng: &mut R,
    ) -> DemoMetrics {
        metrics::demo_performance_metrics(
            &self.snapshot.assets,
            &self.snapshot.alerts,
            &self.snapshot.work_orders,
            Trends::generate(now, rng),
        )
    }

    pub fn realtime_updates<R: Rng + ?Sized>(&self, now: OffsetDateTime, rng: &mut R) -> RealtimeFeed {
        realtime::simulate(&self.snapshot.assets, &self.snapshot.alerts, now, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;

    #[test]
    fn sample_overview_matches_sample_records() {
        let demo = DemoData::default();
        let overview = demo.performance_overview(datetime!(2025-03-15 10:00 UTC));
        assert_eq!(overview.totals.total_assets, 3);
        assert_eq!(overview.totals.operational_assets, 2);
        assert_eq!(overview.kpis.fleet_readiness, 67);
        assert_eq!(overview.kpis.critical_alerts, 1);
        assert_eq!(overview.kpis.budget_status, 0);
    }

    #[test]
    fn alerts_come_back_ranked() {
        let ids: Vec<String> = DemoData::default().alerts().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["PA-002", "PA-001"]);
    }

    #[test]
    fn demo_metrics_carry_full_trend_series() {
        let mut rng = StdRng::seed_from_u64(3);
        let metrics =
            DemoData::default().demo_performance_metrics(datetime!(2025-03-15 10:00 UTC), &mut rng);
        assert_eq!(metrics.trends.alert_trends.len(), 30);
        assert_eq!(metrics.trends.performance_trends.len(), 30);
        assert_eq!(metrics.trends.cost_trends.len(), 12);
        assert_eq!(metrics.totals.total_assets, 3);
    }

    #[test]
    fn custom_settings_feed_the_budget_kpi() {
        let demo = DemoData::new(Snapshot::default()).with_settings(KpiSettings {
            monthly_budget: 0.0,
            field_team_uptime: 90,
        });
        let overview = demo.performance_overview(datetime!(2025-03-15 10:00 UTC));
        assert_eq!(overview.kpis.fleet_readiness, 0);
        assert_eq!(overview.kpis.field_team_uptime, 90);
    }
}
