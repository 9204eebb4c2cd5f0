//! `elix report`: fleet KPIs, category breakdown and ranked alerts.

use std::fmt::Write as _;

use elix_client::DashboardClient;
use elix_core::metrics::{self, CategoryPerformance, KpiSettings, PerformanceOverview};
use elix_core::{PredictiveAlert, Snapshot};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Report {
    pub overview: PerformanceOverview,
    pub category_performance: Vec<CategoryPerformance>,
    pub alerts: Vec<PredictiveAlert>,
}

impl Report {
    pub(crate) fn from_snapshot(
        snapshot: &Snapshot,
        settings: &KpiSettings,
        now: OffsetDateTime,
    ) -> Self {
        Report {
            overview: metrics::performance_overview(
                &snapshot.assets,
                &snapshot.alerts,
                &snapshot.work_orders,
                now,
                settings,
            ),
            category_performance: metrics::category_performance(&snapshot.assets),
            alerts: metrics::rank_alerts(snapshot.alerts.clone()),
        }
    }

    /// Pull the same figures from a running server, falling back to the
    /// sample data for any call that fails.
    pub(crate) async fn from_server(client: &DashboardClient) -> Self {
        Report {
            overview: client.performance_overview_or_demo().await,
            category_performance: client.category_performance_or_demo().await,
            alerts: client.alerts_or_demo().await,
        }
    }

    pub(crate) fn render_text(&self) -> String {
        let kpis = &self.overview.kpis;
        let totals = &self.overview.totals;
        let mut out = String::new();

        let _ = writeln!(out, "Fleet overview");
        let _ = writeln!(out, "  Fleet readiness:    {}%", kpis.fleet_readiness);
        let _ = writeln!(out, "  Critical alerts:    {}", kpis.critical_alerts);
        let _ = writeln!(out, "  Budget status:      {}%", kpis.budget_status);
        let _ = writeln!(out, "  Field team uptime:  {}%", kpis.field_team_uptime);
        let _ = writeln!(
            out,
            "  Assets:             {} ({} operational)",
            totals.total_assets, totals.operational_assets
        );
        let _ = writeln!(out, "  Alerts:             {}", totals.total_alerts);
        let _ = writeln!(out, "  Work orders:        {}", totals.total_work_orders);

        let _ = writeln!(out);
        let _ = writeln!(out, "Categories");
        if self.category_performance.is_empty() {
            let _ = writeln!(out, "  (no assets)");
        }
        for c in &self.category_performance {
            let _ = writeln!(
                out,
                "  {:<24} {:>3} total {:>3} operational {:>4}% uptime",
                c.category, c.total, c.operational, c.uptime
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Alerts");
        if self.alerts.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for a in &self.alerts {
            let priority = a.priority.as_ref().map_or("-", |p| p.as_str());
            let status = a.status.as_ref().map_or("-", |s| s.as_str());
            let _ = writeln!(
                out,
                "  [{priority:<8}] {:<10} {:<10} risk {:>3}%  {status}",
                a.id,
                a.asset_id,
                a.risk()
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_report() -> Report {
        Report::from_snapshot(
            &Snapshot::sample(),
            &KpiSettings::default(),
            datetime!(2025-03-15 10:00 UTC),
        )
    }

    #[test]
    fn report_ranks_alerts_and_groups_categories() {
        let report = sample_report();
        assert_eq!(report.overview.kpis.fleet_readiness, 67);
        let ids: Vec<&str> = report.alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["PA-002", "PA-001"]);
        assert_eq!(report.category_performance.len(), 2);
    }

    #[test]
    fn text_lists_every_section() {
        let text = sample_report().render_text();
        assert!(text.contains("Fleet readiness:    67%"));
        assert!(text.contains("Categories"));
        assert!(text.contains("[critical] PA-002"));
        let critical = text.find("PA-002").unwrap();
        let high = text.find("PA-001").unwrap();
        assert!(critical < high);
    }

    #[test]
    fn empty_snapshot_renders_placeholders() {
        let report = Report::from_snapshot(
            &Snapshot::default(),
            &KpiSettings::default(),
            datetime!(2025-03-15 10:00 UTC),
        );
        let text = report.render_text();
        assert!(text.contains("(no assets)"));
        assert!(text.contains("(none)"));
        assert!(text.contains("Fleet readiness:    0%"));
    }

    #[test]
    fn json_uses_camel_case() {
        let value = serde_json::to_value(sample_report()).unwrap();
        assert!(value["categoryPerformance"].is_array());
        assert_eq!(value["overview"]["kpis"]["fleetReadiness"], 67);
    }
}
