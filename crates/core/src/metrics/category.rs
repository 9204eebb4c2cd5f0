use serde::{Deserialize, Serialize};

use super::share_percent;
use crate::record::Asset;

/// Uptime of one asset category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub total: usize,
    pub operational: usize,
    pub uptime: u32,
}

/// Group `assets` by [`Asset::category_bucket`] and compute each group's
/// uptime. Groups are returned in the order their first asset appears.
pub fn category_performance(assets: &[Asset]) -> Vec<CategoryPerformance> {
    let mut groups: Vec<CategoryPerformance> = Vec::new();

    for asset in assets {
        let bucket = asset.category_bucket();
        let idx = match groups.iter().position(|g| g.category == bucket) {
            Some(idx) => idx,
            None => {
                groups.push(CategoryPerformance {
                    category: bucket.to_string(),
                    total: 0,
                    operational: 0,
                    uptime: 0,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.total += 1;
        if asset.is_operational() {
            group.operational += 1;
        }
    }

    for group in &mut groups {
        group.uptime = share_percent(group.operational, group.total);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AssetStatus;

    fn asset(id: &str, ty: &str, category: Option<&str>, status: &str) -> Asset {
        let mut a = Asset::new(id, id, ty).with_status(AssetStatus::from(status));
        a.category = category.map(str::to_string);
        a
    }

    #[test]
    fn groups_in_first_seen_order() {
        let assets = vec![
            asset("g1", "Generators", Some("Power"), "operational"),
            asset("p1", "Pumps", None, "critical"),
            asset("g2", "Generators", Some("Power"), "warning"),
            asset("g3", "Generators", Some("Power"), "offline"),
        ];
        let perf = category_performance(&assets);
        assert_eq!(
            perf,
            vec![
                CategoryPerformance {
                    category: "Power".into(),
                    total: 3,
                    operational: 2,
                    uptime: 67,
                },
                CategoryPerformance {
                    category: "Pumps".into(),
                    total: 1,
                    operational: 0,
                    uptime: 0,
                },
            ]
        );
    }

    #[test]
    fn missing_category_and_type_is_unknown() {
        let perf = category_performance(&[asset("x", "", Some(""), "healthy")]);
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].category, "Unknown");
        assert_eq!(perf[0].uptime, 100);
    }

    #[test]
    fn empty_fleet_has_no_groups() {
        assert!(category_performance(&[]).is_empty());
    }

    #[test]
    fn uptime_stays_in_range() {
        let statuses = ["operational", "warning", "critical", "maintenance", "offline", "retired", "bogus"];
        let assets: Vec<Asset> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| asset(&format!("a{i}"), if i % 2 == 0 { "Pump" } else { "HVAC" }, None, s))
            .collect();
        for group in category_performance(&assets) {
            assert!(group.total > 0);
            assert!(group.uptime <= 100);
            assert_eq!(group.uptime, share_percent(group.operational, group.total));
        }
    }
}
