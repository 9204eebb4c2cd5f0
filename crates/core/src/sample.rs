//! The built-in sample fleet and the snapshot format used for bulk imports.

use serde::{Deserialize, Serialize};

use crate::record::{
    AlertPriority, AlertStatus, Asset, AssetStatus, Coordinates, Criticality, Location,
    PredictiveAlert, WorkOrder,
};

/// A full copy of the three domain collections, as accepted by
/// `POST /init-enhanced-demo` and read by `elix report`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub alerts: Vec<PredictiveAlert>,
    #[serde(default)]
    pub work_orders: Vec<WorkOrder>,
}

/// Record counts reported after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub assets: usize,
    pub alerts: usize,
    pub work_orders: usize,
}

impl Snapshot {
    /// Three assets and two active alerts, enough to light up every panel.
    pub fn sample() -> Self {
        Snapshot {
            assets: sample_assets(),
            alerts: sample_alerts(),
            work_orders: Vec::new(),
        }
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            assets: self.assets.len(),
            alerts: self.alerts.len(),
            work_orders: self.work_orders.len(),
        }
    }
}

struct AssetSeed {
    id: &'static str,
    name: &'static str,
    kind: &'static str,
    category: &'static str,
    status: AssetStatus,
    site: &'static str,
    lat: f64,
    lng: f64,
    model: &'static str,
    supplier: &'static str,
    purchased: &'static str,
    serial: &'static str,
    efficiency: f64,
    criticality: Criticality,
}

impl AssetSeed {
    fn build(self) -> Asset {
        let mut asset = Asset::new(self.id, self.name, self.kind)
            .with_category(self.category)
            .with_status(self.status);
        asset.location = Some(Location {
            site: self.site.to_string(),
            coordinates: Some(Coordinates {
                lat: self.lat,
                lng: self.lng,
            }),
            building: None,
            floor: None,
        });
        asset.model = Some(self.model.to_string());
        asset.supplier = Some(self.supplier.to_string());
        asset.purchase_date = Some(self.purchased.to_string());
        asset.serial_number = Some(self.serial.to_string());
        asset.efficiency = Some(self.efficiency);
        asset.criticality = Some(self.criticality);
        asset
    }
}

pub fn sample_assets() -> Vec<Asset> {
    vec![
        AssetSeed {
            id: "HM-001",
            name: "Excavator CAT 320",
            kind: "Heavy Machinery",
            category: "Heavy Machinery",
            status: AssetStatus::Operational,
            site: "Dubai Industrial Zone",
            lat: 25.1972,
            lng: 55.2744,
            model: "CAT 320GC",
            supplier: "Caterpillar Inc.",
            purchased: "2022-03-15",
            serial: "CAT320-2024-001",
            efficiency: 89.0,
            criticality: Criticality::Medium,
        }
        .build(),
        AssetSeed {
            id: "HM-002",
            name: "Crane Liebherr LTM",
            kind: "Heavy Machinery",
            category: "Heavy Machinery",
            status: AssetStatus::Warning,
            site: "Abu Dhabi Complex",
            lat: 24.4539,
            lng: 54.3773,
            model: "LTM 1070-4.2",
            supplier: "Liebherr Group",
            purchased: "2021-08-20",
            serial: "LIE-2024-002",
            efficiency: 74.0,
            criticality: Criticality::High,
        }
        .build(),
        AssetSeed {
            id: "HVAC-001",
            name: "Chiller Unit 1",
            kind: "HVAC",
            category: "HVAC Systems",
            status: AssetStatus::Critical,
            site: "Riyadh Operations",
            lat: 24.7136,
            lng: 46.6753,
            model: "Carrier AquaEdge 19DV",
            supplier: "Carrier Corporation",
            purchased: "2023-01-10",
            serial: "CAR-HVAC-003",
            efficiency: 45.0,
            criticality: Criticality::Critical,
        }
        .build(),
    ]
}

#[allow(clippy::too_many_arguments)]
fn alert(
    id: &str,
    asset_id: &str,
    asset_name: &str,
    risk: f64,
    timeframe: &str,
    recommendation: &str,
    category: &str,
    priority: AlertPriority,
    insight: &str,
) -> PredictiveAlert {
    let mut alert = PredictiveAlert::new(id, asset_id)
        .with_priority(priority)
        .with_risk(risk)
        .with_status(AlertStatus::Active);
    alert.asset_name = Some(asset_name.to_string());
    alert.timeframe = Some(timeframe.to_string());
    alert.recommendation = Some(recommendation.to_string());
    alert.category = Some(category.to_string());
    alert.ai_insight = Some(insight.to_string());
    alert
}

pub fn sample_alerts() -> Vec<PredictiveAlert> {
    vec![
        alert(
            "PA-001",
            "HM-002",
            "Crane Liebherr LTM",
            85.0,
            "7 days",
            "Schedule hydraulic system inspection",
            "Heavy Machinery",
            AlertPriority::High,
            "Machine learning detected irregular hydraulic pressure patterns indicating potential pump failure.",
        ),
        alert(
            "PA-002",
            "HVAC-001",
            "Chiller Unit 1",
            91.0,
            "3 days",
            "Immediate maintenance required",
            "HVAC",
            AlertPriority::Critical,
            "AI models predict critical compressor failure within 72 hours based on vibration and temperature analysis.",
        ),
    ]
}
