//! Simulated sensor and alert activity for the realtime demo feed.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::metrics::round_half_up;
use crate::record::{timestamp, Asset, PredictiveAlert};

/// How many assets (from the front of the scan) report sensor readings.
pub const SENSOR_ASSETS: usize = 5;

const ALERT_UPDATE_CHANCE: f64 = 0.3;
const INSIGHT_CHANCE: f64 = 0.2;
const INSIGHT_TEXT: &str = "AI detected subtle pattern changes in operational data suggesting \
                            optimal maintenance window in 14-21 days.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    pub temperature: f64,
    pub pressure: f64,
    pub vibration: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskChange {
    RiskIncreased,
    RiskDecreased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeUpdate {
    #[serde(rename_all = "camelCase")]
    SensorReading {
        asset_id: String,
        asset_name: String,
        timestamp: String,
        data: SensorData,
    },
    #[serde(rename_all = "camelCase")]
    AlertUpdate {
        alert_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asset_name: Option<String>,
        timestamp: String,
        change: RiskChange,
        new_risk_percentage: f64,
    },
    #[serde(rename_all = "camelCase")]
    AiInsight {
        asset_id: String,
        asset_name: String,
        timestamp: String,
        insight: String,
        confidence: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeFeed {
    pub updates: Vec<RealtimeUpdate>,
    pub timestamp: String,
    pub system_status: String,
    pub data_freshness: String,
}

fn jittered<R: Rng + ?Sized>(rng: &mut R, base: f64, spread: f64) -> f64 {
    round_half_up(base + (rng.gen::<f64>() - 0.5) * spread)
}

/// One round of simulated updates.
///
/// Of the first [`SENSOR_ASSETS`] assets, each one not offline reports a
/// jittered reading. Then, by chance, a random active alert has its risk
/// nudged and a random asset gets an AI insight.
pub fn simulate<R: Rng + ?Sized>(
    assets: &[Asset],
    alerts: &[PredictiveAlert],
    now: OffsetDateTime,
    rng: &mut R,
) -> RealtimeFeed {
    let stamp = timestamp(now);
    let mut updates = Vec::new();

    for asset in assets.iter().take(SENSOR_ASSETS).filter(|a| !a.is_offline()) {
        let data = SensorData {
            temperature: jittered(rng, asset.temperature.unwrap_or(25.0), 5.0),
            pressure: jittered(rng, asset.pressure.unwrap_or(5.0), 2.0),
            vibration: jittered(rng, asset.vibration.unwrap_or(2.0), 1.0),
            efficiency: jittered(rng, asset.efficiency.unwrap_or(85.0), 10.0).clamp(0.0, 100.0),
        };
        updates.push(RealtimeUpdate::SensorReading {
            asset_id: asset.id.clone(),
            asset_name: asset.name.clone(),
            timestamp: stamp.clone(),
            data,
        });
    }

    if rng.gen_bool(ALERT_UPDATE_CHANCE) {
        let active: Vec<&PredictiveAlert> = alerts.iter().filter(|a| a.is_active()).collect();
        if let Some(alert) = active.choose(rng) {
            let change = if rng.gen_bool(0.5) {
                RiskChange::RiskIncreased
            } else {
                RiskChange::RiskDecreased
            };
            let risk = (alert.risk() + (rng.gen::<f64>() - 0.5) * 10.0).clamp(0.0, 100.0);
            updates.push(RealtimeUpdate::AlertUpdate {
                alert_id: alert.id.clone(),
                asset_name: alert.asset_name.clone(),
                timestamp: stamp.clone(),
                change,
                new_risk_percentage: risk,
            });
        }
    }

    if rng.gen_bool(INSIGHT_CHANCE) {
        if let Some(asset) = assets.choose(rng) {
            updates.push(RealtimeUpdate::AiInsight {
                asset_id: asset.id.clone(),
                asset_name: asset.name.clone(),
                timestamp: stamp.clone(),
                insight: INSIGHT_TEXT.to_string(),
                confidence: rng.gen_range(75..=95),
            });
        }
    }

    RealtimeFeed {
        updates,
        timestamp: stamp,
        system_status: "optimal".to_string(),
        data_freshness: "real-time".to_string(),
    }
}
