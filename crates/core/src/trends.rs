//! Synthesized trend series for the demo dashboard.
//!
//! The series are random walks around fixed baselines, regenerated on every
//! request. Every generator takes the RNG explicitly so tests can seed it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::metrics::round_half_up;

pub const TREND_DAYS: i64 = 30;
pub const COST_MONTHS: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTrendPoint {
    pub date: String,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTrendPoint {
    pub date: String,
    pub avg_efficiency: u32,
    pub uptime: u32,
    pub utilization: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTrendPoint {
    pub month: String,
    pub preventive: u32,
    pub corrective: u32,
    pub emergency: u32,
    pub total: u32,
    pub savings: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub alert_trends: Vec<AlertTrendPoint>,
    pub performance_trends: Vec<PerformanceTrendPoint>,
    pub cost_trends: Vec<CostTrendPoint>,
}

impl Trends {
    pub fn generate<R: Rng + ?Sized>(now: OffsetDateTime, rng: &mut R) -> Self {
        Trends {
            alert_trends: alert_trends(now, rng),
            performance_trends: performance_trends(now, rng),
            cost_trends: cost_trends(now, rng),
        }
    }
}

fn day_label(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!("{:04}-{:02}-{:02}", at.year(), at.month() as u8, at.day())
}

fn month_label(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!("{:04}-{:02}", at.year(), at.month() as u8)
}

/// `base + (r - 0.5) * spread` for a uniform `r` in `[0, 1)`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, base: f64, spread: f64) -> f64 {
    base + (rng.gen::<f64>() - 0.5) * spread
}

/// Daily alert counts, oldest first, ending today. The last seven days
/// carry two extra critical alerts.
pub fn alert_trends<R: Rng + ?Sized>(now: OffsetDateTime, rng: &mut R) -> Vec<AlertTrendPoint> {
    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let critical = rng.gen_range(0..3) + if days_ago < 7 { 2 } else { 0 };
            let high = rng.gen_range(2..7);
            let medium = rng.gen_range(3..11);
            AlertTrendPoint {
                date: day_label(now - Duration::days(days_ago)),
                critical,
                high,
                medium,
                total: critical + high + medium,
            }
        })
        .collect()
}

/// Daily fleet performance, oldest first, ending today.
pub fn performance_trends<R: Rng + ?Sized>(
    now: OffsetDateTime,
    rng: &mut R,
) -> Vec<PerformanceTrendPoint> {
    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let efficiency = jitter(rng, 85.0, 10.0).clamp(70.0, 95.0);
            PerformanceTrendPoint {
                date: day_label(now - Duration::days(days_ago)),
                avg_efficiency: round_half_up(efficiency) as u32,
                uptime: round_half_up(jitter(rng, 95.0, 8.0)) as u32,
                utilization: round_half_up(jitter(rng, 78.0, 15.0)) as u32,
            }
        })
        .collect()
}

/// Monthly maintenance spend, oldest first. Months step back 30 days at a
/// time, so a calendar month can repeat or be skipped.
pub fn cost_trends<R: Rng + ?Sized>(now: OffsetDateTime, rng: &mut R) -> Vec<CostTrendPoint> {
    (0..COST_MONTHS)
        .rev()
        .map(|months_ago| {
            let preventive = round_half_up(15_000.0 + rng.gen::<f64>() * 10_000.0) as u32;
            let corrective = round_half_up(25_000.0 + rng.gen::<f64>() * 15_000.0) as u32;
            let emergency = round_half_up(5_000.0 + rng.gen::<f64>() * 8_000.0) as u32;
            CostTrendPoint {
                month: month_label(now - Duration::days(30 * months_ago)),
                preventive,
                corrective,
                emergency,
                total: preventive + corrective + emergency,
                savings: round_half_up(f64::from(preventive) * 0.7) as u32,
            }
        })
        .collect()
}
