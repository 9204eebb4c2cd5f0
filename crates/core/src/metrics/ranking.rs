use std::cmp::Ordering;

use crate::record::{parse_timestamp, PredictiveAlert};

/// Order two alerts for display: higher priority first, then higher risk,
/// then earlier `created_at` (undated alerts last), then id.
pub fn compare_alerts(a: &PredictiveAlert, b: &PredictiveAlert) -> Ordering {
    b.priority_weight()
        .cmp(&a.priority_weight())
        .then_with(|| b.risk().total_cmp(&a.risk()))
        .then_with(|| {
            let ta = a.created_at.as_deref().and_then(parse_timestamp);
            let tb = b.created_at.as_deref().and_then(parse_timestamp);
            match (ta, tb) {
                (Some(ta), Some(tb)) => ta.cmp(&tb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank_alerts(mut alerts: Vec<PredictiveAlert>) -> Vec<PredictiveAlert> {
    alerts.sort_by(compare_alerts);
    alerts
}
