use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{string_enum, Collection};

string_enum! {
    /// Urgency of a predictive alert.
    AlertPriority {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl AlertPriority {
    /// Sort weight; higher is more urgent. Unrecognized priorities weigh 0.
    pub fn weight(&self) -> u8 {
        match self {
            AlertPriority::Critical => 3,
            AlertPriority::High => 2,
            AlertPriority::Medium => 1,
            AlertPriority::Low | AlertPriority::Other(_) => 0,
        }
    }
}

string_enum! {
    /// Lifecycle of a predictive alert.
    AlertStatus {
        Active => "active",
        Addressed => "addressed",
        Resolved => "resolved",
    }
}

/// An AI-generated prediction that an asset is likely to fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveAlert {
    pub id: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AlertPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_cost_impact: Option<f64>,
    #[serde(rename = "work_order_id", default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,
    #[serde(rename = "created_by", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PredictiveAlert {
    pub fn new(id: impl Into<String>, asset_id: impl Into<String>) -> Self {
        PredictiveAlert {
            id: id.into(),
            asset_id: asset_id.into(),
            asset_name: None,
            risk_percentage: None,
            priority: None,
            status: None,
            recommendation: None,
            timeframe: None,
            category: None,
            ai_insight: None,
            confidence_level: None,
            potential_cost_impact: None,
            work_order_id: None,
            created_by: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_priority(mut self, priority: AlertPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_risk(mut self, risk: f64) -> Self {
        self.risk_percentage = Some(risk);
        self
    }

    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(AlertStatus::Active)
    }

    pub fn priority_weight(&self) -> u8 {
        self.priority.as_ref().map_or(0, AlertPriority::weight)
    }

    /// Risk percentage, 0 when absent.
    pub fn risk(&self) -> f64 {
        self.risk_percentage.unwrap_or(0.0)
    }
}

impl Collection for PredictiveAlert {
    const PREFIX: &'static str = "alert:";
    const NAME: &'static str = "alert";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn priority_weights() {
        assert_eq!(AlertPriority::Critical.weight(), 3);
        assert_eq!(AlertPriority::High.weight(), 2);
        assert_eq!(AlertPriority::Medium.weight(), 1);
        assert_eq!(AlertPriority::Low.weight(), 0);
        assert_eq!(AlertPriority::from("urgent").weight(), 0);
    }

    #[test]
    fn decodes_wire_shape() {
        let alert: PredictiveAlert = serde_json::from_value(json!({
            "id": "PA-001",
            "assetId": "HM-002",
            "assetName": "Generator Unit 5",
            "riskPercentage": 85,
            "priority": "high",
            "status": "active",
            "timeframe": "7-14 days",
            "potentialCostImpact": 45000,
            "created_at": "2025-01-02T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(alert.asset_id, "HM-002");
        assert_eq!(alert.risk(), 85.0);
        assert_eq!(alert.priority_weight(), 2);
        assert!(alert.is_active());
        assert_eq!(alert.key(), "alert:PA-001");
    }

    #[test]
    fn missing_priority_weighs_zero() {
        let alert = PredictiveAlert::new("PA-9", "HM-1");
        assert_eq!(alert.priority_weight(), 0);
        assert_eq!(alert.risk(), 0.0);
        assert!(!alert.is_active());
    }
}
