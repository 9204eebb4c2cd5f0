use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{string_enum, Collection};

string_enum! {
    /// Progress of a work order.
    WorkOrderStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl WorkOrderStatus {
    /// Completed and cancelled orders accept no further status changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    /// Whether an order may move from `self` to `next`. Forward skips are
    /// allowed; leaving a terminal state is not, except re-asserting it.
    pub fn can_transition_to(&self, next: &WorkOrderStatus) -> bool {
        !self.is_terminal() || self == next
    }
}

/// A maintenance task against an asset, optionally raised from an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkOrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "created_by", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkOrder {
    pub fn new(id: impl Into<String>, asset_id: impl Into<String>) -> Self {
        WorkOrder {
            id: id.into(),
            asset_id: asset_id.into(),
            alert_id: None,
            status: None,
            title: None,
            description: None,
            priority: None,
            technician: None,
            cost: None,
            estimated_cost: None,
            actual_cost: None,
            created_date: None,
            started_date: None,
            completed_date: None,
            notes: None,
            created_by: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: WorkOrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(WorkOrderStatus::Completed)
    }

    /// Spend attributed to this order for budget purposes (`cost`, else 0).
    pub fn budget_cost(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }
}

impl Collection for WorkOrder {
    const PREFIX: &'static str = "work_order:";
    const NAME: &'static str = "work order";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_sticky() {
        use WorkOrderStatus::*;
        assert!(Pending.can_transition_to(&Completed));
        assert!(Pending.can_transition_to(&InProgress));
        assert!(InProgress.can_transition_to(&Cancelled));
        assert!(Completed.can_transition_to(&Completed));
        assert!(!Completed.can_transition_to(&Pending));
        assert!(!Cancelled.can_transition_to(&InProgress));
    }

    #[test]
    fn in_progress_uses_snake_case() {
        let status: WorkOrderStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, WorkOrderStatus::InProgress);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in_progress\"");
    }

    #[test]
    fn missing_cost_counts_as_zero() {
        let order = WorkOrder::new("WO-1", "HM-001");
        assert_eq!(order.budget_cost(), 0.0);
        assert_eq!(order.key(), "work_order:WO-1");
    }
}
