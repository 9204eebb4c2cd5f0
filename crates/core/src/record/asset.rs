use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{string_enum, Collection};

string_enum! {
    /// Operational state of a piece of equipment.
    ///
    /// `healthy` is the legacy spelling of `operational` used by older
    /// sample data and decodes to the same variant.
    AssetStatus {
        Operational => "operational" | "healthy",
        Warning => "warning",
        Critical => "critical",
        Maintenance => "maintenance",
        Offline => "offline",
        Retired => "retired",
    }
}

impl AssetStatus {
    /// Whether an asset in this state counts towards uptime and fleet
    /// readiness. `Warning` is counted as still operational; this is the
    /// one place that policy lives.
    pub fn is_operational(&self) -> bool {
        matches!(self, AssetStatus::Operational | AssetStatus::Warning)
    }
}

string_enum! {
    /// Business criticality tier.
    Criticality {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub site: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
}

/// A monitored piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    #[serde(rename = "created_by", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    /// Minimal asset with the given identity; every optional field empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Asset {
            id: id.into(),
            name: name.into(),
            asset_type: asset_type.into(),
            category: None,
            status: None,
            location: None,
            efficiency: None,
            criticality: None,
            value: None,
            model: None,
            supplier: None,
            purchase_date: None,
            serial_number: None,
            temperature: None,
            pressure: None,
            vibration: None,
            created_by: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Grouping bucket: `category`, else `type`, else `"Unknown"`.
    /// Empty strings count as missing.
    pub fn category_bucket(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| Some(self.asset_type.as_str()).filter(|t| !t.is_empty()))
            .unwrap_or("Unknown")
    }

    /// An asset without a status is not operational.
    pub fn is_operational(&self) -> bool {
        self.status.as_ref().is_some_and(AssetStatus::is_operational)
    }

    pub fn is_offline(&self) -> bool {
        self.status == Some(AssetStatus::Offline)
    }
}

impl Collection for Asset {
    const PREFIX: &'static str = "asset:";
    const NAME: &'static str = "asset";

    fn id(&self) -> &str {
        &self.id
    }
}
