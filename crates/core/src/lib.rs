//! elix-core: records and fleet analytics for the Elix asset dashboard.
//!
//! # Public API
//!
//! - [`record`] -- asset, alert, work order and profile records
//! - [`Repository`] -- typed access to a [`elix_store::RecordStore`]
//! - [`metrics`] -- category uptime, alert ranking, KPI calculation
//! - [`trends`] / [`realtime`] -- synthesized demo series and sensor updates
//! - [`MaintenanceService`] -- every use case the HTTP surface exposes
//! - [`sample`] -- the built-in sample fleet

pub mod error;
pub mod metrics;
pub mod realtime;
pub mod record;
pub mod repository;
pub mod sample;
pub mod service;
pub mod trends;

pub use error::ServiceError;
pub use record::{
    Asset, AssetStatus, Collection, Criticality, Location, PredictiveAlert, AlertPriority,
    AlertStatus, UserProfile, WorkOrder, WorkOrderStatus,
};
pub use repository::Repository;
pub use sample::Snapshot;
pub use service::MaintenanceService;
