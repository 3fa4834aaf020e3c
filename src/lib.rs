// vitalcare library crate
// Exposes modules for integration testing

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod output;
pub mod storage;
pub mod sync;

pub use alerts::{
    create_alerts, requires_immediate_notification, AnomalyDetector, AnomalyKind, AnomalyPriority,
    AnomalyResult, VitalMonitor, VitalThresholds,
};
pub use models::{Alert, AlertSeverity, AlertType, VitalSigns};
pub use storage::Database;
