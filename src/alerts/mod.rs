pub mod detector;
pub mod notifications;
pub mod system;
pub mod thresholds;

pub use detector::{create_alerts, requires_immediate_notification, AnomalyDetector};
pub use notifications::{NotificationHandler, Notifier};
pub use system::{MonitorOutcome, VitalMonitor};
pub use thresholds::{
    AnomalyKind, AnomalyPriority, AnomalyResult, NotificationRule, ThresholdError, VitalChannel,
    VitalThresholds,
};
