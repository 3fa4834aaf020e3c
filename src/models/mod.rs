// Models module
pub mod alert;
pub mod vitals;

pub use alert::{Alert, AlertSeverity, AlertType};
pub use vitals::VitalSigns;
