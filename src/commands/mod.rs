// Command handlers module
pub mod alerts;
pub mod config;
pub mod sync;
pub mod vitals;

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::alerts::{AnomalyDetector, NotificationHandler, VitalMonitor};
use crate::config::Config;
use crate::output::OutputFormat;
use crate::storage::Database;

pub use alerts::{handle_alert_action, handle_sos_command};
pub use config::handle_config_action;
pub use sync::{handle_export_command, handle_import_command};
pub use vitals::{
    handle_check_command, handle_history_command, handle_record_command, handle_thresholds_command,
};

/// Settings resolved from the config file and global CLI flags.
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub user: String,
    pub json: bool,
}

impl AppContext {
    pub fn new(config: Config, config_path: PathBuf, user: Option<String>, json: bool) -> Self {
        let user = user.unwrap_or_else(|| config.general.default_user.clone());
        let json = json || config.output.format == "json";
        Self {
            config,
            config_path,
            user,
            json,
        }
    }

    pub fn open_database(&self) -> Result<Database> {
        Database::new(&self.config.database_path()?)
    }

    pub fn detector(&self) -> Result<AnomalyDetector> {
        Ok(AnomalyDetector::new(self.config.thresholds.clone())?)
    }

    pub fn notification_handler(&self) -> NotificationHandler {
        NotificationHandler::new(self.config.notifications.enabled && NotificationHandler::is_available())
    }

    pub fn monitor(&self) -> Result<VitalMonitor> {
        Ok(VitalMonitor::new(
            self.detector()?,
            self.open_database()?,
            Box::new(self.notification_handler()),
        )
        .with_cooldown_minutes(self.config.notifications.cooldown_minutes))
    }

    pub fn print<T: OutputFormat>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", value.to_json()?);
        } else {
            println!("{}", value.to_table());
        }
        Ok(())
    }

    /// Print a one-line status, or a `{"status": .., "message": ..}` object in JSON mode.
    pub fn print_status(&self, message: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "status": "success", "message": message }));
        } else {
            println!("{}", message);
        }
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
