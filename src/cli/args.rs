use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::VitalSigns;

#[derive(Parser)]
#[command(name = "vitalcare")]
#[command(about = "Vital-sign monitoring with anomaly alerts")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Patient id (defaults to general.default_user)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Measured values for one reading. Every channel is optional.
#[derive(Args, Debug, Clone, Default)]
pub struct VitalArgs {
    /// Heart rate in beats per minute
    #[arg(long)]
    pub heart_rate: Option<u32>,

    /// Systolic blood pressure in mmHg
    #[arg(long)]
    pub systolic: Option<u32>,

    /// Diastolic blood pressure in mmHg
    #[arg(long)]
    pub diastolic: Option<u32>,

    /// Oxygen saturation in percent
    #[arg(long, value_parser = parse_measurement)]
    pub oxygen: Option<f64>,

    /// Body temperature in °C
    #[arg(long, value_parser = parse_measurement)]
    pub temperature: Option<f64>,
}

fn parse_measurement(value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(format!("{value} is not a finite measurement"))
    }
}

impl VitalArgs {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.systolic.is_none()
            && self.diastolic.is_none()
            && self.oxygen.is_none()
            && self.temperature.is_none()
    }

    pub fn to_reading(&self, user_id: &str) -> VitalSigns {
        let mut reading = VitalSigns::new(user_id);
        reading.heart_rate = self.heart_rate;
        reading.systolic = self.systolic;
        reading.diastolic = self.diastolic;
        reading.oxygen_saturation = self.oxygen;
        reading.temperature = self.temperature;
        reading
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., thresholds.heart_rate.max)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum AlertAction {
    /// List alerts, newest first
    List {
        /// Only unread alerts
        #[arg(long)]
        unread: bool,

        /// Maximum number of alerts to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Mark an alert (or all alerts) as read
    Read {
        /// Alert id
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        #[arg(long)]
        all: bool,
    },
    /// Mark an alert as attended
    Attend {
        /// Alert id
        id: String,
    },
    /// Delete an alert (or every read alert)
    Delete {
        /// Alert id
        #[arg(required_unless_present = "read", conflicts_with = "read")]
        id: Option<String>,

        /// Delete all alerts already read
        #[arg(long)]
        read: bool,
    },
    /// Show the number of unread alerts
    Count,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a reading, store alerts for anomalies and notify urgent ones
    Record {
        #[command(flatten)]
        vitals: VitalArgs,
    },

    /// Classify a reading without storing anything
    Check {
        #[command(flatten)]
        vitals: VitalArgs,
    },

    /// Show recent readings
    History {
        /// Number of readings to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Alert management
    Alerts {
        #[command(subcommand)]
        action: AlertAction,
    },

    /// Raise an SOS emergency alert
    Sos {
        /// Message delivered with the alert
        #[arg(long, default_value = "Emergency assistance requested")]
        message: String,
    },

    /// Show the effective vital-sign thresholds
    Thresholds,

    /// Export readings and alerts
    Export {
        /// Output file (JSON) or directory (with --csv)
        path: PathBuf,

        /// Write CSV files instead of JSON
        #[arg(long)]
        csv: bool,

        /// Include every patient, not just the selected one
        #[arg(long)]
        all_users: bool,
    },

    /// Import a JSON export
    Import {
        /// File produced by `vitalcare export`
        path: PathBuf,
    },

    /// Send a test desktop notification
    NotifyTest,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record() {
        let cli = Cli::try_parse_from([
            "vitalcare", "--user", "maria", "record",
            "--systolic", "190", "--diastolic", "125", "--oxygen", "88",
        ]).unwrap();

        assert_eq!(cli.user.as_deref(), Some("maria"));
        match cli.command {
            Commands::Record { vitals } => {
                assert_eq!(vitals.systolic, Some(190));
                assert_eq!(vitals.oxygen, Some(88.0));
                assert!(vitals.heart_rate.is_none());
                let reading = vitals.to_reading("maria");
                assert_eq!(reading.diastolic, Some(125));
            }
            _ => panic!("expected record command"),
        }
    }

    #[test]
    fn test_alert_read_requires_id_or_all() {
        assert!(Cli::try_parse_from(["vitalcare", "alerts", "read"]).is_err());
        assert!(Cli::try_parse_from(["vitalcare", "alerts", "read", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["vitalcare", "alerts", "read", "abc", "--all"]).is_err());
    }

    #[test]
    fn test_non_finite_measurements_rejected() {
        for bad in ["NaN", "inf", "-inf"] {
            assert!(Cli::try_parse_from(["vitalcare", "record", "--temperature", bad]).is_err());
            assert!(Cli::try_parse_from(["vitalcare", "check", "--oxygen", bad]).is_err());
        }
        assert!(Cli::try_parse_from(["vitalcare", "record", "--temperature", "37.2"]).is_ok());
    }

    #[test]
    fn test_empty_vital_args() {
        assert!(VitalArgs::default().is_empty());
    }
}
