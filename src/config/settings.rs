use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use std::fs;

use crate::alerts::VitalThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub database: DatabaseConfig,
    pub notifications: NotificationConfig,
    pub output: OutputConfig,
    pub thresholds: VitalThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub default_user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub cooldown_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: String, // "table" or "json"
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                default_user: "patient".to_string(),
            },
            database: DatabaseConfig {
                path: "~/.local/share/vitalcare/vitalcare.db".to_string(),
            },
            notifications: NotificationConfig {
                enabled: true,
                cooldown_minutes: 30,
            },
            output: OutputConfig {
                format: "table".to_string(),
            },
            thresholds: VitalThresholds::default(),
        }
    }
}

impl Config {
    /// Load from `path`, writing a commented default file first if none exists.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "Created default configuration");
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.thresholds.validate()
            .with_context(|| format!("Invalid thresholds in config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml()?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// TOML with a short explanation above every section.
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# VitalCare Configuration File\n");
        output.push_str("# All settings can be changed with: vitalcare config set <key> <value>\n");
        output.push_str("\n");

        output.push_str("[general]\n");
        output.push_str("# Patient id used when --user is not passed\n");
        output.push_str(&format!("default_user = {}\n", toml_string(&self.general.default_user)));
        output.push_str("\n");

        output.push_str("[database]\n");
        output.push_str("# SQLite file holding readings and alerts (~ expands to your home directory)\n");
        output.push_str(&format!("path = {}\n", toml_string(&self.database.path)));
        output.push_str("\n");

        output.push_str("[notifications]\n");
        output.push_str("# Desktop notifications for medium and high priority anomalies\n");
        output.push_str(&format!("enabled = {}\n", self.notifications.enabled));
        output.push_str("# Minutes before the same anomaly notifies the same patient again.\n");
        output.push_str("# High priority anomalies and SOS alerts always notify.\n");
        output.push_str(&format!("cooldown_minutes = {}\n", self.notifications.cooldown_minutes));
        output.push_str("\n");

        output.push_str("[output]\n");
        output.push_str("# \"table\" or \"json\"; --json overrides\n");
        output.push_str(&format!("format = {}\n", toml_string(&self.output.format)));
        output.push_str("\n");

        output.push_str("# Normal ranges are inclusive. Values above `max` escalate to medium\n");
        output.push_str("# priority at `medium` and to high priority at `high`.\n");
        let thresholds = toml::to_string(&ThresholdsSection { thresholds: &self.thresholds })
            .context("Failed to serialize thresholds")?;
        output.push_str(&thresholds);

        Ok(output)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to determine home directory")?;
        Ok(home.join(".config").join("vitalcare").join("config.toml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        expand_home(&self.database.path)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();

        match key {
            "general.default_user" => {
                if value.trim().is_empty() {
                    anyhow::bail!("default_user cannot be empty");
                }
                updated.general.default_user = value.to_string();
            }
            "database.path" => updated.database.path = value.to_string(),
            "notifications.enabled" => {
                updated.notifications.enabled = value.parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "notifications.cooldown_minutes" => {
                updated.notifications.cooldown_minutes = value.parse()
                    .with_context(|| format!("Invalid cooldown value: {}", value))?;
            }
            "output.format" => {
                if !["table", "json"].contains(&value) {
                    anyhow::bail!("Invalid output format: {}. Must be 'table' or 'json'", value);
                }
                updated.output.format = value.to_string();
            }
            _ => match key.strip_prefix("thresholds.") {
                Some(threshold_key) => {
                    set_threshold(&mut updated.thresholds, threshold_key, value)?;
                    updated.thresholds.validate()
                        .with_context(|| format!("Rejected {} = {}", key, value))?;
                }
                None => anyhow::bail!("Unknown configuration key: {}", key),
            },
        }

        *self = updated;
        Ok(())
    }
}

#[derive(Serialize)]
struct ThresholdsSection<'a> {
    thresholds: &'a VitalThresholds,
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn set_threshold(thresholds: &mut VitalThresholds, key: &str, value: &str) -> Result<()> {
    let int = || -> Result<u32> {
        value.parse().with_context(|| format!("Invalid integer value: {}", value))
    };
    let float = || -> Result<f64> {
        value.parse().with_context(|| format!("Invalid numeric value: {}", value))
    };

    let bp = &mut thresholds.blood_pressure;
    let hr = &mut thresholds.heart_rate;
    let t = &mut thresholds.temperature;

    match key {
        "blood_pressure.systolic_min" => bp.systolic_min = int()?,
        "blood_pressure.systolic_max" => bp.systolic_max = int()?,
        "blood_pressure.diastolic_min" => bp.diastolic_min = int()?,
        "blood_pressure.diastolic_max" => bp.diastolic_max = int()?,
        "blood_pressure.systolic_medium" => bp.systolic_medium = int()?,
        "blood_pressure.systolic_high" => bp.systolic_high = int()?,
        "blood_pressure.diastolic_medium" => bp.diastolic_medium = int()?,
        "blood_pressure.diastolic_high" => bp.diastolic_high = int()?,
        "heart_rate.min" => hr.min = int()?,
        "heart_rate.max" => hr.max = int()?,
        "heart_rate.medium" => hr.medium = int()?,
        "heart_rate.high" => hr.high = int()?,
        "oxygen.normal_min" => thresholds.oxygen.normal_min = float()?,
        "oxygen.critical_min" => thresholds.oxygen.critical_min = float()?,
        "temperature.min" => t.min = float()?,
        "temperature.max" => t.max = float()?,
        "temperature.medium" => t.medium = float()?,
        "temperature.high" => t.high = float()?,
        _ => anyhow::bail!("Unknown threshold key: thresholds.{}", key),
    }
    Ok(())
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .context("Failed to determine home directory")?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commented_toml_parses_back() {
        let config = Config::default();
        let text = config.to_commented_toml().unwrap();
        assert!(text.contains("[thresholds.heart_rate]"));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vitalcare").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.thresholds.heart_rate.min = 150;
        config.save_to(&path).unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();
        config.set_value("general.default_user", "maria").unwrap();
        config.set_value("notifications.cooldown_minutes", "15").unwrap();
        config.set_value("thresholds.heart_rate.max", "110").unwrap();
        config.set_value("thresholds.temperature.high", "40.0").unwrap();

        assert_eq!(config.general.default_user, "maria");
        assert_eq!(config.notifications.cooldown_minutes, 15);
        assert_eq!(config.thresholds.heart_rate.max, 110);
        assert_eq!(config.thresholds.temperature.high, 40.0);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set_value("output.format", "xml").is_err());
        assert!(config.set_value("notifications.enabled", "maybe").is_err());
        assert!(config.set_value("thresholds.heart_rate.max", "fast").is_err());
        assert!(config.set_value("thresholds.pulse.max", "100").is_err());
        assert!(config.set_value("unknown.key", "1").is_err());
    }

    #[test]
    fn test_invalid_threshold_leaves_config_untouched() {
        let mut config = Config::default();
        // Max above the medium tier breaks the tier ordering
        assert!(config.set_value("thresholds.heart_rate.max", "130").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_database_path_expansion() {
        let mut config = Config::default();
        config.database.path = "/tmp/vitalcare.db".to_string();
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/vitalcare.db"));
    }
}
