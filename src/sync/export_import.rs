use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use chrono::{DateTime, Utc};
use crate::models::{Alert, VitalSigns};
use crate::storage::Database;
use crate::storage::sqlite::format_timestamp;

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub vital_signs: Vec<VitalSigns>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub vital_signs_imported: usize,
    pub alerts_imported: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub struct ExportImportManager<'a> {
    database: &'a Database,
}

impl<'a> ExportImportManager<'a> {
    pub fn new(database: &'a Database) -> Self {
        Self { database }
    }

    /// Export readings and alerts, for one user or everyone.
    pub fn export_to_json(&self, output_path: &Path, user_id: Option<&str>) -> Result<ExportData> {
        let export_data = ExportData {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            user_id: user_id.map(str::to_string),
            vital_signs: self.database.list_vitals(user_id, None)?,
            alerts: self.database.list_alerts(user_id, false, None)?,
        };

        let json_content = serde_json::to_string_pretty(&export_data)?;
        fs::write(output_path, json_content)
            .with_context(|| format!("Failed to write export file: {}", output_path.display()))?;

        tracing::info!(
            path = %output_path.display(),
            vital_signs = export_data.vital_signs.len(),
            alerts = export_data.alerts.len(),
            "Exported data"
        );
        Ok(export_data)
    }

    /// Write `vital_signs.csv` and `alerts.csv` into `output_dir`.
    pub fn export_to_csv(&self, output_dir: &Path, user_id: Option<&str>) -> Result<()> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create export directory: {}", output_dir.display()))?;

        let vitals = self.database.list_vitals(user_id, None)?;
        self.write_vitals_csv(&vitals, &output_dir.join("vital_signs.csv"))?;

        let alerts = self.database.list_alerts(user_id, false, None)?;
        self.write_alerts_csv(&alerts, &output_dir.join("alerts.csv"))?;

        Ok(())
    }

    /// Import a JSON export. Rows whose id already exists are skipped.
    pub fn import_from_json(&self, import_path: &Path) -> Result<ImportResult> {
        let json_content = fs::read_to_string(import_path)
            .with_context(|| format!("Failed to read import file: {}", import_path.display()))?;
        let import_data: ExportData = serde_json::from_str(&json_content)
            .with_context(|| format!("Failed to parse import file: {}", import_path.display()))?;

        if import_data.version != EXPORT_VERSION {
            anyhow::bail!(
                "Unsupported export version {} (expected {})",
                import_data.version,
                EXPORT_VERSION
            );
        }

        Ok(self.import_data(import_data))
    }

    fn import_data(&self, import_data: ExportData) -> ImportResult {
        let mut result = ImportResult::default();

        for vitals in &import_data.vital_signs {
            match self.database.save_vitals_if_absent(vitals) {
                Ok(true) => result.vital_signs_imported += 1,
                Ok(false) => result.duplicates_skipped += 1,
                Err(e) => result.errors.push(format!("Failed to import reading {}: {:#}", vitals.id, e)),
            }
        }

        for alert in &import_data.alerts {
            match self.database.insert_alert_if_absent(alert) {
                Ok(true) => result.alerts_imported += 1,
                Ok(false) => result.duplicates_skipped += 1,
                Err(e) => result.errors.push(format!("Failed to import alert {}: {:#}", alert.id, e)),
            }
        }

        result
    }

    fn write_vitals_csv(&self, vitals: &[VitalSigns], path: &Path) -> Result<()> {
        let mut csv_content = String::new();
        csv_content.push_str("id,user_id,heart_rate,systolic,diastolic,oxygen_saturation,temperature,recorded_at\n");

        for v in vitals {
            csv_content.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                csv_field(&v.id),
                csv_field(&v.user_id),
                optional(v.heart_rate),
                optional(v.systolic),
                optional(v.diastolic),
                optional(v.oxygen_saturation),
                optional(v.temperature),
                format_timestamp(&v.timestamp),
            ));
        }

        fs::write(path, csv_content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn write_alerts_csv(&self, alerts: &[Alert], path: &Path) -> Result<()> {
        let mut csv_content = String::new();
        csv_content.push_str("id,user_id,title,message,severity,alert_type,is_read,attended,created_at,related_id\n");

        for alert in alerts {
            csv_content.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                csv_field(&alert.id),
                csv_field(&alert.user_id),
                csv_field(&alert.title),
                csv_field(&alert.message),
                alert.severity,
                alert.alert_type,
                alert.is_read,
                alert.attended,
                format_timestamp(&alert.timestamp),
                csv_field(alert.related_id.as_deref().unwrap_or("")),
            ));
        }

        fs::write(path, csv_content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
