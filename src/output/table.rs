use tabled::{Table, Tabled};
use serde::Serialize;
use crate::alerts::{requires_immediate_notification, AnomalyResult, VitalThresholds};
use crate::models::{Alert, VitalSigns};

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String;
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

#[derive(Tabled, Serialize, Debug)]
pub struct VitalsRow {
    #[tabled(rename = "Recorded")]
    pub recorded: String,
    #[tabled(rename = "Blood Pressure")]
    pub blood_pressure: String,
    #[tabled(rename = "Heart Rate")]
    pub heart_rate: String,
    #[tabled(rename = "SpO2")]
    pub oxygen: String,
    #[tabled(rename = "Temp")]
    pub temperature: String,
    #[tabled(rename = "ID")]
    pub id: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct AnomalyRow {
    #[tabled(rename = "Anomaly")]
    pub anomaly: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Priority")]
    pub priority: String,
    #[tabled(rename = "Notify")]
    pub notify: String,
    #[tabled(rename = "Recommendation")]
    pub recommendation: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct AlertRow {
    #[tabled(rename = "")]
    pub status: String,
    #[tabled(rename = "When")]
    pub when: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Type")]
    pub alert_type: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "ID")]
    pub id: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct ThresholdRow {
    #[tabled(rename = "Channel")]
    pub channel: String,
    #[tabled(rename = "Normal Range")]
    pub normal: String,
    #[tabled(rename = "Medium From")]
    pub medium: String,
    #[tabled(rename = "High From")]
    pub high: String,
}

impl VitalsRow {
    pub fn from_vitals(vitals: &VitalSigns) -> Self {
        Self {
            recorded: vitals.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            blood_pressure: vitals.blood_pressure_label().unwrap_or_else(dash),
            heart_rate: vitals.heart_rate.map(|v| v.to_string()).unwrap_or_else(dash),
            oxygen: vitals.oxygen_saturation.map(|v| format!("{:.1}%", v)).unwrap_or_else(dash),
            temperature: vitals.temperature.map(|v| format!("{:.1}", v)).unwrap_or_else(dash),
            id: short_id(&vitals.id),
        }
    }
}

impl AnomalyRow {
    pub fn from_result(result: &AnomalyResult) -> Self {
        Self {
            anomaly: result.kind.title().to_string(),
            value: result.measured.clone(),
            priority: result.priority.to_string(),
            notify: if requires_immediate_notification(result) { "now" } else { "silent" }.to_string(),
            recommendation: result.recommendation.clone(),
        }
    }
}

impl AlertRow {
    pub fn from_alert(alert: &Alert) -> Self {
        let status = if alert.attended {
            "done"
        } else if alert.is_read {
            ""
        } else {
            "new"
        };
        Self {
            status: status.to_string(),
            when: alert.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            severity: alert.severity.to_string(),
            alert_type: alert.alert_type.to_string(),
            title: alert.title.clone(),
            id: alert.id.clone(),
        }
    }
}

pub fn threshold_rows(thresholds: &VitalThresholds) -> Vec<ThresholdRow> {
    let bp = &thresholds.blood_pressure;
    let hr = &thresholds.heart_rate;
    let oxygen = &thresholds.oxygen;
    let t = &thresholds.temperature;

    vec![
        ThresholdRow {
            channel: "Blood pressure (mmHg)".to_string(),
            normal: format!("{}/{} - {}/{}", bp.systolic_min, bp.diastolic_min, bp.systolic_max, bp.diastolic_max),
            medium: format!("{}/{}", bp.systolic_medium, bp.diastolic_medium),
            high: format!("{}/{}", bp.systolic_high, bp.diastolic_high),
        },
        ThresholdRow {
            channel: "Heart rate (bpm)".to_string(),
            normal: format!("{} - {}", hr.min, hr.max),
            medium: hr.medium.to_string(),
            high: hr.high.to_string(),
        },
        ThresholdRow {
            channel: "Oxygen saturation (%)".to_string(),
            normal: format!(">= {:.1}", oxygen.normal_min),
            medium: format!("< {:.1}", oxygen.normal_min),
            high: format!("< {:.1}", oxygen.critical_min),
        },
        ThresholdRow {
            channel: "Temperature (°C)".to_string(),
            normal: format!("{:.1} - {:.1}", t.min, t.max),
            medium: format!("{:.1}", t.medium),
            high: format!("{:.1}", t.high),
        },
    ]
}

impl OutputFormat for Vec<VitalSigns> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No readings recorded.".to_string();
        }
        Table::new(self.iter().map(VitalsRow::from_vitals)).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutputFormat for Vec<AnomalyResult> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "All vital signs are within normal range.".to_string();
        }
        Table::new(self.iter().map(AnomalyRow::from_result)).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutputFormat for Vec<Alert> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No alerts.".to_string();
        }
        Table::new(self.iter().map(AlertRow::from_alert)).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn dash() -> String {
    "-".to_string()
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AnomalyDetector;
    use crate::models::{AlertSeverity, AlertType};

    #[test]
    fn test_vitals_row_marks_missing_channels() {
        let reading = VitalSigns::new("u1").with_heart_rate(72);
        let row = VitalsRow::from_vitals(&reading);
        assert_eq!(row.heart_rate, "72");
        assert_eq!(row.blood_pressure, "-");
        assert_eq!(row.oxygen, "-");
        assert_eq!(row.id.len(), 8);
    }

    #[test]
    fn test_anomaly_row_notify_column() {
        let detector = AnomalyDetector::default();
        let results = detector.analyze(&VitalSigns::new("u1").with_heart_rate(105).with_oxygen_saturation(85.0));
        let rows: Vec<AnomalyRow> = results.iter().map(AnomalyRow::from_result).collect();
        assert_eq!(rows[0].notify, "silent");
        assert_eq!(rows[1].notify, "now");
        assert_eq!(rows[1].priority, "high");
    }

    #[test]
    fn test_alert_row_status() {
        let mut alert = Alert::new("u1", "Fever", "m", AlertSeverity::Low, AlertType::VitalSigns);
        assert_eq!(AlertRow::from_alert(&alert).status, "new");
        alert.is_read = true;
        assert_eq!(AlertRow::from_alert(&alert).status, "");
        alert.attended = true;
        assert_eq!(AlertRow::from_alert(&alert).status, "done");
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(Vec::<Alert>::new().to_table(), "No alerts.");
        assert_eq!(Vec::<AnomalyResult>::new().to_table(), "All vital signs are within normal range.");
    }

    #[test]
    fn test_threshold_rows() {
        let rows = threshold_rows(&VitalThresholds::default());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].normal, "90/60 - 140/90");
        assert_eq!(rows[1].high, "140");
    }

    #[test]
    fn test_alert_table_contains_title() {
        let alerts = vec![Alert::sos("u1", "help")];
        assert!(alerts.to_table().contains("SOS Emergency"));
        assert!(alerts.to_json().unwrap().contains("\"alert_type\": \"sos\""));
    }
}
