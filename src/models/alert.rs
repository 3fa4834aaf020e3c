use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(AlertSeverity::Low),
            "medium" => Ok(AlertSeverity::Medium),
            "high" => Ok(AlertSeverity::High),
            "critical" => Ok(AlertSeverity::Critical),
            other => anyhow::bail!("Unknown alert severity: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    VitalSigns,
    Sos,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::VitalSigns => "vital_signs",
            AlertType::Sos => "sos",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vital_signs" => Ok(AlertType::VitalSigns),
            "sos" => Ok(AlertType::Sos),
            other => anyhow::bail!("Unknown alert type: {}", other),
        }
    }
}

/// Persisted alert shown to the patient and their tutor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub alert_type: AlertType,
    pub is_read: bool,
    pub attended: bool,
    pub timestamp: DateTime<Utc>,
    pub related_id: Option<String>,
}

impl Alert {
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: AlertSeverity,
        alert_type: AlertType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            message: message.into(),
            severity,
            alert_type,
            is_read: false,
            attended: false,
            timestamp: Utc::now(),
            related_id: None,
        }
    }

    pub fn with_related_id(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }

    /// SOS alerts are always critical and point at whatever triggered them, if anything.
    pub fn sos(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            user_id,
            "SOS Emergency",
            message,
            AlertSeverity::Critical,
            AlertType::Sos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_alert_is_unread() {
        let alert = Alert::new("u1", "t", "m", AlertSeverity::Medium, AlertType::VitalSigns);
        assert!(!alert.is_read);
        assert!(!alert.attended);
        assert!(alert.related_id.is_none());
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let a = Alert::new("u1", "t", "m", AlertSeverity::Low, AlertType::VitalSigns);
        let b = Alert::new("u1", "t", "m", AlertSeverity::Low, AlertType::VitalSigns);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("HIGH".parse::<AlertSeverity>().unwrap(), AlertSeverity::High);
        assert_eq!("critical".parse::<AlertSeverity>().unwrap(), AlertSeverity::Critical);
        assert!("urgent".parse::<AlertSeverity>().is_err());
        assert!(AlertSeverity::Critical > AlertSeverity::High);
    }

    #[test]
    fn test_sos_alert() {
        let alert = Alert::sos("u1", "Fell in the kitchen");
        assert_eq!(alert.alert_type, AlertType::Sos);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!("sos".parse::<AlertType>().unwrap(), AlertType::Sos);
    }
}
