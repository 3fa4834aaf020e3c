use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single vital-signs reading for one user. Any channel may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub id: String,
    pub user_id: String,
    pub heart_rate: Option<u32>,        // bpm
    pub systolic: Option<u32>,          // mmHg
    pub diastolic: Option<u32>,         // mmHg
    pub oxygen_saturation: Option<f64>, // SpO2 %
    pub temperature: Option<f64>,       // °C
    pub timestamp: DateTime<Utc>,
}

impl VitalSigns {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            heart_rate: None,
            systolic: None,
            diastolic: None,
            oxygen_saturation: None,
            temperature: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_heart_rate(mut self, bpm: u32) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    pub fn with_blood_pressure(mut self, systolic: u32, diastolic: u32) -> Self {
        self.systolic = Some(systolic);
        self.diastolic = Some(diastolic);
        self
    }

    pub fn with_oxygen_saturation(mut self, percent: f64) -> Self {
        self.oxygen_saturation = Some(percent);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Blood pressure counts as present when either side was measured.
    pub fn has_blood_pressure(&self) -> bool {
        self.systolic.is_some() || self.diastolic.is_some()
    }

    pub fn has_any_channel(&self) -> bool {
        self.has_blood_pressure()
            || self.heart_rate.is_some()
            || self.oxygen_saturation.is_some()
            || self.temperature.is_some()
    }

    pub fn blood_pressure_label(&self) -> Option<String> {
        if !self.has_blood_pressure() {
            return None;
        }
        let side = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        Some(format!("{}/{}", side(self.systolic), side(self.diastolic)))
    }
}
