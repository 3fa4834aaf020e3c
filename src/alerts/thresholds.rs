use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::AlertSeverity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureThresholds {
    pub systolic_min: u32,
    pub systolic_max: u32,
    pub diastolic_min: u32,
    pub diastolic_max: u32,
    pub systolic_medium: u32, // escalates "pressure high" to medium priority
    pub systolic_high: u32,   // escalates "pressure high" to high priority
    pub diastolic_medium: u32,
    pub diastolic_high: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateThresholds {
    pub min: u32,
    pub max: u32,
    pub medium: u32,
    pub high: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenThresholds {
    pub normal_min: f64,
    pub critical_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureThresholds {
    pub min: f64,
    pub max: f64,
    pub medium: f64,
    pub high: f64,
}

/// Normal ranges and escalation tiers for every vital-sign channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalThresholds {
    pub blood_pressure: BloodPressureThresholds,
    pub heart_rate: HeartRateThresholds,
    pub oxygen: OxygenThresholds,
    pub temperature: TemperatureThresholds,
}

impl Default for VitalThresholds {
    fn default() -> Self {
        Self {
            blood_pressure: BloodPressureThresholds {
                systolic_min: 90,
                systolic_max: 140,
                diastolic_min: 60,
                diastolic_max: 90,
                systolic_medium: 160,
                systolic_high: 180,
                diastolic_medium: 100,
                diastolic_high: 120,
            },
            heart_rate: HeartRateThresholds {
                min: 60,
                max: 100,
                medium: 120,
                high: 140,
            },
            oxygen: OxygenThresholds {
                normal_min: 95.0,
                critical_min: 90.0,
            },
            temperature: TemperatureThresholds {
                min: 36.0,
                max: 37.5,
                medium: 38.5,
                high: 39.5,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("{channel}: minimum {min} must be below maximum {max}")]
    InvertedRange {
        channel: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{channel}: escalation tiers must satisfy max ({max}) < medium ({medium}) <= high ({high})")]
    UnorderedTiers {
        channel: &'static str,
        max: f64,
        medium: f64,
        high: f64,
    },
    #[error("oxygen: critical minimum {critical} must be below normal minimum {normal}")]
    OxygenCritical { critical: f64, normal: f64 },
}

impl VitalThresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let bp = &self.blood_pressure;
        check_range("systolic", bp.systolic_min as f64, bp.systolic_max as f64)?;
        check_range("diastolic", bp.diastolic_min as f64, bp.diastolic_max as f64)?;
        check_tiers(
            "systolic",
            bp.systolic_max as f64,
            bp.systolic_medium as f64,
            bp.systolic_high as f64,
        )?;
        check_tiers(
            "diastolic",
            bp.diastolic_max as f64,
            bp.diastolic_medium as f64,
            bp.diastolic_high as f64,
        )?;

        let hr = &self.heart_rate;
        check_range("heart_rate", hr.min as f64, hr.max as f64)?;
        check_tiers("heart_rate", hr.max as f64, hr.medium as f64, hr.high as f64)?;

        if self.oxygen.critical_min >= self.oxygen.normal_min {
            return Err(ThresholdError::OxygenCritical {
                critical: self.oxygen.critical_min,
                normal: self.oxygen.normal_min,
            });
        }

        let t = &self.temperature;
        check_range("temperature", t.min, t.max)?;
        check_tiers("temperature", t.max, t.medium, t.high)?;

        Ok(())
    }
}

fn check_range(channel: &'static str, min: f64, max: f64) -> Result<(), ThresholdError> {
    if min >= max {
        return Err(ThresholdError::InvertedRange { channel, min, max });
    }
    Ok(())
}

fn check_tiers(channel: &'static str, max: f64, medium: f64, high: f64) -> Result<(), ThresholdError> {
    if max >= medium || medium > high {
        return Err(ThresholdError::UnorderedTiers {
            channel,
            max,
            medium,
            high,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalChannel {
    BloodPressure,
    HeartRate,
    Oxygen,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    PressureHigh,
    PressureLow,
    HeartRateHigh,
    HeartRateLow,
    OxygenLow,
    TemperatureHigh,
    TemperatureLow,
}

impl AnomalyKind {
    pub fn id(&self) -> &'static str {
        match self {
            AnomalyKind::PressureHigh => "pressure_high",
            AnomalyKind::PressureLow => "pressure_low",
            AnomalyKind::HeartRateHigh => "heart_rate_high",
            AnomalyKind::HeartRateLow => "heart_rate_low",
            AnomalyKind::OxygenLow => "oxygen_low",
            AnomalyKind::TemperatureHigh => "temperature_high",
            AnomalyKind::TemperatureLow => "temperature_low",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AnomalyKind::PressureHigh => "High Blood Pressure",
            AnomalyKind::PressureLow => "Low Blood Pressure",
            AnomalyKind::HeartRateHigh => "Tachycardia",
            AnomalyKind::HeartRateLow => "Bradycardia",
            AnomalyKind::OxygenLow => "Low Oxygen Saturation",
            AnomalyKind::TemperatureHigh => "Fever",
            AnomalyKind::TemperatureLow => "Hypothermia",
        }
    }

    pub fn channel(&self) -> VitalChannel {
        match self {
            AnomalyKind::PressureHigh | AnomalyKind::PressureLow => VitalChannel::BloodPressure,
            AnomalyKind::HeartRateHigh | AnomalyKind::HeartRateLow => VitalChannel::HeartRate,
            AnomalyKind::OxygenLow => VitalChannel::Oxygen,
            AnomalyKind::TemperatureHigh | AnomalyKind::TemperatureLow => VitalChannel::Temperature,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPriority {
    Low,
    Medium,
    High,
}

impl AnomalyPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyPriority::Low => "low",
            AnomalyPriority::Medium => "medium",
            AnomalyPriority::High => "high",
        }
    }

    pub fn severity(&self) -> AlertSeverity {
        match self {
            AnomalyPriority::Low => AlertSeverity::Low,
            AnomalyPriority::Medium => AlertSeverity::Medium,
            AnomalyPriority::High => AlertSeverity::High,
        }
    }
}

impl fmt::Display for AnomalyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one channel of a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub has_anomaly: bool,
    pub kind: AnomalyKind,
    pub priority: AnomalyPriority,
    pub measured: String,
    pub description: String,
    pub recommendation: String,
}

/// Notification cooldown for one (user, anomaly kind) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRule {
    pub user_id: String,
    pub kind: AnomalyKind,
    pub last_triggered: Option<DateTime<Utc>>,
    pub cooldown_minutes: u32,
}

impl NotificationRule {
    pub fn new(user_id: impl Into<String>, kind: AnomalyKind, cooldown_minutes: u32) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            last_triggered: None,
            cooldown_minutes,
        }
    }

    pub fn can_trigger(&self, now: DateTime<Utc>) -> bool {
        match self.last_triggered {
            Some(last) => now - last >= Duration::minutes(self.cooldown_minutes as i64),
            None => true,
        }
    }

    pub fn mark_triggered(&mut self, now: DateTime<Utc>) {
        self.last_triggered = Some(now);
    }
}
