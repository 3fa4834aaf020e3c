//! Threshold-based anomaly classification over a single vital-signs reading.
//!
//! Channels are evaluated independently in a fixed order (blood pressure,
//! heart rate, oxygen saturation, temperature). A missing channel is skipped,
//! and every channel contributes at most one [`AnomalyResult`].

use crate::alerts::thresholds::{
    AnomalyKind, AnomalyPriority, AnomalyResult, ThresholdError, VitalThresholds,
};
use crate::models::{Alert, AlertType, VitalSigns};

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    thresholds: VitalThresholds,
}

impl AnomalyDetector {
    pub fn new(thresholds: VitalThresholds) -> Result<Self, ThresholdError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &VitalThresholds {
        &self.thresholds
    }

    /// Classify a reading. Returns one entry per out-of-range channel present.
    pub fn analyze(&self, vitals: &VitalSigns) -> Vec<AnomalyResult> {
        let mut results = Vec::new();

        results.extend(self.check_blood_pressure(vitals));
        results.extend(vitals.heart_rate.and_then(|bpm| self.check_heart_rate(bpm)));
        results.extend(vitals.oxygen_saturation.and_then(|spo2| self.check_oxygen(spo2)));
        results.extend(vitals.temperature.and_then(|celsius| self.check_temperature(celsius)));

        results
    }

    fn check_blood_pressure(&self, vitals: &VitalSigns) -> Option<AnomalyResult> {
        let label = vitals.blood_pressure_label()?;
        let bp = &self.thresholds.blood_pressure;
        let (sys, dia) = (vitals.systolic, vitals.diastolic);

        let reaches = |systolic: u32, diastolic: u32| {
            sys.is_some_and(|v| v >= systolic) || dia.is_some_and(|v| v >= diastolic)
        };
        let above = sys.is_some_and(|v| v > bp.systolic_max) || dia.is_some_and(|v| v > bp.diastolic_max);

        if above {
            let priority = if reaches(bp.systolic_high, bp.diastolic_high) {
                AnomalyPriority::High
            } else if reaches(bp.systolic_medium, bp.diastolic_medium) {
                AnomalyPriority::Medium
            } else {
                AnomalyPriority::Low
            };
            return Some(anomaly(
                AnomalyKind::PressureHigh,
                priority,
                format!("{} mmHg", label),
                format!(
                    "Blood pressure {} mmHg is above the normal limit of {}/{} mmHg",
                    label, bp.systolic_max, bp.diastolic_max
                ),
            ));
        }

        let below = sys.is_some_and(|v| v < bp.systolic_min) || dia.is_some_and(|v| v < bp.diastolic_min);
        if below {
            return Some(anomaly(
                AnomalyKind::PressureLow,
                AnomalyPriority::Medium,
                format!("{} mmHg", label),
                format!(
                    "Blood pressure {} mmHg is below the normal limit of {}/{} mmHg",
                    label, bp.systolic_min, bp.diastolic_min
                ),
            ));
        }

        None
    }

    fn check_heart_rate(&self, bpm: u32) -> Option<AnomalyResult> {
        let hr = &self.thresholds.heart_rate;

        if bpm > hr.max {
            let priority = tier(bpm, hr.medium, hr.high);
            return Some(anomaly(
                AnomalyKind::HeartRateHigh,
                priority,
                format!("{} bpm", bpm),
                format!("Heart rate {} bpm is above the normal maximum of {} bpm", bpm, hr.max),
            ));
        }

        if bpm < hr.min {
            return Some(anomaly(
                AnomalyKind::HeartRateLow,
                AnomalyPriority::Medium,
                format!("{} bpm", bpm),
                format!("Heart rate {} bpm is below the normal minimum of {} bpm", bpm, hr.min),
            ));
        }

        None
    }

    fn check_oxygen(&self, spo2: f64) -> Option<AnomalyResult> {
        let oxygen = &self.thresholds.oxygen;

        let priority = if spo2 < oxygen.critical_min {
            AnomalyPriority::High
        } else if spo2 < oxygen.normal_min {
            AnomalyPriority::Medium
        } else {
            return None;
        };

        Some(anomaly(
            AnomalyKind::OxygenLow,
            priority,
            format!("{:.1}%", spo2),
            format!(
                "Oxygen saturation {:.1}% is below the normal minimum of {:.1}%",
                spo2, oxygen.normal_min
            ),
        ))
    }

    fn check_temperature(&self, celsius: f64) -> Option<AnomalyResult> {
        let t = &self.thresholds.temperature;

        if celsius > t.max {
            let priority = tier(celsius, t.medium, t.high);
            return Some(anomaly(
                AnomalyKind::TemperatureHigh,
                priority,
                format!("{:.1} °C", celsius),
                format!("Temperature {:.1} °C is above the normal maximum of {:.1} °C", celsius, t.max),
            ));
        }

        if celsius < t.min {
            return Some(anomaly(
                AnomalyKind::TemperatureLow,
                AnomalyPriority::Medium,
                format!("{:.1} °C", celsius),
                format!("Temperature {:.1} °C is below the normal minimum of {:.1} °C", celsius, t.min),
            ));
        }

        None
    }
}

/// Medium and high priority anomalies are pushed to the patient and tutor right away.
pub fn requires_immediate_notification(result: &AnomalyResult) -> bool {
    matches!(result.priority, AnomalyPriority::Medium | AnomalyPriority::High)
}

/// Build one unread vital-signs alert per anomaly, in the same order.
pub fn create_alerts(vitals: &VitalSigns, results: &[AnomalyResult]) -> Vec<Alert> {
    results
        .iter()
        .filter(|result| result.has_anomaly)
        .map(|result| {
            Alert::new(
                vitals.user_id.clone(),
                result.kind.title(),
                format!("{}. {}", result.description, result.recommendation),
                result.priority.severity(),
                AlertType::VitalSigns,
            )
            .with_related_id(vitals.id.clone())
        })
        .collect()
}

fn tier<T: PartialOrd>(value: T, medium: T, high: T) -> AnomalyPriority {
    if value >= high {
        AnomalyPriority::High
    } else if value >= medium {
        AnomalyPriority::Medium
    } else {
        AnomalyPriority::Low
    }
}

fn anomaly(
    kind: AnomalyKind,
    priority: AnomalyPriority,
    measured: String,
    description: String,
) -> AnomalyResult {
    AnomalyResult {
        has_anomaly: true,
        kind,
        priority,
        measured,
        description,
        recommendation: recommendation(kind, priority).to_string(),
    }
}

fn recommendation(kind: AnomalyKind, priority: AnomalyPriority) -> &'static str {
    match (kind, priority) {
        (AnomalyKind::PressureHigh, AnomalyPriority::High) => {
            "Seek emergency care immediately; this may be a hypertensive crisis"
        }
        (AnomalyKind::PressureHigh, AnomalyPriority::Medium) => {
            "Rest for a few minutes, measure again and contact your doctor if it persists"
        }
        (AnomalyKind::PressureHigh, AnomalyPriority::Low) => {
            "Reduce salt and caffeine intake and keep monitoring"
        }
        (AnomalyKind::PressureLow, _) => {
            "Sit or lie down, drink water and stand up slowly"
        }
        (AnomalyKind::HeartRateHigh, AnomalyPriority::High) => {
            "Stop all activity and seek medical attention immediately"
        }
        (AnomalyKind::HeartRateHigh, _) => {
            "Rest, breathe slowly and measure again in a few minutes"
        }
        (AnomalyKind::HeartRateLow, _) => {
            "Contact your doctor if you feel dizzy, weak or short of breath"
        }
        (AnomalyKind::OxygenLow, AnomalyPriority::High) => {
            "Seek emergency care immediately; oxygen saturation is critically low"
        }
        (AnomalyKind::OxygenLow, _) => {
            "Breathe deeply, sit upright and measure again; contact your doctor if it stays low"
        }
        (AnomalyKind::TemperatureHigh, AnomalyPriority::High) => {
            "Take an antipyretic and contact your doctor as soon as possible"
        }
        (AnomalyKind::TemperatureHigh, _) => {
            "Stay hydrated, rest and keep monitoring your temperature"
        }
        (AnomalyKind::TemperatureLow, _) => {
            "Move to a warm place, cover up and drink something warm"
        }
    }
}
