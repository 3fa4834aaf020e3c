use crate::alerts::{
    detector::{create_alerts, requires_immediate_notification, AnomalyDetector},
    notifications::Notifier,
    thresholds::{AnomalyPriority, AnomalyResult, NotificationRule},
};
use crate::models::{Alert, VitalSigns};
use crate::storage::Database;
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

/// Everything that happened while recording one reading.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorOutcome {
    pub reading: VitalSigns,
    pub anomalies: Vec<AnomalyResult>,
    pub alerts: Vec<Alert>,
    /// Alert ids pushed to the notifier.
    pub notified: Vec<String>,
    /// Alert ids whose notification failed. They stay stored and unread.
    pub failed: Vec<String>,
}

/// Records readings, turns anomalies into stored alerts and notifies the urgent ones.
///
/// The cooldown is read from the store's notification log, so it holds across
/// separate monitor instances sharing one database.
pub struct VitalMonitor {
    detector: AnomalyDetector,
    database: Database,
    notifier: Box<dyn Notifier>,
    cooldown_minutes: u32,
}

impl VitalMonitor {
    pub fn new(detector: AnomalyDetector, database: Database, notifier: Box<dyn Notifier>) -> Self {
        Self {
            detector,
            database,
            notifier,
            cooldown_minutes: 30,
        }
    }

    pub fn with_cooldown_minutes(mut self, minutes: u32) -> Self {
        self.cooldown_minutes = minutes;
        self
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Persist a reading with one alert per anomaly, then push the urgent ones.
    pub fn record_reading(&mut self, reading: VitalSigns) -> Result<MonitorOutcome> {
        let anomalies = self.detector.analyze(&reading);
        let alerts = create_alerts(&reading, &anomalies);
        self.database.save_reading_with_alerts(&reading, &alerts)?;
        tracing::info!(reading_id = %reading.id, user_id = %reading.user_id, alerts = alerts.len(), "Recorded vital signs");

        let mut notified = Vec::new();
        let mut failed = Vec::new();
        for (anomaly, alert) in anomalies.iter().zip(&alerts) {
            tracing::warn!(
                user_id = %reading.user_id,
                kind = %anomaly.kind,
                priority = %anomaly.priority,
                "Anomaly detected: {}", anomaly.description
            );

            if !requires_immediate_notification(anomaly) {
                continue;
            }
            let mut rule = self.notification_rule(&reading.user_id, anomaly)?;
            let now = Utc::now();
            if anomaly.priority != AnomalyPriority::High && !rule.can_trigger(now) {
                tracing::debug!(kind = %anomaly.kind, "Notification suppressed by cooldown");
                continue;
            }

            if let Err(e) = self.notifier.notify(alert) {
                tracing::error!(alert_id = %alert.id, kind = %anomaly.kind, "Failed to send notification: {e:#}");
                failed.push(alert.id.clone());
                continue;
            }
            rule.mark_triggered(now);
            if let Err(e) = self.database.record_notification(&rule.user_id, rule.kind.id(), &now) {
                tracing::error!(alert_id = %alert.id, "Failed to log notification: {e:#}");
            }
            notified.push(alert.id.clone());
        }

        Ok(MonitorOutcome {
            reading,
            anomalies,
            alerts,
            notified,
            failed,
        })
    }

    /// Raise an SOS alert. It is always stored and always notified, cooldown or not.
    /// A notifier failure is logged; the stored alert is still returned.
    pub fn raise_sos(&mut self, user_id: &str, message: &str, related_id: Option<&str>) -> Result<Alert> {
        let mut alert = Alert::sos(user_id, message);
        alert.related_id = related_id.map(str::to_string);

        self.database.insert_alert(&alert)?;
        tracing::warn!(user_id = %user_id, alert_id = %alert.id, "SOS raised");

        if let Err(e) = self.notifier.notify(&alert) {
            tracing::error!(alert_id = %alert.id, "Failed to send SOS notification: {e:#}");
        }
        Ok(alert)
    }

    fn notification_rule(&self, user_id: &str, anomaly: &AnomalyResult) -> Result<NotificationRule> {
        let mut rule = NotificationRule::new(user_id, anomaly.kind, self.cooldown_minutes);
        rule.last_triggered = self.database.last_notified(user_id, anomaly.kind.id())?;
        Ok(rule)
    }
}
