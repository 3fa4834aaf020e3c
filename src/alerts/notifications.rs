use crate::models::{Alert, AlertSeverity, AlertType};
use anyhow::{Context, Result};
use notify_rust::{Notification, Timeout};

/// Delivery channel for alerts that must reach the patient or tutor right away.
pub trait Notifier {
    fn notify(&self, alert: &Alert) -> Result<()>;
}

pub struct NotificationHandler {
    enabled: bool,
}

impl NotificationHandler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn send_alert(&self, alert: &Alert) -> Result<()> {
        if !self.enabled {
            tracing::debug!(alert_id = %alert.id, "Desktop notifications disabled, skipping");
            return Ok(());
        }

        let (timeout, urgency) = match alert.severity {
            AlertSeverity::Critical => (Timeout::Never, notify_rust::Urgency::Critical),
            AlertSeverity::High => (Timeout::Milliseconds(10000), notify_rust::Urgency::Critical),
            AlertSeverity::Medium => (Timeout::Milliseconds(7000), notify_rust::Urgency::Normal),
            AlertSeverity::Low => (Timeout::Milliseconds(5000), notify_rust::Urgency::Low),
        };

        let icon = match alert.alert_type {
            AlertType::Sos => "dialog-error",
            AlertType::VitalSigns => match alert.severity {
                AlertSeverity::Low => "dialog-information",
                _ => "dialog-warning",
            },
        };

        let mut notification = Notification::new();
        notification
            .summary(&alert.title)
            .body(&alert.message)
            .timeout(timeout)
            .urgency(urgency)
            .appname("vitalcare")
            .icon(icon);

        notification.show()
            .context("Failed to show desktop notification")?;

        tracing::info!(alert_id = %alert.id, severity = %alert.severity, "Notification sent");
        Ok(())
    }

    pub fn send_test_notification(&self) -> Result<()> {
        if !self.enabled {
            return Err(anyhow::anyhow!("Desktop notifications are disabled"));
        }

        Notification::new()
            .summary("VitalCare Notification Test")
            .body("Desktop notifications are working. You'll be alerted when a vital sign needs attention.")
            .timeout(Timeout::Milliseconds(5000))
            .urgency(notify_rust::Urgency::Normal)
            .appname("vitalcare")
            .icon("dialog-information")
            .show()
            .context("Failed to show test notification")?;

        Ok(())
    }

    pub fn is_available() -> bool {
        #[cfg(target_os = "linux")]
        {
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        }

        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            true
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            false
        }
    }
}

impl Notifier for NotificationHandler {
    fn notify(&self, alert: &Alert) -> Result<()> {
        self.send_alert(alert)
    }
}
