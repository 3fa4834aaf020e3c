use std::path::Path;
use anyhow::{Result, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use crate::models::{Alert, VitalSigns};
use crate::storage::migrations::apply_migrations;

const VITALS_COLUMNS: &str =
    "id, user_id, heart_rate, systolic, diastolic, oxygen_saturation, temperature, recorded_at";
const ALERT_COLUMNS: &str =
    "id, user_id, title, message, severity, alert_type, is_read, attended, created_at, related_id";

pub struct Database {
    connection: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connection", &"<SQLite Connection>")
            .finish()
    }
}

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let connection = Connection::open(path)
            .with_context(|| format!("Failed to open database at: {}", path.display()))?;

        connection.execute_batch("
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = memory;
        ").context("Failed to configure SQLite pragmas")?;

        let db = Database { connection };
        db.init_schema()?;

        tracing::debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;
        let db = Database { connection };
        db.init_schema()?;
        Ok(db)
    }

    pub fn init_schema(&self) -> Result<()> {
        apply_migrations(&self.connection)
            .context("Failed to apply database migrations")
    }

    // Vital-sign readings

    pub fn save_vitals(&self, vitals: &VitalSigns) -> Result<()> {
        self.write_vitals("INSERT", vitals)
            .with_context(|| format!("Failed to save vital signs {}", vitals.id))?;
        Ok(())
    }

    /// Insert unless a reading with the same id exists. Returns whether a row was written.
    pub fn save_vitals_if_absent(&self, vitals: &VitalSigns) -> Result<bool> {
        let rows = self.write_vitals("INSERT OR IGNORE", vitals)
            .with_context(|| format!("Failed to import vital signs {}", vitals.id))?;
        Ok(rows > 0)
    }

    fn write_vitals(&self, verb: &str, vitals: &VitalSigns) -> rusqlite::Result<usize> {
        self.connection.execute(
            &format!("{verb} INTO vital_signs ({VITALS_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                vitals.id,
                vitals.user_id,
                vitals.heart_rate,
                vitals.systolic,
                vitals.diastolic,
                vitals.oxygen_saturation,
                vitals.temperature,
                format_timestamp(&vitals.timestamp),
            ],
        )
    }

    pub fn get_vitals(&self, id: &str) -> Result<Option<VitalSigns>> {
        self.connection.query_row(
            &format!("SELECT {VITALS_COLUMNS} FROM vital_signs WHERE id = ?1"),
            [id],
            vitals_from_row,
        ).optional().context("Failed to load vital signs")
    }

    /// Most recent readings first. `None` for user lists every user.
    pub fn list_vitals(&self, user_id: Option<&str>, limit: Option<usize>) -> Result<Vec<VitalSigns>> {
        let mut stmt = self.connection.prepare(&format!(
            "SELECT {VITALS_COLUMNS} FROM vital_signs
             WHERE (?1 IS NULL OR user_id = ?1)
             ORDER BY recorded_at DESC, rowid DESC LIMIT ?2"
        )).context("Failed to prepare vital signs query")?;

        let rows = stmt.query_map(params![user_id, sql_limit(limit)], vitals_from_row)
            .context("Failed to execute vital signs query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to parse vital signs row")?);
        }
        Ok(results)
    }

    pub fn latest_vitals(&self, user_id: &str) -> Result<Option<VitalSigns>> {
        Ok(self.list_vitals(Some(user_id), Some(1))?.into_iter().next())
    }

    /// Store a reading together with the alerts raised from it, in one transaction.
    pub fn save_reading_with_alerts(&self, vitals: &VitalSigns, alerts: &[Alert]) -> Result<()> {
        let tx = self.connection.unchecked_transaction()
            .context("Failed to start reading transaction")?;
        self.write_vitals("INSERT", vitals)
            .with_context(|| format!("Failed to save vital signs {}", vitals.id))?;
        for alert in alerts {
            self.write_alert("INSERT", alert)
                .with_context(|| format!("Failed to insert alert {}", alert.id))?;
        }
        tx.commit().context("Failed to commit reading")?;
        Ok(())
    }

    // Alerts

    pub fn insert_alert(&self, alert: &Alert) -> Result<()> {
        self.write_alert("INSERT", alert)
            .with_context(|| format!("Failed to insert alert {}", alert.id))?;
        Ok(())
    }

    pub fn insert_alert_if_absent(&self, alert: &Alert) -> Result<bool> {
        let rows = self.write_alert("INSERT OR IGNORE", alert)
            .with_context(|| format!("Failed to import alert {}", alert.id))?;
        Ok(rows > 0)
    }

    fn write_alert(&self, verb: &str, alert: &Alert) -> rusqlite::Result<usize> {
        self.connection.execute(
            &format!("{verb} INTO alerts ({ALERT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                alert.id,
                alert.user_id,
                alert.title,
                alert.message,
                alert.severity.as_str(),
                alert.alert_type.as_str(),
                alert.is_read,
                alert.attended,
                format_timestamp(&alert.timestamp),
                alert.related_id,
            ],
        )
    }

    pub fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        self.connection.query_row(
            &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
            [id],
            alert_from_row,
        ).optional().context("Failed to load alert")
    }

    /// Newest alerts first.
    pub fn list_alerts(&self, user_id: Option<&str>, unread_only: bool, limit: Option<usize>) -> Result<Vec<Alert>> {
        let mut stmt = self.connection.prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts
             WHERE (?1 IS NULL OR user_id = ?1) AND (?2 = 0 OR is_read = 0)
             ORDER BY created_at DESC, rowid DESC LIMIT ?3"
        )).context("Failed to prepare alert query")?;

        let rows = stmt.query_map(params![user_id, unread_only, sql_limit(limit)], alert_from_row)
            .context("Failed to execute alert query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to parse alert row")?);
        }
        Ok(results)
    }

    pub fn unread_count(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM alerts WHERE user_id = ?1 AND is_read = 0",
            [user_id],
            |row| row.get(0),
        ).context("Failed to count unread alerts")?;
        Ok(count as usize)
    }

    pub fn mark_read(&self, id: &str) -> Result<bool> {
        let rows = self.connection.execute("UPDATE alerts SET is_read = 1 WHERE id = ?1", [id])
            .context("Failed to mark alert as read")?;
        Ok(rows > 0)
    }

    pub fn mark_all_read(&self, user_id: &str) -> Result<usize> {
        self.connection.execute(
            "UPDATE alerts SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            [user_id],
        ).context("Failed to mark alerts as read")
    }

    /// Attending an alert implies it has been read.
    pub fn mark_attended(&self, id: &str) -> Result<bool> {
        let rows = self.connection.execute(
            "UPDATE alerts SET attended = 1, is_read = 1 WHERE id = ?1",
            [id],
        ).context("Failed to mark alert as attended")?;
        Ok(rows > 0)
    }

    pub fn delete_alert(&self, id: &str) -> Result<bool> {
        let rows = self.connection.execute("DELETE FROM alerts WHERE id = ?1", [id])
            .context("Failed to delete alert")?;
        Ok(rows > 0)
    }

    pub fn delete_read_alerts(&self, user_id: &str) -> Result<usize> {
        self.connection.execute(
            "DELETE FROM alerts WHERE user_id = ?1 AND is_read = 1",
            [user_id],
        ).context("Failed to delete read alerts")
    }

    // Notification log

    /// When `kind` was last pushed to the notifier for `user_id`.
    pub fn last_notified(&self, user_id: &str, kind: &str) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = self.connection.query_row(
            "SELECT notified_at FROM notification_log WHERE user_id = ?1 AND kind = ?2",
            [user_id, kind],
            |row| row.get(0),
        ).optional().context("Failed to load notification log")?;

        value.map(|v| parse_timestamp(0, v)).transpose()
            .context("Failed to parse notification timestamp")
    }

    pub fn record_notification(&self, user_id: &str, kind: &str, at: &DateTime<Utc>) -> Result<()> {
        self.connection.execute(
            "INSERT INTO notification_log (user_id, kind, notified_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, kind) DO UPDATE SET notified_at = excluded.notified_at",
            params![user_id, kind, format_timestamp(at)],
        ).context("Failed to record notification")?;
        Ok(())
    }
}

fn sql_limit(limit: Option<usize>) -> i64 {
    // SQLite treats a negative LIMIT as unbounded
    limit.map(|l| l as i64).unwrap_or(-1)
}

pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn vitals_from_row(row: &Row<'_>) -> rusqlite::Result<VitalSigns> {
    Ok(VitalSigns {
        id: row.get(0)?,
        user_id: row.get(1)?,
        heart_rate: row.get(2)?,
        systolic: row.get(3)?,
        diastolic: row.get(4)?,
        oxygen_saturation: row.get(5)?,
        temperature: row.get(6)?,
        timestamp: parse_timestamp(7, row.get(7)?)?,
    })
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let severity: String = row.get(4)?;
    let alert_type: String = row.get(5)?;

    Ok(Alert {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        severity: severity.parse()
            .map_err(|e: anyhow::Error| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
        alert_type: alert_type.parse()
            .map_err(|e: anyhow::Error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into()))?,
        is_read: row.get(6)?,
        attended: row.get(7)?,
        timestamp: parse_timestamp(8, row.get(8)?)?,
        related_id: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, AlertType};
    use chrono::Duration;

    fn alert_at(user: &str, minutes_ago: i64) -> Alert {
        let mut alert = Alert::new(user, "Fever", "Temperature 38.9 °C", AlertSeverity::Medium, AlertType::VitalSigns);
        alert.timestamp = Utc::now() - Duration::minutes(minutes_ago);
        alert
    }

    #[test]
    fn test_vitals_round_trip_keeps_missing_channels() {
        let db = Database::in_memory().unwrap();
        let reading = VitalSigns::new("u1").with_heart_rate(88).with_temperature(37.1);
        db.save_vitals(&reading).unwrap();

        let loaded = db.get_vitals(&reading.id).unwrap().unwrap();
        assert_eq!(loaded.heart_rate, Some(88));
        assert_eq!(loaded.systolic, None);
        assert_eq!(loaded.oxygen_saturation, None);
        assert_eq!(format_timestamp(&loaded.timestamp), format_timestamp(&reading.timestamp));
    }

    #[test]
    fn test_duplicate_vitals_rejected() {
        let db = Database::in_memory().unwrap();
        let reading = VitalSigns::new("u1").with_heart_rate(70);
        db.save_vitals(&reading).unwrap();
        assert!(db.save_vitals(&reading).is_err());
        assert!(!db.save_vitals_if_absent(&reading).unwrap());
    }

    #[test]
    fn test_list_vitals_newest_first() {
        let db = Database::in_memory().unwrap();
        let old = VitalSigns::new("u1").with_heart_rate(70).with_timestamp(Utc::now() - Duration::hours(2));
        let new = VitalSigns::new("u1").with_heart_rate(90);
        let other = VitalSigns::new("u2").with_heart_rate(65);
        for v in [&old, &new, &other] {
            db.save_vitals(v).unwrap();
        }

        let listed = db.list_vitals(Some("u1"), None).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, new.id);
        assert_eq!(db.latest_vitals("u1").unwrap().unwrap().id, new.id);
        assert_eq!(db.list_vitals(None, None).unwrap().len(), 3);
        assert_eq!(db.list_vitals(None, Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_alert_read_and_attend() {
        let db = Database::in_memory().unwrap();
        let alert = alert_at("u1", 0).with_related_id("reading-1");
        db.insert_alert(&alert).unwrap();
        assert_eq!(db.unread_count("u1").unwrap(), 1);

        assert!(db.mark_read(&alert.id).unwrap());
        assert_eq!(db.unread_count("u1").unwrap(), 0);

        assert!(db.mark_attended(&alert.id).unwrap());
        let loaded = db.get_alert(&alert.id).unwrap().unwrap();
        assert!(loaded.is_read);
        assert!(loaded.attended);
        assert_eq!(loaded.related_id.as_deref(), Some("reading-1"));
        assert_eq!(loaded.severity, AlertSeverity::Medium);

        assert!(!db.mark_read("missing").unwrap());
    }

    #[test]
    fn test_list_alerts_filters() {
        let db = Database::in_memory().unwrap();
        let older = alert_at("u1", 30);
        let newer = alert_at("u1", 5);
        for alert in [&older, &newer, &alert_at("u2", 1)] {
            db.insert_alert(alert).unwrap();
        }
        db.mark_read(&older.id).unwrap();

        let all = db.list_alerts(Some("u1"), false, None).unwrap();
        assert_eq!(all.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec![newer.id.as_str(), older.id.as_str()]);

        let unread = db.list_alerts(Some("u1"), true, None).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, newer.id);

        assert_eq!(db.list_alerts(None, false, Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_mark_all_read_and_delete_read() {
        let db = Database::in_memory().unwrap();
        for alert in [alert_at("u1", 3), alert_at("u1", 2), alert_at("u2", 1)] {
            db.insert_alert(&alert).unwrap();
        }

        assert_eq!(db.mark_all_read("u1").unwrap(), 2);
        assert_eq!(db.delete_read_alerts("u1").unwrap(), 2);
        assert!(db.list_alerts(Some("u1"), false, None).unwrap().is_empty());
        assert_eq!(db.unread_count("u2").unwrap(), 1);
    }

    #[test]
    fn test_reading_and_alerts_saved_together() {
        let db = Database::in_memory().unwrap();
        let existing = alert_at("u1", 0);
        db.insert_alert(&existing).unwrap();

        // A clashing alert id rolls the reading back too
        let reading = VitalSigns::new("u1").with_heart_rate(130);
        assert!(db.save_reading_with_alerts(&reading, &[alert_at("u1", 0), existing.clone()]).is_err());
        assert!(db.get_vitals(&reading.id).unwrap().is_none());
        assert_eq!(db.list_alerts(Some("u1"), false, None).unwrap().len(), 1);

        let alert = alert_at("u1", 0).with_related_id(reading.id.clone());
        db.save_reading_with_alerts(&reading, &[alert.clone()]).unwrap();
        assert!(db.get_vitals(&reading.id).unwrap().is_some());
        assert!(db.get_alert(&alert.id).unwrap().is_some());
    }

    #[test]
    fn test_notification_log_keeps_latest_per_kind() {
        let db = Database::in_memory().unwrap();
        assert!(db.last_notified("u1", "heart_rate_high").unwrap().is_none());

        let first = Utc::now() - Duration::minutes(40);
        let second = Utc::now();
        db.record_notification("u1", "heart_rate_high", &first).unwrap();
        db.record_notification("u1", "heart_rate_high", &second).unwrap();
        db.record_notification("u2", "heart_rate_high", &first).unwrap();

        let last = db.last_notified("u1", "heart_rate_high").unwrap().unwrap();
        assert_eq!(format_timestamp(&last), format_timestamp(&second));
        assert!(db.last_notified("u1", "oxygen_low").unwrap().is_none());
        let other = db.last_notified("u2", "heart_rate_high").unwrap().unwrap();
        assert_eq!(format_timestamp(&other), format_timestamp(&first));
    }

    #[test]
    fn test_delete_alert() {
        let db = Database::in_memory().unwrap();
        let alert = alert_at("u1", 0);
        db.insert_alert(&alert).unwrap();

        assert!(db.delete_alert(&alert.id).unwrap());
        assert!(!db.delete_alert(&alert.id).unwrap());
        assert!(db.get_alert(&alert.id).unwrap().is_none());
    }
}
