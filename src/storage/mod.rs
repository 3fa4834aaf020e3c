// Local alert and vital-sign repository
pub mod sqlite;
pub mod migrations;

pub use sqlite::Database;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::models::{Alert, AlertSeverity, AlertType, VitalSigns};
    use tempfile::TempDir;

    #[test]
    fn test_database_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("vitalcare.db");

        let db = Database::new(&db_path).unwrap();
        assert!(db_path.exists());

        let reading = VitalSigns::new("patient-1").with_heart_rate(130);
        let alert = Alert::new("patient-1", "Tachycardia", "130 bpm", AlertSeverity::Medium, AlertType::VitalSigns)
            .with_related_id(reading.id.clone());
        db.save_vitals(&reading).unwrap();
        db.insert_alert(&alert).unwrap();

        // Re-opening must not re-run migrations destructively
        drop(db);
        let db2 = Database::new(&db_path).unwrap();
        assert!(db2.get_vitals(&reading.id).unwrap().is_some());
        assert_eq!(db2.unread_count("patient-1").unwrap(), 1);
    }
}
