use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "vitals_and_alerts",
        sql: include_str!("../../migrations/001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "notification_log",
        sql: include_str!("../../migrations/002_notification_log.sql"),
    },
];

/// Highest applied migration, 0 for a fresh store.
pub fn get_schema_version(connection: &Connection) -> Result<i32> {
    connection
        .execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)", [])
        .context("Failed to create schema_version table")?;

    let version = connection
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get::<_, Option<i32>>(0))
        .optional()
        .context("Failed to read schema version")?
        .flatten();

    Ok(version.unwrap_or(0))
}

/// Bring the vitals store up to the latest schema. Each step commits with its version row.
pub fn apply_migrations(connection: &Connection) -> Result<()> {
    let current = get_schema_version(connection)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(version = migration.version, name = migration.name, "Applying migration");

        let tx = connection.unchecked_transaction()
            .context("Failed to start migration transaction")?;
        tx.execute_batch(migration.sql)
            .with_context(|| format!("Failed to apply migration {} ({})", migration.version, migration.name))?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [migration.version])
            .with_context(|| format!("Failed to record schema version {}", migration.version))?;
        tx.commit()
            .with_context(|| format!("Failed to commit migration {}", migration.version))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_tables(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name != 'schema_version' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0)).unwrap().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_fresh_store_has_no_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_all_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), MIGRATIONS.len() as i32);
        assert_eq!(store_tables(&conn), vec!["alerts", "notification_log", "vital_signs"]);
    }

    #[test]
    fn test_rerun_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();

        let rows: i64 = conn.query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0)).unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_upgrade_from_first_version() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0].sql).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY);
             INSERT INTO schema_version (version) VALUES (1);",
        ).unwrap();

        apply_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        assert!(store_tables(&conn).contains(&"notification_log".to_string()));
    }

    #[test]
    fn test_versions_strictly_increase() {
        assert!(MIGRATIONS.windows(2).all(|pair| pair[0].version < pair[1].version));
    }
}
