//! Database migrations and compatibility

use crate::error::{StoreError, StoreResult};
use crate::storage::schema::*;
use rusqlite::{Connection, OptionalExtension, params};

/// Migrations in the order they must be applied
const MIGRATIONS: &[(&str, &str)] = &[
    ("initial_schema", "Token table and word index"),
    ("add_batch_registry", "Batch registry with backfill of existing batches"),
    ("add_position_index", "Unique (batch, document, position) index"),
];

/// Database migration manager
#[derive(Debug, Default)]
pub struct MigrationManager;

impl MigrationManager {
    pub fn new() -> Self {
        Self
    }

    /// Run all pending migrations, each in its own transaction
    pub fn run_migrations(&self, conn: &mut Connection) -> StoreResult<usize> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY,
                version TEXT NOT NULL UNIQUE,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .map_err(|e| StoreError::sqlite("Failed to create migrations table", e))?;

        let applied = self.applied_versions(conn)?;
        let mut count = 0;

        for (version, description) in MIGRATIONS {
            if applied.iter().any(|v| v == version) {
                continue;
            }
            log::info!("Applying migration: {} - {}", version, description);

            let tx = conn
                .transaction()
                .map_err(|e| StoreError::sqlite("Failed to start migration transaction", e))?;
            self.apply_migration(&tx, version)?;
            tx.execute("INSERT INTO migrations (version) VALUES (?1)", [version])
                .map_err(|e| {
                    StoreError::sqlite(&format!("Failed to record migration {}", version), e)
                })?;
            tx.commit().map_err(|e| {
                StoreError::sqlite(&format!("Failed to commit migration {}", version), e)
            })?;
            count += 1;
        }

        conn.execute_batch(CREATE_METADATA_TABLE)
            .map_err(|e| StoreError::sqlite("Failed to create metadata table", e))?;
        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| StoreError::sqlite("Failed to set schema version", e))?;

        Ok(count)
    }

    fn applied_versions(&self, conn: &Connection) -> StoreResult<Vec<String>> {
        let mut stmt = conn
            .prepare("SELECT version FROM migrations ORDER BY id")
            .map_err(|e| StoreError::sqlite("Failed to prepare migration query", e))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::sqlite("Failed to execute migration query", e))?;

        let mut versions = Vec::new();
        for version in rows {
            versions.push(
                version.map_err(|e| StoreError::sqlite("Failed to read migration version", e))?,
            );
        }
        Ok(versions)
    }

    /// Apply a specific migration
    fn apply_migration(&self, conn: &Connection, version: &str) -> StoreResult<()> {
        match version {
            "initial_schema" => conn
                .execute_batch(CREATE_TOKENS_TABLE)
                .map_err(|e| StoreError::sqlite("Failed to create tokenized_texts table", e)),
            "add_batch_registry" => {
                conn.execute_batch(CREATE_BATCHES_TABLE)
                    .map_err(|e| StoreError::sqlite("Failed to create batches table", e))?;
                let backfilled = conn
                    .execute(BACKFILL_BATCHES, [chrono::Utc::now().to_rfc3339()])
                    .map_err(|e| StoreError::sqlite("Failed to backfill batches", e))?;
                if backfilled > 0 {
                    log::info!("Registered {} pre-existing batches", backfilled);
                }
                Ok(())
            }
            "add_position_index" => conn
                .execute_batch(CREATE_POSITION_INDEX)
                .map_err(|e| StoreError::sqlite("Failed to create position index", e)),
            _ => Err(StoreError::io(format!("Unknown migration version: {}", version))),
        }
    }

    /// Latest applied migration, if any
    pub fn current_version(&self, conn: &Connection) -> StoreResult<Option<String>> {
        conn.query_row(
            "SELECT version FROM migrations ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| StoreError::sqlite("Failed to query current version", e))
    }

    /// Check if database is up to date
    pub fn is_up_to_date(&self, conn: &Connection) -> StoreResult<bool> {
        let latest = MIGRATIONS.last().map(|(version, _)| *version);
        Ok(self.current_version(conn)?.as_deref() == latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_migrates_fully() {
        let mut conn = Connection::open_in_memory().unwrap();
        let manager = MigrationManager::new();

        let applied = manager.run_migrations(&mut conn).unwrap();
        assert_eq!(applied, MIGRATIONS.len());
        assert!(manager.is_up_to_date(&conn).unwrap());
        assert_eq!(
            manager.current_version(&conn).unwrap().as_deref(),
            Some("add_position_index")
        );

        // A second run is a no-op
        assert_eq!(manager.run_migrations(&mut conn).unwrap(), 0);
    }

    #[test]
    fn test_registry_backfill_from_older_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE migrations (
                id INTEGER PRIMARY KEY,
                version TEXT NOT NULL UNIQUE,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO migrations (version) VALUES ('initial_schema');",
        )
        .unwrap();
        conn.execute_batch(CREATE_TOKENS_TABLE).unwrap();
        conn.execute_batch(
            "INSERT INTO tokenized_texts (batch_id, document_id, text, word, position)
             VALUES ('old', 'd1', 'a b', 'a', 0), ('old', 'd1', 'a b', 'b', 1),
                    ('old', 'd2', 'c', 'c', 0);",
        )
        .unwrap();

        let manager = MigrationManager::new();
        assert_eq!(manager.run_migrations(&mut conn).unwrap(), 2);

        let (status, documents): (String, i64) = conn
            .query_row(
                "SELECT status, document_count FROM batches WHERE batch_id = 'old'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(status, "complete");
        assert_eq!(documents, 2);
    }
}
