//! SQLite positional store for nextword-rs
//!
//! Holds one row per `(batch, document, position, word)` and answers
//! adjacency queries through a self-join on `position + 1` inside the same
//! batch and document. The word index makes the query cost follow the number
//! of keyword occurrences rather than the corpus size.
//!
//! The connection sits behind a mutex, so a store shared through an `Arc`
//! serializes writes, deletes and queries. Each document insert and each batch
//! delete is a single transaction; a reader never sees half of either.
//! Write transactions take the write lock up front, so a second process
//! writing the same file waits out the busy timeout instead of failing.

use crate::config::StorageConfig;
use crate::error::{StoreError, StoreResult};
use crate::storage::migrations::MigrationManager;
use crate::storage::schema::*;
use crate::storage::{BatchInfo, BatchStatus, StoreStats, WordCount};
use crate::text::TokenizedDocument;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Persistent positional word index
pub struct PositionalStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl PositionalStore {
    /// Open (or create) a store at `path` with default settings
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let config = StorageConfig {
            database_path: path.as_ref().to_path_buf(),
            ..Default::default()
        };
        Self::open_with_config(&config)
    }

    /// Open (or create) the store described by `config`
    pub fn open_with_config(config: &StorageConfig) -> StoreResult<Self> {
        let path = &config.database_path;
        let conn = Connection::open(path).map_err(|e| {
            StoreError::sqlite(&format!("Failed to open database {}", path.display()), e)
        })?;

        let store = Self::initialize(conn, config, Some(path.clone()))?;
        log::info!("Opened positional store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::sqlite("Failed to create in-memory database", e))?;
        let config = StorageConfig {
            wal: false,
            ..Default::default()
        };
        Self::initialize(conn, &config, None)
    }

    fn initialize(
        mut conn: Connection,
        config: &StorageConfig,
        path: Option<PathBuf>,
    ) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| StoreError::sqlite("Failed to set busy timeout", e))?;

        if config.wal && path.is_some() {
            let _: String = conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| StoreError::sqlite("Failed to enable WAL mode", e))?;
        }

        let applied = MigrationManager::new().run_migrations(&mut conn)?;
        log::info!(
            "Database initialized with schema version {} ({} migrations applied)",
            SCHEMA_VERSION,
            applied
        );

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::io("Store connection lock is poisoned"))
    }

    /// Register a new batch. This is the atomic create-if-absent step: an
    /// existing registration fails with `ConstraintViolation`.
    pub fn create_batch(&self, batch_id: &str, source: Option<&Path>) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO batches (batch_id, source_path, created_at, status, document_count)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                batch_id,
                source.map(|p| p.to_string_lossy().to_string()),
                Utc::now().to_rfc3339(),
                BatchStatus::Ingesting.as_str(),
            ],
        )
        .map_err(|e| StoreError::sqlite(&format!("Failed to register batch '{}'", batch_id), e))?;

        log::info!("Registered batch '{}'", batch_id);
        Ok(())
    }

    /// Record the outcome of an ingestion run
    pub fn finish_batch(
        &self,
        batch_id: &str,
        status: BatchStatus,
        document_count: usize,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE batches SET status = ?2, document_count = ?3 WHERE batch_id = ?1",
                params![batch_id, status.as_str(), document_count as i64],
            )
            .map_err(|e| StoreError::sqlite(&format!("Failed to finish batch '{}'", batch_id), e))?;

        if updated == 0 {
            return Err(StoreError::not_found(format!(
                "Batch '{}' is not registered",
                batch_id
            )));
        }
        log::info!("Batch '{}' marked {} with {} documents", batch_id, status, document_count);
        Ok(())
    }

    /// Write every token of one document in a single transaction.
    ///
    /// Either all rows of the document become visible or none do. The batch
    /// must be registered (`NotFound` otherwise), and writing a document that
    /// already has rows in the batch fails with `ConstraintViolation`.
    /// Returns the number of rows written.
    pub fn insert_document(
        &self,
        batch_id: &str,
        document: &TokenizedDocument,
    ) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StoreError::sqlite("Failed to start transaction", e))?;

        let registered: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM batches WHERE batch_id = ?1",
                [batch_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::sqlite("Failed to look up batch", e))?;
        if registered.is_none() {
            return Err(StoreError::not_found(format!(
                "Batch '{}' is not registered",
                batch_id
            )));
        }

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare_cached(INSERT_TOKEN)
                .map_err(|e| StoreError::sqlite("Failed to prepare statement", e))?;

            for (position, word, text) in document.positioned_words() {
                stmt.execute(params![
                    batch_id,
                    document.document_id,
                    text,
                    word,
                    position as i64,
                ])
                .map_err(|e| {
                    StoreError::sqlite(
                        &format!(
                            "Failed to insert token {} of document '{}'",
                            position, document.document_id
                        ),
                        e,
                    )
                })?;
                inserted += 1;
            }
        }

        tx.commit().map_err(|e| {
            StoreError::sqlite(
                &format!("Failed to commit document '{}'", document.document_id),
                e,
            )
        })?;

        log::debug!(
            "Inserted {} tokens for document '{}' in batch '{}'",
            inserted,
            document.document_id,
            batch_id
        );
        Ok(inserted)
    }

    /// True iff the batch is registered
    pub fn batch_exists(&self, batch_id: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM batches WHERE batch_id = ?1",
                [batch_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::sqlite("Failed to check batch existence", e))?;
        Ok(found.is_some())
    }

    /// Remove every record of a batch together with its registration.
    ///
    /// Returns the number of token rows removed; `NotFound` when the batch
    /// had neither rows nor a registration.
    pub fn delete_batch(&self, batch_id: &str) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StoreError::sqlite("Failed to start transaction", e))?;

        let tokens = tx
            .execute("DELETE FROM tokenized_texts WHERE batch_id = ?1", [batch_id])
            .map_err(|e| {
                StoreError::sqlite(&format!("Failed to delete tokens of '{}'", batch_id), e)
            })?;
        let registrations = tx
            .execute("DELETE FROM batches WHERE batch_id = ?1", [batch_id])
            .map_err(|e| StoreError::sqlite(&format!("Failed to unregister '{}'", batch_id), e))?;

        if tokens == 0 && registrations == 0 {
            return Err(StoreError::not_found(format!(
                "Batch '{}' does not exist",
                batch_id
            )));
        }

        tx.commit().map_err(|e| {
            StoreError::sqlite(&format!("Failed to commit deletion of '{}'", batch_id), e)
        })?;

        log::info!("Deleted batch '{}' ({} tokens)", batch_id, tokens);
        Ok(tokens)
    }

    /// Registered batch ids
    pub fn list_batches(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT batch_id FROM batches ORDER BY batch_id")
            .map_err(|e| StoreError::sqlite("Failed to prepare query", e))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::sqlite("Failed to list batches", e))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| StoreError::sqlite("Failed to read batch row", e))?);
        }
        Ok(result)
    }

    /// Registry entries with token counts
    pub fn batch_info(&self) -> StoreResult<Vec<BatchInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(SELECT_BATCH_INFO)
            .map_err(|e| StoreError::sqlite("Failed to prepare query", e))?;

        let rows = stmt
            .query_map([], row_to_batch_info)
            .map_err(|e| StoreError::sqlite("Failed to query batches", e))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| StoreError::sqlite("Failed to read batch row", e))?);
        }
        Ok(result)
    }

    /// Words found at `position + 1` after `keyword` in the same document,
    /// most frequent first, at most `limit` entries.
    pub fn next_word_counts(&self, keyword: &str, limit: usize) -> StoreResult<Vec<WordCount>> {
        if keyword.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached(NEXT_WORD_COUNTS)
            .map_err(|e| StoreError::sqlite("Failed to prepare adjacency query", e))?;

        let rows = stmt
            .query_map(params![keyword, limit as i64], |row| {
                Ok(WordCount {
                    word: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })
            .map_err(|e| StoreError::sqlite("Failed to run adjacency query", e))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| StoreError::sqlite("Failed to read adjacency row", e))?);
        }
        Ok(result)
    }

    /// Number of occurrences of `word` across all batches
    pub fn word_frequency(&self, word: &str) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM tokenized_texts WHERE word = ?1",
                [word],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::sqlite("Failed to count word", e))?;
        Ok(count as usize)
    }

    /// Stored `(position, word)` sequence of one document, in position order
    pub fn document_words(
        &self,
        batch_id: &str,
        document_id: &str,
    ) -> StoreResult<Vec<(usize, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT position, word FROM tokenized_texts
                 WHERE batch_id = ?1 AND document_id = ?2
                 ORDER BY position",
            )
            .map_err(|e| StoreError::sqlite("Failed to prepare query", e))?;

        let rows = stmt
            .query_map([batch_id, document_id], |row| {
                Ok((row.get::<_, i64>(0)? as usize, row.get::<_, String>(1)?))
            })
            .map_err(|e| StoreError::sqlite("Failed to query document", e))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| StoreError::sqlite("Failed to read token row", e))?);
        }
        Ok(result)
    }

    /// Get store statistics
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let conn = self.lock()?;
        let (token_count, document_count, distinct_words): (i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*),
                        (SELECT COUNT(*) FROM (SELECT DISTINCT batch_id, document_id FROM tokenized_texts)),
                        COUNT(DISTINCT word)
                 FROM tokenized_texts",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e| StoreError::sqlite("Failed to count tokens", e))?;

        let batch_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM batches", [], |row| row.get(0))
            .map_err(|e| StoreError::sqlite("Failed to count batches", e))?;

        let file_size: i64 = conn
            .query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::sqlite("Failed to get database size", e))?;

        Ok(StoreStats {
            token_count: token_count as usize,
            document_count: document_count as usize,
            batch_count: batch_count as usize,
            distinct_words: distinct_words as usize,
            file_size_bytes: file_size as usize,
        })
    }

    /// Close the connection, reporting any error SQLite raises on close
    pub fn close(self) -> StoreResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StoreError::io("Store connection lock is poisoned"))?;
        conn.close()
            .map_err(|(_, e)| StoreError::sqlite("Failed to close database", e))?;
        if let Some(path) = &self.path {
            log::info!("Closed positional store at {}", path.display());
        }
        Ok(())
    }
}

fn row_to_batch_info(row: &Row) -> rusqlite::Result<BatchInfo> {
    let created_at: String = row.get(2)?;
    let status: String = row.get(3)?;

    Ok(BatchInfo {
        batch_id: row.get(0)?,
        source_path: row.get(1)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        status: status.parse().unwrap_or(BatchStatus::Incomplete),
        document_count: row.get::<_, i64>(4)? as usize,
        token_count: row.get::<_, i64>(5)? as usize,
    })
}
