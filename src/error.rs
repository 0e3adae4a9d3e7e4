//! Error types for nextword-rs
//!
//! This module provides the error taxonomy shared by the store, the ingestion
//! pipeline and the query engine.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for nextword operations
#[derive(Error, Debug)]
pub enum NextwordError {
    /// Positional store errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The batch is already registered; it must be deleted before re-ingesting
    #[error("Batch '{0}' already exists, delete it before ingesting again")]
    DuplicateBatch(String),

    /// Whole-run ingestion errors (per-file problems are `IngestionError`s)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Rejected query parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for nextword operations
pub type Result<T> = std::result::Result<T, NextwordError>;

/// Result type alias for positional store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Classification of storage-layer faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreErrorKind {
    /// Disk, lock or corruption faults
    IoFailure,
    /// A uniqueness or other constraint rejected the write
    ConstraintViolation,
    /// The addressed batch or row does not exist
    NotFound,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreErrorKind::IoFailure => "I/O failure",
            StoreErrorKind::ConstraintViolation => "constraint violation",
            StoreErrorKind::NotFound => "not found",
        };
        f.write_str(name)
    }
}

/// Storage-layer error with a kind the callers can branch on
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::IoFailure, message)
    }

    /// Classify a SQLite error and prefix it with the step that failed
    pub fn sqlite(context: &str, err: rusqlite::Error) -> Self {
        let kind = classify(&err);
        Self::new(kind, format!("{}: {}", context, err))
    }

    /// Whether the error ends an ingestion run. Only a constraint violation
    /// is confined to the document that caused it.
    pub fn is_fatal(&self) -> bool {
        self.kind != StoreErrorKind::ConstraintViolation
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let kind = classify(&err);
        Self::new(kind, err.to_string())
    }
}

impl From<rusqlite::Error> for NextwordError {
    fn from(err: rusqlite::Error) -> Self {
        NextwordError::Store(err.into())
    }
}

fn classify(err: &rusqlite::Error) -> StoreErrorKind {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreErrorKind::NotFound,
        _ => match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => StoreErrorKind::ConstraintViolation,
            _ => StoreErrorKind::IoFailure,
        },
    }
}

/// Why a single document could not be ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestionErrorKind {
    /// Not a JSON object of the expected `info[*].annotations.text` shape
    MalformedDocument,
    /// File bytes are not valid UTF-8
    InvalidEncoding,
    /// File or directory entry could not be read
    Unreadable,
    /// Another file in the same batch already produced this document id
    DuplicateDocument,
    /// Store error that stopped the run at this document
    StoreFailure,
}

/// Per-document ingestion failure, recorded in the batch summary
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{}: {kind:?}: {message}", .path.display())]
pub struct IngestionError {
    pub path: PathBuf,
    pub kind: IngestionErrorKind,
    pub message: String,
}

impl IngestionError {
    pub fn new(
        path: impl Into<PathBuf>,
        kind: IngestionErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = NextwordError::DuplicateBatch("kakao1".to_string());
        assert_eq!(
            error.to_string(),
            "Batch 'kakao1' already exists, delete it before ingesting again"
        );

        let store = StoreError::not_found("batch 'x' is not registered");
        assert_eq!(store.to_string(), "not found: batch 'x' is not registered");
    }

    #[test]
    fn test_sqlite_classification() {
        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind, StoreErrorKind::NotFound);

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (k TEXT PRIMARY KEY)", []).unwrap();
        conn.execute("INSERT INTO t (k) VALUES ('a')", []).unwrap();
        let dup = conn.execute("INSERT INTO t (k) VALUES ('a')", []).unwrap_err();
        let err = StoreError::sqlite("Failed to insert", dup);
        assert_eq!(err.kind, StoreErrorKind::ConstraintViolation);
        assert!(err.message.starts_with("Failed to insert"));
        assert!(!err.is_fatal());

        let bad = conn.execute("SELECT * FROM missing_table", []).unwrap_err();
        assert_eq!(StoreError::from(bad).kind, StoreErrorKind::IoFailure);
    }

    #[test]
    fn test_error_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = NextwordError::from(io_error);

        match error {
            NextwordError::Io(_) => (),
            _ => panic!("Expected Io error"),
        }

        let store_error = NextwordError::from(StoreError::io("disk full"));
        assert!(matches!(store_error, NextwordError::Store(ref e) if e.is_fatal()));
        assert!(StoreError::not_found("batch vanished").is_fatal());
    }

    #[test]
    fn test_ingestion_error_display() {
        let err = IngestionError::new(
            "/data/bad.json",
            IngestionErrorKind::MalformedDocument,
            "expected a JSON object",
        );
        assert_eq!(
            err.to_string(),
            "/data/bad.json: MalformedDocument: expected a JSON object"
        );
    }
}
