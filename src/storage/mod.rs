//! Storage functionality for nextword-rs
//!
//! This module provides the positional token store using embedded SQLite.

pub mod database;
pub mod migrations;
pub mod schema;

// Re-export main types
pub use database::PositionalStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A successor word and how often it follows the keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

impl WordCount {
    pub fn new(word: impl Into<String>, count: usize) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

/// Lifecycle state of a registered batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Claimed; ingestion is running or was interrupted
    Ingesting,
    /// Every enumerated file was processed
    Complete,
    /// Ingestion stopped early on a storage failure
    Incomplete,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Ingesting => "ingesting",
            BatchStatus::Complete => "complete",
            BatchStatus::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ingesting" => Ok(BatchStatus::Ingesting),
            "complete" => Ok(BatchStatus::Complete),
            "incomplete" => Ok(BatchStatus::Incomplete),
            other => Err(format!("Unknown batch status: {}", other)),
        }
    }
}

/// Registry entry for one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchInfo {
    pub batch_id: String,
    pub source_path: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub status: BatchStatus,
    pub document_count: usize,
    pub token_count: usize,
}

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub token_count: usize,
    pub document_count: usize,
    pub batch_count: usize,
    pub distinct_words: usize,
    pub file_size_bytes: usize,
}
