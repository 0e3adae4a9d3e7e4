//! Configuration for nextword-rs
//!
//! Every section has sensible defaults, so a missing config file is never an
//! error. Files are plain JSON with any subset of the sections below.

use crate::error::{NextwordError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub tokenizer: TokenizerConfig,
    pub ingestion: IngestionConfig,
    pub query: QueryConfig,
}

/// SQLite store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database file
    pub database_path: PathBuf,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// Use the write-ahead log (ignored for in-memory stores)
    pub wal: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("nextword.db"),
            busy_timeout_ms: 5000,
            wal: true,
        }
    }
}

/// Tokenizer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Apply NFC normalization before segmentation
    pub normalize_unicode: bool,
    /// Keep punctuation segments as tokens of their own
    pub keep_punctuation: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            keep_punctuation: true,
        }
    }
}

/// Directory ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestionConfig {
    /// File extensions treated as documents, compared case-insensitively
    pub extensions: Vec<String>,
    /// Directory walk depth; 1 means direct children only
    pub max_depth: usize,
    /// Follow symbolic links while walking
    pub follow_links: bool,
    /// Number of files parsed in parallel before their rows are written
    pub parse_batch_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["json".to_string()],
            max_depth: 1,
            follow_links: false,
            parse_batch_size: 64,
        }
    }
}

/// Adjacency query settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of successors returned when the caller gives no limit
    pub default_limit: usize,
    /// Requested limits above this are clamped
    pub max_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 1000,
        }
    }
}

impl Config {
    /// Load a configuration file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NextwordError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            NextwordError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.default_limit == 0 {
            return Err(NextwordError::Config(
                "query.default_limit must be at least 1".to_string(),
            ));
        }
        if self.query.max_limit < self.query.default_limit {
            return Err(NextwordError::Config(format!(
                "query.max_limit ({}) is below query.default_limit ({})",
                self.query.max_limit, self.query.default_limit
            )));
        }
        self.ingestion.validate()
    }
}

impl IngestionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.parse_batch_size == 0 {
            return Err(NextwordError::Config(
                "ingestion.parse_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(NextwordError::Config(
                "ingestion.max_depth must be at least 1".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(NextwordError::Config(
                "ingestion.extensions must name at least one extension".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.query.default_limit, 5);
        assert_eq!(config.ingestion.extensions, vec!["json".to_string()]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nextword.json");
        std::fs::write(&path, r#"{ "query": { "default_limit": 10 } }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.query.default_limit, 10);
        assert_eq!(config.query.max_limit, 1000);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("saved.json");
        let mut config = Config::default();
        config.ingestion.max_depth = 3;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.query.default_limit = 0;
        assert!(matches!(config.validate(), Err(NextwordError::Config(_))));

        let mut config = Config::default();
        config.ingestion.parse_batch_size = 0;
        assert!(config.validate().is_err());

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(NextwordError::Config(_))));
    }
}
