//! # nextword-rs
//!
//! A positional word index over annotated conversation corpora. Folders of
//! JSON dialogue records are tokenized and stored as
//! `(batch, document, position, word)` rows in SQLite, and the index answers
//! one question fast: which words most often come right after a keyword.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nextword_rs::{Config, IngestionPipeline, PositionalStore, QueryEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = PositionalStore::open("corpus.db")?;
//!
//!     // Load one folder of dialogue records as a batch
//!     let summary = IngestionPipeline::new(&store, &config).run("data/kakao1")?;
//!     println!("Ingested {} documents", summary.documents_ingested);
//!
//!     // Words that most often follow the keyword
//!     for entry in QueryEngine::new(&store, &config).query("지금")? {
//!         println!("{}: {}", entry.word, entry.count);
//!     }
//!
//!     store.close()?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod storage;
pub mod text;
pub mod utils;

// Re-export main API types
pub use api::{
    BatchRegistry, IngestProgress, IngestSummary, IngestionPipeline, QueryEngine, QueryReport,
};
pub use config::Config;
pub use error::{
    IngestionError, IngestionErrorKind, NextwordError, Result, StoreError, StoreErrorKind,
};

// Re-export commonly used types
pub use storage::{BatchInfo, BatchStatus, PositionalStore, StoreStats, WordCount};
pub use text::{TokenizedDocument, Tokenizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_imports() {
        // Ensure all major types can be imported
        let _config = Config::default();
        let _tokenizer = Tokenizer::default();
        let _store = PositionalStore::memory().unwrap();
    }
}
