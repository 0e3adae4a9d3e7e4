//! IngestionPipeline - directory ingestion API
//!
//! Loads a folder of annotated conversation documents into the positional
//! store as one batch. A batch is claimed atomically before anything is
//! written, so a second run over the same folder name is refused rather than
//! duplicated. Bad files are recorded and skipped; only a fatal storage fault
//! stops the run early.

use crate::config::{Config, IngestionConfig};
use crate::error::{
    IngestionError, IngestionErrorKind, NextwordError, Result, StoreError, StoreErrorKind,
};
use crate::storage::{BatchStatus, PositionalStore};
use crate::text::{DocumentRecord, TokenizedDocument, Tokenizer};
use crate::utils;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Progress after each processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestProgress {
    pub batch_id: String,
    pub files_processed: usize,
    pub files_total: usize,
    pub path: PathBuf,
}

impl IngestProgress {
    pub fn percent(&self) -> f32 {
        utils::calculate_progress(self.files_processed, self.files_total)
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub batch_id: String,
    pub documents_ingested: usize,
    pub documents_failed: usize,
    pub tokens_inserted: usize,
    pub errors: Vec<IngestionError>,
    /// Set when a storage failure stopped the run before every file was seen
    pub aborted: Option<StoreError>,
    pub elapsed_secs: f64,
}

impl IngestSummary {
    fn new(batch_id: &str) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            documents_ingested: 0,
            documents_failed: 0,
            tokens_inserted: 0,
            errors: Vec::new(),
            aborted: None,
            elapsed_secs: 0.0,
        }
    }

    fn record_failure(&mut self, error: IngestionError) {
        log::warn!("Skipping document: {}", error);
        self.documents_failed += 1;
        self.errors.push(error);
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Folder-to-batch ingestion over a shared store
pub struct IngestionPipeline<'a> {
    store: &'a PositionalStore,
    tokenizer: Tokenizer,
    config: IngestionConfig,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(store: &'a PositionalStore, config: &Config) -> Self {
        Self {
            store,
            tokenizer: Tokenizer::new(config.tokenizer.clone()),
            config: config.ingestion.clone(),
        }
    }

    /// Ingest `directory` as a batch named after its base name
    pub fn run<P: AsRef<Path>>(&self, directory: P) -> Result<IngestSummary> {
        self.run_with_progress(directory, |_| {})
    }

    /// Ingest `directory`, calling `on_progress` after every file.
    ///
    /// Returns `DuplicateBatch` without writing anything when the batch name
    /// is already registered.
    pub fn run_with_progress<P, F>(&self, directory: P, mut on_progress: F) -> Result<IngestSummary>
    where
        P: AsRef<Path>,
        F: FnMut(&IngestProgress),
    {
        let start_time = std::time::Instant::now();
        self.config.validate()?;
        let dir = utils::normalize_dir(directory)?;
        let batch_id = utils::batch_id_from_dir(&dir).ok_or_else(|| {
            NextwordError::Ingestion(format!("Cannot derive a batch id from {}", dir.display()))
        })?;

        let (files, walk_errors) = self.collect_documents(&dir);

        match self.store.create_batch(&batch_id, Some(&dir)) {
            Ok(()) => {}
            Err(e) if e.kind == StoreErrorKind::ConstraintViolation => {
                log::warn!("Refusing to ingest {}: batch '{}' exists", dir.display(), batch_id);
                return Err(NextwordError::DuplicateBatch(batch_id));
            }
            Err(e) => return Err(e.into()),
        }

        log::info!(
            "Ingesting {} documents from {} into batch '{}'",
            files.len(),
            dir.display(),
            batch_id
        );

        let mut summary = IngestSummary::new(&batch_id);
        let files_total = files.len() + walk_errors.len();
        let mut files_processed = 0;

        for error in walk_errors {
            let path = error.path.clone();
            summary.record_failure(error);
            files_processed += 1;
            on_progress(&IngestProgress {
                batch_id: batch_id.clone(),
                files_processed,
                files_total,
                path,
            });
        }

        'rounds: for round in files.chunks(self.config.parse_batch_size) {
            let loaded: Vec<std::result::Result<TokenizedDocument, IngestionError>> =
                round.par_iter().map(|path| self.load_document(path)).collect();

            for (path, document) in round.iter().zip(loaded) {
                match document {
                    Ok(document) => match self.store.insert_document(&batch_id, &document) {
                        Ok(inserted) => {
                            summary.documents_ingested += 1;
                            summary.tokens_inserted += inserted;
                        }
                        Err(e) if !e.is_fatal() => {
                            summary.record_failure(IngestionError::new(
                                path,
                                IngestionErrorKind::DuplicateDocument,
                                format!(
                                    "Document id '{}' already ingested: {}",
                                    document.document_id, e
                                ),
                            ));
                        }
                        Err(e) => {
                            // IoFailure, or NotFound when the batch vanished mid-run
                            log::error!("Stopping ingestion of '{}': {}", batch_id, e);
                            summary.documents_failed += 1;
                            summary.errors.push(IngestionError::new(
                                path,
                                IngestionErrorKind::StoreFailure,
                                e.to_string(),
                            ));
                            summary.aborted = Some(e);
                        }
                    },
                    Err(error) => summary.record_failure(error),
                }

                files_processed += 1;
                on_progress(&IngestProgress {
                    batch_id: batch_id.clone(),
                    files_processed,
                    files_total,
                    path: path.clone(),
                });

                if summary.aborted.is_some() {
                    break 'rounds;
                }
            }
        }

        let status = if summary.aborted.is_some() {
            BatchStatus::Incomplete
        } else {
            BatchStatus::Complete
        };
        if let Err(e) = self
            .store
            .finish_batch(&batch_id, status, summary.documents_ingested)
        {
            log::error!("Failed to record outcome of batch '{}': {}", batch_id, e);
            if summary.aborted.is_none() {
                summary.aborted = Some(e);
            }
        }

        summary.elapsed_secs = start_time.elapsed().as_secs_f64();
        log::info!(
            "Batch '{}': {} ingested, {} failed, {} tokens in {:.2}s",
            batch_id,
            summary.documents_ingested,
            summary.documents_failed,
            summary.tokens_inserted,
            summary.elapsed_secs
        );
        Ok(summary)
    }

    /// Document files under `dir`, sorted by name, plus unreadable entries
    fn collect_documents(&self, dir: &Path) -> (Vec<PathBuf>, Vec<IngestionError>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(self.config.max_depth)
            .follow_links(self.config.follow_links)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file()
                        && utils::has_extension(entry.path(), &self.config.extensions)
                    {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    errors.push(IngestionError::new(
                        path,
                        IngestionErrorKind::Unreadable,
                        e.to_string(),
                    ));
                }
            }
        }

        (files, errors)
    }

    /// Read, decode, parse and tokenize one document file
    fn load_document(&self, path: &Path) -> std::result::Result<TokenizedDocument, IngestionError> {
        let bytes = std::fs::read(path).map_err(|e| {
            IngestionError::new(path, IngestionErrorKind::Unreadable, e.to_string())
        })?;
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let content = std::str::from_utf8(bytes).map_err(|e| {
            IngestionError::new(path, IngestionErrorKind::InvalidEncoding, e.to_string())
        })?;

        let record = DocumentRecord::parse(content)
            .map_err(|e| IngestionError::new(path, IngestionErrorKind::MalformedDocument, e))?;

        let document_id = utils::document_id_from_path(path).ok_or_else(|| {
            IngestionError::new(
                path,
                IngestionErrorKind::MalformedDocument,
                "Cannot derive a document id from the file name",
            )
        })?;

        Ok(TokenizedDocument::from_record(document_id, &record, &self.tokenizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_document_strips_bom() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("d1.json");
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(r#"{"info":[{"annotations":{"text":"지금 가자"}}]}"#.as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let store = PositionalStore::memory().unwrap();
        let pipeline = IngestionPipeline::new(&store, &Config::default());
        let document = pipeline.load_document(&path).unwrap();
        assert_eq!(document.document_id, "d1");
        assert_eq!(document.segments[0].words, vec!["지금", "가자"]);
    }

    #[test]
    fn test_load_document_error_kinds() {
        let temp_dir = tempdir().unwrap();
        let store = PositionalStore::memory().unwrap();
        let pipeline = IngestionPipeline::new(&store, &Config::default());

        let latin1 = temp_dir.path().join("latin1.json");
        std::fs::write(&latin1, b"{\"info\": \"caf\xe9\"}").unwrap();
        let err = pipeline.load_document(&latin1).unwrap_err();
        assert_eq!(err.kind, IngestionErrorKind::InvalidEncoding);

        let array = temp_dir.path().join("array.json");
        std::fs::write(&array, "[]").unwrap();
        let err = pipeline.load_document(&array).unwrap_err();
        assert_eq!(err.kind, IngestionErrorKind::MalformedDocument);

        let missing = temp_dir.path().join("missing.json");
        let err = pipeline.load_document(&missing).unwrap_err();
        assert_eq!(err.kind, IngestionErrorKind::Unreadable);
    }

    #[test]
    fn test_collect_documents_filters_and_sorts() {
        let temp_dir = tempdir().unwrap();
        for name in ["b.json", "a.JSON", "notes.txt", "c.json"] {
            std::fs::write(temp_dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("nested/d.json"), "{}").unwrap();

        let store = PositionalStore::memory().unwrap();
        let pipeline = IngestionPipeline::new(&store, &Config::default());
        let (files, errors) = pipeline.collect_documents(temp_dir.path());
        assert!(errors.is_empty());

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JSON", "b.json", "c.json"]);

        let mut config = Config::default();
        config.ingestion.max_depth = 2;
        let pipeline = IngestionPipeline::new(&store, &config);
        let (files, _) = pipeline.collect_documents(temp_dir.path());
        assert_eq!(files.len(), 4);
    }
}
