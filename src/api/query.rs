//! QueryEngine - adjacency query API
//!
//! Answers "which words most often come right after this keyword". The
//! keyword is matched exactly as stored: no tokenization, no case folding.

use crate::config::{Config, QueryConfig};
use crate::error::{NextwordError, Result};
use crate::storage::{PositionalStore, WordCount};
use serde::Serialize;

/// Keyword frequency together with its ranked successors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub keyword: String,
    pub occurrences: usize,
    pub successors: Vec<WordCount>,
}

/// Top-K successor queries over a store
pub struct QueryEngine<'a> {
    store: &'a PositionalStore,
    config: QueryConfig,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a PositionalStore, config: &Config) -> Self {
        Self {
            store,
            config: config.query.clone(),
        }
    }

    /// Successors of `keyword` using the configured default limit
    pub fn query(&self, keyword: &str) -> Result<Vec<WordCount>> {
        self.query_with_limit(keyword, self.config.default_limit)
    }

    /// Up to `limit` successors of `keyword`, most frequent first.
    ///
    /// An empty or unknown keyword yields an empty list. `limit` must be at
    /// least 1; limits above `max_limit` are clamped.
    pub fn query_with_limit(&self, keyword: &str, limit: usize) -> Result<Vec<WordCount>> {
        let limit = self.effective_limit(limit)?;
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let successors = self.store.next_word_counts(keyword, limit)?;
        log::info!(
            "Query '{}' (top {}): {} successors",
            keyword,
            limit,
            successors.len()
        );
        Ok(successors)
    }

    /// Number of times `keyword` occurs anywhere in the store
    pub fn occurrences(&self, keyword: &str) -> Result<usize> {
        if keyword.is_empty() {
            return Ok(0);
        }
        Ok(self.store.word_frequency(keyword)?)
    }

    /// Occurrence count and successors in one report
    pub fn report(&self, keyword: &str, limit: Option<usize>) -> Result<QueryReport> {
        let limit = limit.unwrap_or(self.config.default_limit);
        let successors = self.query_with_limit(keyword, limit)?;
        Ok(QueryReport {
            keyword: keyword.to_string(),
            occurrences: self.occurrences(keyword)?,
            successors,
        })
    }

    fn effective_limit(&self, limit: usize) -> Result<usize> {
        if limit == 0 {
            return Err(NextwordError::InvalidQuery(
                "limit must be at least 1".to_string(),
            ));
        }
        if limit > self.config.max_limit {
            log::warn!(
                "Requested limit {} exceeds maximum {}, clamping",
                limit,
                self.config.max_limit
            );
            return Ok(self.config.max_limit);
        }
        Ok(limit)
    }
}
