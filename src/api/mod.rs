//! API layer for nextword-rs
//!
//! This module provides the public interfaces a UI or CLI drives: directory
//! ingestion, adjacency queries and batch management.

pub mod ingest;
pub mod query;
pub mod registry;

// Re-export main API types
pub use ingest::{IngestProgress, IngestSummary, IngestionPipeline};
pub use query::{QueryEngine, QueryReport};
pub use registry::BatchRegistry;
