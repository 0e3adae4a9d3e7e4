//! Text processing for nextword-rs
//!
//! This module provides word tokenization and the annotated-document model
//! that feeds the positional store.

pub mod document;
pub mod tokenizer;

// Re-export main types
pub use document::{DocumentRecord, Segment, TokenizedDocument};
pub use tokenizer::Tokenizer;
