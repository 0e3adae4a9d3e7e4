//! Annotated conversation documents
//!
//! Source records look like
//! `{ "info": [ { "annotations": { "text": "...", ... }, ... }, ... ] }`.
//! Anything that is not a JSON object at the top level is malformed.

use crate::text::Tokenizer;
use serde::Deserialize;

/// One parsed source document
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DocumentRecord {
    #[serde(default)]
    pub info: Option<Vec<InfoEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct InfoEntry {
    #[serde(default)]
    pub annotations: Option<Annotations>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Annotations {
    #[serde(default)]
    pub text: Option<String>,
}

impl DocumentRecord {
    /// Parse a record, rejecting any top-level shape other than an object
    pub fn parse(content: &str) -> Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| format!("Invalid JSON: {}", e))?;
        if !value.is_object() {
            return Err("Top-level value is not a JSON object".to_string());
        }
        serde_json::from_value(value).map_err(|e| format!("Unexpected document shape: {}", e))
    }

    /// Every `info[*].annotations.text` value, in document order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.info
            .iter()
            .flatten()
            .filter_map(|entry| entry.annotations.as_ref())
            .filter_map(|annotations| annotations.text.as_deref())
    }
}

/// A tokenized text span of a document, kept with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub words: Vec<String>,
}

/// A document ready to be written to the positional store.
///
/// Positions run contiguously across segments: the first word of a segment
/// follows the last word of the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedDocument {
    pub document_id: String,
    pub segments: Vec<Segment>,
}

impl TokenizedDocument {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            segments: Vec::new(),
        }
    }

    pub fn from_record(
        document_id: impl Into<String>,
        record: &DocumentRecord,
        tokenizer: &Tokenizer,
    ) -> Self {
        let mut document = Self::new(document_id);
        for text in record.texts() {
            document.push_text(text, tokenizer);
        }
        document
    }

    /// Tokenize `text` and append it as the next segment
    pub fn push_text(&mut self, text: &str, tokenizer: &Tokenizer) {
        let words = tokenizer.tokenize(text);
        self.segments.push(Segment {
            text: text.to_string(),
            words,
        });
    }

    /// Append a pre-tokenized segment
    pub fn push_words<I, S>(&mut self, text: impl Into<String>, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.push(Segment {
            text: text.into(),
            words: words.into_iter().map(Into::into).collect(),
        });
    }

    pub fn token_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    /// `(position, word, segment text)` for every token
    pub fn positioned_words(&self) -> impl Iterator<Item = (usize, &str, &str)> {
        self.segments
            .iter()
            .flat_map(|segment| {
                segment
                    .words
                    .iter()
                    .map(move |word| (word.as_str(), segment.text.as_str()))
            })
            .enumerate()
            .map(|(position, (word, text))| (position, word, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extracts_texts() {
        let content = r#"{
            "info": [
                { "annotations": { "text": "지금 뭐 해", "speaker": "A" } },
                { "annotations": { "lines": [] } },
                { "id": 3 },
                { "annotations": { "text": "지금 자" } }
            ],
            "header": { "dialogueId": "d1" }
        }"#;
        let record = DocumentRecord::parse(content).unwrap();
        let texts: Vec<&str> = record.texts().collect();
        assert_eq!(texts, vec!["지금 뭐 해", "지금 자"]);
    }

    #[test]
    fn test_missing_info_is_empty() {
        let record = DocumentRecord::parse(r#"{ "header": {} }"#).unwrap();
        assert_eq!(record.texts().count(), 0);

        let record = DocumentRecord::parse(r#"{ "info": null }"#).unwrap();
        assert_eq!(record.texts().count(), 0);
    }

    #[test]
    fn test_malformed_shapes() {
        assert!(DocumentRecord::parse("[1, 2, 3]").is_err());
        assert!(DocumentRecord::parse(r#""just a string""#).is_err());
        assert!(DocumentRecord::parse("{ broken").is_err());
        assert!(DocumentRecord::parse(r#"{ "info": "not a list" }"#).is_err());
        assert!(
            DocumentRecord::parse(r#"{ "info": [ { "annotations": { "text": 42 } } ] }"#).is_err()
        );
    }

    #[test]
    fn test_positions_are_contiguous_across_segments() {
        let tokenizer = Tokenizer::default();
        let record = DocumentRecord::parse(
            r#"{ "info": [ { "annotations": { "text": "지금 뭐 해" } },
                           { "annotations": { "text": "" } },
                           { "annotations": { "text": "지금 자" } } ] }"#,
        )
        .unwrap();
        let document = TokenizedDocument::from_record("d1", &record, &tokenizer);

        assert_eq!(document.token_count(), 5);
        let positioned: Vec<(usize, &str, &str)> = document.positioned_words().collect();
        assert_eq!(positioned[0], (0, "지금", "지금 뭐 해"));
        assert_eq!(positioned[3], (3, "지금", "지금 자"));
        assert_eq!(positioned[4], (4, "자", "지금 자"));
        let positions: Vec<usize> = positioned.iter().map(|(p, _, _)| *p).collect();
        assert_eq!(positions, (0..5).collect::<Vec<_>>());
    }
}
