//! Word tokenization
//!
//! Splits text on Unicode word boundaries (UAX #29). The rules are language
//! neutral, so Hangul syllable runs, Latin words and CJK text all segment the
//! same way on every run.

use crate::config::TokenizerConfig;
use std::borrow::Cow;
use unicode_normalization::{IsNormalized, UnicodeNormalization, is_nfc_quick};
use unicode_segmentation::UnicodeSegmentation;

/// Deterministic word tokenizer
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Tokenize already-decoded text into an ordered sequence of words.
    ///
    /// Whitespace never becomes a token. Punctuation becomes its own token
    /// unless `keep_punctuation` is off, in which case it is dropped.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = self.normalize(text);

        text.split_word_bounds()
            .filter(|segment| !segment.chars().all(char::is_whitespace))
            .filter(|segment| self.config.keep_punctuation || is_wordlike(segment))
            .map(str::to_owned)
            .collect()
    }

    fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.config.normalize_unicode {
            return Cow::Borrowed(text);
        }
        match is_nfc_quick(text.chars()) {
            IsNormalized::Yes => Cow::Borrowed(text),
            _ => Cow::Owned(text.nfc().collect()),
        }
    }
}

fn is_wordlike(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_korean_whitespace_split() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("지금 뭐 해 지금 자"),
            vec!["지금", "뭐", "해", "지금", "자"]
        );
        assert_eq!(tokenizer.tokenize("지금 가자"), vec!["지금", "가자"]);
    }

    #[test]
    fn test_punctuation_tokens() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("Hello, world! 뭐 해?"),
            vec!["Hello", ",", "world", "!", "뭐", "해", "?"]
        );

        let words_only = Tokenizer::new(TokenizerConfig {
            keep_punctuation: false,
            ..Default::default()
        });
        assert_eq!(
            words_only.tokenize("Hello, world! 뭐 해?"),
            vec!["Hello", "world", "뭐", "해"]
        );
    }

    #[test]
    fn test_case_and_contractions_preserved() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("Don't STOP now"),
            vec!["Don't", "STOP", "now"]
        );
    }

    #[test]
    fn test_nfc_normalization() {
        // "가" spelled as conjoining jamo U+1100 U+1161
        let decomposed = "\u{1100}\u{1161}자";
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize(decomposed), vec!["가자"]);

        let raw = Tokenizer::new(TokenizerConfig {
            normalize_unicode: false,
            ..Default::default()
        });
        assert_ne!(raw.tokenize(decomposed), vec!["가자"]);
    }

    #[test]
    fn test_empty_and_blank_input() {
        let tokenizer = Tokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("  \n\t ").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let tokenizer = Tokenizer::default();
        let text = "오늘 뭐 먹지? 오늘은 피자, 내일은 치킨.";
        assert_eq!(tokenizer.tokenize(text), tokenizer.tokenize(text));
    }
}
