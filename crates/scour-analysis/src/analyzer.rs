//! Analyzer presets.
//!
//! An [`Analyzer`] is a fixed chain of tokenizer and filters. The same preset
//! must be used for a field at indexing time and at query time, otherwise
//! query terms never line up with indexed terms.

use std::collections::BTreeMap;

use crate::{
    field::FieldName,
    filter::TokenFilterExt,
    token::Token,
    tokenizer::{KeywordTokenizer, StandardTokenizer},
};

/// Longest token kept by the length filter, in characters.
pub const MAX_WORD_LENGTH: usize = 128;

/// Default shortest token kept by the length filter, in characters.
pub const DEFAULT_MIN_WORD_LENGTH: usize = 1;

/// The chain an [`Analyzer`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    /// Full splitting chain followed by lowercasing. Used to index contents.
    Indexing,
    /// Full splitting chain without lowercasing. Used to interpret user input;
    /// case is normalized later by query rewriting.
    Query,
    /// Whitespace and punctuation splitting plus lowercasing, without word
    /// splitting. Used for exact multi-word input.
    Literal,
    /// The whole input as one token.
    Keyword,
}

/// A configured analysis chain.
///
/// Fields other than [`crate::Field::Contents`] are always analyzed as a
/// single keyword, whatever the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analyzer {
    /// Chain to run.
    kind: AnalyzerKind,
    /// Shortest token kept, in characters.
    min_word_length: usize,
    /// Longest token kept, in characters.
    max_word_length: usize,
}

impl Analyzer {
    /// Creates an analyzer of the given kind with default length bounds.
    pub const fn new(kind: AnalyzerKind) -> Self {
        Self {
            kind,
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
            max_word_length: MAX_WORD_LENGTH,
        }
    }

    /// The contents indexing chain.
    pub const fn indexing() -> Self {
        Self::new(AnalyzerKind::Indexing)
    }

    /// The query interpretation chain.
    pub const fn query() -> Self {
        Self::new(AnalyzerKind::Query)
    }

    /// The literal, non-splitting chain.
    pub const fn literal() -> Self {
        Self::new(AnalyzerKind::Literal)
    }

    /// The keyword chain.
    pub const fn keyword() -> Self {
        Self::new(AnalyzerKind::Keyword)
    }

    /// Returns the analyzer with different length bounds.
    pub const fn with_word_length(mut self, min: usize, max: usize) -> Self {
        self.min_word_length = min;
        self.max_word_length = max;
        self
    }

    /// Returns the chain this analyzer runs.
    pub const fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    /// Returns the shortest token kept.
    pub const fn min_word_length(&self) -> usize {
        self.min_word_length
    }

    /// Returns the longest token kept.
    pub const fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    /// Returns a lazy token stream over `text` as analyzed for `field`.
    pub fn token_stream<'a>(
        &self,
        field: &FieldName,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = Token> + 'a> {
        if !field.is_contents() {
            return Box::new(KeywordTokenizer::new(text));
        }

        let (min, max) = (self.min_word_length, self.max_word_length);
        match self.kind {
            AnalyzerKind::Indexing => Box::new(
                StandardTokenizer::new(text)
                    .split_words()
                    .split_dots()
                    .split_camel_case()
                    .length_bounds(min, max)
                    .lowercase(),
            ),
            AnalyzerKind::Query => Box::new(
                StandardTokenizer::new(text)
                    .split_words()
                    .split_dots()
                    .split_camel_case()
                    .length_bounds(min, max),
            ),
            AnalyzerKind::Literal => Box::new(StandardTokenizer::new(text).lowercase()),
            AnalyzerKind::Keyword => Box::new(KeywordTokenizer::new(text)),
        }
    }

    /// Collects the token stream into a vector.
    pub fn analyze(&self, field: &FieldName, text: &str) -> Vec<Token> {
        self.token_stream(field, text).collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::indexing()
    }
}

/// Maps every indexed contents term of `text` to the byte offsets where it starts.
///
/// Hosts use this to highlight matched terms in a file.
pub fn extract_text_terms(text: &str) -> BTreeMap<String, Vec<usize>> {
    let mut terms: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for token in Analyzer::indexing().token_stream(&FieldName::contents(), text) {
        terms.entry(token.text).or_default().push(token.start_offset);
    }
    terms
}
