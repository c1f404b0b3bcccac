//! Shared schema and analysis configuration.
//!
//! Writer and searcher receive the same [`IndexContext`], so every index they open has the
//! same tokenizer registered and the same token length bounds applied on both sides.

use scour_analysis::Analyzer;
use scour_config::AnalysisSettings;
use scour_query::QueryBuilder;
use tantivy::{Index, IndexSettings as TantivyIndexSettings};

use crate::{
    IndexError,
    analyzer::{SCOUR_TOKENIZER, build_analyzer},
    location::IndexLocation,
    schema::IndexSchema,
};

/// How an index is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create a new index, failing if one exists.
    Create,
    /// Open the existing index or create an empty one.
    OpenOrCreate,
    /// Open the existing index, failing if there is none.
    Existing,
}

/// Schema and analysis configuration threaded through writer and searcher.
#[derive(Debug, Clone)]
pub struct IndexContext {
    /// Field handles.
    schema: IndexSchema,
    /// Analyzer used for `contents` at index time.
    analyzer: Analyzer,
}

impl IndexContext {
    /// Creates a context with the given token length bounds.
    pub fn new(analysis: &AnalysisSettings) -> Self {
        Self {
            schema: IndexSchema::new(),
            analyzer: Analyzer::indexing()
                .with_word_length(analysis.min_word_length, analysis.max_word_length),
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// Returns the index-time analyzer.
    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    /// Returns a query builder whose analyzers use the same length bounds as indexing.
    pub fn query_builder(&self, phrase_slop: u32) -> QueryBuilder {
        QueryBuilder::new()
            .with_word_length(
                self.analyzer.min_word_length(),
                self.analyzer.max_word_length(),
            )
            .with_phrase_slop(phrase_slop)
    }

    /// Opens the index at `location` and registers the scour tokenizer on it.
    pub fn open_index(
        &self,
        location: &IndexLocation,
        mode: OpenMode,
    ) -> Result<Index, IndexError> {
        let directory = location.directory()?;
        let schema = self.schema.schema().clone();
        let opened = match mode {
            OpenMode::Create => Index::create(directory, schema, TantivyIndexSettings::default()),
            OpenMode::OpenOrCreate => Index::open_or_create(directory, schema),
            OpenMode::Existing => Index::open(directory),
        };
        let index = opened.map_err(|e| IndexError::open_index(location.display_path(), &e))?;
        index
            .tokenizers()
            .register(SCOUR_TOKENIZER, build_analyzer(self.analyzer));
        Ok(index)
    }
}

impl Default for IndexContext {
    fn default() -> Self {
        Self::new(&AnalysisSettings::default())
    }
}
