//! Construction of the query AST from a search string.
//!
//! The exact form of a query matches what was typed as literally as the index
//! allows. The split form runs every word through the full splitting analyzer.
//! Non-exact searches combine both, preferring exact matches.

use scour_analysis::{Analyzer, DEFAULT_MIN_WORD_LENGTH, Field, FieldName, MAX_WORD_LENGTH};

use crate::{
    ast::{Clause, Occur, Query},
    error::QueryError,
    lower::Lowering,
    parser::parse,
};

/// Score multiplier applied to the exact form in a combined query.
pub const EXACT_BOOST: f32 = 2.0;

/// Builds exact, split and combined queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    /// Shortest analyzed word kept, in characters.
    min_word_length: usize,
    /// Longest analyzed word kept, in characters.
    max_word_length: usize,
    /// Slop of phrase queries.
    phrase_slop: u32,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Creates a builder with default analysis settings.
    pub fn new() -> Self {
        Self {
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
            max_word_length: MAX_WORD_LENGTH,
            phrase_slop: 0,
        }
    }

    /// Sets the word length bounds of the split analyzer.
    pub fn with_word_length(mut self, min: usize, max: usize) -> Self {
        self.min_word_length = min;
        self.max_word_length = max;
        self
    }

    /// Sets the slop of phrase queries.
    pub fn with_phrase_slop(mut self, slop: u32) -> Self {
        self.phrase_slop = slop;
        self
    }

    /// Builds the query for `text`: the exact form alone when `exact`,
    /// otherwise the exact form boosted by [`EXACT_BOOST`] OR the split form.
    ///
    /// Returns `Ok(None)` when nothing searchable remains.
    pub fn build(&self, text: &str, exact: bool) -> Result<Option<Query>, QueryError> {
        let exact_query = self.exact_query(text)?;
        if exact {
            return Ok(exact_query);
        }

        let split_query = self.split_query(text)?;
        Ok(match (exact_query, split_query) {
            (Some(exact), Some(split)) => Query::boolean(vec![
                Clause::should(Query::boost(exact, EXACT_BOOST)),
                Clause::should(split),
            ]),
            (exact, split) => exact.or(split),
        })
    }

    /// Builds the exact form of `text`.
    ///
    /// Multi-word input is analyzed literally (no word splitting) and becomes
    /// a phrase when every word is a plain contents term; any other mix stays
    /// a conjunction. A single word is one unanalyzed term, which also matches
    /// file names when it looks like one.
    pub fn exact_query(&self, text: &str) -> Result<Option<Query>, QueryError> {
        let text = text.trim();
        let Some(expr) = parse(text)? else {
            return Ok(None);
        };

        if text.contains(char::is_whitespace) {
            let lowered = Lowering::new(Analyzer::literal())
                .with_phrase_slop(self.phrase_slop)
                .lower(&expr);
            Ok(lowered.map(|query| self.fold_phrase(query)))
        } else {
            let lowered = Lowering::new(Analyzer::keyword()).lower(&expr);
            Ok(lowered.map(match_file_name))
        }
    }

    /// Builds the split form of `text`.
    pub fn split_query(&self, text: &str) -> Result<Option<Query>, QueryError> {
        let Some(expr) = parse(text.trim())? else {
            return Ok(None);
        };
        let analyzer =
            Analyzer::query().with_word_length(self.min_word_length, self.max_word_length);
        Ok(Lowering::new(analyzer)
            .with_phrase_slop(self.phrase_slop)
            .lower(&expr))
    }

    /// Folds a conjunction of plain contents terms into a phrase.
    fn fold_phrase(&self, query: Query) -> Query {
        let Query::Boolean(boolean) = &query else {
            return query;
        };

        let mut terms = Vec::with_capacity(boolean.clauses().len());
        for clause in boolean.clauses() {
            match (&clause.occur, &clause.query) {
                (Occur::Must, Query::Term { field, text }) if field.is_contents() => {
                    terms.push(text.clone());
                }
                _ => return query,
            }
        }

        if terms.len() < 2 {
            return query;
        }
        Query::Phrase {
            field: FieldName::contents(),
            terms,
            slop: self.phrase_slop,
        }
    }
}

/// Lets a single contents word that looks like a file name (`Main.java`)
/// also match the name field.
fn match_file_name(query: Query) -> Query {
    let Query::Term { field, text } = &query else {
        return query;
    };
    let looks_like_file = text.contains('.') && !text.starts_with('.') && !text.ends_with('.');
    if !field.is_contents() || !looks_like_file {
        return query;
    }

    let name = Query::term(Field::Name, text.clone());
    Query::any_of(vec![query.clone(), name]).unwrap_or(query)
}
