//! Prefix completion of the last typed term.

use scour_analysis::{Field, FieldName};

use super::{QueryRewriter, walk_boolean};
use crate::ast::{BooleanQuery, Clause, Occur, Query};

/// Rewrites the last term of the query into `(term OR term*)` so results
/// appear while a word is still being typed.
///
/// "Last" follows input order: a counter adds the clause count of every
/// boolean entered and drops by one per clause visited, so it reads zero
/// exactly at the final clause of every enclosing boolean. Prohibited
/// clauses and terms shorter than the minimum length are never rewritten.
#[derive(Debug, Clone, Copy)]
pub struct LastTermPrefixer {
    /// Clauses not yet visited in the enclosing booleans.
    remaining: usize,
    /// Shortest term, in characters, that gets a prefix alternative.
    min_length: usize,
}

impl LastTermPrefixer {
    /// Creates a prefixer for terms of at least `min_length` characters.
    pub fn new(min_length: usize) -> Self {
        Self {
            remaining: 0,
            min_length,
        }
    }

    /// Returns true if terms of `field` can be completed.
    fn completes(field: &FieldName) -> bool {
        matches!(field, FieldName::Doc(f) if *f != Field::Modified)
    }
}

impl QueryRewriter for LastTermPrefixer {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        let original = Query::term(field.clone(), text);
        if self.remaining != 0
            || !Self::completes(field)
            || text.chars().count() < self.min_length
        {
            return original;
        }

        Query::any_of(vec![original.clone(), Query::prefix(field.clone(), text)])
            .unwrap_or(original)
    }

    fn boolean(&mut self, query: &BooleanQuery) -> Query {
        self.remaining += query.clauses().len();
        walk_boolean(self, query)
    }

    fn enter_clause(&mut self, clause: &Clause) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        clause.occur != Occur::MustNot
    }
}
