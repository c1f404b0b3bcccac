//! Fuzzy expansion of contents terms.

use scour_analysis::FieldName;

use super::QueryRewriter;
use crate::ast::{Clause, Occur, Query};

/// Weight of the substring alternative.
const WILDCARD_BOOST: f32 = 0.75;

/// Weight of the edit-distance alternative.
const FUZZY_BOOST: f32 = 0.5;

/// Replaces contents terms with `(term* OR *term*^0.75 OR term~^0.5)` and
/// contents phrases with an OR of per-word fuzzy queries.
///
/// Prohibited clauses are left alone.
#[derive(Debug, Clone, Copy)]
pub struct Fuzzifier {
    /// Edit distance of the fuzzy alternative.
    distance: u8,
}

impl Fuzzifier {
    /// Creates a fuzzifier using the given edit distance.
    pub fn new(distance: u8) -> Self {
        Self { distance }
    }
}

impl QueryRewriter for Fuzzifier {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        let original = Query::term(field.clone(), text);
        if !field.is_contents() {
            return original;
        }

        Query::any_of(vec![
            Query::prefix(field.clone(), text),
            Query::boost(
                Query::wildcard(field.clone(), format!("*{text}*")),
                WILDCARD_BOOST,
            ),
            Query::boost(
                Query::Fuzzy {
                    field: field.clone(),
                    text: text.to_string(),
                    distance: self.distance,
                },
                FUZZY_BOOST,
            ),
        ])
        .unwrap_or(original)
    }

    fn phrase(&mut self, field: &FieldName, terms: &[String], slop: u32) -> Query {
        let original = Query::Phrase {
            field: field.clone(),
            terms: terms.to_vec(),
            slop,
        };
        if !field.is_contents() {
            return original;
        }

        Query::boolean(
            terms
                .iter()
                .map(|text| {
                    Clause::should(Query::Fuzzy {
                        field: field.clone(),
                        text: text.clone(),
                        distance: self.distance,
                    })
                })
                .collect(),
        )
        .unwrap_or(original)
    }

    fn enter_clause(&mut self, clause: &Clause) -> bool {
        clause.occur != Occur::MustNot
    }
}
