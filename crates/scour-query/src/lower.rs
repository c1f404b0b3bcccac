//! Lowering from the syntax tree to the query AST.
//!
//! Words are run through an [`Analyzer`] for the field they target. Words
//! carrying wildcards or a fuzzy suffix are not analyzed; they become
//! [`Query::Prefix`], [`Query::Wildcard`] or [`Query::Fuzzy`] nodes as typed.

use scour_analysis::{Analyzer, FieldName, Token};

use crate::{
    ast::{Clause, DEFAULT_FUZZY_DISTANCE, Occur, Query},
    expr::QueryExpr,
};

/// Converts [`QueryExpr`] trees into [`Query`] trees.
#[derive(Debug, Clone, Copy)]
pub struct Lowering {
    /// Analyzer applied to plain words and phrases.
    analyzer: Analyzer,
    /// Slop given to phrase nodes.
    phrase_slop: u32,
}

impl Lowering {
    /// Creates a lowering that analyzes words with `analyzer`.
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            phrase_slop: 0,
        }
    }

    /// Sets the slop given to phrase nodes.
    pub fn with_phrase_slop(mut self, slop: u32) -> Self {
        self.phrase_slop = slop;
        self
    }

    /// Lowers an expression whose unqualified words target the contents field.
    ///
    /// Returns `None` when analysis leaves nothing to search for.
    pub fn lower(&self, expr: &QueryExpr) -> Option<Query> {
        self.lower_in(expr, &FieldName::contents())
    }

    /// Lowers an expression in the scope of `field`.
    fn lower_in(&self, expr: &QueryExpr, field: &FieldName) -> Option<Query> {
        match expr {
            QueryExpr::Term(text) => self.lower_term(field, text),
            QueryExpr::Phrase(words) => self.lower_phrase(field, words),
            QueryExpr::Not(inner) => {
                Query::boolean(vec![Clause::must_not(self.lower_in(inner, field)?)])
            }
            QueryExpr::And(exprs) => self.combine(exprs, field, Occur::Must),
            QueryExpr::Or(exprs) => self.combine(exprs, field, Occur::Should),
            QueryExpr::Field { name, expr } => self.lower_in(expr, &FieldName::parse(name)),
            QueryExpr::Boost { expr, factor } => {
                Some(Query::boost(self.lower_in(expr, field)?, *factor))
            }
        }
    }

    /// Lowers operands into clauses of `occur`; negated operands become
    /// prohibited clauses.
    fn combine(&self, exprs: &[QueryExpr], field: &FieldName, occur: Occur) -> Option<Query> {
        let mut clauses = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let clause = match expr {
                QueryExpr::Not(inner) => self
                    .lower_in(inner, field)
                    .map(Clause::must_not),
                _ => self.lower_in(expr, field).map(|query| Clause { occur, query }),
            };
            clauses.extend(clause);
        }

        if clauses.len() == 1 && clauses[0].occur != Occur::MustNot {
            return clauses.pop().map(|clause| clause.query);
        }
        Query::boolean(clauses)
    }

    /// Lowers a single word.
    fn lower_term(&self, field: &FieldName, text: &str) -> Option<Query> {
        if let Some((base, distance)) = split_fuzzy(text) {
            return Some(Query::Fuzzy {
                field: field.clone(),
                text: base.to_string(),
                distance,
            });
        }

        if text.contains(['*', '?']) {
            return match text.strip_suffix('*') {
                Some(base) if !base.is_empty() && !base.contains(['*', '?']) => {
                    Some(Query::prefix(field.clone(), base))
                }
                _ if text.chars().all(|ch| ch == '*' || ch == '?') => None,
                _ => Some(Query::wildcard(field.clone(), text)),
            };
        }

        let tokens = self.analyzer.analyze(field, text);
        Query::all_of(
            tokens
                .into_iter()
                .map(|token| Query::term(field.clone(), token.text))
                .collect(),
        )
    }

    /// Lowers a quoted phrase: one term per position, the first token of
    /// each position.
    fn lower_phrase(&self, field: &FieldName, words: &[String]) -> Option<Query> {
        let text = words.join(" ");
        let tokens = self.analyzer.analyze(field, &text);
        let leading: Vec<&Token> = tokens
            .iter()
            .enumerate()
            .filter(|(idx, token)| *idx == 0 || token.position_increment > 0)
            .map(|(_, token)| token)
            .collect();

        if leading.len() < 2 {
            return Query::all_of(
                tokens
                    .into_iter()
                    .map(|token| Query::term(field.clone(), token.text))
                    .collect(),
            );
        }

        Some(Query::Phrase {
            field: field.clone(),
            terms: leading.into_iter().map(|token| token.text.clone()).collect(),
            slop: self.phrase_slop,
        })
    }
}

/// Splits a trailing fuzzy marker (`~` or `~N`) off a word.
fn split_fuzzy(text: &str) -> Option<(&str, u8)> {
    let (base, digits) = text.rsplit_once('~')?;
    if base.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let distance = if digits.is_empty() {
        DEFAULT_FUZZY_DISTANCE
    } else {
        digits
            .parse::<u8>()
            .map_or(DEFAULT_FUZZY_DISTANCE, |d| d.min(DEFAULT_FUZZY_DISTANCE))
    };
    Some((base, distance))
}
