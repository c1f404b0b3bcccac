//! Query compiler.
//!
//! Compiles a query AST into Tantivy queries.

use std::{cmp::Reverse, collections::BTreeSet, ops::Bound, str};

use scour_analysis::Field as DocField;
use scour_query::{BooleanQuery as AstBoolean, Occur as AstOccur, Query as AstQuery};
use tantivy::{
    Searcher as TvSearcher, Term,
    query::{
        AllQuery, BooleanQuery, BoostQuery, EmptyQuery, Occur, PhraseQuery, Query, RangeQuery,
        TermQuery, TermSetQuery,
    },
    schema::{Field, IndexRecordOption},
};
use tantivy_fst::{Automaton, Regex};

use crate::{IndexError, schema::IndexSchema, search::fuzzy::FuzzyMatcher};

/// Characters with a meaning in regular expressions.
const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// Most alternatives one fuzzy term expands to.
const MAX_FUZZY_EXPANSIONS: usize = 50;

/// A compiled query with the contents terms it can match.
pub struct CompiledQuery {
    /// Executable query.
    pub(crate) query: Box<dyn Query>,
    /// Contents terms, including those found by expansion, outside prohibited clauses.
    pub(crate) terms: BTreeSet<String>,
}

/// Compiles query AST nodes into Tantivy queries against one searcher snapshot.
pub struct QueryCompiler<'a> {
    /// Index schema for field references.
    schema: &'a IndexSchema,
    /// Snapshot whose term dictionaries expansions read.
    searcher: &'a TvSearcher,
    /// Automaton source for fuzzy nodes.
    fuzzy: &'a FuzzyMatcher,
    /// Maximum number of scored clauses from fuzzy expansion.
    max_clause_count: usize,
    /// Fuzzy clauses built so far.
    clauses: usize,
    /// Collected contents terms.
    terms: BTreeSet<String>,
}

impl<'a> QueryCompiler<'a> {
    /// Creates a compiler for `searcher`.
    pub(crate) fn new(
        schema: &'a IndexSchema,
        searcher: &'a TvSearcher,
        fuzzy: &'a FuzzyMatcher,
        max_clause_count: usize,
    ) -> Self {
        Self {
            schema,
            searcher,
            fuzzy,
            max_clause_count,
            clauses: 0,
            terms: BTreeSet::new(),
        }
    }

    /// Compiles `query`.
    ///
    /// Prefix and wildcard expansions become constant-score term sets of any size. Fuzzy
    /// alternatives are scored clauses; fails with [`IndexError::TooManyClauses`] when they
    /// exceed the clause cap.
    pub(crate) fn compile(mut self, query: &AstQuery) -> Result<CompiledQuery, IndexError> {
        let compiled = self.compile_node(query, true)?;
        Ok(CompiledQuery {
            query: compiled,
            terms: self.terms,
        })
    }

    /// Compiles one node. `collect` is false below prohibited clauses.
    fn compile_node(
        &mut self,
        query: &AstQuery,
        collect: bool,
    ) -> Result<Box<dyn Query>, IndexError> {
        match query {
            AstQuery::Term { field, text } => Ok(match field.field() {
                Some(field) => self.compile_term(field, text, collect),
                None => Box::new(EmptyQuery),
            }),
            AstQuery::Phrase { field, terms, slop } => Ok(match field.field() {
                Some(field) => self.compile_phrase(field, terms, *slop, collect),
                None => Box::new(EmptyQuery),
            }),
            AstQuery::Prefix { field, prefix } => match self.text_field(field.field()) {
                Some(field) => self.compile_prefix(field, prefix, collect),
                None => Ok(Box::new(EmptyQuery)),
            },
            AstQuery::Wildcard { field, pattern } => match self.text_field(field.field()) {
                Some(field) => self.compile_wildcard(field, pattern, collect),
                None => Ok(Box::new(EmptyQuery)),
            },
            AstQuery::Fuzzy {
                field,
                text,
                distance,
            } => match self.text_field(field.field()) {
                Some(field) => self.compile_fuzzy(field, text, *distance, collect),
                None => Ok(Box::new(EmptyQuery)),
            },
            AstQuery::Boolean(boolean) => self.compile_boolean(boolean, collect),
            AstQuery::Boost { query, factor } => {
                let inner = self.compile_node(query, collect)?;
                Ok(Box::new(BoostQuery::new(inner, *factor)))
            }
            AstQuery::Range {
                field,
                lower,
                upper,
            } => Ok(self.compile_range(*field, *lower, *upper)),
        }
    }

    /// Returns the schema handle of a text field. Numeric and unknown fields have none.
    fn text_field(&self, field: Option<DocField>) -> Option<Field> {
        field
            .filter(|field| *field != DocField::Modified)
            .map(|field| self.schema.field(field))
    }

    /// Compiles an exact term.
    fn compile_term(&mut self, field: DocField, text: &str, collect: bool) -> Box<dyn Query> {
        if field == DocField::Modified {
            return match text.parse::<i64>() {
                Ok(value) => Box::new(TermQuery::new(
                    Term::from_field_i64(self.schema.modified, value),
                    IndexRecordOption::Basic,
                )),
                Err(_) => Box::new(EmptyQuery),
            };
        }
        let handle = self.schema.field(field);
        let option = if field == DocField::Contents {
            if collect {
                self.terms.insert(text.to_string());
            }
            IndexRecordOption::WithFreqs
        } else {
            IndexRecordOption::Basic
        };
        Box::new(TermQuery::new(Term::from_field_text(handle, text), option))
    }

    /// Compiles a phrase. Untokenized fields store whole values, so their phrase is the
    /// joined term.
    fn compile_phrase(
        &mut self,
        field: DocField,
        words: &[String],
        slop: u32,
        collect: bool,
    ) -> Box<dyn Query> {
        if field != DocField::Contents {
            return self.compile_term(field, &words.join(" "), collect);
        }
        match words {
            [] => Box::new(EmptyQuery),
            [word] => self.compile_term(field, word, collect),
            _ => {
                if collect {
                    self.terms.extend(words.iter().cloned());
                }
                let terms = words
                    .iter()
                    .map(|word| Term::from_field_text(self.schema.contents, word))
                    .collect();
                let mut phrase = PhraseQuery::new(terms);
                phrase.set_slop(slop);
                Box::new(phrase)
            }
        }
    }

    /// Expands a prefix to the indexed terms that start with it.
    ///
    /// Terms are visited in sorted order, so each segment is scanned from the first term at
    /// or after the prefix until the first term without it.
    fn compile_prefix(
        &mut self,
        field: Field,
        prefix: &str,
        collect: bool,
    ) -> Result<Box<dyn Query>, IndexError> {
        let searcher = self.searcher;
        let mut matches = BTreeSet::new();
        for segment in searcher.segment_readers() {
            let inverted = segment.inverted_index(field)?;
            let mut stream = inverted.terms().range().ge(prefix.as_bytes()).into_stream()?;
            while stream.advance() {
                if !stream.key().starts_with(prefix.as_bytes()) {
                    break;
                }
                insert_term(&mut matches, stream.key());
            }
        }
        Ok(self.term_set(field, &matches, collect))
    }

    /// Expands a wildcard pattern to the indexed terms it matches.
    fn compile_wildcard(
        &mut self,
        field: Field,
        pattern: &str,
        collect: bool,
    ) -> Result<Box<dyn Query>, IndexError> {
        let regex = wildcard_to_regex(pattern);
        // Validate once so the per-segment factory cannot fail.
        Regex::new(&regex).map_err(|e| IndexError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let matches = self.expand(field, || Regex::new(&regex).ok())?;
        Ok(self.term_set(field, &matches, collect))
    }

    /// Expands a fuzzy term to the indexed terms within its edit distance.
    ///
    /// Only the [`MAX_FUZZY_EXPANSIONS`] most frequent terms are kept; each becomes one
    /// scored clause.
    fn compile_fuzzy(
        &mut self,
        field: Field,
        text: &str,
        distance: u8,
        collect: bool,
    ) -> Result<Box<dyn Query>, IndexError> {
        if self.fuzzy.automaton(text, distance).is_none() {
            let is_contents = field == self.schema.contents;
            if collect && is_contents {
                self.terms.insert(text.to_string());
            }
            return Ok(Box::new(TermQuery::new(
                Term::from_field_text(field, text),
                IndexRecordOption::WithFreqs,
            )));
        }
        let fuzzy = self.fuzzy;
        let matches = self.expand(field, || fuzzy.automaton(text, distance))?;
        let matches = self.most_frequent(field, matches, MAX_FUZZY_EXPANSIONS)?;
        if matches.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }
        self.count_clauses(matches.len())?;
        if collect && field == self.schema.contents {
            self.terms.extend(matches.iter().cloned());
        }
        let clauses = matches
            .iter()
            .map(|text| {
                let query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(field, text),
                    IndexRecordOption::WithFreqs,
                ));
                (Occur::Should, query)
            })
            .collect();
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Collects the terms of `field` accepted by automata from `make`, one per segment.
    ///
    /// A factory returning `None` expands to nothing.
    fn expand<A>(
        &self,
        field: Field,
        make: impl Fn() -> Option<A>,
    ) -> Result<BTreeSet<String>, IndexError>
    where
        A: Automaton,
        A::State: Clone,
    {
        let searcher = self.searcher;
        let mut matches = BTreeSet::new();
        for segment in searcher.segment_readers() {
            let Some(automaton) = make() else {
                break;
            };
            let inverted = segment.inverted_index(field)?;
            let mut stream = inverted.terms().search(automaton).into_stream()?;
            while stream.advance() {
                insert_term(&mut matches, stream.key());
            }
        }
        Ok(matches)
    }

    /// Keeps the `limit` terms of `field` found in the most documents, ties by term order.
    fn most_frequent(
        &self,
        field: Field,
        matches: BTreeSet<String>,
        limit: usize,
    ) -> Result<BTreeSet<String>, IndexError> {
        if matches.len() <= limit {
            return Ok(matches);
        }
        let mut ranked = Vec::with_capacity(matches.len());
        for text in matches {
            let doc_freq = self.searcher.doc_freq(&Term::from_field_text(field, &text))?;
            ranked.push((Reverse(doc_freq), text));
        }
        ranked.sort_unstable();
        Ok(ranked.into_iter().take(limit).map(|(_, text)| text).collect())
    }

    /// Counts scored clauses against the cap.
    fn count_clauses(&mut self, added: usize) -> Result<(), IndexError> {
        self.clauses += added;
        if self.clauses > self.max_clause_count {
            return Err(IndexError::TooManyClauses {
                limit: self.max_clause_count,
            });
        }
        Ok(())
    }

    /// Builds a constant-score query over expanded terms.
    fn term_set(
        &mut self,
        field: Field,
        matches: &BTreeSet<String>,
        collect: bool,
    ) -> Box<dyn Query> {
        if matches.is_empty() {
            return Box::new(EmptyQuery);
        }
        if collect && field == self.schema.contents {
            self.terms.extend(matches.iter().cloned());
        }
        let terms: Vec<Term> = matches
            .iter()
            .map(|text| Term::from_field_text(field, text))
            .collect();
        Box::new(TermSetQuery::new(terms))
    }

    /// Compiles a boolean node.
    ///
    /// A node with only prohibited clauses matches every document the clauses exclude.
    fn compile_boolean(
        &mut self,
        boolean: &AstBoolean,
        collect: bool,
    ) -> Result<Box<dyn Query>, IndexError> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> =
            Vec::with_capacity(boolean.clauses().len() + 1);
        for clause in boolean.clauses() {
            let occur = match clause.occur {
                AstOccur::Must => Occur::Must,
                AstOccur::Should => Occur::Should,
                AstOccur::MustNot => Occur::MustNot,
            };
            let query = self.compile_node(&clause.query, collect && occur != Occur::MustNot)?;
            clauses.push((occur, query));
        }
        if clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
            clauses.push((Occur::Must, Box::new(AllQuery)));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Compiles an inclusive range. Only the modification time is numeric.
    fn compile_range(
        &self,
        field: DocField,
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> Box<dyn Query> {
        if field != DocField::Modified {
            return Box::new(EmptyQuery);
        }
        let bound = |value: Option<i64>| value.map_or(Bound::Unbounded, Bound::Included);
        Box::new(RangeQuery::new_i64_bounds(
            field.name().to_string(),
            bound(lower),
            bound(upper),
        ))
    }
}

/// Adds a dictionary key to `matches`, skipping keys that are not UTF-8.
fn insert_term(matches: &mut BTreeSet<String>, key: &[u8]) {
    if let Ok(text) = str::from_utf8(key) {
        matches.insert(text.to_string());
    }
}

/// Translates a wildcard pattern into a regular expression: `*` matches any run of
/// characters and `?` exactly one.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c if REGEX_META.contains(&c) => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
    }
    regex
}
