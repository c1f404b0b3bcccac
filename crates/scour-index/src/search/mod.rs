//! Searching the index.
//!
//! The [`Searcher`] turns a [`SearchQuery`] into results, widening the match step by step
//! until something is found:
//!
//! 1. A fuzzy request searches fuzzy only.
//! 2. An exact request runs the exact query and stops on any hit.
//! 3. The exact and split forms are combined, the exact form boosted.
//! 4. With automatic fuzzy search enabled, the request is retried as fuzzy.
//!
//! Each attempt builds the query, runs the rewrite passes and compiles the result against
//! the current snapshot. The reader behind the snapshot is cached and reopened when the
//! shared [`IndexGeneration`] moves on.

pub mod fuzzy;


use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    str,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use fuzzy::FuzzyMatcher;
use scour_analysis::{Field as DocField, NO_VALUE};
use scour_config::{Preference, SearchSettings};
use scour_query::{PASS_ORDER, QueryBuilder, RewriteContext, SearchQuery, rewrite};
use tantivy::{
    DocAddress, DocSet, IndexReader, Postings, ReloadPolicy, Searcher as TvSearcher,
    TantivyDocument, Term,
    collector::TopDocs,
    query::AllQuery,
    schema::{Field, IndexRecordOption, Value},
};
use tracing::{debug, warn};

use crate::{
    IndexError,
    context::{IndexContext, OpenMode},
    events::IndexGeneration,
    location::IndexLocation,
    query::{CompiledQuery, QueryCompiler},
    result::{ResultDoc, SearchResult},
};

/// Characters removed from a search string that failed to parse.
const QUERY_SYNTAX_CHARS: &[char] = &['(', ')', '"', '[', ']', '\'', '{', '}'];

/// A reader opened at a known index generation.
struct CachedReader {
    /// Generation the reader was opened at.
    generation: u64,
    /// The open reader.
    reader: IndexReader,
}

/// Searches an index.
pub struct Searcher {
    /// Where the index lives.
    location: IndexLocation,
    /// Schema and analysis shared with the writer.
    context: IndexContext,
    /// Commit counter shared with the writer.
    generation: IndexGeneration,
    /// Search preferences and limits.
    settings: SearchSettings,
    /// Named project groups for `ws:` clauses.
    working_sets: HashMap<String, Vec<String>>,
    /// Builds queries from search strings.
    builder: QueryBuilder,
    /// Reader reused across searches until the generation changes.
    cached: Option<CachedReader>,
    /// Automata for fuzzy expansion.
    fuzzy: FuzzyMatcher,
    /// Called with the number of documents assembled so far.
    #[cfg(test)]
    on_assembled: Option<Box<dyn Fn(usize) + Send>>,
}

impl Searcher {
    /// Creates a searcher. The index is opened on first use.
    pub fn new(
        location: IndexLocation,
        context: IndexContext,
        generation: IndexGeneration,
        settings: SearchSettings,
    ) -> Self {
        let builder = context.query_builder(settings.phrase_slop);
        Self {
            location,
            context,
            generation,
            settings,
            working_sets: HashMap::new(),
            builder,
            cached: None,
            fuzzy: FuzzyMatcher::new(),
            #[cfg(test)]
            on_assembled: None,
        }
    }

    /// Sets the working sets `ws:` clauses resolve against.
    pub fn with_working_sets(mut self, working_sets: HashMap<String, Vec<String>>) -> Self {
        self.working_sets = working_sets;
        self
    }

    /// Updates a boolean preference.
    pub fn set_preference(&mut self, preference: Preference, value: bool) {
        debug!(preference = preference.key(), value, "search preference changed");
        self.settings.set(preference, value);
    }

    /// Current search settings.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Searches the index.
    ///
    /// Returns `Ok(None)` when the search string is too short, cannot be parsed, expands to
    /// too many fuzzy clauses or nothing matches. The request's `exact`, `fuzzy` and search
    /// string fields are updated to the form that produced the result. Cancellation stops the
    /// search quietly.
    pub fn search(
        &mut self,
        query: &mut SearchQuery,
    ) -> Result<Option<SearchResult>, IndexError> {
        if query.search_string.chars().count() < self.settings.min_query_length {
            return Ok(None);
        }

        if query.fuzzy {
            query.exact = false;
            return self.search_index(query);
        }

        let mut result = None;
        if query.exact {
            result = self.search_index(query)?;
        }
        if is_empty(result.as_ref()) && !query.is_canceled() {
            query.exact = false;
            result = self.search_index(query)?;
        }
        if is_empty(result.as_ref()) && self.settings.fuzzy_search_auto && !query.is_canceled() {
            query.fuzzy = true;
            query.exact = false;
            result = self.search_index(query)?;
        }
        Ok(result)
    }

    /// Runs one search attempt with the request's current flags.
    fn search_index(
        &mut self,
        query: &mut SearchQuery,
    ) -> Result<Option<SearchResult>, IndexError> {
        let searcher = self.searcher()?;
        let compiled = match self.compile_query(query, &searcher, true) {
            Err(IndexError::TooManyClauses { limit }) if query.fuzzy => {
                debug!(limit, "fuzzy query too broad");
                return Ok(None);
            }
            Err(IndexError::TooManyClauses { limit }) => {
                debug!(limit, "retrying without prefix completion");
                match self.compile_query(query, &searcher, false) {
                    Err(IndexError::TooManyClauses { .. }) => return Ok(None),
                    other => other?,
                }
            }
            Err(IndexError::Query(err)) => {
                debug!(error = %err, "retrying without query syntax");
                query.search_string = query.search_string.replace(QUERY_SYNTAX_CHARS, " ");
                match self.compile_query(query, &searcher, true) {
                    Err(IndexError::Query(_)) => return Ok(None),
                    other => other?,
                }
            }
            other => other?,
        };
        let Some(compiled) = compiled else {
            return Ok(None);
        };
        self.collect_results(query, &searcher, &compiled)
    }

    /// Builds, rewrites and compiles the request. `None` when nothing searchable remains.
    fn compile_query(
        &self,
        query: &SearchQuery,
        searcher: &TvSearcher,
        prefix_last_term: bool,
    ) -> Result<Option<CompiledQuery>, IndexError> {
        let Some(built) = self.builder.build(&query.search_string, query.exact)? else {
            return Ok(None);
        };
        let ctx = RewriteContext {
            fuzzy: query.fuzzy,
            prefix_last_term,
            min_prefix_length: self.settings.min_prefix_length,
            fuzzy_distance: self.settings.fuzzy_distance,
            filter: query.filter.as_ref(),
            current_project: query.current_project.as_deref(),
            working_sets: &self.working_sets,
            now_millis: now_millis(),
        };
        let rewritten = rewrite(&built, &PASS_ORDER, &ctx);
        debug!(
            search = %query.search_string,
            exact = query.exact,
            fuzzy = query.fuzzy,
            query = %rewritten,
            "compiling query"
        );
        let compiler = QueryCompiler::new(
            self.context.schema(),
            searcher,
            &self.fuzzy,
            self.settings.max_clause_count,
        );
        compiler.compile(&rewritten).map(Some)
    }

    /// Scores the compiled query and assembles result documents.
    fn collect_results(
        &self,
        query: &SearchQuery,
        searcher: &TvSearcher,
        compiled: &CompiledQuery,
    ) -> Result<Option<SearchResult>, IndexError> {
        let num_docs = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);
        if num_docs == 0 {
            return Ok(None);
        }
        let limit = query.max_results.map_or(num_docs, |max| max.min(num_docs)).max(1);
        let contents = self.context.schema().contents;
        let term_weights = Arc::new(term_weights(searcher, contents, &compiled.terms)?);

        if query.is_canceled() {
            return Ok(None);
        }

        let mut hits = searcher.search(compiled.query.as_ref(), &TopDocs::with_limit(limit))?;
        if hits.is_empty() {
            return Ok(None);
        }
        hits.sort_by(|(a_score, a_addr), (b_score, b_addr)| {
            b_score.total_cmp(a_score).then_with(|| a_addr.cmp(b_addr))
        });

        let mut docs = Vec::with_capacity(hits.len());
        for (score, address) in hits {
            if query.is_canceled() {
                debug!(assembled = docs.len(), "search canceled");
                break;
            }
            let stored: TantivyDocument = searcher.doc(address)?;
            let term_freqs = if self.settings.show_match_counts {
                Some(self.match_counts(searcher, address, &compiled.terms)?)
            } else {
                None
            };
            docs.push(self.result_doc(&stored, score, address, term_freqs, &term_weights));
            #[cfg(test)]
            if let Some(hook) = &self.on_assembled {
                hook(docs.len());
            }
        }

        debug!(hits = docs.len(), "search complete");
        Ok(Some(SearchResult::new(
            query.search_string.clone(),
            docs,
            term_weights,
        )))
    }

    /// Reads the stored fields of a hit.
    fn result_doc(
        &self,
        stored: &TantivyDocument,
        score: f32,
        address: DocAddress,
        term_freqs: Option<BTreeMap<String, u32>>,
        term_weights: &Arc<BTreeMap<String, f32>>,
    ) -> ResultDoc {
        let schema = self.context.schema();
        let text = |field: Field, default: &str| {
            stored
                .get_first(field)
                .and_then(|value| value.as_str())
                .unwrap_or(default)
                .to_string()
        };
        ResultDoc {
            score,
            address,
            file: text(schema.file, ""),
            name: text(schema.name, ""),
            ext: text(schema.ext, NO_VALUE),
            proj: text(schema.proj, ""),
            modified: stored
                .get_first(schema.modified)
                .and_then(|value| value.as_i64())
                .unwrap_or_default(),
            jar: text(schema.jar, NO_VALUE),
            term_freqs,
            term_weights: Arc::clone(term_weights),
        }
    }

    /// Counts how often each contents term occurs in one document.
    fn match_counts(
        &self,
        searcher: &TvSearcher,
        address: DocAddress,
        terms: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, u32>, IndexError> {
        let contents = self.context.schema().contents;
        let inverted = searcher
            .segment_reader(address.segment_ord)
            .inverted_index(contents)?;
        let mut counts = BTreeMap::new();
        for text in terms {
            let term = Term::from_field_text(contents, text);
            let Some(mut postings) = inverted.read_postings(&term, IndexRecordOption::WithFreqs)?
            else {
                continue;
            };
            if postings.doc() > address.doc_id {
                continue;
            }
            if postings.seek(address.doc_id) == address.doc_id {
                counts.insert(text.clone(), postings.term_freq());
            }
        }
        Ok(counts)
    }

    /// Lists indexed values of `field` that start with `prefix`, ignoring case.
    ///
    /// Terms are visited in sorted order, so each segment is scanned from the first term at
    /// or after the lowercased prefix until the first term that does not match.
    pub fn proposals(
        &mut self,
        prefix: &str,
        field: DocField,
    ) -> Result<BTreeSet<String>, IndexError> {
        let mut proposals = BTreeSet::new();
        if field == DocField::Modified {
            return Ok(proposals);
        }
        let prefix = prefix.to_lowercase();
        let handle = self.context.schema().field(field);
        let searcher = self.searcher()?;
        for segment in searcher.segment_readers() {
            let inverted = segment.inverted_index(handle)?;
            let mut stream = inverted.terms().range().ge(prefix.as_bytes()).into_stream()?;
            while stream.advance() {
                let Ok(text) = str::from_utf8(stream.key()) else {
                    continue;
                };
                if !text.to_lowercase().starts_with(&prefix) {
                    break;
                }
                proposals.insert(text.to_string());
            }
        }
        Ok(proposals)
    }

    /// Lists every indexed project.
    pub fn index_projects(&mut self) -> Result<BTreeSet<String>, IndexError> {
        self.proposals("", DocField::Proj)
    }

    /// Number of documents in the current snapshot.
    pub fn num_docs(&mut self) -> Result<u64, IndexError> {
        Ok(self.searcher()?.num_docs())
    }

    /// Drops the cached reader and warms up a new one.
    ///
    /// A failed warmup is logged.
    pub fn on_index_update(&mut self) {
        self.cached = None;
        if let Err(err) = self.warmup() {
            warn!(error = %err, "warmup search failed");
        }
    }

    /// Drops the cached reader.
    pub fn on_index_reset(&mut self) {
        debug!("index reset, dropping reader");
        self.cached = None;
    }

    /// Opens a reader and runs a throwaway search on it.
    fn warmup(&mut self) -> Result<(), IndexError> {
        let searcher = self.searcher()?;
        searcher.search(&AllQuery, &TopDocs::with_limit(1))?;
        Ok(())
    }

    /// Returns a searcher over the current snapshot, reopening the reader when the
    /// generation moved on since it was opened.
    fn searcher(&mut self) -> Result<TvSearcher, IndexError> {
        let generation = self.generation.current();
        if let Some(cached) = &self.cached
            && cached.generation == generation
        {
            return Ok(cached.reader.searcher());
        }

        let index = self.context.open_index(&self.location, OpenMode::Existing)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        debug!(generation, "opened index reader");
        let searcher = reader.searcher();
        self.cached = Some(CachedReader { generation, reader });
        Ok(searcher)
    }
}

/// Returns true when there is no result or it has no documents.
fn is_empty(result: Option<&SearchResult>) -> bool {
    result.is_none_or(SearchResult::is_empty)
}

/// Weights each contents term by inverse document frequency: `ln(N / (df + 1)) + 1`.
///
/// Terms that occur in no document are left out.
fn term_weights(
    searcher: &TvSearcher,
    contents: Field,
    terms: &BTreeSet<String>,
) -> Result<BTreeMap<String, f32>, IndexError> {
    let total = searcher.num_docs() as f32;
    let mut weights = BTreeMap::new();
    for text in terms {
        let doc_freq = searcher.doc_freq(&Term::from_field_text(contents, text))?;
        if doc_freq > 0 {
            weights.insert(text.clone(), (total / (doc_freq as f32 + 1.0)).ln() + 1.0);
        }
    }
    Ok(weights)
}

/// Current time in epoch milliseconds.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
