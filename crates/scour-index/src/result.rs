//! Search result types.
//!
//! A [`SearchResult`] holds the documents of one search in rank order together with the
//! weights of the contents terms the query matched. Each [`ResultDoc`] carries the stored
//! metadata of one file plus, when match counting is enabled, how often each query term
//! occurs in it.

use std::{collections::BTreeMap, slice, sync::Arc, vec};

use scour_analysis::NO_VALUE;
use tantivy::DocAddress;

/// Archive extension that marks a document as packaged.
const JAR_SUFFIX: &str = ".jar";

/// Documents matching one search, best first.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Search string that produced the result.
    query: String,
    /// Matching documents, by descending score then document address.
    docs: Vec<ResultDoc>,
    /// Inverse document frequency weight of each matched contents term.
    term_weights: Arc<BTreeMap<String, f32>>,
}

impl SearchResult {
    /// Creates a result from ranked documents.
    pub(crate) fn new(
        query: impl Into<String>,
        docs: Vec<ResultDoc>,
        term_weights: Arc<BTreeMap<String, f32>>,
    ) -> Self {
        Self {
            query: query.into(),
            docs,
            term_weights,
        }
    }

    /// Search string that produced the result.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Documents in rank order.
    pub fn docs(&self) -> &[ResultDoc] {
        &self.docs
    }

    /// Iterates over documents in rank order.
    pub fn iter(&self) -> slice::Iter<'_, ResultDoc> {
        self.docs.iter()
    }

    /// Contents terms of the query with their weights.
    pub fn term_weights(&self) -> &BTreeMap<String, f32> {
        &self.term_weights
    }
}

impl IntoIterator for SearchResult {
    type Item = ResultDoc;
    type IntoIter = vec::IntoIter<ResultDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a ResultDoc;
    type IntoIter = slice::Iter<'a, ResultDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

/// One matching document.
#[derive(Debug, Clone)]
pub struct ResultDoc {
    /// Relevance score.
    pub(crate) score: f32,
    /// Location of the document in the searched snapshot.
    pub(crate) address: DocAddress,
    /// Full file path.
    pub(crate) file: String,
    /// Last path segment.
    pub(crate) name: String,
    /// Lowercased extension or the no-value marker.
    pub(crate) ext: String,
    /// Owning project path.
    pub(crate) proj: String,
    /// Modification time in epoch milliseconds.
    pub(crate) modified: i64,
    /// Containing archive or the no-value marker.
    pub(crate) jar: String,
    /// Frequency of each query term in the document, when counted.
    pub(crate) term_freqs: Option<BTreeMap<String, u32>>,
    /// Shared term weights of the result.
    pub(crate) term_weights: Arc<BTreeMap<String, f32>>,
}

impl ResultDoc {
    /// Relevance score.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Location of the document in the searched snapshot.
    pub fn address(&self) -> DocAddress {
        self.address
    }

    /// Full file path.
    pub fn file_path(&self) -> &str {
        &self.file
    }

    /// Last segment of the file path.
    pub fn file_name(&self) -> &str {
        &self.name
    }

    /// Lowercased extension, if the file has one.
    pub fn extension(&self) -> Option<&str> {
        (self.ext != NO_VALUE).then_some(self.ext.as_str())
    }

    /// Owning project path.
    pub fn project(&self) -> &str {
        &self.proj
    }

    /// Last segment of the project path.
    pub fn project_name(&self) -> &str {
        self.proj
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.proj)
    }

    /// Returns true if the file lives inside an archive.
    pub fn is_in_jar(&self) -> bool {
        self.jar != NO_VALUE && self.jar.ends_with(JAR_SUFFIX)
    }

    /// Containing archive, if any.
    pub fn jar_name(&self) -> Option<&str> {
        self.is_in_jar().then_some(self.jar.as_str())
    }

    /// Modification time in epoch milliseconds.
    pub fn modified(&self) -> i64 {
        self.modified
    }

    /// Total occurrences of the query's contents terms, when counted.
    pub fn match_count(&self) -> Option<u32> {
        self.term_freqs.as_ref().map(|freqs| freqs.values().sum())
    }

    /// Highlighting strength of `term` in this document.
    ///
    /// The square root of the term's frequency times its weight. Zero when the term is not
    /// part of the query or match counts were not collected.
    pub fn term_score(&self, term: &str) -> f32 {
        let Some(weight) = self.term_weights.get(term) else {
            return 0.0;
        };
        let freq = self
            .term_freqs
            .as_ref()
            .and_then(|freqs| freqs.get(term))
            .copied()
            .unwrap_or(0);
        (freq as f32).sqrt() * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(proj: &str, ext: &str, jar: &str) -> ResultDoc {
        ResultDoc {
            score: 1.0,
            address: DocAddress::new(0, 0),
            file: format!("{proj}/src/Main.{ext}"),
            name: format!("Main.{ext}"),
            ext: ext.to_string(),
            proj: proj.to_string(),
            modified: 42,
            jar: jar.to_string(),
            term_freqs: None,
            term_weights: Arc::default(),
        }
    }

    #[test]
    fn metadata_accessors() {
        let doc = doc("/ws/core", "java", NO_VALUE);
        assert_eq!(doc.file_path(), "/ws/core/src/Main.java");
        assert_eq!(doc.file_name(), "Main.java");
        assert_eq!(doc.extension(), Some("java"));
        assert_eq!(doc.project(), "/ws/core");
        assert_eq!(doc.project_name(), "core");
        assert_eq!(doc.modified(), 42);
        assert!(!doc.is_in_jar());
        assert_eq!(doc.jar_name(), None);
    }

    #[test]
    fn missing_extension_is_none() {
        assert_eq!(doc("core", NO_VALUE, NO_VALUE).extension(), None);
        assert_eq!(doc("core", NO_VALUE, NO_VALUE).project_name(), "core");
    }

    #[test]
    fn jar_membership_requires_jar_suffix() {
        assert!(doc("core", "class", "/lib/rt.jar").is_in_jar());
        assert_eq!(
            doc("core", "class", "/lib/rt.jar").jar_name(),
            Some("/lib/rt.jar")
        );
        assert!(!doc("core", "class", "/lib/src.zip").is_in_jar());
    }

    #[test]
    fn match_count_sums_frequencies() {
        let mut doc = doc("core", "rs", NO_VALUE);
        assert_eq!(doc.match_count(), None);
        doc.term_freqs = Some(BTreeMap::from([("parse".to_string(), 3), ("xml".to_string(), 2)]));
        assert_eq!(doc.match_count(), Some(5));
    }

    #[test]
    fn term_score_scales_weight() {
        let mut doc = doc("core", "rs", NO_VALUE);
        doc.term_weights = Arc::new(BTreeMap::from([("parse".to_string(), 2.0)]));
        doc.term_freqs = Some(BTreeMap::from([("parse".to_string(), 4)]));
        assert!((doc.term_score("parse") - 4.0).abs() < f32::EPSILON);
        assert_eq!(doc.term_score("xml"), 0.0);
    }

    #[test]
    fn result_iterates_in_order() {
        let mut first = doc("core", "rs", NO_VALUE);
        first.score = 2.0;
        let result = SearchResult::new(
            "main",
            vec![first, doc("util", "rs", NO_VALUE)],
            Arc::default(),
        );
        assert_eq!(result.query(), "main");
        assert_eq!(result.len(), 2);
        assert!(!result.is_empty());
        let projects: Vec<_> = result.iter().map(ResultDoc::project).collect();
        assert_eq!(projects, ["core", "util"]);
        assert_eq!(result.into_iter().count(), 2);
    }
}
