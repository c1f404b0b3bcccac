//! The caller-facing search request.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::ast::Query;

/// A cancellation flag shared between the thread running a search and the
/// thread that may cancel it.
///
/// Searches poll the flag; setting it never blocks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the flag so the request can be run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One search request, refined as the user types.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// The text typed by the user.
    pub search_string: String,
    /// Maximum number of results; all matches when `None`.
    pub max_results: Option<usize>,
    /// Try an exact match before split and fuzzy matching.
    pub exact: bool,
    /// Search with fuzzy alternatives only.
    pub fuzzy: bool,
    /// Project substituted for the `proj:.` marker.
    pub current_project: Option<String>,
    /// Restriction every result must satisfy.
    pub filter: Option<Query>,
    /// Cancellation flag polled while searching.
    canceled: CancelFlag,
}

impl SearchQuery {
    /// Creates an exact, unbounded, non-fuzzy request.
    pub fn new(search_string: impl Into<String>) -> Self {
        Self {
            search_string: search_string.into(),
            max_results: None,
            exact: true,
            fuzzy: false,
            current_project: None,
            filter: None,
            canceled: CancelFlag::new(),
        }
    }

    /// Limits the number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Sets whether an exact match is tried first.
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// Sets whether the search is fuzzy.
    pub fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    /// Sets the current project.
    pub fn with_current_project(mut self, project: impl Into<String>) -> Self {
        self.current_project = Some(project.into());
        self
    }

    /// Sets the result filter.
    pub fn with_filter(mut self, filter: Query) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Returns a handle that cancels this request from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.canceled.clone()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.canceled.cancel();
    }

    /// Returns true once cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled.is_canceled()
    }
}
