//! Change notification between writers and searchers.
//!
//! A commit or reset bumps the shared [`IndexGeneration`]; a searcher holding a reader from
//! an older generation reopens before its next search. Hosts that want to react directly
//! register an [`IndexCallback`].

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Shared counter of index changes.
#[derive(Debug, Clone, Default)]
pub struct IndexGeneration(Arc<AtomicU64>);

impl IndexGeneration {
    /// Creates a counter at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generation.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Advances the generation and returns the new value.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// A change to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEvent {
    /// New data was committed.
    Updated,
    /// Open readers must be discarded.
    Reset,
}

/// Receiver for index events; does nothing by default.
pub struct IndexCallback(Box<dyn Fn(IndexEvent) + Send + Sync>);

impl IndexCallback {
    /// Wraps a closure.
    pub fn new(callback: impl Fn(IndexEvent) + Send + Sync + 'static) -> Self {
        Self(Box::new(callback))
    }

    /// Delivers an event.
    pub fn notify(&self, event: IndexEvent) {
        (self.0)(event);
    }
}

impl Default for IndexCallback {
    fn default() -> Self {
        Self::new(|_| {})
    }
}

impl fmt::Debug for IndexCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IndexCallback")
    }
}
