//! Error types for the scour-index crate.

use std::{io, path::PathBuf};

use scour_query::QueryError;
use tantivy::TantivyError;
use thiserror::Error;

/// Errors that can occur when working with the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Location of the index.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The writer lock is held by someone else.
    #[error("index is locked: {0}")]
    Locked(String),

    /// The storage layer could not read or write a file.
    #[error("index storage error: {0}")]
    Storage(String),

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fuzzy expansion produced more scored clauses than the cap allows.
    #[error("query expands to more than {limit} clauses")]
    TooManyClauses {
        /// Configured maximum.
        limit: usize,
    },

    /// A wildcard pattern could not be turned into an automaton.
    #[error("invalid wildcard pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Error message.
        message: String,
    },

    /// The search string could not be parsed.
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// How a failed index operation should be treated by the retry harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Locked or temporarily unavailable storage.
    Transient,
    /// Out of memory or disk.
    ResourceExhausted,
    /// Anything else.
    Fatal,
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: TantivyError) -> Self {
        match Self::from(source) {
            Self::Write(message) => Self::Commit(message),
            other => other,
        }
    }

    /// Classifies the error for retry decisions.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Locked(_) | Self::Storage(_) => FailureKind::Transient,
            Self::Io(err) => match err.kind() {
                io::ErrorKind::OutOfMemory | io::ErrorKind::StorageFull => {
                    FailureKind::ResourceExhausted
                }
                _ => FailureKind::Transient,
            },
            Self::OpenIndex { .. }
            | Self::Write(_)
            | Self::Commit(_)
            | Self::TooManyClauses { .. }
            | Self::InvalidPattern { .. }
            | Self::Query(_) => FailureKind::Fatal,
        }
    }
}

impl From<TantivyError> for IndexError {
    fn from(err: TantivyError) -> Self {
        match err {
            TantivyError::LockFailure(lock, message) => {
                Self::Locked(message.unwrap_or_else(|| lock.to_string()))
            }
            TantivyError::IoError(io) => Self::Io(io::Error::new(io.kind(), io.to_string())),
            TantivyError::OpenDirectoryError(open) => Self::Storage(open.to_string()),
            TantivyError::OpenReadError(open) => Self::Storage(open.to_string()),
            TantivyError::OpenWriteError(open) => Self::Storage(open.to_string()),
            other => Self::Write(other.to_string()),
        }
    }
}
