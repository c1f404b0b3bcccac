//! Configuration validation.
//!
//! Hard errors for values the engine cannot run with, warnings for values that merely look
//! wrong.

use std::fmt;

use crate::{Config, ConfigError};

/// Smallest writer heap the index accepts, in bytes.
pub const MIN_WRITER_HEAP_SIZE: usize = 15_000_000;

/// Largest supported fuzzy edit distance.
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A working set lists no projects and will match nothing.
    EmptyWorkingSet {
        /// Name of the working set.
        name: String,
    },
    /// The prefix threshold is below the minimum query length, so it never applies.
    PrefixShorterThanQuery {
        /// Configured `min_prefix_length`.
        min_prefix_length: usize,
        /// Configured `min_query_length`.
        min_query_length: usize,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWorkingSet { name } => {
                write!(f, "working set '{name}' lists no projects")
            }
            Self::PrefixShorterThanQuery {
                min_prefix_length,
                min_query_length,
            } => write!(
                f,
                "min_prefix_length ({min_prefix_length}) is below \
                 min_query_length ({min_query_length})"
            ),
        }
    }
}

/// Rejects settings the engine cannot work with.
pub fn check_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.max_clause_count == 0 {
        return Err(ConfigError::invalid(
            "search.max_clause_count",
            "must be at least 1",
        ));
    }
    if config.search.fuzzy_distance > MAX_FUZZY_DISTANCE {
        return Err(ConfigError::invalid(
            "search.fuzzy_distance",
            format!(
                "{} exceeds the maximum of {MAX_FUZZY_DISTANCE}",
                config.search.fuzzy_distance
            ),
        ));
    }
    if config.analysis.min_word_length > config.analysis.max_word_length {
        return Err(ConfigError::invalid(
            "analysis.min_word_length",
            format!(
                "{} is greater than max_word_length {}",
                config.analysis.min_word_length, config.analysis.max_word_length
            ),
        ));
    }
    if config.index.max_retry_attempts == 0 {
        return Err(ConfigError::invalid(
            "index.max_retry_attempts",
            "must be at least 1",
        ));
    }
    if config.index.writer_heap_size < MIN_WRITER_HEAP_SIZE {
        return Err(ConfigError::invalid(
            "index.writer_heap_size",
            format!("must be at least {MIN_WRITER_HEAP_SIZE} bytes"),
        ));
    }
    Ok(())
}

/// Collects warnings for a configuration that passed [`check_config`].
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    let mut names: Vec<&String> = config.working_sets.keys().collect();
    names.sort();
    for name in names {
        if config.working_sets[name].is_empty() {
            warnings.push(ConfigWarning::EmptyWorkingSet { name: name.clone() });
        }
    }

    let search = &config.search;
    if search.min_prefix_length < search.min_query_length {
        warnings.push(ConfigWarning::PrefixShorterThanQuery {
            min_prefix_length: search.min_prefix_length,
            min_query_length: search.min_query_length,
        });
    }

    warnings
}
