//! Configuration merging.
//!
//! Folds several `RawConfig` files into one `Config`, closest file winning.

use std::path::PathBuf;

use crate::{
    AnalysisSettings, Config, IndexSettings, SearchSettings,
    parse::{RawAnalysisSettings, RawConfig, RawIndexSettings, RawSearchSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges configuration files into a single `Config`.
///
/// Configs are given highest precedence first. Scalars take the first defined value; working
/// sets merge by name with the first definition winning.
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let mut result = Config::default();

    // Lowest precedence first so closer files overwrite
    for parsed in configs.iter().rev() {
        let raw = &parsed.config;
        if let Some(ref search) = raw.search {
            apply_raw_search(&mut result.search, search);
        }
        if let Some(ref analysis) = raw.analysis {
            apply_raw_analysis(&mut result.analysis, analysis);
        }
        if let Some(ref index) = raw.index {
            apply_raw_index(&mut result.index, index);
        }
        if let Some(ref sets) = raw.working_sets {
            for (name, projects) in sets {
                result.working_sets.insert(name.clone(), projects.clone());
            }
        }
    }

    result
}

/// Applies raw search settings, overwriting any present values.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(v) = raw.fuzzy_search_auto {
        result.fuzzy_search_auto = v;
    }
    if let Some(v) = raw.show_match_counts {
        result.show_match_counts = v;
    }
    if let Some(v) = raw.max_clause_count {
        result.max_clause_count = v;
    }
    if let Some(v) = raw.min_query_length {
        result.min_query_length = v;
    }
    if let Some(v) = raw.min_prefix_length {
        result.min_prefix_length = v;
    }
    if let Some(v) = raw.phrase_slop {
        result.phrase_slop = v;
    }
    if let Some(v) = raw.fuzzy_distance {
        result.fuzzy_distance = v;
    }
}

/// Applies raw analysis settings.
fn apply_raw_analysis(result: &mut AnalysisSettings, raw: &RawAnalysisSettings) {
    if let Some(v) = raw.min_word_length {
        result.min_word_length = v;
    }
    if let Some(v) = raw.max_word_length {
        result.max_word_length = v;
    }
}

/// Applies raw index settings.
fn apply_raw_index(result: &mut IndexSettings, raw: &RawIndexSettings) {
    if let Some(v) = raw.writer_heap_size {
        result.writer_heap_size = v;
    }
    if let Some(v) = raw.max_retry_attempts {
        result.max_retry_attempts = v;
    }
    if let Some(v) = raw.retry_backoff_ms {
        result.retry_backoff_ms = v;
    }
    if let Some(v) = raw.merge_min_segments {
        result.merge_min_segments = v;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parse::parse_config_str;

    fn parsed(name: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(name),
            config: parse_config_str(toml, Path::new(name)).unwrap(),
        }
    }

    #[test]
    fn empty_merge_is_default() {
        let config = merge_configs(&[]);
        assert_eq!(config.search.max_clause_count, 5000);
        assert!(config.working_sets.is_empty());
    }

    #[test]
    fn closest_value_wins() {
        let configs = [
            parsed("near", "[search]\nphrase_slop = 2\n"),
            parsed(
                "far",
                "[search]\nphrase_slop = 5\nshow_match_counts = false\n",
            ),
        ];
        let config = merge_configs(&configs);
        assert_eq!(config.search.phrase_slop, 2);
        assert!(!config.search.show_match_counts);
        assert!(config.search.fuzzy_search_auto);
    }

    #[test]
    fn working_sets_merge_by_name() {
        let configs = [
            parsed("near", "[working_sets]\nweb = [\"ui\"]\n"),
            parsed(
                "far",
                "[working_sets]\nweb = [\"old\"]\nserver = [\"api\", \"db\"]\n",
            ),
        ];
        let config = merge_configs(&configs);
        assert_eq!(config.working_sets["web"], vec!["ui"]);
        assert_eq!(config.working_sets["server"], vec!["api", "db"]);
    }
}
