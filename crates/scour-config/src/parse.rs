//! Configuration file parsing.
//!
//! Parses individual `.scour.toml` files into `RawConfig` values whose fields stay optional
//! until merging.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here and ignore parent and global configs.
    pub root: Option<bool>,
    /// `[search]` section.
    pub search: Option<RawSearchSettings>,
    /// `[analysis]` section.
    pub analysis: Option<RawAnalysisSettings>,
    /// `[index]` section.
    pub index: Option<RawIndexSettings>,
    /// `[working_sets]` table: set name -> project names.
    pub working_sets: Option<HashMap<String, Vec<String>>>,
}

/// Raw search settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchSettings {
    /// Fall back to fuzzy matching when nothing exact matches.
    pub fuzzy_search_auto: Option<bool>,
    /// Count per-document matches for displayed results.
    pub show_match_counts: Option<bool>,
    /// Maximum clauses an expanded query may contain.
    pub max_clause_count: Option<usize>,
    /// Shortest query string that is executed.
    pub min_query_length: Option<usize>,
    /// Shortest last term that gets prefix expansion.
    pub min_prefix_length: Option<usize>,
    /// Slop applied to phrase queries.
    pub phrase_slop: Option<u32>,
    /// Edit distance for fuzzy terms.
    pub fuzzy_distance: Option<u8>,
}

/// Raw analysis settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAnalysisSettings {
    /// Tokens shorter than this are dropped.
    pub min_word_length: Option<usize>,
    /// Tokens longer than this are dropped.
    pub max_word_length: Option<usize>,
}

/// Raw index settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIndexSettings {
    /// Memory budget for the index writer in bytes.
    pub writer_heap_size: Option<usize>,
    /// Attempts made before a failing index operation is abandoned.
    pub max_retry_attempts: Option<u32>,
    /// Wait between attempts in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Minimum number of segments merged together.
    pub merge_min_segments: Option<usize>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config() {
        let config = parse_config_str("", Path::new("test.toml")).unwrap();
        assert!(config.root.is_none());
        assert!(config.search.is_none());
        assert!(config.analysis.is_none());
        assert!(config.index.is_none());
        assert!(config.working_sets.is_none());
    }

    #[test]
    fn partial_sections() {
        let toml = r#"
root = true

[search]
fuzzy_search_auto = false
max_clause_count = 1024

[working_sets]
backend = ["core", "storage"]
"#;
        let config = parse_config_str(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.root, Some(true));
        let search = config.search.unwrap();
        assert_eq!(search.fuzzy_search_auto, Some(false));
        assert_eq!(search.max_clause_count, Some(1024));
        assert!(search.show_match_counts.is_none());
        let sets = config.working_sets.unwrap();
        assert_eq!(sets["backend"], vec!["core", "storage"]);
    }

    #[test]
    fn malformed_toml_reports_path() {
        let err = parse_config_str("[search\n", Path::new("bad.toml")).unwrap_err();
        assert!(
            matches!(err, ConfigError::ParseToml { ref path, .. } if path == Path::new("bad.toml"))
        );
    }

    #[test]
    fn wrong_type_is_an_error() {
        let toml = "[index]\nmax_retry_attempts = \"ten\"\n";
        assert!(parse_config_str(toml, Path::new("test.toml")).is_err());
    }
}
