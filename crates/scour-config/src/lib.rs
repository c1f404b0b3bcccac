//! Configuration system for scour.
//!
//! scour reads TOML files named `.scour.toml`. Configuration is resolved by walking up the
//! directory tree from the current working directory, collecting any `.scour.toml` files found,
//! then loading `~/.scour.toml` as the global config with lowest precedence.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod validate;

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawAnalysisSettings, RawConfig, RawIndexSettings, RawSearchSettings, parse_config_file,
    parse_config_str,
};
use serde::{Deserialize, Serialize};
pub use validate::{ConfigWarning, MAX_FUZZY_DISTANCE, MIN_WRITER_HEAP_SIZE};
use validate::{check_config, validate_config};

/// Fully merged configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Query construction and execution settings.
    pub search: SearchSettings,
    /// Token analysis settings.
    pub analysis: AnalysisSettings,
    /// Index writer settings.
    pub index: IndexSettings,
    /// Named working sets: set name -> project names.
    pub working_sets: HashMap<String, Vec<String>>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.scour.toml` files.
    ///
    /// Returns the defaults if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first. The merged
    /// result is checked, and settings the engine cannot run with are rejected.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let config = merge_configs(&parsed);
        check_config(&config)?;
        Ok(config)
    }

    /// Returns warnings for settings that are accepted but probably unintended.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML format.
    pub fn settings_to_toml(&self) -> String {
        let serializable = SerializableSettings {
            search: self.search.clone(),
            analysis: self.analysis.clone(),
            index: self.index.clone(),
            working_sets: self
                .working_sets
                .iter()
                .map(|(name, projects)| (name.clone(), projects.clone()))
                .collect(),
        };
        toml::to_string_pretty(&serializable).expect("settings serialization should not fail")
    }
}

/// Boolean user preferences a host can toggle at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preference {
    /// Retry with fuzzy matching when an exact search finds nothing.
    FuzzySearchAuto,
    /// Count term occurrences for displayed results.
    ShowMatchCounts,
}

impl Preference {
    /// Every preference.
    pub const ALL: [Self; 2] = [Self::FuzzySearchAuto, Self::ShowMatchCounts];

    /// Key used for the preference in `[search]`.
    pub const fn key(self) -> &'static str {
        match self {
            Self::FuzzySearchAuto => "fuzzy_search_auto",
            Self::ShowMatchCounts => "show_match_counts",
        }
    }
}

/// Settings that shape query construction and execution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Retry with fuzzy matching when an exact search finds nothing.
    pub fuzzy_search_auto: bool,
    /// Count term occurrences for displayed results.
    pub show_match_counts: bool,
    /// Maximum clauses an expanded query may contain.
    pub max_clause_count: usize,
    /// Shortest query string that is executed.
    pub min_query_length: usize,
    /// Shortest last term that gets prefix expansion.
    pub min_prefix_length: usize,
    /// Slop applied to phrase queries.
    pub phrase_slop: u32,
    /// Edit distance for fuzzy terms.
    pub fuzzy_distance: u8,
}

impl SearchSettings {
    /// Reads a boolean preference.
    pub const fn get(&self, preference: Preference) -> bool {
        match preference {
            Preference::FuzzySearchAuto => self.fuzzy_search_auto,
            Preference::ShowMatchCounts => self.show_match_counts,
        }
    }

    /// Updates a boolean preference.
    pub const fn set(&mut self, preference: Preference, value: bool) {
        match preference {
            Preference::FuzzySearchAuto => self.fuzzy_search_auto = value,
            Preference::ShowMatchCounts => self.show_match_counts = value,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            fuzzy_search_auto: true,
            show_match_counts: true,
            max_clause_count: 5000,
            min_query_length: 2,
            min_prefix_length: 3,
            phrase_slop: 0,
            fuzzy_distance: 2,
        }
    }
}

/// Token length bounds used by the analyzers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Tokens shorter than this are dropped.
    pub min_word_length: usize,
    /// Tokens longer than this are dropped.
    pub max_word_length: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_word_length: 1,
            max_word_length: 128,
        }
    }
}

/// Index writer tuning and retry behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Memory budget for the index writer in bytes.
    pub writer_heap_size: usize,
    /// Attempts made before a failing index operation is abandoned.
    pub max_retry_attempts: u32,
    /// Wait between attempts in milliseconds.
    pub retry_backoff_ms: u64,
    /// Minimum number of segments merged together.
    pub merge_min_segments: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            writer_heap_size: 50_000_000,
            max_retry_attempts: 10,
            retry_backoff_ms: 1000,
            merge_min_segments: 2,
        }
    }
}

/// Settings in the layout of a `.scour.toml` file.
#[derive(Serialize)]
struct SerializableSettings {
    /// `[search]` section.
    search: SearchSettings,
    /// `[analysis]` section.
    analysis: AnalysisSettings,
    /// `[index]` section.
    index: IndexSettings,
    /// `[working_sets]` table, sorted by name.
    working_sets: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_defaults() {
        let search = SearchSettings::default();
        assert!(search.fuzzy_search_auto);
        assert!(search.show_match_counts);
        assert_eq!(search.max_clause_count, 5000);
        assert_eq!(search.min_query_length, 2);
        assert_eq!(search.min_prefix_length, 3);
        assert_eq!(search.phrase_slop, 0);
        assert_eq!(search.fuzzy_distance, 2);
    }

    #[test]
    fn index_defaults() {
        let index = IndexSettings::default();
        assert_eq!(index.writer_heap_size, 50_000_000);
        assert_eq!(index.max_retry_attempts, 10);
        assert_eq!(index.retry_backoff_ms, 1000);
        assert_eq!(index.merge_min_segments, 2);
    }

    #[test]
    fn preference_get_set() {
        let mut search = SearchSettings::default();
        for preference in Preference::ALL {
            assert!(search.get(preference));
            search.set(preference, false);
            assert!(!search.get(preference));
        }
        assert!(!search.fuzzy_search_auto);
        assert!(!search.show_match_counts);
    }

    #[test]
    fn settings_to_toml_round_trips_through_parser() {
        let mut config = Config::default();
        config.search.phrase_slop = 3;
        config
            .working_sets
            .insert("web".into(), vec!["ui".into(), "api".into()]);

        let toml = config.settings_to_toml();
        assert!(toml.contains("[search]"));
        assert!(toml.contains("phrase_slop = 3"));
        assert!(toml.contains("[working_sets]"));

        let raw = parse_config_str(&toml, Path::new("out.toml")).unwrap();
        let merged = merge_configs(&[ParsedConfig {
            path: PathBuf::from("out.toml"),
            config: raw,
        }]);
        assert_eq!(merged.search.phrase_slop, 3);
        assert_eq!(merged.working_sets["web"], vec!["ui", "api"]);
    }
}
