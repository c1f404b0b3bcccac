//! Configuration file discovery.
//!
//! Finds `.scour.toml` files by walking up the directory tree from a starting point,
//! then appending the global `~/.scour.toml` if present.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::parse::is_root_config;

/// Name of a configuration file in any directory.
pub const CONFIG_FILENAME: &str = ".scour.toml";

/// Configuration files that apply to `cwd`, in precedence order.
///
/// Every ancestor of `cwd` holding a config file contributes it, closest first. A file with
/// `root = true` ends the walk and also shuts out the global file, which otherwise comes last.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();
    for dir in cwd.ancestors() {
        let candidate = dir.join(CONFIG_FILENAME);
        if !candidate.is_file() {
            continue;
        }
        let root = is_root_config(&candidate);
        configs.push(candidate);
        if root {
            return configs;
        }
    }

    if let Some(global) = global_config_path()
        && global.is_file()
        && !configs.contains(&global)
    {
        configs.push(global);
    }
    configs
}

/// `~/.scour.toml`, or `None` without a home directory.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Whether `path` is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    /// Scratch directory tree for discovery tests.
    struct Tree(
        /// Temporary root, removed on drop.
        tempfile::TempDir,
    );

    impl Tree {
        fn new() -> Self {
            Self(tempfile::tempdir().unwrap())
        }

        fn dir(&self, relative: &str) -> PathBuf {
            let path = self.0.path().join(relative);
            fs::create_dir_all(&path).unwrap();
            path
        }

        fn config(&self, relative: &str, toml: &str) -> PathBuf {
            let path = self.dir(relative).join(CONFIG_FILENAME);
            fs::write(&path, toml).unwrap();
            path
        }
    }

    /// Drops the user's own global config from a discovery result.
    fn local(configs: &[PathBuf]) -> Vec<&PathBuf> {
        configs.iter().filter(|p| !is_global_config(p)).collect()
    }

    #[test]
    fn no_configs_found() {
        let tree = Tree::new();
        let start = tree.dir("a/b/c");
        assert!(local(&discover_config_files(&start)).is_empty());
    }

    #[test]
    fn closest_config_comes_first() {
        let tree = Tree::new();
        let outer = tree.config("", "# outer\n");
        let inner = tree.config("a/b", "# inner\n");
        let start = tree.dir("a/b/c/d");

        let configs = discover_config_files(&start);
        assert_eq!(local(&configs), vec![&inner, &outer]);
    }

    #[test]
    fn root_config_stops_traversal() {
        let tree = Tree::new();
        tree.config("", "# outer\n");
        let project = tree.config("work/project", "root = true\n");
        let start = tree.dir("work/project/src");

        let configs = discover_config_files(&start);
        assert_eq!(configs, vec![project]);
    }

    #[test]
    fn global_path_uses_config_filename() {
        let path = global_config_path().unwrap();
        assert!(path.ends_with(CONFIG_FILENAME));
        assert!(is_global_config(&path));
        assert!(!is_global_config(Path::new("/elsewhere/.scour.toml")));
    }
}
