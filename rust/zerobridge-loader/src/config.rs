//! Loader configuration read from the process environment.

use std::path::PathBuf;

/// Comma-separated list of files or directories to load native libraries from.
pub const NATIVE_LIBS_DIRS_VAR: &str = "ZEROBRIDGE_NATIVE_LIBS_DIRS";

/// `true`/`false` flag controlling [`load_at_startup`](crate::load_at_startup).
/// Loading is enabled when the variable is unset.
pub const LOAD_AT_STARTUP_VAR: &str = "ZEROBRIDGE_LOAD_NATIVE_LIBS_AT_STARTUP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Files or directories to load, in order.
    pub search_paths: Vec<PathBuf>,
    /// Whether the process-wide startup load runs.
    pub load_at_startup: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            search_paths: Vec::new(),
            load_at_startup: true,
        }
    }
}

impl LoaderConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> LoaderConfig {
        LoaderConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LoaderConfig {
        let search_paths = lookup(NATIVE_LIBS_DIRS_VAR)
            .map(|value| parse_search_paths(&value))
            .unwrap_or_default();
        let load_at_startup = lookup(LOAD_AT_STARTUP_VAR)
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        LoaderConfig {
            search_paths,
            load_at_startup,
        }
    }
}

fn parse_search_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
