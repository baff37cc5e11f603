//! Interpreter configuration.

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Extension appended to import names that have none.
pub const DEFAULT_EXTENSION: &str = "quill";

/// Colon-separated (platform path list) directories searched by `import`.
pub const PATH_ENV: &str = "QUILL_PATH";

/// Optional cap on nested function applications.
pub const MAX_CALL_DEPTH_ENV: &str = "QUILL_MAX_CALL_DEPTH";

/// Settings applied when an interpreter is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Whether `import` may touch the filesystem.
    pub import_enabled: bool,
    /// Directories searched, in order, for imported files.
    pub search_paths: Vec<PathBuf>,
    pub default_extension: String,
    /// `None` leaves recursion bounded only by memory.
    pub max_call_depth: Option<usize>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            import_enabled: true,
            search_paths: Vec::new(),
            default_extension: DEFAULT_EXTENSION.to_string(),
            max_call_depth: None,
        }
    }
}

impl EvalConfig {
    /// Defaults overlaid with `QUILL_PATH` and `QUILL_MAX_CALL_DEPTH`.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os(PATH_ENV).map(|paths| env::split_paths(&paths).collect()),
            env::var(MAX_CALL_DEPTH_ENV).ok(),
        )
    }

    fn from_vars(search_paths: Option<Vec<PathBuf>>, max_call_depth: Option<String>) -> Self {
        let mut config = EvalConfig::default();
        if let Some(paths) = search_paths {
            config.search_paths = paths
                .into_iter()
                .filter(|path| !path.as_os_str().is_empty())
                .collect();
        }
        if let Some(raw) = max_call_depth {
            match raw.trim().parse::<usize>() {
                Ok(0) => {}
                Ok(limit) => config.max_call_depth = Some(limit),
                Err(_) => warn!(value = %raw, "ignoring invalid {MAX_CALL_DEPTH_ENV}"),
            }
        }
        config
    }
}
