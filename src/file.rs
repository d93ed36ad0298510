//! Build configuration discovery.
//!
//! Without an explicit `--config`, the CLI looks for a configuration file in
//! the working directory and its ancestors. The walk stops (inclusive) at the
//! first directory containing a `.git` marker, or at the filesystem root.
//!
//! Directories are expanded **shallowest first**, and the search runs from
//! the deepest end, so a configuration next to the working directory shadows
//! one at the repository root. Within one directory, names are tried in
//! [`CONFIG_FILE_NAMES`] order.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::WeaveError;

/// File names recognized as a build configuration, in preference order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["iniweave.toml", "iniweave.yaml", "iniweave.yml"];

/// Directory entry that bounds the ancestor walk.
pub const ROOT_MARKER: &str = ".git";

/// Expand `start` and its ancestors into a directory list, shallowest first.
///
/// With a `marker`, the walk stops at (and includes) the first directory
/// containing an entry of that name. Falls back to the filesystem root when
/// the marker is never found.
pub fn expand_ancestors_from(start: &Path, marker: Option<&str>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut current = start;

    loop {
        dirs.push(current.to_path_buf());

        if let Some(name) = marker
            && current.join(name).exists()
        {
            break;
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    dirs.reverse();
    dirs
}

/// Search `start` and its ancestors for a configuration file.
pub fn find_config_file_from(start: &Path) -> Option<PathBuf> {
    let dirs = expand_ancestors_from(start, Some(ROOT_MARKER));
    for dir in dirs.iter().rev() {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found build configuration");
                return Some(candidate);
            }
        }
    }
    None
}

/// Search from the current working directory.
pub fn find_config_file() -> Result<PathBuf, WeaveError> {
    let cwd = std::env::current_dir().map_err(|e| WeaveError::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    find_config_file_from(&cwd).ok_or(WeaveError::NoConfigFile)
}
