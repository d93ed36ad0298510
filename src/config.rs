//! Build configuration.
//!
//! A [`BuildConfig`] is loaded from an `iniweave.toml` or `iniweave.yaml`
//! file, with a few fields overridable from the environment. Relative paths
//! in the file are resolved against the file's own directory, so a build
//! behaves the same regardless of the working directory it is started from.

use std::fs;
use std::path::{Path, PathBuf};

use confique::Config;
use serde::Serialize;
use tracing::debug;

use crate::error::WeaveError;
use crate::pipeline::FailurePolicy;
use crate::registry::RegistryTable;
use crate::validate;

/// Settings for one `iniweave build`.
#[derive(Config, Serialize, Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Root of the document tree. Files and directories whose names start
    /// with `@` are not compiled.
    #[config(env = "IW_INPUT_ROOT")]
    pub input_root: PathBuf,

    /// Path of the merged output file.
    #[config(env = "IW_OUTPUT_PATH")]
    pub output_path: PathBuf,

    /// Root of the macro tree. Without it, macro directives are kept as
    /// plain entries.
    #[config(env = "IW_MACRO_ROOT")]
    pub macro_root: Option<PathBuf>,

    /// Document name the registry tables are compiled under.
    #[config(default = "registry.ini")]
    pub registry_file: String,

    /// Registry tables, built in order.
    pub registry: Option<Vec<RegistryTable>>,

    /// Omit the `; File:` banner before each document.
    #[config(env = "IW_RELEASE", default = false)]
    pub release: bool,

    /// What to do when a document fails: `abort` or `skip`.
    #[config(default = "abort")]
    pub on_error: FailurePolicy,

    /// Maximum inheritance nesting.
    #[config(default = 64)]
    pub max_depth: usize,
}

impl BuildConfig {
    /// Load the configuration at `path`, with environment overrides.
    ///
    /// In `strict` mode, keys the configuration does not know are rejected.
    pub fn load(path: &Path, strict: bool) -> Result<Self, WeaveError> {
        let content = fs::read_to_string(path).map_err(|e| WeaveError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if strict {
            validate::validate_unknown_keys::<BuildConfig>(&content, path)?;
        }

        let config = BuildConfig::builder().env().file(path).load()?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        debug!(path = %path.display(), "loaded build configuration");
        Ok(config.anchored(base))
    }

    /// Resolve relative paths against `base`.
    pub fn anchored(mut self, base: &Path) -> Self {
        self.input_root = anchor(base, self.input_root);
        self.output_path = anchor(base, self.output_path);
        self.macro_root = self.macro_root.map(|p| anchor(base, p));
        self
    }

    pub fn registry_tables(&self) -> &[RegistryTable] {
        self.registry.as_deref().unwrap_or_default()
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// A commented TOML template of every setting.
pub fn template() -> String {
    confique::toml::template::<BuildConfig>(confique::toml::FormatOptions::default())
}
