//! Top-level operations: build, diff and init, plus the result types the
//! CLI prints.
//!
//! [`handle()`] is framework-agnostic; the clap layer only turns parsed
//! arguments into an [`Action`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::builder::{BuildReport, Weave};
use crate::config::{self, BuildConfig};
use crate::diff::{self, SectionDiff};
use crate::error::WeaveError;
use crate::file;

/// An operation, independent of any CLI framework.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Compile the document tree described by a build configuration.
    Build {
        /// Explicit configuration file. Discovered from the working
        /// directory when absent.
        config: Option<PathBuf>,
        /// Overrides the configured output path.
        output: Option<PathBuf>,
        /// Forces release output when set.
        release: bool,
        /// Reject unknown configuration keys.
        strict: bool,
        /// Compile without writing, returning the merged text.
        dry_run: bool,
    },
    /// Compare one section between two documents.
    Diff {
        from: PathBuf,
        to: PathBuf,
        section: String,
        json: bool,
    },
    /// Generate a commented configuration template.
    Init { output: Option<PathBuf> },
}

/// Result of an operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Built(BuildReport),
    /// Merged output of a dry run.
    Preview(String),
    Diff(SectionDiff),
    DiffJson(String),
    Template(String),
    TemplateWritten { path: PathBuf },
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Built(report) => write!(f, "{report}"),
            ActionResult::Preview(text) => write!(f, "{text}"),
            ActionResult::Diff(diff) => write!(f, "{diff}"),
            ActionResult::DiffJson(json) => write!(f, "{json}"),
            ActionResult::Template(t) => write!(f, "{t}"),
            ActionResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
        }
    }
}

/// Run `action`.
pub fn handle(action: &Action) -> Result<ActionResult, WeaveError> {
    match action {
        Action::Build {
            config,
            output,
            release,
            strict,
            dry_run,
        } => {
            let path = match config {
                Some(path) => path.clone(),
                None => file::find_config_file()?,
            };
            let config = BuildConfig::load(&path, *strict)?;
            let mut builder = Weave::builder().from_config(config);
            if let Some(output) = output {
                builder = builder.output_path(output);
            }
            if *release {
                builder = builder.release(true);
            }

            if *dry_run {
                let compilation = builder.compile()?;
                debug!(report = %compilation.report, "dry run");
                Ok(ActionResult::Preview(compilation.output))
            } else {
                builder.run().map(ActionResult::Built)
            }
        }
        Action::Diff {
            from,
            to,
            section,
            json,
        } => {
            let diff = diff::diff_files(from, to, section)?;
            if *json {
                Ok(ActionResult::DiffJson(diff.to_json()))
            } else {
                Ok(ActionResult::Diff(diff))
            }
        }
        Action::Init { output } => {
            let template = config::template();
            match output {
                Some(path) => {
                    write_template(path, &template)?;
                    Ok(ActionResult::TemplateWritten { path: path.clone() })
                }
                None => Ok(ActionResult::Template(template)),
            }
        }
    }
}

fn write_template(path: &Path, template: &str) -> Result<(), WeaveError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| WeaveError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, template).map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
