use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::emit;
use crate::error::WeaveError;
use crate::inherit::DEFAULT_MAX_DEPTH;
use crate::loader;
use crate::pipeline::{CompilationContext, FailurePolicy};
use crate::registry::{self, RegistryTable};
use crate::types::normalize_name;

/// Entry point for configuring a build.
pub struct Weave;

impl Weave {
    pub fn builder() -> WeaveBuilder {
        WeaveBuilder::new()
    }
}

/// Builder for one compilation of a document tree into a merged INI file.
///
/// Only [`input_root()`](Self::input_root) is needed to compile;
/// [`run()`](Self::run) additionally needs an
/// [`output_path()`](Self::output_path).
#[derive(Debug, Clone)]
pub struct WeaveBuilder {
    input_root: Option<PathBuf>,
    output_path: Option<PathBuf>,
    macro_root: Option<PathBuf>,
    registry_file: String,
    registry: Vec<RegistryTable>,
    release: bool,
    on_error: FailurePolicy,
    max_depth: usize,
}

impl WeaveBuilder {
    fn new() -> Self {
        Self {
            input_root: None,
            output_path: None,
            macro_root: None,
            registry_file: "registry.ini".to_string(),
            registry: Vec::new(),
            release: false,
            on_error: FailurePolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Take every setting from a loaded [`BuildConfig`].
    pub fn from_config(mut self, config: BuildConfig) -> Self {
        self.input_root = Some(config.input_root);
        self.output_path = Some(config.output_path);
        self.macro_root = config.macro_root;
        self.registry_file = config.registry_file;
        self.registry = config.registry.unwrap_or_default();
        self.release = config.release;
        self.on_error = config.on_error;
        self.max_depth = config.max_depth;
        self
    }

    /// Root of the document tree to compile.
    pub fn input_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_root = Some(path.into());
        self
    }

    /// Where [`run()`](Self::run) writes the merged file.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Root of the macro tree. Without one, macro directives stay as plain
    /// entries.
    pub fn macro_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.macro_root = Some(path.into());
        self
    }

    /// Document name for the registry tables (default: `"registry.ini"`).
    pub fn registry_file(mut self, name: &str) -> Self {
        self.registry_file = name.to_string();
        self
    }

    /// Append a registry table.
    pub fn registry_table(mut self, table: RegistryTable) -> Self {
        self.registry.push(table);
        self
    }

    /// Omit `; File:` banners from the output (default: `false`).
    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Set the failure policy (default: [`FailurePolicy::Abort`]).
    pub fn on_error(mut self, policy: FailurePolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Cap inheritance nesting (default: 64).
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    fn effective_input_root(&self) -> Result<&Path, WeaveError> {
        self.input_root
            .as_deref()
            .ok_or(WeaveError::InputRootRequired)
    }

    fn effective_output_path(&self) -> Result<&Path, WeaveError> {
        self.output_path
            .as_deref()
            .ok_or(WeaveError::OutputPathRequired)
    }

    /// Load, resolve and render everything without writing the output.
    pub fn compile(&self) -> Result<Compilation, WeaveError> {
        let input_root = self.effective_input_root()?;
        let mut documents = loader::load_documents(input_root, self.on_error)?;

        let macros = match &self.macro_root {
            Some(root) => Some(loader::load_macros(root)?),
            None => None,
        };
        let macro_count = macros.as_ref().map_or(0, |m| m.len());

        if !self.registry.is_empty() {
            let registry = registry::build_registry(&self.registry, &documents)?;
            let name = normalize_name(&self.registry_file);
            if documents.insert(name.clone(), registry).is_some() {
                warn!(document = %name, "registry replaces a document of the same name");
            }
        }

        let mut context = CompilationContext::new(documents).max_depth(self.max_depth);
        if let Some(macros) = macros {
            context = context.with_macros(macros);
        }
        let compiled = context.compile(self.on_error)?;

        let report = BuildReport {
            documents: compiled.documents.len(),
            sections: compiled.documents.iter().map(|(_, d)| d.len()).sum(),
            macros: macro_count,
            skipped: compiled.skipped,
            output_path: self.output_path.clone(),
        };
        let output = emit::render(&compiled.documents, self.release);
        Ok(Compilation { output, report })
    }

    /// Compile and write the merged file to the output path.
    pub fn run(&self) -> Result<BuildReport, WeaveError> {
        let output_path = self.effective_output_path()?;
        let Compilation { output, report } = self.compile()?;
        emit::write_output(output_path, &output)?;
        info!(
            path = %output_path.display(),
            documents = report.documents,
            sections = report.sections,
            "wrote merged output"
        );
        Ok(report)
    }
}

/// Rendered output plus its report, from [`WeaveBuilder::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub output: String,
    pub report: BuildReport,
}

/// Summary of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub documents: usize,
    pub sections: usize,
    pub macros: usize,
    /// Documents left out under [`FailurePolicy::Skip`].
    pub skipped: Vec<String>,
    pub output_path: Option<PathBuf>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compiled {} documents ({} sections, {} macros)",
            self.documents, self.sections, self.macros
        )?;
        if let Some(path) = &self.output_path {
            write!(f, " into {}", path.display())?;
        }
        if !self.skipped.is_empty() {
            write!(f, "\nSkipped: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}
