use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// What makes a macro template malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroDefect {
    /// Placeholder indices skip this index.
    MissingIndex(usize),
    /// A closed range whose start is past its end, as written.
    InvertedRange(String),
}

impl fmt::Display for MacroDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroDefect::MissingIndex(index) => {
                write!(f, "placeholder index {index} is missing")
            }
            MacroDefect::InvertedRange(token) => {
                write!(f, "range placeholder '{token}' is inverted")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WeaveError {
    #[error("Macro '{name}' is malformed: {defect}")]
    MalformedMacro { name: String, defect: MacroDefect },

    #[error("Undefined macro: {0}")]
    UndefinedMacro(String),

    #[error("Malformed inheritance reference '{0}', expected \"<document>:<section>\"")]
    MalformedReference(String),

    #[error("Reference '{0}' uses 'this:' but there is no current document")]
    MissingContext(String),

    #[error("Inherited document not found: {0}")]
    UnknownDocument(String),

    #[error("Section '{section}' not found in {document}")]
    UnknownSection { document: String, section: String },

    #[error("Cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("Inheritance of '{reference}' exceeds the depth limit of {limit}")]
    InheritanceTooDeep { reference: String, limit: usize },

    #[error("In {document}: {source}")]
    Document {
        document: String,
        source: Box<WeaveError>,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Unsupported document format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Invalid registry pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownConfigKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownConfigKeys(Vec<WeaveError>),

    #[error("No iniweave.toml or iniweave.yaml found, pass --config")]
    NoConfigFile,

    #[error("input_root is required. Call .input_root() on the builder or set it in the config file.")]
    InputRootRequired,

    #[error("output_path is required. Call .output_path() on the builder or set it in the config file.")]
    OutputPathRequired,
}

impl WeaveError {
    /// Attach the name of the document being compiled.
    pub fn in_document(self, document: &str) -> Self {
        WeaveError::Document {
            document: document.to_string(),
            source: Box::new(self),
        }
    }
}
