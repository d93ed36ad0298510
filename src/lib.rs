//! Compile a tree of sectioned INI, YAML and TOML documents into one merged
//! INI file, with section inheritance and parameterized macros.
//!
//! ```ignore
//! let report = Weave::builder()
//!     .input_root("mod/src")
//!     .macro_root("mod/src/@macros")
//!     .output_path("mod/build/rules.ini")
//!     .run()?;
//! ```
//!
//! That call loads every document under `mod/src`, loads the macro templates,
//! resolves every section, and writes the result with a `; File:` banner in
//! front of each document.
//!
//! # Documents and sections
//!
//! A document is a file under the input root, named by its `/`-separated
//! path relative to that root (`units/tank.ini`). It holds ordered sections;
//! a section holds ordered `key=value` entries where a value is a scalar or
//! a list (`key[]=item` in INI, a sequence in YAML or TOML). Files and
//! directories starting with `@` are never compiled, which is where macro
//! trees usually live.
//!
//! # Directives
//!
//! Two kinds of entry are rewritten during compilation; everything else is
//! copied through:
//!
//! - **`@Inherits=doc.ini:Section`** splices the fully resolved entries of
//!   the referenced section in place. `this:Section` refers to the current
//!   document. Several references may be given as a list value
//!   (`@Inherits[]=...`); they apply in order, and entries after the directive override
//!   inherited ones. A cycle fails with the full chain in the error.
//! - **`@name=args`** expands the macro template `name` with the
//!   comma-separated (or listed) arguments. Without a macro root these
//!   entries stay as they are.
//!
//! After a section is resolved, duplicate keys collapse: the last value
//! wins, and the key keeps the position where it first appeared.
//!
//! # Macros
//!
//! A macro template is a section whose keys and values contain placeholders:
//!
//! ```text
//! ${0}      the first argument
//! ${1...}   one key per argument from the second on
//! ${0...2}  arguments 0 through 2
//! ```
//!
//! Templates are checked when loaded: a `${2}` without a `${1}` or a range
//! like `${3...1}` is rejected before anything is compiled. A file with one
//! section is also reachable by its bare name (`@voice` for `voice.ini`).
//!
//! # Registries
//!
//! The build configuration can list registry tables. Each collects the
//! section names of its sources (document names, glob patterns such as
//! `units/*.ini`, or external files) into a numbered section, compiled under
//! the `registry_file` name so other sections can inherit from it.
//!
//! # Configuration
//!
//! The CLI reads `iniweave.toml` or `iniweave.yaml`, searched upward from the
//! working directory to the repository root. [`BuildConfig`] is the schema;
//! `iniweave init` prints a commented template of it. Relative paths resolve
//! against the configuration file's directory.
//!
//! # Core library
//!
//! Resolution itself ([`CompilationContext`]) does no I/O. Loading lives in
//! [`loader`], rendering in [`emit`]. The clap adapter (the `cli` module,
//! behind the `clap` Cargo feature, on by default) only converts arguments
//! into an [`Action`]; [`handle()`] does the rest.
//!
//! # Error handling
//!
//! All fallible operations return [`WeaveError`]. Resolution errors are
//! wrapped with the name of the document being compiled.

pub mod arity;
pub mod config;
pub mod diff;
pub mod directive;
pub mod emit;
pub mod error;
pub mod format;
pub mod inherit;
pub mod loader;
pub mod macros;
pub mod pipeline;
pub mod placeholder;
pub mod registry;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod file;
mod ops;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{BuildReport, Compilation, Weave, WeaveBuilder};
#[cfg(feature = "clap")]
pub use cli::{Cli, Command};
pub use config::BuildConfig;
pub use error::WeaveError;
pub use file::{find_config_file, find_config_file_from};
pub use inherit::{ContentCache, DocumentStore, Reference, Resolver, SectionCache};
pub use macros::{MacroStore, MacroTemplate};
pub use ops::{Action, ActionResult, handle};
pub use pipeline::{CompilationContext, Compiled, FailurePolicy};
pub use registry::RegistryTable;
pub use types::{Document, DocumentMap, Section, Value};
