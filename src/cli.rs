//! Clap adapter for the `iniweave` binary.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! The only bridge to the core is [`Command::into_action()`], which converts
//! parsed arguments into an [`Action`](crate::Action). Everything after that
//! flows through the clap-free [`handle()`](crate::handle).

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::ops::Action;

/// Compile sectioned INI/YAML/TOML trees with inheritance and macros into a
/// single INI file.
#[derive(Debug, Parser)]
#[command(name = "iniweave", version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile the document tree into the merged output file.
    Build {
        /// Build configuration. Searched upward from the working directory
        /// when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the merged file here instead of the configured output_path.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Leave out the `; File:` banners.
        #[arg(long)]
        release: bool,
        /// Accept unknown keys in the configuration file.
        #[arg(long)]
        no_strict: bool,
        /// Print the merged output instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Compare the values of one section between two documents.
    Diff {
        /// Document with the values reported as "more".
        from: PathBuf,
        /// Document with the values reported as "less".
        to: PathBuf,
        /// Section to compare.
        #[arg(short, long)]
        section: String,
        /// Print the difference as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Generate a commented build configuration.
    Init {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Default `tracing` filter for the chosen verbosity. `RUST_LOG` takes
    /// precedence when set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl Command {
    /// Convert the parsed subcommand into a framework-agnostic [`Action`].
    pub fn into_action(self) -> Action {
        match self {
            Command::Build {
                config,
                output,
                release,
                no_strict,
                dry_run,
            } => Action::Build {
                config,
                output,
                release,
                strict: !no_strict,
                dry_run,
            },
            Command::Diff {
                from,
                to,
                section,
                json,
            } => Action::Diff {
                from,
                to,
                section,
                json,
            },
            Command::Init { output } => Action::Init { output },
        }
    }
}
