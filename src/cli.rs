//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::paths::AssetKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kiln static asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Source directory path (relative to project root)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: kiln.toml)
    #[arg(short = 'C', long, default_value = "kiln.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a template project
    Init {
        /// the name(path) of the project directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Deletes the output directory and rebuilds all asset categories
    Build,

    /// Serve the output. Rebuild and reload on change automatically
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Delete the output directory
    Clean,

    /// Run a single asset task without cleaning
    Task {
        /// Asset category to rebuild
        #[arg(value_enum)]
        kind: AssetKind,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build)
    }
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}
