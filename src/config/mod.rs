//! Project configuration management for `kiln.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                         |
//! |-------------|-------------------------------------------------|
//! | `[build]`   | Paths, browser range, image effort, transpiler  |
//! | `[serve]`   | Development server (port, interface, watch)     |
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"
//! output = "build"
//! browsers = "> 0%"
//!
//! [serve]
//! port = 3000
//! ```

mod build;
pub mod defaults;
mod error;
mod serve;

// Internal imports used in this module
use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl ProjectConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Get CLI arguments reference
    pub fn get_cli(&self) -> &'static Cli {
        self.cli.unwrap()
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        // Determine the final root path based on command
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => {
                let base = cli
                    .root
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| self.get_root().to_owned());
                base.join(name)
            }
            _ => cli
                .root
                .as_ref()
                .cloned()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };

        self.set_root(&root);
        self.update_path_with_root(&root);

        if let Commands::Serve {
            interface,
            port,
            watch,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path) {
        let cli = self.get_cli();

        // Apply CLI overrides first
        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        // Normalize root to absolute path
        let root = Self::normalize_path(root);
        self.set_root(&root);

        // Normalize config path
        self.config_path = Self::normalize_path(&root.join(&cli.config));

        // Normalize all directory paths
        self.build.source = Self::normalize_path(&root.join(&self.build.source));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.load_paths = self
            .build
            .load_paths
            .iter()
            .map(|p| Self::normalize_path(&root.join(p)))
            .collect();
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found");
        }

        if self.build.browsers.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[build.browsers] must be a browserslist expression".into()
            ));
        }

        if self.build.scripts.transpile.enable {
            Self::check_command_installed(
                "[build.scripts.transpile.command]",
                &self.build.scripts.transpile.command,
            )?;
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        if command.is_empty() {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }

        let cmd = &command[0];
        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
