//! Kiln - a static asset pipeline for front-end projects.

mod build;
mod cli;
mod config;
mod init;
mod logger;
mod paths;
mod reload;
mod serve;
mod tasks;
mod watch;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::ProjectConfig;
use init::new_project;
use serve::serve_project;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static ProjectConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Init { .. } => new_project(config),
        Commands::Build => build::run_build(config),
        Commands::Serve { .. } => serve_project(config),
        Commands::Clean => build::clean_output(config),
        Commands::Task { kind } => build::run_single(config, *kind),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<ProjectConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        ProjectConfig::from_path(&config_path)?
    } else {
        ProjectConfig::default()
    };
    config.update_with_cli(cli);

    // Validate config state based on command
    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found."),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}
