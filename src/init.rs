//! Project initialization module.
//!
//! Creates the source layout the path table expects, with starter files
//! and a default configuration.

use crate::config::ProjectConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "kiln.toml";

/// Default project directory structure
const PROJECT_DIRS: &[&str] = &[
    "src/assets/sass",
    "src/assets/js",
    "src/assets/fonts",
    "src/assets/img",
    "src/assets/lib",
];

/// Starter files written into a fresh project
const STARTER_FILES: &[(&str, &str)] = &[
    ("src/assets/sass/style.scss", include_str!("embed/init/style.scss")),
    ("src/assets/js/main.js", include_str!("embed/init/main.js")),
    ("src/index.html", include_str!("embed/init/index.html")),
];

/// Create a new project with default structure
pub fn new_project(config: &ProjectConfig) -> Result<()> {
    let root = config.get_root();
    let has_name = matches!(
        config.get_cli().command,
        crate::cli::Commands::Init { name: Some(_) }
    );

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `kiln init <NAME>` to create in a subdirectory."
        );
    }

    init_project_structure(root)?;
    init_starter_files(root)?;
    init_default_config(root)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&ProjectConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create project directory structure
fn init_project_structure(root: &Path) -> Result<()> {
    for dir in PROJECT_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `kiln init <NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write starter source files
fn init_starter_files(root: &Path) -> Result<()> {
    for (rel, content) in STARTER_FILES {
        let path = root.join(rel);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
