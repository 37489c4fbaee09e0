//! Lib task: copy pre-built vendor files verbatim.
//!
//! Files under `assets/lib` are already-built `.js`/`.css` artifacts and
//! need no transformation or minification.

use crate::config::ProjectConfig;
use crate::paths::{self, AssetKind};
use crate::reload::LiveReload;
use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

pub fn run(config: &ProjectConfig, reload: Option<&LiveReload>) -> Result<Vec<PathBuf>> {
    let sources = paths::collect_sources(AssetKind::Lib, config)?;
    let base = AssetKind::Lib.source_base(config);
    let dest = AssetKind::Lib.dest(config);

    let mut artifacts = Vec::new();
    for path in &sources {
        let rel = path
            .strip_prefix(&base)
            .with_context(|| format!("Lib file outside source tree: {}", path.display()))?;
        let out_path = dest.join(rel);

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(path, &out_path)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
        artifacts.push(out_path);
    }

    if let Some(reload) = reload {
        if !artifacts.is_empty() {
            reload.reload();
        }
    }

    Ok(artifacts)
}

// ============================================================================
// Tests
// ============================================================================
