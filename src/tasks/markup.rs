//! Markup task: resolve page includes and write assembled pages.
//!
//! Pages at the source root (one level) may splice shared fragments in via
//! `<!--= path -->` directives, the same mechanism the scripts task uses.
//! Assembled output lands at the build root mirroring source structure,
//! and the dev server gets a full reload.

use super::include::resolve_includes;
use crate::config::ProjectConfig;
use crate::paths::{self, AssetKind};
use crate::reload::LiveReload;
use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

pub fn run(config: &ProjectConfig, reload: Option<&LiveReload>) -> Result<Vec<PathBuf>> {
    let sources = paths::collect_sources(AssetKind::Markup, config)?;
    let base = AssetKind::Markup.source_base(config);
    let dest = AssetKind::Markup.dest(config);

    let mut artifacts = Vec::new();
    for path in &sources {
        let rel = path
            .strip_prefix(&base)
            .with_context(|| format!("Page outside source tree: {}", path.display()))?;
        let assembled = resolve_includes(path)?;

        let out_path = dest.join(rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&out_path, assembled)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        artifacts.push(out_path);
    }

    if let Some(reload) = reload {
        reload.reload();
    }

    Ok(artifacts)
}

// ============================================================================
// Tests
// ============================================================================
