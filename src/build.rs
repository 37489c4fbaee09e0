//! Build orchestration.
//!
//! Coordinates the clean step and the parallel task batch.
//!
//! # Architecture
//!
//! ```text
//! build_all()
//!     │
//!     ├── clean_output() ──► delete the output directory (idempotent)
//!     │
//!     └── rayon batch ─────► styles | scripts | images
//!                            fonts  | markup  | lib      (no ordering)
//! ```
//!
//! Categories never write to overlapping destination paths, so the batch
//! needs no coordination beyond the clean barrier in front of it.

use crate::{
    config::ProjectConfig,
    log,
    paths::AssetKind,
    reload::LiveReload,
    tasks::{self, TaskReport},
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::fs;

/// Delete the build output directory and everything under it.
///
/// Idempotent: an already-absent directory is a success. A filesystem
/// denial (e.g. permissions) propagates as a fatal error.
pub fn clean_output(config: &ProjectConfig) -> Result<()> {
    let output = &config.build.output;
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    Ok(())
}

/// Clean, then run all task functions concurrently.
///
/// Task failures never abort the batch; each lands in its report so the
/// caller decides whether to exit non-zero (build) or keep watching
/// (serve).
pub fn build_all(
    config: &ProjectConfig,
    reload: Option<&LiveReload>,
) -> Result<Vec<TaskReport>> {
    clean_output(config)?;
    fs::create_dir_all(&config.build.output).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.build.output.display()
        )
    })?;

    let reports = AssetKind::ALL
        .par_iter()
        .map(|&kind| tasks::run(kind, config, reload))
        .collect();

    Ok(reports)
}

/// `kiln build`: full build, non-zero exit on any task failure.
pub fn run_build(config: &ProjectConfig) -> Result<()> {
    let reports = build_all(config, None)?;

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        bail!("{failed} task(s) failed");
    }

    log!("build"; "done");
    Ok(())
}

/// `kiln task <kind>`: run one category without cleaning first.
pub fn run_single(config: &ProjectConfig, kind: AssetKind) -> Result<()> {
    let report = tasks::run(kind, config, None);
    if report.is_failure() {
        bail!("{} task failed", kind.name());
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
