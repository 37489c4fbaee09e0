//! Task functions, one per asset category.
//!
//! Each task reads the files its category's source globs match, threads
//! them through a fixed chain of transforms and writes the results to the
//! category's destination directory:
//!
//! - **styles**: compile Sass, prefix, pretty-print, minify
//! - **scripts**: resolve includes, transpile, minify
//! - **lib**: copy pre-built vendor files verbatim
//! - **fonts**: copy incrementally (mtime-gated)
//! - **images**: lossless optimization
//! - **markup**: resolve includes into pages
//!
//! A task never panics the pipeline: `run` converts any error into a
//! [`TaskReport`] failure so the orchestrator can log it and keep sibling
//! tasks (and the watch session) alive.

pub mod fonts;
pub mod images;
pub mod include;
pub mod lib;
pub mod markup;
pub mod scripts;
pub mod styles;

use crate::config::ProjectConfig;
use crate::log;
use crate::paths::AssetKind;
use crate::reload::LiveReload;
use std::path::PathBuf;

// ============================================================================
// Task Reports
// ============================================================================

/// What a single task run produced.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Task completed; lists every file written this run.
    Built { artifacts: Vec<PathBuf> },
    /// Task failed; carries the transform's diagnostic.
    Failed { diagnostic: String },
}

/// Result of one task invocation, consumed by the orchestrator.
#[derive(Debug)]
pub struct TaskReport {
    pub kind: AssetKind,
    pub outcome: TaskOutcome,
}

impl TaskReport {
    pub const fn is_failure(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Failed { .. })
    }

    /// Log this report: written-file count on success, diagnostic on failure.
    pub fn log(&self) {
        match &self.outcome {
            TaskOutcome::Built { artifacts } => {
                log!(self.kind.name(); "{} file(s) written", artifacts.len());
            }
            TaskOutcome::Failed { diagnostic } => {
                log!("error"; "{}: {}", self.kind.name(), diagnostic);
            }
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run one category's task, converting errors into a failure report.
///
/// `reload` is the dev-server notifier; `None` outside a serve session.
pub fn run(
    kind: AssetKind,
    config: &ProjectConfig,
    reload: Option<&LiveReload>,
) -> TaskReport {
    let result = match kind {
        AssetKind::Styles => styles::run(config, reload),
        AssetKind::Scripts => scripts::run(config, reload),
        AssetKind::Lib => lib::run(config, reload),
        AssetKind::Fonts => fonts::run(config, reload),
        AssetKind::Images => images::run(config, reload),
        AssetKind::Markup => markup::run(config, reload),
    };

    let outcome = match result {
        Ok(artifacts) => TaskOutcome::Built { artifacts },
        Err(e) => TaskOutcome::Failed {
            diagnostic: format!("{e:#}"),
        },
    };

    let report = TaskReport { kind, outcome };
    report.log();
    report
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Check if destination is up-to-date compared to source.
pub fn is_up_to_date(src: &std::path::Path, dst: &std::path::Path) -> bool {
    let Ok(src_meta) = src.metadata() else {
        return false;
    };
    let Ok(dst_meta) = dst.metadata() else {
        return false;
    };

    let Ok(src_time) = src_meta.modified() else {
        return false;
    };
    let Ok(dst_time) = dst_meta.modified() else {
        return false;
    };

    src_time <= dst_time
}
