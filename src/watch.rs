//! File system watcher for live rebuilds.
//!
//! Monitors each asset category's watch root and re-runs only the matching
//! task on change, then lets the task push its own reload notification.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │  │
//! │  │ events   │    │ (300ms)  │    │                        │  │
//! │  └──────────┘    └──────────┘    │  categorize paths,     │  │
//! │                                  │  re-run matching tasks │  │
//! │                                  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rapid edits to one category are batched into a single task run; this is
//! a deliberate departure from pipelines that let watch callbacks overlap.

use crate::{
    config::ProjectConfig,
    log,
    paths::{AssetKind, categorize},
    reload::LiveReload,
    tasks,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative to the source root for log display.
fn rel_path(path: &Path, source: &Path) -> String {
    path.strip_prefix(source)
        .unwrap_or(path)
        .display()
        .to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Re-run every task whose category matches a changed path.
fn handle_changes(paths: &[PathBuf], config: &ProjectConfig, reload: &LiveReload) {
    if paths.is_empty() {
        return;
    }

    let source = &config.build.source;
    let mut affected = FxHashSet::default();

    for path in paths {
        if let Some(kind) = categorize(path, config) {
            if affected.insert(kind) {
                log!("watch"; "{} changed ({})", kind.name(), rel_path(path, source));
            }
        }
    }

    if affected.is_empty() {
        return;
    }

    // Independent categories rebuild concurrently; task failures are
    // logged by the dispatcher and must not end the watch session.
    let affected: Vec<AssetKind> = affected.into_iter().collect();
    affected
        .par_iter()
        .for_each(|&kind| {
            tasks::run(kind, config, Some(reload));
        });
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &ProjectConfig) -> Result<()> {
    // One watch per category. The markup root is the whole source tree, so
    // asset subtree events can arrive twice; the debouncer's path set
    // collapses them before dispatch.
    let mut watched = Vec::new();
    for kind in AssetKind::ALL {
        let root = kind.watch_root(config);
        if !root.exists() {
            continue;
        }
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}: {}", kind.name(), root.display()))?;
        watched.push(kind.name());
    }

    log!("watch"; "watching: {}", watched.join(", "));

    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and live rebuild.
pub fn watch_for_changes_blocking(
    config: &'static ProjectConfig,
    reload: &LiveReload,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), config, reload);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Other cases: irrelevant events, timeout without ready, etc.
            _ => {}
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
