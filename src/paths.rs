//! The asset path table: category source globs, watch roots and destinations.
//!
//! Every asset category maps to one or more source glob patterns (what a
//! task reads), a broader watch root (what re-triggers the task during
//! `serve`), and a destination directory under the build output. The table
//! is pure data; tasks and the watcher both consume it.
//!
//! # Categories
//!
//! | Category | Source globs                    | Destination      |
//! |----------|---------------------------------|------------------|
//! | Fonts    | `assets/fonts/**/*.*`           | `assets/fonts/`  |
//! | Images   | `assets/img/**/*.{raster,svg}`  | `assets/img/`    |
//! | Scripts  | `assets/js/*.js` (one level)    | `assets/js/`     |
//! | Lib      | `assets/lib/**/*.{js,css}`      | `assets/lib/`    |
//! | Styles   | `assets/sass/style.scss`        | `assets/css/`    |
//! | Markup   | `*.{htm,html,php}` (one level)  | output root      |

use crate::config::ProjectConfig;
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Stylesheet entry file, relative to the source root. Partials pulled in
/// through `@use`/`@import` are not listed here; the compiler resolves them.
pub const STYLE_ENTRY: &str = "assets/sass/style.scss";

/// One asset category of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AssetKind {
    /// Font files, copied incrementally
    Fonts,
    /// Raster/vector images, optimized losslessly
    Images,
    /// Top-level script files, assembled and minified
    Scripts,
    /// Pre-built vendor files, copied verbatim
    Lib,
    /// Stylesheet entry, compiled and minified
    Styles,
    /// Page files with include directives
    Markup,
}

impl AssetKind {
    /// All categories, in the order the build orchestrator runs them.
    pub const ALL: [Self; 6] = [
        Self::Styles,
        Self::Scripts,
        Self::Images,
        Self::Fonts,
        Self::Markup,
        Self::Lib,
    ];

    /// Get the short name for this category (used in logs)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fonts => "fonts",
            Self::Images => "images",
            Self::Scripts => "scripts",
            Self::Lib => "lib",
            Self::Styles => "styles",
            Self::Markup => "markup",
        }
    }

    /// Source glob patterns, relative to the source root.
    ///
    /// `glob` has no brace expansion, so extension sets are spelled out as
    /// one pattern per extension.
    pub const fn source_globs(self) -> &'static [&'static str] {
        match self {
            Self::Fonts => &["assets/fonts/**/*.*"],
            Self::Images => &[
                "assets/img/**/*.jpg",
                "assets/img/**/*.jpeg",
                "assets/img/**/*.png",
                "assets/img/**/*.svg",
                "assets/img/**/*.ico",
            ],
            Self::Scripts => &["assets/js/*.js"],
            Self::Lib => &["assets/lib/**/*.js", "assets/lib/**/*.css"],
            Self::Styles => &["assets/sass/style.scss"],
            Self::Markup => &["*.htm", "*.html", "*.php"],
        }
    }

    /// Directory watched for this category during `serve`.
    ///
    /// Watch roots are broader than source globs: scripts watch the whole
    /// `assets/js` tree so edits to included fragments re-trigger the task,
    /// and styles watch every stylesheet source, not just the entry file.
    pub fn watch_root(self, config: &ProjectConfig) -> PathBuf {
        let source = &config.build.source;
        match self {
            Self::Fonts => source.join("assets/fonts"),
            Self::Images => source.join("assets/img"),
            Self::Scripts => source.join("assets/js"),
            Self::Lib => source.join("assets/lib"),
            Self::Styles => source.join("assets/sass"),
            Self::Markup => source.clone(),
        }
    }

    /// Base directory relative paths are computed from when mapping a
    /// source file to its destination.
    pub fn source_base(self, config: &ProjectConfig) -> PathBuf {
        match self {
            Self::Markup => config.build.source.clone(),
            _ => self.watch_root(config),
        }
    }

    /// Destination directory under the build output.
    pub fn dest(self, config: &ProjectConfig) -> PathBuf {
        let output = &config.build.output;
        match self {
            Self::Fonts => output.join("assets/fonts"),
            Self::Images => output.join("assets/img"),
            Self::Scripts => output.join("assets/js"),
            Self::Lib => output.join("assets/lib"),
            Self::Styles => output.join("assets/css"),
            Self::Markup => output.clone(),
        }
    }
}

/// Resolve a category's source globs into a sorted file list.
pub fn collect_sources(kind: AssetKind, config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    let source = &config.build.source;
    let mut files = Vec::new();

    for pattern in kind.source_globs() {
        let full = source.join(pattern);
        let full = full
            .to_str()
            .with_context(|| format!("Non-UTF8 source path: {}", full.display()))?
            .to_owned();

        for entry in glob::glob(&full)
            .with_context(|| format!("Invalid glob pattern: {full}"))?
        {
            let path = entry.context("Failed to read glob entry")?;
            if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Categorize a changed path to decide which task the watcher re-runs.
///
/// More specific asset subtrees win over the markup fallback; files at the
/// source root only count as markup when they carry a page extension.
pub fn categorize(path: &Path, config: &ProjectConfig) -> Option<AssetKind> {
    let source = &config.build.source;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    if path.starts_with(source.join("assets/sass")) {
        return Some(AssetKind::Styles);
    }
    if path.starts_with(source.join("assets/js")) {
        return (ext == "js").then_some(AssetKind::Scripts);
    }
    if path.starts_with(source.join("assets/fonts")) {
        return Some(AssetKind::Fonts);
    }
    if path.starts_with(source.join("assets/img")) {
        return Some(AssetKind::Images);
    }
    if path.starts_with(source.join("assets/lib")) {
        return matches!(ext, "js" | "css").then_some(AssetKind::Lib);
    }
    if path.starts_with(source) && matches!(ext, "htm" | "html" | "php") {
        return Some(AssetKind::Markup);
    }

    None
}

// ============================================================================
// Tests
// ============================================================================
