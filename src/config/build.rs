//! `[build]` section configuration.
//!
//! Contains build settings: source/output paths, the browser support range
//! for vendor prefixing, image optimization effort and script transpilation.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in kiln.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "src"           # Source directory
/// output = "build"         # Output directory
/// browsers = "> 0%"        # Vendor prefix support range
/// image_effort = 3
///
/// [build.scripts.transpile]
/// enable = true
/// command = ["esbuild", "--target=es2015"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root", skip_serializing_if = "Option::is_none")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Asset source directory.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Browserslist expression the stylesheet prefixer targets.
    #[serde(default = "defaults::build::browsers")]
    #[educe(Default = defaults::build::browsers())]
    pub browsers: String,

    /// Lossless image optimization effort level (0-6, higher is slower).
    #[serde(default = "defaults::build::image_effort")]
    #[educe(Default = defaults::build::image_effort())]
    pub image_effort: u8,

    /// Extra import search paths for the stylesheet compiler.
    #[serde(default = "defaults::build::load_paths")]
    #[educe(Default = defaults::build::load_paths())]
    pub load_paths: Vec<PathBuf>,

    /// Script task settings.
    #[serde(default)]
    pub scripts: ScriptsConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.scripts]` section - script assembly settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptsConfig {
    /// External transpiler integration.
    #[serde(default)]
    pub transpile: TranspileConfig,
}

/// `[build.scripts.transpile]` section - external transpiler command.
///
/// The command receives assembled source on stdin and must write the
/// transpiled result to stdout. Disabled by default so a build does not
/// require a foreign toolchain.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct TranspileConfig {
    /// Run the transpiler as part of the scripts task.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Transpiler command line (program + arguments).
    #[serde(default = "defaults::build::transpile::command")]
    #[educe(Default = defaults::build::transpile::command())]
    pub command: Vec<String>,
}
