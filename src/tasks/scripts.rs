//! Scripts task: assemble include directives, transpile and minify.
//!
//! Each top-level file under `assets/js` (one level, not recursive) is
//! assembled by splicing its `//= path` includes, optionally piped through
//! an external transpiler command, written as `<stem>.js`, then minified
//! into `<stem>.min.js`. Includes resolve before transpilation so spliced
//! fragments are transpiled together with their host file.
//!
//! Scripts cannot be hot-injected safely, so the dev server gets a full
//! reload notification.

use super::include::resolve_includes;
use crate::config::ProjectConfig;
use crate::paths::{self, AssetKind};
use crate::reload::LiveReload;
use anyhow::{Context, Result, anyhow, bail};
use minify_js::{Session, TopLevelMode};
use std::{
    fs,
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

pub fn run(config: &ProjectConfig, reload: Option<&LiveReload>) -> Result<Vec<PathBuf>> {
    let sources = paths::collect_sources(AssetKind::Scripts, config)?;
    let dest = AssetKind::Scripts.dest(config);

    if !sources.is_empty() {
        fs::create_dir_all(&dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
    }

    let mut artifacts = Vec::new();
    for path in &sources {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Invalid script file name: {}", path.display()))?;

        let assembled = resolve_includes(path)?;
        let code = transpile(&assembled, config)
            .with_context(|| format!("Failed to transpile {}", path.display()))?;

        let out_path = dest.join(format!("{stem}.js"));
        fs::write(&out_path, &code)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;

        let minified = minify_source(&code)
            .with_context(|| format!("Failed to minify {}", path.display()))?;
        let min_path = dest.join(format!("{stem}.min.js"));
        fs::write(&min_path, minified)
            .with_context(|| format!("Failed to write {}", min_path.display()))?;

        artifacts.push(out_path);
        artifacts.push(min_path);
    }

    if let Some(reload) = reload {
        reload.reload();
    }

    Ok(artifacts)
}

/// Pipe assembled source through the configured transpiler command.
///
/// The command contract is stdin in, stdout out, non-zero exit on error.
/// When disabled, the assembled source passes through unchanged.
fn transpile(code: &str, config: &ProjectConfig) -> Result<String> {
    let transpile = &config.build.scripts.transpile;
    if !transpile.enable {
        return Ok(code.to_owned());
    }

    let Some((program, args)) = transpile.command.split_first() else {
        bail!("[build.scripts.transpile.command] is empty");
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn `{program}`"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(code.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        bail!(
            "`{program}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    String::from_utf8(output.stdout).context("Transpiler produced non-UTF8 output")
}

/// Minify and mangle assembled script source.
fn minify_source(code: &str) -> Result<String> {
    let session = Session::new();
    let mut out = Vec::new();
    minify_js::minify(&session, TopLevelMode::Global, code.as_bytes(), &mut out)
        .map_err(|e| anyhow!("{e:?}"))?;

    String::from_utf8(out).context("Minifier produced non-UTF8 output")
}

// ============================================================================
// Tests
// ============================================================================
