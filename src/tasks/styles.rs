//! Styles task: compile the Sass entry, prefix, pretty-print and minify.
//!
//! Chain: `grass` compiles `assets/sass/style.scss` to plain CSS, then
//! `lightningcss` applies vendor prefixes for the configured browser range
//! and prints two artifacts side by side: a pretty `style.css` and a
//! single-line `style.min.css` with all comments dropped. `z-index` values
//! pass through untouched; no rebasing is performed.
//!
//! A compile error aborts the task before any write, so a previous valid
//! `style.min.css` on disk survives a broken edit during watch.

use crate::config::ProjectConfig;
use crate::paths::{AssetKind, STYLE_ENTRY};
use crate::reload::LiveReload;
use anyhow::{Context, Result, anyhow};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::{fs, path::PathBuf};

/// Stylesheet path the dev server injects on change, relative to the
/// output root.
const INJECT_PATH: &str = "assets/css/style.min.css";

pub fn run(config: &ProjectConfig, reload: Option<&LiveReload>) -> Result<Vec<PathBuf>> {
    let entry = config.build.source.join(STYLE_ENTRY);
    let dest = AssetKind::Styles.dest(config);

    let css = compile_sass(&entry, config)?;
    let targets = browser_targets(&config.build.browsers)?;

    let mut sheet = StyleSheet::parse(&css, ParserOptions::default())
        .map_err(|e| anyhow!("Failed to parse compiled stylesheet: {e}"))?;
    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("Failed to transform stylesheet: {e}"))?;

    fs::create_dir_all(&dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    // Unminified artifact first; a later minify failure must not take the
    // readable one down with it.
    let pretty = sheet
        .to_css(PrinterOptions {
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("Failed to print stylesheet: {e}"))?
        .code;
    let css_path = dest.join("style.css");
    fs::write(&css_path, pretty)
        .with_context(|| format!("Failed to write {}", css_path.display()))?;

    let minified = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("Failed to print minified stylesheet: {e}"))?
        .code;
    let min_path = dest.join("style.min.css");
    fs::write(&min_path, strip_comment_markers(&minified))
        .with_context(|| format!("Failed to write {}", min_path.display()))?;

    if let Some(reload) = reload {
        reload.inject_css(INJECT_PATH);
    }

    Ok(vec![css_path, min_path])
}

/// Compile the Sass entry file to expanded CSS.
///
/// The compiler's own error already carries the file/line context, so it
/// is surfaced verbatim.
fn compile_sass(entry: &std::path::Path, config: &ProjectConfig) -> Result<String> {
    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    for path in &config.build.load_paths {
        options = options.load_path(path);
    }

    grass::from_path(entry, &options).map_err(|e| anyhow!("{e}"))
}

/// Resolve a browserslist expression into prefixer targets.
fn browser_targets(browsers: &str) -> Result<Targets> {
    let browsers = Browsers::from_browserslist([browsers])
        .map_err(|e| anyhow!("Invalid [build.browsers] expression: {e}"))?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Drop residual `/*! ... */` markers from minified output.
fn strip_comment_markers(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;

    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_with_root(root: &Path) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.build.source = root.join("src");
        config.build.output = root.join("build");
        config.build.load_paths = vec![];
        config
    }

    fn write_entry(root: &Path, scss: &str) {
        let sass = root.join("src/assets/sass");
        fs::create_dir_all(&sass).unwrap();
        fs::write(sass.join("style.scss"), scss).unwrap();
    }

    #[test]
    fn test_run_produces_both_artifacts() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        write_entry(tmp.path(), ".btn { color: red; }\n");

        let artifacts = run(&config, None).unwrap();

        assert_eq!(artifacts.len(), 2);
        let pretty = fs::read_to_string(tmp.path().join("build/assets/css/style.css")).unwrap();
        let min = fs::read_to_string(tmp.path().join("build/assets/css/style.min.css")).unwrap();

        assert!(pretty.contains(".btn"));
        assert!(pretty.contains('\n'));
        // Single line, comment free, equivalent selector
        assert_eq!(min.trim_end().lines().count(), 1);
        assert!(min.contains(".btn"));
        assert!(min.contains("red"));
        assert!(!min.contains("/*"));
    }

    #[test]
    fn test_run_resolves_sass_nesting() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        write_entry(tmp.path(), ".nav { a { color: blue; } }\n");

        run(&config, None).unwrap();

        let min = fs::read_to_string(tmp.path().join("build/assets/css/style.min.css")).unwrap();
        assert!(min.contains(".nav a"));
    }

    #[test]
    fn test_z_index_survives_minification() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        write_entry(tmp.path(), ".modal { z-index: 9999; }\n");

        run(&config, None).unwrap();

        let min = fs::read_to_string(tmp.path().join("build/assets/css/style.min.css")).unwrap();
        assert!(min.contains("z-index:9999"));
    }

    #[test]
    fn test_compile_error_leaves_previous_min_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());

        write_entry(tmp.path(), ".ok { color: green; }\n");
        run(&config, None).unwrap();
        let min_path = tmp.path().join("build/assets/css/style.min.css");
        let before = fs::read_to_string(&min_path).unwrap();

        // Break the source; the task must fail without writing anything.
        write_entry(tmp.path(), ".broken { color: ;\n");
        let err = run(&config, None);
        assert!(err.is_err());

        let after = fs::read_to_string(&min_path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_compile_error_reports_location() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        write_entry(tmp.path(), ".broken {\n  color: ;\n}\n");

        let err = run(&config, None).unwrap_err();
        // grass includes the entry file name in its diagnostic
        assert!(format!("{err:#}").contains("style.scss"));
    }

    #[test]
    fn test_missing_entry_fails() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());

        assert!(run(&config, None).is_err());
    }

    #[test]
    fn test_strip_comment_markers() {
        assert_eq!(
            strip_comment_markers("a{color:red}/*! keep */b{top:0}"),
            "a{color:red}b{top:0}"
        );
        assert_eq!(strip_comment_markers("/* only */"), "");
        assert_eq!(strip_comment_markers("a{color:red}"), "a{color:red}");
        // Unterminated marker is dropped to the end
        assert_eq!(strip_comment_markers("a{}/*! oops"), "a{}");
    }

    #[test]
    fn test_idempotent_output() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        write_entry(tmp.path(), ".card { margin: 0 auto; }\n");

        run(&config, None).unwrap();
        let first = fs::read(tmp.path().join("build/assets/css/style.min.css")).unwrap();
        run(&config, None).unwrap();
        let second = fs::read(tmp.path().join("build/assets/css/style.min.css")).unwrap();

        assert_eq!(first, second);
    }
}
