//! Fonts task: incremental copy of the font tree.
//!
//! The one category with run-to-run memory: a font is copied only when the
//! destination is missing or older than the source. The "last run" record
//! is the destination file's own mtime on disk, so it survives process
//! restarts.

use super::is_up_to_date;
use crate::config::ProjectConfig;
use crate::paths::{self, AssetKind};
use crate::reload::LiveReload;
use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

pub fn run(config: &ProjectConfig, reload: Option<&LiveReload>) -> Result<Vec<PathBuf>> {
    let sources = paths::collect_sources(AssetKind::Fonts, config)?;
    let base = AssetKind::Fonts.source_base(config);
    let dest = AssetKind::Fonts.dest(config);

    let mut artifacts = Vec::new();
    for path in &sources {
        let rel = path
            .strip_prefix(&base)
            .with_context(|| format!("Font outside source tree: {}", path.display()))?;
        let out_path = dest.join(rel);

        if is_up_to_date(path, &out_path) {
            continue;
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::Path, thread, time::Duration};
    use tempfile::TempDir;

    fn config_with_root(root: &Path) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.build.source = root.join("src");
        config.build.output = root.join("build");
        config
    }

    fn fonts_dir(root: &Path) -> PathBuf {
        let dir = root.join("src/assets/fonts");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_copies_tree_preserving_structure() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        let fonts = fonts_dir(tmp.path());
        fs::create_dir_all(fonts.join("mono")).unwrap();
        fs::write(fonts.join("sans.woff2"), "sans").unwrap();
        fs::write(fonts.join("mono/code.ttf"), "mono").unwrap();

        let artifacts = run(&config, None).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert!(tmp.path().join("build/assets/fonts/sans.woff2").is_file());
        assert!(tmp.path().join("build/assets/fonts/mono/code.ttf").is_file());
    }

    #[test]
    fn test_unchanged_font_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        let fonts = fonts_dir(tmp.path());
        fs::write(fonts.join("sans.woff2"), "sans").unwrap();

        run(&config, None).unwrap();
        // Second invocation finds everything up-to-date
        let artifacts = run(&config, None).unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_modified_font_recopied() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        let fonts = fonts_dir(tmp.path());
        fs::write(fonts.join("sans.woff2"), "v1").unwrap();

        run(&config, None).unwrap();

        thread::sleep(Duration::from_millis(20));
        fs::write(fonts.join("sans.woff2"), "v2").unwrap();

        let artifacts = run(&config, None).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("build/assets/fonts/sans.woff2")).unwrap(),
            "v2"
        );
    }

    #[test]
    fn test_new_font_copied_on_next_run() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        let fonts = fonts_dir(tmp.path());
        fs::write(fonts.join("sans.woff2"), "sans").unwrap();

        run(&config, None).unwrap();

        fs::write(fonts.join("serif.woff2"), "serif").unwrap();
        let artifacts = run(&config, None).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].ends_with("serif.woff2"));
    }
}
