//! Inline include directive resolution.
//!
//! Scripts and markup may splice other files in by relative reference:
//!
//! ```text
//! //= partials/util.js          (script form)
//! <!--= partials/header.html --> (markup form)
//! ```
//!
//! A directive line is replaced by the referenced file's content, resolved
//! relative to the file containing the directive. Resolution is recursive;
//! includes may include further files. A file including itself (directly
//! or through a chain) is an error.

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

fn script_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*//=\s*(.+?)\s*$").unwrap())
}

fn markup_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*<!--=\s*(.+?)\s*-->\s*$").unwrap())
}

/// Read a file and resolve all include directives recursively.
pub fn resolve_includes(path: &Path) -> Result<String> {
    let mut stack = Vec::new();
    resolve_file(path, &mut stack)
}

/// Extract the referenced path from a directive line, if the line is one.
fn directive_target(line: &str) -> Option<&str> {
    if let Some(caps) = markup_directive().captures(line) {
        return caps.get(1).map(|m| m.as_str());
    }
    if let Some(caps) = script_directive().captures(line) {
        return caps.get(1).map(|m| m.as_str());
    }
    None
}

fn resolve_file(path: &Path, stack: &mut Vec<PathBuf>) -> Result<String> {
    if stack.iter().any(|p| p == path) {
        bail!("Circular include: {}", path.display());
    }
    stack.push(path.to_path_buf());

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let base = path.parent().unwrap_or(Path::new(""));

    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        match directive_target(line) {
            Some(target) => {
                let included = base.join(target);
                let resolved = resolve_file(&included, stack).with_context(|| {
                    format!("Failed to include `{target}` from {}", path.display())
                })?;
                out.push_str(&resolved);
                // Spliced content keeps its own trailing newline handling;
                // make sure the next source line starts fresh.
                if !resolved.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    stack.pop();
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directive_target_forms() {
        assert_eq!(directive_target("//= util.js"), Some("util.js"));
        assert_eq!(directive_target("  //=   sub/a.js  "), Some("sub/a.js"));
        assert_eq!(
            directive_target("<!--= partials/head.html -->"),
            Some("partials/head.html")
        );
        assert_eq!(directive_target("var x = 1; //= not a directive"), None);
        assert_eq!(directive_target("// plain comment"), None);
        assert_eq!(directive_target("<!-- plain comment -->"), None);
    }

    #[test]
    fn test_resolve_includes_in_reference_order() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.js");
        fs::write(tmp.path().join("first.js"), "var first = 1;\n").unwrap();
        fs::write(tmp.path().join("second.js"), "var second = 2;\n").unwrap();
        fs::write(&main, "//= first.js\n//= second.js\nvar tail = 3;\n").unwrap();

        let result = resolve_includes(&main).unwrap();

        let first = result.find("var first").unwrap();
        let second = result.find("var second").unwrap();
        let tail = result.find("var tail").unwrap();
        assert!(first < second && second < tail);
    }

    #[test]
    fn test_resolve_includes_nested() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("parts")).unwrap();
        fs::write(tmp.path().join("parts/inner.js"), "var inner = 1;\n").unwrap();
        // The nested directive resolves relative to outer.js, not main.js
        fs::write(tmp.path().join("parts/outer.js"), "//= inner.js\n").unwrap();
        let main = tmp.path().join("main.js");
        fs::write(&main, "//= parts/outer.js\n").unwrap();

        let result = resolve_includes(&main).unwrap();
        assert!(result.contains("var inner = 1;"));
    }

    #[test]
    fn test_resolve_includes_markup_form() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("header.html"), "<header>hi</header>\n").unwrap();
        let page = tmp.path().join("index.html");
        fs::write(&page, "<!--= header.html -->\n<main></main>\n").unwrap();

        let result = resolve_includes(&page).unwrap();
        assert!(result.contains("<header>hi</header>"));
        assert!(result.contains("<main></main>"));
        assert!(!result.contains("<!--="));
    }

    #[test]
    fn test_resolve_includes_missing_file() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.js");
        fs::write(&main, "//= nope.js\n").unwrap();

        let err = resolve_includes(&main).unwrap_err();
        assert!(format!("{err:#}").contains("nope.js"));
    }

    #[test]
    fn test_resolve_includes_circular() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.js");
        let b = tmp.path().join("b.js");
        fs::write(&a, "//= b.js\n").unwrap();
        fs::write(&b, "//= a.js\n").unwrap();

        let err = resolve_includes(&a).unwrap_err();
        assert!(format!("{err:#}").contains("Circular include"));
    }

    #[test]
    fn test_resolve_includes_plain_file_unchanged() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.js");
        fs::write(&main, "var a = 1;\nvar b = 2;\n").unwrap();

        let result = resolve_includes(&main).unwrap();
        assert_eq!(result, "var a = 1;\nvar b = 2;\n");
    }
}
