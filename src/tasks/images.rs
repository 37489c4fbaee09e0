//! Images task: lossless/near-lossless optimization.
//!
//! PNG files are re-encoded at the configured effort level, JPEG files are
//! re-encoded near-lossless, SVG files are re-serialized through `usvg`
//! with the `viewBox` attribute preserved, and ICO files pass through
//! untouched. An optimized artifact is only kept when it is not larger
//! than the source; otherwise the source bytes are written as-is.

use crate::config::ProjectConfig;
use crate::paths::{self, AssetKind};
use crate::reload::LiveReload;
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use std::{fs, path::PathBuf};

/// JPEG re-encode quality. High enough to stay visually lossless.
const JPEG_QUALITY: u8 = 90;

pub fn run(config: &ProjectConfig, reload: Option<&LiveReload>) -> Result<Vec<PathBuf>> {
    let sources = paths::collect_sources(AssetKind::Images, config)?;
    let base = AssetKind::Images.source_base(config);
    let dest = AssetKind::Images.dest(config);

    let mut artifacts = Vec::new();
    for path in &sources {
        let rel = path
            .strip_prefix(&base)
            .with_context(|| format!("Image outside source tree: {}", path.display()))?;
        let out_path = dest.join(rel);

        let data = fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let optimized = optimize(&data, path, config)
            .with_context(|| format!("Failed to optimize {}", path.display()))?;

        // Never trade a smaller source for a larger "optimized" artifact
        let output = match optimized {
            Some(bytes) if bytes.len() <= data.len() => bytes,
            _ => data,
        };

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&out_path, output)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        artifacts.push(out_path);
    }

    if let Some(reload) = reload {
        if !artifacts.is_empty() {
            reload.reload();
        }
    }

    Ok(artifacts)
}

/// Optimize one image by extension. `None` means copy verbatim.
fn optimize(
    data: &[u8],
    path: &std::path::Path,
    config: &ProjectConfig,
) -> Result<Option<Vec<u8>>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" => optimize_png(data, config.build.image_effort).map(Some),
        "jpg" | "jpeg" => recompress_jpeg(data).map(Some),
        "svg" => optimize_svg(data).map(Some),
        // ICO containers carry multiple pre-sized frames; leave them alone
        _ => Ok(None),
    }
}

/// Re-encode a PNG losslessly at the given effort level.
fn optimize_png(data: &[u8], effort: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data).context("Failed to decode PNG")?;

    let compression = match effort {
        0 | 1 => CompressionType::Fast,
        2 => CompressionType::Default,
        _ => CompressionType::Best,
    };

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive);
    encoder
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .context("Failed to encode PNG")?;
    Ok(out)
}

/// Re-encode a JPEG near-lossless.
fn recompress_jpeg(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data).context("Failed to decode JPEG")?;
    let rgb = img.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode_image(&rgb).context("Failed to encode JPEG")?;
    Ok(out)
}

/// Re-serialize an SVG without indentation, keeping `viewBox` intact.
fn optimize_svg(data: &[u8]) -> Result<Vec<u8>> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(data, &options).context("Failed to parse SVG")?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };

    Ok(tree.to_string(&write_options).into_bytes())
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
        config
    }

    fn img_dir(root: &Path) -> PathBuf {
        let dir = root.join("src/assets/img");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// A tiny valid PNG produced by the `image` crate itself.
    fn sample_png() -> Vec<u8> {
        let img = image::RgbaImage::from_fn(16, 16, |x, y| {
            image::Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        });
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageOutputFormat::Png)
            .unwrap();
        out
    }

    const SAMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">
    <rect x="1" y="1" width="8" height="8" fill="#f00"/>
</svg>"##;

    #[test]
    fn test_png_written_and_decodable() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        fs::write(img_dir(tmp.path()).join("dot.png"), sample_png()).unwrap();

        run(&config, None).unwrap();

        let out = fs::read(tmp.path().join("build/assets/img/dot.png")).unwrap();
        assert!(image::load_from_memory(&out).is_ok());
    }

    #[test]
    fn test_svg_keeps_viewbox() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        fs::write(img_dir(tmp.path()).join("icon.svg"), SAMPLE_SVG).unwrap();

        run(&config, None).unwrap();

        let out =
            fs::read_to_string(tmp.path().join("build/assets/img/icon.svg")).unwrap();
        assert!(out.contains("viewBox"));
    }

    #[test]
    fn test_ico_copied_verbatim() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        // Content is irrelevant; ICO passes through without decoding
        fs::write(img_dir(tmp.path()).join("favicon.ico"), b"\x00\x00\x01\x00").unwrap();

        run(&config, None).unwrap();

        let out = fs::read(tmp.path().join("build/assets/img/favicon.ico")).unwrap();
        assert_eq!(out, b"\x00\x00\x01\x00");
    }

    #[test]
    fn test_output_never_larger_than_source() {
        // A PNG that is already tiny: re-encoding must not inflate it
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        let src = sample_png();
        fs::write(img_dir(tmp.path()).join("dot.png"), &src).unwrap();

        run(&config, None).unwrap();

        let out = fs::read(tmp.path().join("build/assets/img/dot.png")).unwrap();
        assert!(out.len() <= src.len());
    }

    #[test]
    fn test_nested_structure_preserved() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        let nested = img_dir(tmp.path()).join("icons");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("icon.svg"), SAMPLE_SVG).unwrap();

        run(&config, None).unwrap();

        assert!(tmp.path().join("build/assets/img/icons/icon.svg").is_file());
    }

    #[test]
    fn test_corrupt_image_fails_task() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_root(tmp.path());
        fs::write(img_dir(tmp.path()).join("broken.png"), b"not a png").unwrap();

        assert!(run(&config, None).is_err());
    }
}
