//! Writing rendered symbols to PNG and SVG files.
use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// File names used when an export flag is given without a path.
pub const DEFAULT_PNG_NAME: &str = "qrcode.png";
pub const DEFAULT_SVG_NAME: &str = "qrcode.svg";

/// Saves `image` as a PNG file, creating parent directories as needed.
///
/// # Example
///
/// ```rust,no_run
/// use smartqr::render::{render, RenderOptions};
/// use smartqr::export::save_png;
///
/// let rendered = render("https://naver.com", &RenderOptions::default()).unwrap();
/// save_png(&rendered.raster, "output/naver.png").unwrap();
/// ```
pub fn save_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyPayload);
    }
    ensure_parent(path)?;
    image.save_with_format(path, ImageFormat::Png)?;
    tracing::info!(path = %path.display(), "PNG saved");
    Ok(())
}

/// Saves an SVG document, creating parent directories as needed.
pub fn save_svg(svg: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if svg.is_empty() {
        return Err(Error::EmptyPayload);
    }
    ensure_parent(path)?;
    fs::write(path, svg).map_err(|e| Error::io(path, e))?;
    tracing::info!(path = %path.display(), "SVG saved");
    Ok(())
}

/// Encodes `image` as PNG into memory.
pub fn png_bytes(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
        }
        _ => Ok(()),
    }
}
