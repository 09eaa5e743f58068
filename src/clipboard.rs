//! Copying a rendered symbol or its payload to the system clipboard.
//!
//! Clipboard access is unavailable in SSH sessions and headless environments, so every call
//! returns a [`Result`] and the caller decides what to tell the user.
use std::borrow::Cow;

use image::RgbaImage;

use crate::error::{Error, Result};

/// Somewhere text and images can be copied to.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;

    /// Copies raw RGBA pixels, row-major, 4 bytes per pixel.
    fn set_image(&mut self, width: usize, height: usize, rgba: &[u8]) -> Result<()>;
}

/// The operating-system clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text)
            .map_err(|e| Error::Clipboard(e.to_string()))
    }

    fn set_image(&mut self, width: usize, height: usize, rgba: &[u8]) -> Result<()> {
        let image = arboard::ImageData {
            width,
            height,
            bytes: Cow::Borrowed(rgba),
        };
        self.inner
            .set_image(image)
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}

/// Copies the rendered symbol as an image.
pub fn copy_image(sink: &mut dyn ClipboardSink, image: &RgbaImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyPayload);
    }
    sink.set_image(image.width() as usize, image.height() as usize, image.as_raw())?;
    tracing::info!(width = image.width(), "QR image copied to clipboard");
    Ok(())
}

/// Copies `text`, typically the encoded payload.
pub fn copy_text(sink: &mut dyn ClipboardSink, text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(Error::EmptyPayload);
    }
    sink.set_text(text)?;
    tracing::info!(chars = text.chars().count(), "payload copied to clipboard");
    Ok(())
}

/// Records what was copied; for tests and dry runs.
#[derive(Default, Debug)]
pub struct MemoryClipboard {
    pub text: Option<String>,
    pub image: Option<(usize, usize, Vec<u8>)>,
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.text = Some(text.to_string());
        Ok(())
    }

    fn set_image(&mut self, width: usize, height: usize, rgba: &[u8]) -> Result<()> {
        self.image = Some((width, height, rgba.to_vec()));
        Ok(())
    }
}
