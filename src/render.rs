use core::fmt;
use core::str::FromStr;

use image::{ImageBuffer, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::qrcode::{QrCode, QrCodeEcc};

/*---- Options ----*/

/// Largest accepted quiet zone, in modules.
pub const MAX_MARGIN: u32 = 64;

/// Largest accepted target width, in pixels.
pub const MAX_WIDTH: u32 = 8192;

/// An RGBA colour, written and parsed as a hex string.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#RRGGBB`, ignoring alpha.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    fn to_pixel(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize, len: usize| {
            u8::from_str_radix(&hex[i..i + len], 16).map_err(|_| invalid())
        };
        match hex.len() {
            3 => Ok(Color::rgb(
                channel(0, 1)? * 17,
                channel(1, 1)? * 17,
                channel(2, 1)? * 17,
            )),
            6 => Ok(Color::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            8 => Ok(Color {
                r: channel(0, 2)?,
                g: channel(2, 2)?,
                b: channel(4, 2)?,
                a: channel(6, 2)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.a == 255 {
            f.write_str(&self.to_hex())
        } else {
            write!(f, "{}{:02X}", self.to_hex(), self.a)
        }
    }
}

/// How a symbol is turned into pixels.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Target side length in pixels. The raster is the largest whole multiple of the module
    /// count that fits, and never less than one pixel per module.
    pub width: u32,
    /// Quiet zone, in modules.
    pub margin: u32,
    pub dark: Color,
    pub light: Color,
    /// Minimum error correction level; the encoder may raise it.
    pub ecc: QrCodeEcc,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 256,
            margin: 2,
            dark: Color::BLACK,
            light: Color::WHITE,
            ecc: QrCodeEcc::Medium,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(Error::InvalidOptions("width must be at least 1 pixel".into()));
        }
        if self.width > MAX_WIDTH {
            return Err(Error::InvalidOptions(format!(
                "width must be at most {MAX_WIDTH} pixels, got {}",
                self.width
            )));
        }
        if self.margin > MAX_MARGIN {
            return Err(Error::InvalidOptions(format!(
                "margin must be at most {MAX_MARGIN} modules, got {}",
                self.margin
            )));
        }
        Ok(())
    }

    /// The margin actually drawn. Unvalidated options are clamped rather than overflowing.
    fn quiet_zone(&self) -> u32 {
        self.margin.min(MAX_MARGIN)
    }

    /// Modules across the whole image, quiet zone included.
    fn modules_across(&self, qr: &QrCode) -> u32 {
        qr.size() as u32 + 2 * self.quiet_zone()
    }

    fn scale(&self, qr: &QrCode) -> u32 {
        (self.width.min(MAX_WIDTH) / self.modules_across(qr)).max(1)
    }
}

/*---- Rendering ----*/

/// A payload encoded once and rendered to both raster and vector form.
#[derive(Clone, Debug)]
pub struct RenderedQr {
    pub qr: QrCode,
    pub raster: RgbaImage,
    pub svg: String,
}

/// Encodes `payload` and renders it with `options`.
///
/// # Errors
///
/// * [`Error::EmptyPayload`] if the payload is empty or only whitespace.
/// * [`Error::InvalidOptions`] if the options are unusable.
/// * [`Error::DataTooLong`] if the payload exceeds QR capacity.
///
/// # Example
///
/// ```rust
/// use smartqr::render::{render, RenderOptions};
///
/// let rendered = render("tel:01012345678", &RenderOptions::default()).unwrap();
/// assert!(rendered.svg.contains("<svg"));
/// assert_eq!(rendered.raster.width(), rendered.raster.height());
/// ```
pub fn render(payload: &str, options: &RenderOptions) -> Result<RenderedQr> {
    if payload.trim().is_empty() {
        return Err(Error::EmptyPayload);
    }
    options.validate()?;
    let qr = QrCode::encode_text(payload, options.ecc)?;
    tracing::debug!(
        version = qr.version().value(),
        ecc = ?qr.error_correction_level(),
        mask = qr.mask().value(),
        "payload encoded"
    );
    let raster = to_image(&qr, options);
    let svg = to_svg_string(&qr, options);
    Ok(RenderedQr { qr, raster, svg })
}

/// Draws the symbol into an RGBA image, quiet zone included.
pub fn to_image(qr: &QrCode, options: &RenderOptions) -> RgbaImage {
    let scale = options.scale(qr);
    let border = options.quiet_zone() as i32;
    let side = scale * options.modules_across(qr);
    let dark = options.dark.to_pixel();
    let light = options.light.to_pixel();

    ImageBuffer::from_fn(side, side, |x, y| {
        let qr_x = (x / scale) as i32 - border;
        let qr_y = (y / scale) as i32 - border;
        if qr.get_module(qr_x, qr_y) {
            dark
        } else {
            light
        }
    })
}

/// Returns an SVG document depicting the symbol.
///
/// The viewBox is measured in modules; `width`/`height` carry the requested pixel size. The
/// string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(qr: &QrCode, options: &RenderOptions) -> String {
    let border = options.quiet_zone() as i32;
    let dimension = qr.size() + border * 2;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{1}\" height=\"{1}\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension, options.width
    );
    result += &format!(
        "\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"{}/>\n",
        options.light.to_hex(),
        opacity_attr(options.light)
    );
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            if qr.get_module(x, y) {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += &format!(
        "\" fill=\"{}\"{}/>\n",
        options.dark.to_hex(),
        opacity_attr(options.dark)
    );
    result += "</svg>\n";
    result
}

fn opacity_attr(color: Color) -> String {
    if color.a == 255 {
        String::new()
    } else {
        format!(" fill-opacity=\"{:.3}\"", f32::from(color.a) / 255.0)
    }
}

/// Returns the symbol as terminal block art, two characters per module.
pub fn to_terminal_string(qr: &QrCode, border: i32) -> String {
    let mut out = String::new();
    for y in -border..qr.size() + border {
        for x in -border..qr.size() + border {
            let c = if qr.get_module(x, y) { '█' } else { ' ' };
            out.push(c);
            out.push(c);
        }
        out.push('\n');
    }
    out
}
