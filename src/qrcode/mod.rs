#![forbid(unsafe_code)]
//! QR code encoding.
//!
//! Encodes text or binary data into QR Code Model 2 symbols: versions 1 to 40, four error
//! correction levels, numeric/alphanumeric/byte/ECI segments and automatic mask selection.
//! Symbols own their module grid and are immutable once built.
mod ecc;
#[cfg(test)]
mod reader;
mod segment;

pub use segment::{BitBuffer, QrSegment, QrSegmentMode, ALPHANUMERIC_CHARSET, UTF8_ECI};

use serde::{Deserialize, Serialize};

use ecc::{add_ecc_and_interleave, num_data_codewords};

/// A QR Code symbol, a square grid of dark and light modules.
///
/// # Example
///
/// ```rust
/// use smartqr::qrcode::{QrCode, QrCodeEcc};
///
/// let qr = QrCode::encode_text("Hello, World!", QrCodeEcc::Low).unwrap();
/// assert_eq!(qr.size(), 21);
/// assert!(qr.get_module(0, 0));
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    /// Side length in modules, `version * 4 + 17`.
    size: i32,
    errorcorrectionlevel: QrCodeEcc,
    mask: Mask,
    /// Row-major module colours, `true` for dark.
    modules: Vec<bool>,
}

impl QrCode {
    /// Encodes a text string at the given error correction level.
    ///
    /// The most compact single segment mode is chosen, the smallest version that holds the data
    /// is used and the error correction level is raised as long as the version does not grow.
    /// Non-ASCII text is marked as UTF-8 with an ECI segment.
    ///
    /// # Errors
    ///
    /// Returns [`DataTooLong`] if the text does not fit in a version 40 symbol.
    pub fn encode_text(text: &str, ecl: QrCodeEcc) -> Result<Self, DataTooLong> {
        let segs = QrSegment::make_segments(text);
        QrCode::encode_segments(&segs, ecl)
    }

    /// Encodes arbitrary bytes in a single byte-mode segment.
    pub fn encode_binary(data: &[u8], ecl: QrCodeEcc) -> Result<Self, DataTooLong> {
        let segs = [QrSegment::make_bytes(data)];
        QrCode::encode_segments(&segs, ecl)
    }

    /// Encodes segments with the full version range, automatic mask and ECC boosting.
    pub fn encode_segments(segs: &[QrSegment], ecl: QrCodeEcc) -> Result<Self, DataTooLong> {
        QrCode::encode_segments_advanced(segs, ecl, Version::MIN, Version::MAX, None, true)
    }

    /// Encodes segments with explicit control over the version range and mask.
    ///
    /// # Arguments
    ///
    /// * `segs` - Segments to concatenate.
    /// * `ecl` - Minimum error correction level.
    /// * `minversion` / `maxversion` - Inclusive range of versions to try, smallest first.
    /// * `mask` - Fixed mask, or `None` to pick the one with the lowest penalty score.
    /// * `boostecl` - Raise `ecl` when the chosen version has room for it.
    ///
    /// # Panics
    ///
    /// Panics if `minversion > maxversion`.
    pub fn encode_segments_advanced(
        segs: &[QrSegment],
        mut ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool,
    ) -> Result<Self, DataTooLong> {
        assert!(minversion <= maxversion, "Invalid value");

        let mut version = minversion;
        let datausedbits: usize = loop {
            let datacapacitybits = num_data_codewords(version, ecl) * 8;
            let dataused = QrSegment::get_total_bits(segs, version);
            match dataused {
                Some(n) if n <= datacapacitybits => break n,
                _ if version >= maxversion => {
                    return Err(match dataused {
                        None => DataTooLong::SegmentTooLong,
                        Some(n) => DataTooLong::DataOverCapacity(n, datacapacitybits),
                    });
                }
                _ => version = Version::new(version.value() + 1),
            }
        };

        for newecl in [QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            if boostecl && datausedbits <= num_data_codewords(version, newecl) * 8 {
                ecl = newecl;
            }
        }

        let datacapacitybits = num_data_codewords(version, ecl) * 8;
        let mut bb = BitBuffer(Vec::with_capacity(datacapacitybits));
        for seg in segs {
            bb.append_bits(seg.mode().mode_bits(), 4);
            bb.append_bits(seg.num_chars() as u32, seg.mode().num_char_count_bits(version));
            bb.0.extend_from_slice(seg.data());
        }
        debug_assert_eq!(bb.len(), datausedbits);

        // Terminator, then zero bits up to a byte boundary.
        let numzerobits = core::cmp::min(4, datacapacitybits - bb.len());
        bb.append_bits(0, numzerobits as u8);
        let numzerobits = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);
        debug_assert_eq!(bb.len() % 8, 0);

        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.len() >= datacapacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }

        let mut datacodewords = vec![0u8; bb.len() / 8];
        for (i, &bit) in bb.0.iter().enumerate() {
            datacodewords[i >> 3] |= u8::from(bit) << (7 - (i & 7));
        }

        tracing::debug!(
            version = version.value(),
            ecl = ?ecl,
            bits = datausedbits,
            "encoding QR symbol"
        );
        Ok(QrCode::encode_codewords(version, ecl, &datacodewords, mask))
    }

    /// Builds a symbol from already padded data codewords.
    ///
    /// This is a low-level API; most callers want [`encode_segments_advanced`](Self::encode_segments_advanced).
    pub fn encode_codewords(
        version: Version,
        ecl: QrCodeEcc,
        datacodewords: &[u8],
        mask: Option<Mask>,
    ) -> Self {
        let mut canvas = Canvas::new(version);
        canvas.draw_function_patterns(version);
        let allcodewords = add_ecc_and_interleave(datacodewords, version, ecl);
        canvas.draw_codewords(&allcodewords);

        let mask = mask.unwrap_or_else(|| {
            let mut best = Mask::new(0);
            let mut minpenalty = i32::MAX;
            for i in 0u8..8 {
                let candidate = Mask::new(i);
                canvas.apply_mask(candidate);
                canvas.draw_format_bits(ecl, candidate);
                let penalty = canvas.penalty_score();
                if penalty < minpenalty {
                    best = candidate;
                    minpenalty = penalty;
                }
                // XOR again to undo.
                canvas.apply_mask(candidate);
            }
            best
        });
        canvas.apply_mask(mask);
        canvas.draw_format_bits(ecl, mask);

        Self {
            version,
            size: canvas.size,
            errorcorrectionlevel: ecl,
            mask,
            modules: canvas.modules,
        }
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size, in the range [21, 177].
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Returns the error correction level actually used, which may be above the requested one.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.errorcorrectionlevel
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the colour of the module at (x, y): `true` for dark.
    ///
    /// Coordinates outside the symbol are light, so callers can draw a quiet zone by iterating
    /// past the edges.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        (0..self.size).contains(&x)
            && (0..self.size).contains(&y)
            && self.modules[(y * self.size + x) as usize]
    }
}

/// Module grid under construction, tracking which modules belong to function patterns.
struct Canvas {
    size: i32,
    modules: Vec<bool>,
    isfunction: Vec<bool>,
}

impl Canvas {
    fn new(version: Version) -> Self {
        let size = i32::from(version.value()) * 4 + 17;
        let len = (size * size) as usize;
        Self {
            size,
            modules: vec![false; len],
            isfunction: vec![false; len],
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.size + x) as usize
    }

    fn module(&self, x: i32, y: i32) -> bool {
        self.modules[self.index(x, y)]
    }

    fn set_function_module(&mut self, x: i32, y: i32, isdark: bool) {
        let i = self.index(x, y);
        self.modules[i] = isdark;
        self.isfunction[i] = true;
    }

    fn draw_function_patterns(&mut self, version: Version) {
        let size = self.size;
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Alignment patterns everywhere except the three finder corners.
        let positions = alignment_pattern_positions(version);
        let last = positions.len().saturating_sub(1);
        for (i, &x) in positions.iter().enumerate() {
            for (j, &y) in positions.iter().enumerate() {
                let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !corner {
                    self.draw_alignment_pattern(x, y);
                }
            }
        }

        // Reserve the format areas; real bits are drawn once the mask is known.
        self.draw_format_bits(QrCodeEcc::Low, Mask::new(0));
        self.draw_version(version);
    }

    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4..=4 {
            for dx in -4..=4 {
                let (xx, yy) = (x + dx, y + dy);
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let dist = dx.abs().max(dy.abs());
                    self.set_function_module(xx, yy, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2..=2 {
            for dx in -2..=2 {
                self.set_function_module(x + dx, y + dy, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits: u32 = {
            let data = u32::from((ecl.format_bits() << 3) | mask.value());
            let mut rem = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            ((data << 10) | rem) ^ 0x5412
        };

        // First copy, around the top-left finder.
        for i in 0..6 {
            self.set_function_module(8, i, get_bit(bits, i));
        }
        self.set_function_module(8, 7, get_bit(bits, 6));
        self.set_function_module(8, 8, get_bit(bits, 7));
        self.set_function_module(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function_module(14 - i, 8, get_bit(bits, i));
        }

        // Second copy, split between the other two finders.
        let size = self.size;
        for i in 0..8 {
            self.set_function_module(size - 1 - i, 8, get_bit(bits, i));
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i, get_bit(bits, i));
        }
        self.set_function_module(8, size - 8, true);
    }

    fn draw_version(&mut self, version: Version) {
        let ver = u32::from(version.value());
        if ver < 7 {
            return;
        }
        let bits: u32 = {
            let mut rem = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
            }
            (ver << 12) | rem
        };
        for i in 0..18 {
            let bit = get_bit(bits, i);
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    /// Places codeword bits in the zigzag column-pair order, skipping function modules.
    fn draw_codewords(&mut self, data: &[u8]) {
        let size = self.size;
        let totalbits = data.len() * 8;
        let mut i: usize = 0;
        let mut right = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                let y = if upward { size - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = right - j;
                    let idx = self.index(x, y);
                    if !self.isfunction[idx] && i < totalbits {
                        self.modules[idx] = (data[i >> 3] >> (7 - (i & 7))) & 1 != 0;
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, totalbits);
    }

    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = self.index(x, y);
                if self.isfunction[idx] {
                    continue;
                }
                let invert = match mask.value() {
                    0 => (x + y) % 2 == 0,
                    1 => y % 2 == 0,
                    2 => x % 3 == 0,
                    3 => (x + y) % 3 == 0,
                    4 => (x / 3 + y / 2) % 2 == 0,
                    5 => (x * y) % 2 + (x * y) % 3 == 0,
                    6 => ((x * y) % 2 + (x * y) % 3) % 2 == 0,
                    7 => ((x + y) % 2 + (x * y) % 3) % 2 == 0,
                    _ => unreachable!(),
                };
                self.modules[idx] ^= invert;
            }
        }
    }

    fn penalty_score(&self) -> i32 {
        let size = self.size;
        let mut result: i32 = 0;

        // Runs and finder-like patterns in rows, then columns.
        for transpose in [false, true] {
            for a in 0..size {
                let mut runcolor = false;
                let mut runlen: i32 = 0;
                let mut history = FinderPenalty::new(size);
                for b in 0..size {
                    let color = if transpose { self.module(a, b) } else { self.module(b, a) };
                    if color == runcolor {
                        runlen += 1;
                        if runlen == 5 {
                            result += PENALTY_N1;
                        } else if runlen > 5 {
                            result += 1;
                        }
                    } else {
                        history.add_history(runlen);
                        if !runcolor {
                            result += history.count_patterns() * PENALTY_N3;
                        }
                        runcolor = color;
                        runlen = 1;
                    }
                }
                result += history.terminate_and_count(runcolor, runlen) * PENALTY_N3;
            }
        }

        // 2x2 blocks of one colour.
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.module(x, y);
                if color == self.module(x + 1, y)
                    && color == self.module(x, y + 1)
                    && color == self.module(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Dark/light balance.
        let dark = self.modules.iter().filter(|&&m| m).count() as i32;
        let total = size * size;
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result + k * PENALTY_N4
    }
}

/// Centre coordinates of alignment patterns for `version`, ascending.
fn alignment_pattern_positions(version: Version) -> Vec<i32> {
    let ver = i32::from(version.value());
    if ver == 1 {
        return Vec::new();
    }
    let numalign = ver / 7 + 2;
    let step = if ver == 32 {
        26
    } else {
        (ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2) * 2
    };
    let size = ver * 4 + 17;
    let mut result: Vec<i32> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}

struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            // Light border before the first run.
            currentrunlength += self.qr_size;
        }
        self.run_history.copy_within(0..6, 1);
        self.run_history[0] = currentrunlength;
    }

    /// 1 if the recent runs look like a 1:1:3:1:1 finder with 4 light modules on either side.
    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n)
            + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// The 2-bit value stored in the format information.
    fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

/// The data does not fit any version in the requested range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataTooLong {
    /// A segment's character count exceeds its count field.
    #[error("Segment too long")]
    SegmentTooLong,
    /// Data bits exceed the capacity of the largest allowed version.
    #[error("Data length = {0} bits, Max capacity = {1} bits")]
    DataOverCapacity(usize, usize),
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }
}

fn get_bit(x: u32, i: i32) -> bool {
    ((x >> i) & 1) != 0
}
