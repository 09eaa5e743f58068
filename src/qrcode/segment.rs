use super::Version;

/// Characters encodable in alphanumeric mode, in code-point order.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// ECI assignment number for UTF-8.
pub const UTF8_ECI: u32 = 26;

/// The data mode of a segment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    Eci,
}

impl QrSegmentMode {
    pub(crate) fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Eci => 0x7,
        }
    }

    /// Width of the character count field at the given version.
    pub(crate) fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        let widths: [u8; 3] = match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Eci => [0, 0, 0],
        };
        widths[usize::from((ver.value() + 7) / 17)]
    }
}

/// A segment of data in a QR code, holding its already-encoded bit stream.
///
/// Build segments with [`make_numeric`](Self::make_numeric),
/// [`make_alphanumeric`](Self::make_alphanumeric), [`make_bytes`](Self::make_bytes) or let
/// [`make_segments`](Self::make_segments) choose the densest single mode for a string.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: Vec<bool>,
}

impl QrSegment {
    /// Creates a byte-mode segment for arbitrary binary data.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(data.len() * 8));
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        QrSegment::new(QrSegmentMode::Byte, data.len(), bb.0)
    }

    /// Creates a numeric-mode segment.
    ///
    /// # Panics
    ///
    /// Panics if `text` contains anything other than ASCII digits.
    pub fn make_numeric(text: &str) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 3 + (text.len() + 2) / 3));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            assert!(b.is_ascii_digit(), "String contains non-numeric characters");
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        QrSegment::new(QrSegmentMode::Numeric, text.len(), bb.0)
    }

    /// Creates an alphanumeric-mode segment.
    ///
    /// # Panics
    ///
    /// Panics if `text` contains characters outside [`ALPHANUMERIC_CHARSET`].
    pub fn make_alphanumeric(text: &str) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 5 + (text.len() + 1) / 2));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for c in text.chars() {
            let index = ALPHANUMERIC_CHARSET
                .find(c)
                .expect("String contains unencodable characters in alphanumeric mode");
            accumdata = accumdata * 45 + index as u32;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6);
        }
        QrSegment::new(QrSegmentMode::Alphanumeric, text.len(), bb.0)
    }

    /// Creates an Extended Channel Interpretation designator segment.
    ///
    /// # Panics
    ///
    /// Panics if `assignval` is 1 000 000 or more.
    pub fn make_eci(assignval: u32) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(24));
        if assignval < (1 << 7) {
            bb.append_bits(assignval, 8);
        } else if assignval < (1 << 14) {
            bb.append_bits(0b10, 2);
            bb.append_bits(assignval, 14);
        } else if assignval < 1_000_000 {
            bb.append_bits(0b110, 3);
            bb.append_bits(assignval, 21);
        } else {
            panic!("ECI assignment value out of range");
        }
        QrSegment::new(QrSegmentMode::Eci, 0, bb.0)
    }

    /// Returns the segments holding `text` in the most compact single mode.
    ///
    /// Text outside ASCII is stored as UTF-8 bytes preceded by a [`UTF8_ECI`] designator, so
    /// readers do not fall back to ISO-8859-1.
    pub fn make_segments(text: &str) -> Vec<Self> {
        if text.is_empty() {
            Vec::new()
        } else if QrSegment::is_numeric(text) {
            vec![QrSegment::make_numeric(text)]
        } else if QrSegment::is_alphanumeric(text) {
            vec![QrSegment::make_alphanumeric(text)]
        } else if text.is_ascii() {
            vec![QrSegment::make_bytes(text.as_bytes())]
        } else {
            vec![
                QrSegment::make_eci(UTF8_ECI),
                QrSegment::make_bytes(text.as_bytes()),
            ]
        }
    }

    pub fn new(mode: QrSegmentMode, numchars: usize, data: Vec<bool>) -> Self {
        Self { mode, numchars, data }
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Bits needed to encode `segs` at `version`, or `None` if a character count does not fit
    /// its field or the total overflows.
    pub(crate) fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits = seg.mode.num_char_count_bits(version);
            if let Some(limit) = 1usize.checked_shl(u32::from(ccbits)) {
                if seg.numchars >= limit {
                    return None;
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

/// An appendable sequence of bits.
#[derive(Clone, Default, Debug)]
pub struct BitBuffer(pub Vec<bool>);

impl BitBuffer {
    /// Appends the low `len` bits of `val`, most significant first.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0, "Value out of range");
        self.0.extend((0..len).rev().map(|i| (val >> i) & 1 != 0));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
