//! Reads a symbol back into its segments, used to check the encoder end to end.
//!
//! The reader works from the module grid alone: format information, zigzag placement, block
//! de-interleaving, Reed-Solomon syndromes and the segment bit stream are all re-derived here
//! rather than borrowed from the encoder.
use super::ecc::{
    ecc_codewords_per_block, num_data_codewords, num_error_correction_blocks,
    num_raw_data_modules,
};
use super::segment::ALPHANUMERIC_CHARSET;
use super::{alignment_pattern_positions, Mask, QrCode, QrCodeEcc, Version};

/// What a reader recovers from a symbol.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Decoded {
    pub ecl: QrCodeEcc,
    pub mask: Mask,
    pub eci: Option<u32>,
    pub data: Vec<u8>,
}

pub(super) fn read(qr: &QrCode) -> Decoded {
    let version = qr.version();
    let size = qr.size();
    assert_eq!(size, i32::from(version.value()) * 4 + 17);

    let (ecl, mask) = read_format(qr);
    let functions = FunctionMap::new(version);

    let mut bits = Vec::with_capacity(num_raw_data_modules(version));
    let mut right = size - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = ((right + 1) & 2) == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for x in [right, right - 1] {
                if !functions.contains(x, y) {
                    bits.push(qr.get_module(x, y) ^ masked(mask, x, y));
                }
            }
        }
        right -= 2;
    }
    assert_eq!(bits.len(), num_raw_data_modules(version), "data module count");

    let codewords: Vec<u8> = bits
        .chunks_exact(8)
        .map(|byte| byte.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
        .collect();
    let data = deinterleave(&codewords, version, ecl);
    let (eci, data) = parse_segments(&data, version);
    Decoded {
        ecl,
        mask,
        eci,
        data,
    }
}

fn format_word(ecl_bits: u32, mask: u32) -> u32 {
    let data = (ecl_bits << 3) | mask;
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

fn read_format(qr: &QrCode) -> (QrCodeEcc, Mask) {
    let size = qr.size();
    let bit = |x: i32, y: i32, i: i32| u32::from(qr.get_module(x, y)) << i;

    let mut first = 0;
    for i in 0..6 {
        first |= bit(8, i, i);
    }
    first |= bit(8, 7, 6) | bit(8, 8, 7) | bit(7, 8, 8);
    for i in 9..15 {
        first |= bit(14 - i, 8, i);
    }

    let mut second = 0;
    for i in 0..8 {
        second |= bit(size - 1 - i, 8, i);
    }
    for i in 8..15 {
        second |= bit(8, size - 15 + i, i);
    }
    assert_eq!(first, second, "format copies differ");
    assert!(qr.get_module(8, size - 8), "dark module");

    for ecl_bits in 0..4 {
        for mask in 0..8 {
            if format_word(ecl_bits, mask) == first {
                let ecl = match ecl_bits {
                    0 => QrCodeEcc::Medium,
                    1 => QrCodeEcc::Low,
                    2 => QrCodeEcc::High,
                    _ => QrCodeEcc::Quartile,
                };
                return (ecl, Mask::new(mask as u8));
            }
        }
    }
    panic!("no format word matches {first:#017b}");
}

fn masked(mask: Mask, x: i32, y: i32) -> bool {
    match mask.value() {
        0 => (x + y) % 2 == 0,
        1 => y % 2 == 0,
        2 => x % 3 == 0,
        3 => (x + y) % 3 == 0,
        4 => (x / 3 + y / 2) % 2 == 0,
        5 => (x * y) % 2 + (x * y) % 3 == 0,
        6 => ((x * y) % 2 + (x * y) % 3) % 2 == 0,
        _ => ((x + y) % 2 + (x * y) % 3) % 2 == 0,
    }
}

/// Modules reserved for finders, separators, timing, alignment, format and version info.
struct FunctionMap {
    version: u8,
    size: i32,
    alignment: Vec<i32>,
}

impl FunctionMap {
    fn new(version: Version) -> Self {
        Self {
            version: version.value(),
            size: i32::from(version.value()) * 4 + 17,
            alignment: alignment_pattern_positions(version),
        }
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        let size = self.size;
        // Finder, separator and format areas, dark module included.
        if (x <= 8 && y <= 8) || (x >= size - 8 && y <= 8) || (x <= 8 && y >= size - 8) {
            return true;
        }
        if x == 6 || y == 6 {
            return true;
        }
        let last = self.alignment.len().saturating_sub(1);
        for (i, &ax) in self.alignment.iter().enumerate() {
            for (j, &ay) in self.alignment.iter().enumerate() {
                let on_finder =
                    (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !on_finder && (x - ax).abs() <= 2 && (y - ay).abs() <= 2 {
                    return true;
                }
            }
        }
        let version_block = |a: i32, b: i32| a >= size - 11 && a < size - 8 && b < 6;
        self.version >= 7 && (version_block(x, y) || version_block(y, x))
    }
}

fn gf_mul(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x1d);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

/// Splits the raw codewords back into blocks, checks every block's syndromes and returns the
/// concatenated data codewords.
fn deinterleave(codewords: &[u8], version: Version, ecl: QrCodeEcc) -> Vec<u8> {
    let numblocks = num_error_correction_blocks(version, ecl);
    let ecclen = ecc_codewords_per_block(version, ecl);
    let raw = codewords.len();
    let numshort = numblocks - raw % numblocks;
    let shortlen = raw / numblocks;
    let shortdata = shortlen - ecclen;

    let mut blocks: Vec<Vec<u8>> = vec![Vec::with_capacity(shortlen + 1); numblocks];
    let mut next = codewords.iter().copied();
    for i in 0..=shortlen {
        for (j, block) in blocks.iter_mut().enumerate() {
            if i != shortdata || j >= numshort {
                block.push(next.next().expect("ran out of codewords"));
            }
        }
    }
    assert!(next.next().is_none(), "codewords left over");

    let mut data = Vec::new();
    for (j, block) in blocks.iter().enumerate() {
        let mut root: u8 = 1;
        for k in 0..ecclen {
            let syndrome = block.iter().fold(0u8, |acc, &c| gf_mul(acc, root) ^ c);
            assert_eq!(syndrome, 0, "block {j} syndrome {k}");
            root = gf_mul(root, 0x02);
        }
        data.extend_from_slice(&block[..block.len() - ecclen]);
    }
    assert_eq!(data.len(), num_data_codewords(version, ecl));
    data
}

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl BitReader<'_> {
    fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }

    fn peek(&self, offset: usize) -> bool {
        let i = self.pos + offset;
        (self.bytes[i >> 3] >> (7 - (i & 7))) & 1 != 0
    }

    fn take(&mut self, len: u8) -> u32 {
        let mut value = 0;
        for _ in 0..len {
            value = (value << 1) | u32::from(self.peek(0));
            self.pos += 1;
        }
        value
    }
}

/// Decodes the segment stream, then checks the terminator and pad bytes.
fn parse_segments(data: &[u8], version: Version) -> (Option<u32>, Vec<u8>) {
    let width = |widths: [u8; 3]| widths[usize::from((version.value() + 7) / 17)];
    let mut reader = BitReader {
        bytes: data,
        pos: 0,
    };
    let mut eci = None;
    let mut out = Vec::new();

    while reader.remaining() >= 4 {
        match reader.take(4) {
            0x0 => break,
            0x1 => {
                let mut count = reader.take(width([10, 12, 14]));
                while count >= 3 {
                    out.extend(format!("{:03}", reader.take(10)).bytes());
                    count -= 3;
                }
                match count {
                    2 => out.extend(format!("{:02}", reader.take(7)).bytes()),
                    1 => out.extend(format!("{}", reader.take(4)).bytes()),
                    _ => {}
                }
            }
            0x2 => {
                let charset = ALPHANUMERIC_CHARSET.as_bytes();
                let mut count = reader.take(width([9, 11, 13]));
                while count >= 2 {
                    let pair = reader.take(11) as usize;
                    out.push(charset[pair / 45]);
                    out.push(charset[pair % 45]);
                    count -= 2;
                }
                if count == 1 {
                    out.push(charset[reader.take(6) as usize]);
                }
            }
            0x4 => {
                let count = reader.take(width([8, 16, 16]));
                for _ in 0..count {
                    out.push(reader.take(8) as u8);
                }
            }
            0x7 => {
                let value = if !reader.peek(0) {
                    reader.take(8)
                } else if !reader.peek(1) {
                    reader.take(16) & 0x3fff
                } else {
                    reader.take(24) & 0x1f_ffff
                };
                eci = Some(value);
            }
            mode => panic!("unexpected segment mode {mode:#x}"),
        }
    }

    while reader.pos % 8 != 0 {
        assert_eq!(reader.take(1), 0, "non-zero padding bit");
    }
    for pad in [0xec, 0x11].iter().cycle() {
        if reader.remaining() == 0 {
            break;
        }
        assert_eq!(reader.take(8), *pad, "pad byte");
    }
    (eci, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, SAMPLE_INPUTS};
    use crate::qrcode::QrSegment;

    const LEVELS: [QrCodeEcc; 4] = [
        QrCodeEcc::Low,
        QrCodeEcc::Medium,
        QrCodeEcc::Quartile,
        QrCodeEcc::High,
    ];

    fn assert_reads_back(text: &str, ecl: QrCodeEcc) {
        let qr = QrCode::encode_text(text, ecl).unwrap();
        let decoded = read(&qr);
        assert_eq!(decoded.data, text.as_bytes(), "{text:?} at {ecl:?}");
        assert_eq!(decoded.ecl, qr.error_correction_level());
        assert_eq!(decoded.mask, qr.mask());
        assert_eq!(decoded.eci.is_some(), !text.is_ascii());
    }

    #[test]
    fn test_sample_payloads_read_back() {
        for input in SAMPLE_INPUTS {
            let payload = classify(input).formatted;
            for ecl in LEVELS {
                assert_reads_back(&payload, ecl);
            }
        }
    }

    #[test]
    fn test_every_mode_reads_back() {
        let digits = "0123456789".repeat(30);
        for text in [
            "",
            digits.as_str(),
            "HELLO WORLD $%*+-./: 42",
            "Hello, world!",
            "WIFI:T:WPA;S:집;P:비밀번호;;",
        ] {
            for ecl in LEVELS {
                assert_reads_back(text, ecl);
            }
        }
    }

    #[test]
    fn test_multi_block_versions_read_back() {
        // Mixed short and long blocks, alignment grids and version information.
        for len in [200, 700, 1500] {
            let text: String = (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
            assert_reads_back(&text, QrCodeEcc::Low);
            assert_reads_back(&text[..len / 3], QrCodeEcc::High);
        }
    }

    #[test]
    fn test_every_mask_reads_back() {
        let segs = QrSegment::make_segments("tel:01012345678");
        for m in 0..8 {
            let qr = QrCode::encode_segments_advanced(
                &segs,
                QrCodeEcc::Quartile,
                Version::MIN,
                Version::MAX,
                Some(Mask::new(m)),
                false,
            )
            .unwrap();
            let decoded = read(&qr);
            assert_eq!(decoded.mask, Mask::new(m));
            assert_eq!(decoded.ecl, QrCodeEcc::Quartile);
            assert_eq!(decoded.data, b"tel:01012345678");
        }
    }

    #[test]
    fn test_non_ascii_text_carries_utf8_designator() {
        let qr = QrCode::encode_text("안녕하세요", QrCodeEcc::Medium).unwrap();
        let decoded = read(&qr);
        assert_eq!(decoded.eci, Some(26));
        assert_eq!(String::from_utf8(decoded.data).unwrap(), "안녕하세요");
    }
}
