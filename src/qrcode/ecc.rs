//! Error correction: capacity tables and the Reed-Solomon code over GF(2^8/0x11D).
use super::{QrCodeEcc, Version};

/// Computes Reed-Solomon error correction codewords for data blocks of one QR version.
pub(crate) struct ReedSolomon {
    divisor: Vec<u8>,
}

impl ReedSolomon {
    /// Builds the generator polynomial of the given degree (1..=255), coefficients from
    /// highest to lowest power excluding the leading 1.
    pub(crate) fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Degree out of range");
        let mut divisor = vec![0u8; degree - 1];
        divisor.push(1);
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = multiply(root, 0x02);
        }
        Self { divisor }
    }

    /// Returns the remainder of `data` divided by the generator polynomial.
    pub(crate) fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.divisor.len()];
        for &b in data {
            let factor = b ^ result[0];
            result.rotate_left(1);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (x, &y) in result.iter_mut().zip(&self.divisor) {
                *x ^= multiply(y, factor);
            }
        }
        result
    }
}

/// Multiplies two field elements modulo x^8 + x^4 + x^3 + x^2 + 1.
fn multiply(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x1d);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

/// Number of data modules available at `ver` once every function pattern is excluded.
pub(crate) fn num_raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

/// Number of 8-bit data codewords that fit at `ver` and `ecl`.
pub(crate) fn num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    num_raw_data_modules(ver) / 8
        - ecc_codewords_per_block(ver, ecl) * num_error_correction_blocks(ver, ecl)
}

pub(crate) fn ecc_codewords_per_block(ver: Version, ecl: QrCodeEcc) -> usize {
    usize::from(ECC_CODEWORDS_PER_BLOCK[ecl.ordinal()][usize::from(ver.value())])
}

pub(crate) fn num_error_correction_blocks(ver: Version, ecl: QrCodeEcc) -> usize {
    usize::from(NUM_ERROR_CORRECTION_BLOCKS[ecl.ordinal()][usize::from(ver.value())])
}

/// Splits `data` into blocks, appends each block's ECC and interleaves the result.
pub(crate) fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
    assert_eq!(data.len(), num_data_codewords(ver, ecl), "Illegal argument");
    let numblocks = num_error_correction_blocks(ver, ecl);
    let blockecclen = ecc_codewords_per_block(ver, ecl);
    let rawcodewords = num_raw_data_modules(ver) / 8;
    let numshortblocks = numblocks - rawcodewords % numblocks;
    let shortblocklen = rawcodewords / numblocks;
    let shortdatalen = shortblocklen - blockecclen;

    let rs = ReedSolomon::new(blockecclen);
    let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(numblocks);
    let mut rest = data;
    for i in 0..numblocks {
        let datlen = shortdatalen + usize::from(i >= numshortblocks);
        let (dat, tail) = rest.split_at(datlen);
        rest = tail;
        let mut block = dat.to_vec();
        let ecc = rs.remainder(dat);
        if i < numshortblocks {
            // Placeholder keeping every block the same length; skipped while interleaving.
            block.push(0);
        }
        block.extend_from_slice(&ecc);
        blocks.push(block);
    }
    debug_assert!(rest.is_empty());

    let mut result = Vec::with_capacity(rawcodewords);
    for i in 0..=shortblocklen {
        for (j, block) in blocks.iter().enumerate() {
            if i != shortdatalen || j >= numshortblocks {
                result.push(block[i]);
            }
        }
    }
    debug_assert_eq!(result.len(), rawcodewords);
    result
}

static ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];
