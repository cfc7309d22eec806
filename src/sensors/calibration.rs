//! Factory calibration PROM.
//!
//! Eight 16-bit words are read once at setup.  Words 1–6 are the
//! coefficients C1–C6 used by the compensation formulas; the low nibble of
//! word 7 is a CRC-4 over the whole PROM.  A set that fails the check is
//! never handed to the compensation pipeline.

use crate::error::SetupError;

/// Number of PROM words.
pub const PROM_WORDS: usize = 8;

/// CRC-4 generator in the top bits of a 16-bit remainder.
const CRC_POLY: u16 = 0x3000;

/// CRC-4 over the PROM, MSB first, with the low byte of word 7 cleared.
pub fn crc4(words: &[u16; PROM_WORDS]) -> u8 {
    let mut prom = *words;
    prom[7] &= 0xFF00;

    let mut rem: u16 = 0;
    for cnt in 0..PROM_WORDS * 2 {
        let word = prom[cnt >> 1];
        rem ^= if cnt % 2 == 1 { word & 0x00FF } else { word >> 8 };
        for _ in 0..8 {
            rem = if rem & 0x8000 != 0 {
                (rem << 1) ^ CRC_POLY
            } else {
                rem << 1
            };
        }
    }
    ((rem >> 12) & 0x000F) as u8
}

/// Return `words` with the correct CRC stamped into the low nibble of word 7.
pub fn seal(mut words: [u16; PROM_WORDS]) -> [u16; PROM_WORDS] {
    words[7] &= 0xFFF0;
    words[7] |= u16::from(crc4(&words));
    words
}

/// A validated calibration set.  Read-only once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    words: [u16; PROM_WORDS],
}

impl Calibration {
    /// Validate the stored checksum and wrap the words.
    pub fn from_words(words: [u16; PROM_WORDS]) -> Result<Self, SetupError> {
        let stored = (words[7] & 0x000F) as u8;
        let computed = crc4(&words);
        if stored != computed {
            return Err(SetupError::CalibrationCrc { stored, computed });
        }
        Ok(Self { words })
    }

    /// Wrap coefficients without a checksum check.  Compensation-only paths
    /// (bench data, fuzzing) where the PROM was never read.
    pub fn from_coefficients_unchecked(words: [u16; PROM_WORDS]) -> Self {
        Self { words }
    }

    /// Coefficient `C[i]` as a float, ready for the compensation formulas.
    pub fn c(&self, i: usize) -> f64 {
        f64::from(self.words[i])
    }

    pub fn words(&self) -> &[u16; PROM_WORDS] {
        &self.words
    }

    pub fn stored_crc(&self) -> u8 {
        (self.words[7] & 0x000F) as u8
    }
}
