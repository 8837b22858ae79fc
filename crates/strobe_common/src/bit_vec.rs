//! Fixed-width vectors of 4-state logic values with a signedness tag.
//!
//! Bit 0 of a [`BitVec`] is its most significant bit, matching the
//! `[0:N-1]` bus declarations the generated testbenches use and the
//! left-to-right order of `$readmemb` rows.

use crate::error::EncodingError;
use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vector of 4-state [`Logic`] values packed for efficient storage.
///
/// Each logic value occupies 2 bits, with 32 values packed per `u64` word.
/// Invariants: `width >= 1`, and `width >= 2` when `signed`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitVec {
    width: u32,
    signed: bool,
    /// Packed storage: 2 bits per logic value, 32 values per u64.
    data: Vec<u64>,
}

/// Number of logic values packed per u64 word.
const VALUES_PER_WORD: u32 = 32;

impl BitVec {
    /// Creates a vector with every bit set to `value`.
    pub fn filled(value: Logic, width: u32, signed: bool) -> Result<Self, EncodingError> {
        check_shape(width, signed)?;
        let mut v = Self::zeroed(width, signed);
        if value != Logic::Zero {
            for i in 0..width {
                v.set(i, value);
            }
        }
        Ok(v)
    }

    /// Creates a fully-unknown (`x...x`) vector.
    pub fn unknown(width: u32, signed: bool) -> Result<Self, EncodingError> {
        Self::filled(Logic::X, width, signed)
    }

    /// Builds a vector from logic values, most significant first.
    pub fn from_logic(bits: &[Logic], signed: bool) -> Result<Self, EncodingError> {
        let width = u32::try_from(bits.len()).map_err(|_| EncodingError::TooWide { width: u32::MAX })?;
        check_shape(width, signed)?;
        let mut v = Self::zeroed(width, signed);
        for (i, &b) in bits.iter().enumerate() {
            v.set(i as u32, b);
        }
        Ok(v)
    }

    /// Encodes an integer as a two's-complement bit pattern.
    ///
    /// Unsigned vectors accept `0 <= v < 2^width`; signed vectors accept
    /// `-2^(width-1) <= v < 2^(width-1)`.
    pub fn from_integer(value: i128, width: u32, signed: bool) -> Result<Self, EncodingError> {
        check_shape(width, signed)?;
        let out_of_range = EncodingError::OutOfRange {
            value,
            width,
            signed,
        };
        if signed {
            if width <= 127 {
                let half = 1i128 << (width - 1);
                if value < -half || value >= half {
                    return Err(out_of_range);
                }
            }
        } else if value < 0 || (width < 127 && value >= 1i128 << width) {
            return Err(out_of_range);
        }

        let mut v = Self::zeroed(width, signed);
        for i in 0..width {
            // Arithmetic shift keeps replicating the sign bit past bit 127.
            let shift = (width - 1 - i).min(127);
            if (value >> shift) & 1 != 0 {
                v.set(i, Logic::One);
            }
        }
        Ok(v)
    }

    /// Parses a bit string like `"10xz"`.
    ///
    /// The literals `"x"` and `"z"` (any case) expand to a fully unknown or
    /// fully high-impedance vector of the requested width. Otherwise the
    /// string length must equal `width`.
    pub fn from_string(s: &str, width: u32, signed: bool) -> Result<Self, EncodingError> {
        if s.eq_ignore_ascii_case("x") {
            return Self::filled(Logic::X, width, signed);
        }
        if s.eq_ignore_ascii_case("z") {
            return Self::filled(Logic::Z, width, signed);
        }
        let len = s.chars().count();
        if len != width as usize {
            return Err(EncodingError::WidthMismatch {
                expected: width,
                actual: len,
            });
        }
        let bits = s
            .chars()
            .map(|c| Logic::from_char(c).ok_or(EncodingError::InvalidCharacter(c)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_logic(&bits, signed)
    }

    /// Reinterprets a byte buffer, each byte most significant bit first.
    ///
    /// `width` must equal `8 * buf.len()`.
    pub fn from_bytes(buf: &[u8], width: u32, signed: bool) -> Result<Self, EncodingError> {
        let bits = buf.len() * 8;
        if bits != width as usize {
            return Err(EncodingError::WidthMismatch {
                expected: width,
                actual: bits,
            });
        }
        check_shape(width, signed)?;
        let mut v = Self::zeroed(width, signed);
        for (byte_idx, byte) in buf.iter().enumerate() {
            for bit in 0..8u32 {
                if byte & (0x80 >> bit) != 0 {
                    v.set(byte_idx as u32 * 8 + bit, Logic::One);
                }
            }
        }
        Ok(v)
    }

    /// Maps booleans directly onto `One`/`Zero`. Always unsigned.
    pub fn from_booleans(bs: &[bool], width: u32) -> Result<Self, EncodingError> {
        if bs.len() != width as usize {
            return Err(EncodingError::WidthMismatch {
                expected: width,
                actual: bs.len(),
            });
        }
        let bits: Vec<Logic> = bs.iter().copied().map(Logic::from_bool).collect();
        Self::from_logic(&bits, false)
    }

    /// Concatenates vectors left to right into one unsigned vector.
    ///
    /// Used to pack the ports of a clock domain into one bus row.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a BitVec>) -> Result<Self, EncodingError> {
        let bits: Vec<Logic> = parts.into_iter().flat_map(|part| part.iter()).collect();
        Self::from_logic(&bits, false)
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns true if the vector carries two's-complement semantics.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Gets the logic value at `index`, counted from the most significant bit.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        Logic::from_bits(self.data[word_idx] >> bit_offset)
    }

    /// Iterates over the bits, most significant first.
    pub fn iter(&self) -> impl Iterator<Item = Logic> + '_ {
        (0..self.width).map(move |i| self.get(i))
    }

    /// Returns true if no bit is `x` or `z`.
    pub fn is_fully_defined(&self) -> bool {
        self.iter().all(Logic::is_known)
    }

    /// Extracts `width` bits starting at `offset` as a new vector.
    ///
    /// Fails if the range runs past the end of the vector.
    pub fn range(&self, offset: u32, width: u32, signed: bool) -> Result<Self, EncodingError> {
        let end = offset.checked_add(width).unwrap_or(u32::MAX);
        if end > self.width {
            return Err(EncodingError::WidthMismatch {
                expected: end,
                actual: self.width as usize,
            });
        }
        let bits: Vec<Logic> = (offset..end).map(|i| self.get(i)).collect();
        Self::from_logic(&bits, signed)
    }

    /// Splits an unsigned vector into consecutive `width`-bit pieces.
    ///
    /// Every piece carries the caller-supplied signedness.
    pub fn slice(&self, width: u32, signed: bool) -> Result<Vec<Self>, EncodingError> {
        if self.signed {
            return Err(EncodingError::SignedSlice);
        }
        if width == 0 {
            return Err(EncodingError::ZeroWidth);
        }
        if self.width % width != 0 {
            return Err(EncodingError::NotDivisible {
                width: self.width,
                piece: width,
            });
        }
        (0..self.width / width)
            .map(|n| self.range(n * width, width, signed))
            .collect()
    }

    /// Returns a copy carrying a different signedness tag.
    pub fn with_signed(&self, signed: bool) -> Result<Self, EncodingError> {
        check_shape(self.width, signed)?;
        Ok(Self {
            signed,
            ..self.clone()
        })
    }

    /// Converts to an integer, applying two's complement when signed.
    ///
    /// Fails if any bit is `x`/`z` or the value does not fit in an `i128`.
    pub fn to_integer(&self) -> Result<i128, EncodingError> {
        if !self.is_fully_defined() {
            return Err(EncodingError::Undefined(self.to_string()));
        }
        let too_wide = EncodingError::TooWide { width: self.width };
        let (skip, base) = if self.signed && self.get(0) == Logic::One {
            let magnitude_bits = self.width - 1;
            if magnitude_bits < 127 {
                (1, -(1i128 << magnitude_bits))
            } else {
                // Every bit above the low 127 must repeat the sign.
                let sign_bits = (self.width - 127) as usize;
                if self.iter().take(sign_bits).any(|b| b != Logic::One) {
                    return Err(too_wide);
                }
                (sign_bits, i128::MIN)
            }
        } else if self.signed {
            (1, 0)
        } else {
            (0, 0)
        };
        let mut acc = 0i128;
        for b in self.iter().skip(skip) {
            acc = acc
                .checked_mul(2)
                .and_then(|a| a.checked_add(i128::from(b == Logic::One)))
                .ok_or_else(|| too_wide.clone())?;
        }
        Ok(base + acc)
    }

    /// Converts to an unsigned integer regardless of the signedness tag.
    pub fn to_bits_u128(&self) -> Result<u128, EncodingError> {
        if !self.is_fully_defined() {
            return Err(EncodingError::Undefined(self.to_string()));
        }
        if self.width > 128 {
            return Err(EncodingError::TooWide { width: self.width });
        }
        Ok(self
            .iter()
            .fold(0u128, |acc, b| (acc << 1) | u128::from(b == Logic::One)))
    }

    fn zeroed(width: u32, signed: bool) -> Self {
        Self {
            width,
            signed,
            data: vec![0; word_count(width)],
        }
    }

    fn set(&mut self, index: u32, value: Logic) {
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        let mask = !(0b11u64 << bit_offset);
        self.data[word_idx] = (self.data[word_idx] & mask) | ((value as u64) << bit_offset);
    }
}

impl fmt::Display for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.iter() {
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.signed { "s" } else { "" };
        write!(f, "BitVec({}'{tag}b{self})", self.width)
    }
}

fn check_shape(width: u32, signed: bool) -> Result<(), EncodingError> {
    if width == 0 {
        return Err(EncodingError::ZeroWidth);
    }
    if signed && width < 2 {
        return Err(EncodingError::SignedTooNarrow { width });
    }
    Ok(())
}

/// Returns the number of u64 words needed to store `width` logic values.
fn word_count(width: u32) -> usize {
    width.div_ceil(VALUES_PER_WORD) as usize
}
