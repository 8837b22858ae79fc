//! The accepted spellings of a single port sample.

use crate::bit_vec::BitVec;
use crate::error::EncodingError;
use serde::{Deserialize, Serialize};

/// One sample as written by a test author, before it is fixed to a width.
///
/// Every variant is converted by [`Value::to_bit_vec`] using the width and
/// signedness of the port it is assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// An integer, range-checked against the port width.
    Int(i128),
    /// A bit string such as `"10xz"`, or the whole-port literals `"x"`/`"z"`.
    Str(String),
    /// Raw bytes, most significant bit first; the port must be `8 * len` wide.
    Bytes(Vec<u8>),
    /// One boolean per bit; unsigned ports only.
    Bools(Vec<bool>),
    /// An already-encoded vector of exactly the port width.
    Bits(BitVec),
}

impl Value {
    /// Encodes this value for a port of the given width and signedness.
    pub fn to_bit_vec(&self, width: u32, signed: bool) -> Result<BitVec, EncodingError> {
        match self {
            Value::Int(v) => BitVec::from_integer(*v, width, signed),
            Value::Str(s) => BitVec::from_string(s, width, signed),
            Value::Bytes(b) => BitVec::from_bytes(b, width, signed),
            Value::Bools(bs) => {
                if signed {
                    return Err(EncodingError::SignedBooleans);
                }
                BitVec::from_booleans(bs, width)
            }
            Value::Bits(bits) => {
                if bits.width() != width {
                    return Err(EncodingError::WidthMismatch {
                        expected: width,
                        actual: bits.width() as usize,
                    });
                }
                bits.with_signed(signed)
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i128::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<bool>> for Value {
    fn from(bs: Vec<bool>) -> Self {
        Value::Bools(bs)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bools(vec![b])
    }
}

impl From<BitVec> for Value {
    fn from(bits: BitVec) -> Self {
        Value::Bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_uses_port_signedness() {
        let v = Value::from(-1).to_bit_vec(3, true).unwrap();
        assert_eq!(v.to_string(), "111");
        assert!(v.is_signed());
        assert!(Value::from(-1).to_bit_vec(3, false).is_err());
    }

    #[test]
    fn str_and_bytes() {
        assert_eq!(Value::from("xx").to_bit_vec(2, false).unwrap().to_string(), "xx");
        assert_eq!(Value::from("x").to_bit_vec(4, false).unwrap().to_string(), "xxxx");
        let b = Value::from(&b"\xdf"[..]).to_bit_vec(8, false).unwrap();
        assert_eq!(b.to_string(), "11011111");
    }

    #[test]
    fn bools_are_unsigned_only() {
        assert_eq!(
            Value::from(vec![true, false]).to_bit_vec(2, true),
            Err(EncodingError::SignedBooleans)
        );
        assert_eq!(
            Value::from(true).to_bit_vec(1, false).unwrap().to_string(),
            "1"
        );
    }

    #[test]
    fn bits_must_match_width() {
        let bits = BitVec::from_integer(2, 2, false).unwrap();
        assert!(Value::from(bits.clone()).to_bit_vec(3, false).is_err());
        let retagged = Value::from(bits).to_bit_vec(2, true).unwrap();
        assert_eq!(retagged.to_integer().unwrap(), -2);
    }
}
