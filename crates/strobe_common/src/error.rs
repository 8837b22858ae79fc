//! Errors raised while encoding a value into a [`BitVec`](crate::BitVec).

/// A value could not be encoded at the requested width or signedness.
///
/// Encoding errors are detected eagerly at the point of the offending call;
/// nothing is ever silently truncated or padded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A vector of width zero was requested.
    #[error("bit vector width must be positive")]
    ZeroWidth,

    /// A signed vector needs a sign bit plus at least one magnitude bit.
    #[error("signed bit vector must be at least 2 bits wide, got {width}")]
    SignedTooNarrow {
        /// The requested width.
        width: u32,
    },

    /// The supplied value has a different width than the port.
    #[error("width mismatch: expected {expected} bits, got {actual}")]
    WidthMismatch {
        /// The width the value had to have.
        expected: u32,
        /// The width the value actually had.
        actual: usize,
    },

    /// A character outside `0 1 x X z Z` appeared in a bit string.
    #[error("invalid logic character {0:?}")]
    InvalidCharacter(char),

    /// An integer does not fit the width and signedness.
    #[error("value {value} does not fit in {width} {} bits", signedness(.signed))]
    OutOfRange {
        /// The offending value.
        value: i128,
        /// The target width.
        width: u32,
        /// Whether the target is signed.
        signed: bool,
    },

    /// A vector can only be split into equal-width pieces.
    #[error("cannot slice a {width}-bit vector into {piece}-bit pieces")]
    NotDivisible {
        /// The width of the vector being split.
        width: u32,
        /// The requested piece width.
        piece: u32,
    },

    /// Only unsigned vectors can be sliced.
    #[error("cannot slice a signed bit vector")]
    SignedSlice,

    /// Boolean sequences always encode unsigned values.
    #[error("boolean sequences cannot encode a signed value")]
    SignedBooleans,

    /// Integer conversion of a vector holding `x` or `z`.
    #[error("cannot convert {0} to an integer: contains x or z")]
    Undefined(String),

    /// Integer conversion of a vector wider than the integer type.
    #[error("{width}-bit value does not fit in a 128-bit integer")]
    TooWide {
        /// The width of the vector.
        width: u32,
    },
}

fn signedness(signed: &bool) -> &'static str {
    if *signed {
        "signed"
    } else {
        "unsigned"
    }
}
