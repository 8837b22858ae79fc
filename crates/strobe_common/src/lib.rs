//! Shared foundational types for the strobe testbench compiler.
//!
//! This crate provides the 4-state [`Logic`] symbol, the fixed-width
//! [`BitVec`] used to encode every port sample, the [`Value`] sum type that
//! accepts the different ways a test author can spell a sample, and the
//! [`EncodingError`] raised when a spelling does not fit its port.

#![warn(missing_docs)]

pub mod bit_vec;
pub mod error;
pub mod logic;
pub mod value;

pub use bit_vec::BitVec;
pub use error::EncodingError;
pub use logic::Logic;
pub use value::Value;
