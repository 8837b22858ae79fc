//! Output verification for the strobe testbench compiler.
//!
//! After simulation, each clock domain that captures outputs leaves a
//! `$writememb` dump of its capture table. [`Expectations`] holds the
//! expected samples of a test case; checking slices every captured row back
//! into ports and compares them bit by bit, treating `x` in the expected
//! value as don't-care. Mismatches are collected in a [`CheckReport`].
//!
//! # Modules
//!
//! - `dump`: Capture dump parsing
//! - `compare`: Masked comparison and expectations
//! - `report`: Mismatch records and reporting modes
//! - `error`: Dump reading errors

#![warn(missing_docs)]

pub mod compare;
pub mod dump;
pub mod error;
pub mod report;

pub use compare::{matches_masked, mismatched_bits, ExpectedDomain, Expectations};
pub use dump::{parse_dump, read_dump};
pub use error::CheckError;
pub use report::{CheckReport, Mismatch, ReportMode};
