//! Errors raised while reading capture dumps.
//!
//! A mismatch between captured and expected values is not an error: it is
//! recorded in a [`CheckReport`](crate::CheckReport).

use std::path::PathBuf;

use strobe_common::EncodingError;

/// Errors that prevent a comparison from running.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// A capture dump could not be read.
    #[error("failed to read capture dump {path}: {source}")]
    Io {
        /// The dump file.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A dump row is not a bit string of the bus width.
    #[error("capture dump for clock '{clock}', line {line}: {source}")]
    MalformedRow {
        /// The clock domain.
        clock: String,
        /// One-based line number.
        line: usize,
        /// Why the row was rejected.
        #[source]
        source: EncodingError,
    },

    /// A dump holds fewer rows than the domain captures.
    #[error("capture dump for clock '{clock}' has {rows} rows, expected at least {expected}")]
    ShortDump {
        /// The clock domain.
        clock: String,
        /// Rows found.
        rows: usize,
        /// Rows captured by the testbench.
        expected: usize,
    },

    /// No dump was supplied for a domain that captures outputs.
    #[error("no capture dump for clock '{0}'")]
    MissingDump(String),
}
