//! Error types for testbench synthesis.

use std::io;

use strobe_plan::PlanError;

/// Errors that can occur while synthesizing or writing a testbench.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The test plan failed validation.
    #[error("invalid test plan: {0}")]
    Plan(#[from] PlanError),

    /// A generated file could not be written.
    #[error("failed to write testbench files: {0}")]
    Io(#[from] io::Error),

    /// The intermediate representation could not be serialized.
    #[error("failed to serialize testbench IR: {0}")]
    Json(#[from] serde_json::Error),
}
