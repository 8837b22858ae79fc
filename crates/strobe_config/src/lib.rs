//! Parsing and validation of `strobe.toml` test plan files.
//!
//! This crate reads the test configuration and produces a strongly-typed
//! [`StrobeConfig`], then turns each `[[test]]` entry into a
//! [`TestPlan`](strobe_plan::TestPlan).

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{build_plan, build_plans};
pub use types::*;
