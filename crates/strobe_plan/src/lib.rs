//! Test plans for the strobe testbench compiler.
//!
//! A [`TestPlan`] describes one test case of one hardware module: its input
//! and output [`Port`]s, the [`EventClock`]s that pace them, and scalar
//! module parameters. Ports accumulate samples through [`SignalDef`]s and
//! [`TestPlan::validate`] groups them into clock domains for synthesis.
//!
//! # Modules
//!
//! - `event_clock`: Tick index to absolute time mapping
//! - `port`: Ports and signal normalization (dense, sparse, packed)
//! - `plan`: The test plan container and domain grouping
//! - `helpers`: Timestamp- and cycle-oriented signal builders
//! - `error`: Configuration errors

#![warn(missing_docs)]

pub mod error;
pub mod event_clock;
pub mod helpers;
pub mod plan;
pub mod port;

pub use error::PlanError;
pub use event_clock::EventClock;
pub use helpers::{CycleHelper, SignalHelper};
pub use plan::{Domain, PortDecl, PortHandle, TestPlan, ValidatedPlan};
pub use port::{Port, PortDirection, SignalDef};
