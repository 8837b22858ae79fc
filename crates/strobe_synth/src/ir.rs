//! Intermediate representation of a synthesized testbench.
//!
//! The IR is the complete, text-free description of what the renderer
//! emits: one [`DomainRecord`] per clock domain with its bus layouts,
//! preload rows and tick schedule, plus static drivers, module parameters
//! and the global stop time. It is plain data and serializes to JSON.

use serde::Serialize;

/// A synthesized test case, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestbenchIr {
    /// The module under test.
    pub module: String,
    /// The test case name.
    pub test: String,
    /// Module parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Clock-less inputs held at a constant value.
    pub statics: Vec<StaticDriver>,
    /// One record per clock domain, in clock declaration order.
    pub domains: Vec<DomainRecord>,
    /// Time at which the done flag is raised.
    pub stop_time: i64,
}

/// A module parameter override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Value, emitted verbatim.
    pub value: String,
}

/// An input driven to a constant for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticDriver {
    /// Port name.
    pub port: String,
    /// Port width.
    pub width: u32,
    /// The constant value as a bit string.
    pub bits: String,
}

/// The placement of one port on a domain bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusSlice {
    /// Port name.
    pub port: String,
    /// Index of the port's most significant bit on the bus.
    pub offset: u32,
    /// Port width.
    pub width: u32,
}

impl BusSlice {
    /// Index of the port's least significant bit on the bus.
    pub fn end(&self) -> u32 {
        self.offset + self.width - 1
    }
}

/// The input side of a clock domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputBus {
    /// Port placements in declaration order.
    pub ports: Vec<BusSlice>,
    /// Total bus width.
    pub width: u32,
    /// Bus value before the first tick.
    pub init: String,
    /// Preload rows, one per tick; each port's bits are followed by `_`.
    pub rows: Vec<String>,
}

/// The output side of a clock domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputBus {
    /// Port placements in declaration order.
    pub ports: Vec<BusSlice>,
    /// Total bus width.
    pub width: u32,
    /// Rows in the capture table.
    pub rows: usize,
}

/// When a domain's process fires, relative to the previous action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Delay before the counter is reset, when the clock offset is positive.
    pub start: Option<u64>,
    /// Delays of prelude ticks that are used.
    pub prelude: Vec<u64>,
    /// Number of full step cycles emitted as a loop.
    pub repeats: usize,
    /// The clock's step pattern.
    pub steps: Vec<u64>,
    /// Leading steps emitted after the loop.
    pub tail: Vec<u64>,
}

impl Schedule {
    /// Total number of ticks the schedule fires.
    pub fn ticks(&self) -> usize {
        self.prelude.len() + self.repeats * self.steps.len() + self.tail.len()
    }
}

/// One clock domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainRecord {
    /// Clock name.
    pub clock: String,
    /// Number of ticks the domain runs for.
    pub duration: usize,
    /// Tick schedule.
    pub schedule: Schedule,
    /// Driven inputs, if any.
    pub input: Option<InputBus>,
    /// Captured outputs, if any.
    pub output: Option<OutputBus>,
}

impl DomainRecord {
    /// Name of the tick counter.
    pub fn counter(&self) -> String {
        format!("AUTOGEN_{}_cnt", self.clock)
    }

    /// Name of the input bus register.
    pub fn input_bus(&self) -> String {
        format!("AUTOGEN_{}_input", self.clock)
    }

    /// Name of the preload table.
    pub fn input_table(&self) -> String {
        format!("AUTOGEN_{}_input_data", self.clock)
    }

    /// Name of the output bus wire.
    pub fn output_bus(&self) -> String {
        format!("AUTOGEN_{}_output", self.clock)
    }

    /// Name of the capture table.
    pub fn output_table(&self) -> String {
        format!("AUTOGEN_{}_output_data", self.clock)
    }
}

/// Name of the testbench module for a test case.
pub fn bench_name(module: &str, test: &str) -> String {
    format!("tb_{module}_{test}")
}

/// File name of the generated testbench.
pub fn testbench_file(module: &str, test: &str) -> String {
    format!("{}.sv", bench_name(module, test))
}

/// File name of a domain's preload table.
pub fn preload_file(module: &str, test: &str, clock: &str) -> String {
    format!("{}_{clock}.in", bench_name(module, test))
}

/// File name of a domain's capture dump.
pub fn capture_file(module: &str, test: &str, clock: &str) -> String {
    format!("{}_{clock}.out", bench_name(module, test))
}

impl TestbenchIr {
    /// Name of the testbench module.
    pub fn bench_name(&self) -> String {
        bench_name(&self.module, &self.test)
    }
}
