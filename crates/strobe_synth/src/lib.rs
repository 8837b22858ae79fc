//! Testbench synthesis for the strobe testbench compiler.
//!
//! [`synthesize`] validates a [`TestPlan`], lays its clock domains out into
//! a [`TestbenchIr`], renders the SystemVerilog testbench and builds one
//! preload table per domain that drives inputs. The result is an
//! [`Artifacts`] bundle that can be written to a directory.
//!
//! # Usage
//!
//! ```ignore
//! use strobe_synth::{synthesize, RenderOptions};
//!
//! let artifacts = synthesize(&plan, &RenderOptions::default())?;
//! artifacts.write_to(Path::new("build"))?;
//! ```
//!
//! # Modules
//!
//! - `ir`: The intermediate representation and file naming
//! - `layout`: Clock-domain layout, schedules and the stop time
//! - `preload`: Preload table rows
//! - `render`: SystemVerilog text emission
//! - `error`: Synthesis error types

#![warn(missing_docs)]

pub mod error;
pub mod ir;
pub mod layout;
pub mod preload;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use strobe_plan::TestPlan;

pub use error::SynthError;
pub use ir::{
    capture_file, preload_file, testbench_file, BusSlice, DomainRecord, InputBus, OutputBus,
    TestbenchIr,
};
pub use layout::{build_ir, bus_layout};
pub use render::{render, Harness, RenderOptions};

/// A generated file: its name and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name, relative to the output directory.
    pub name: String,
    /// File contents.
    pub contents: String,
}

/// Everything generated for one test case.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// The laid-out testbench.
    pub ir: TestbenchIr,
    /// The testbench source.
    pub testbench: GeneratedFile,
    /// One preload table per domain with inputs.
    pub preloads: Vec<GeneratedFile>,
}

impl Artifacts {
    /// Time at which the testbench raises its done flag.
    pub fn stop_time(&self) -> i64 {
        self.ir.stop_time
    }

    /// Serializes the IR as pretty-printed JSON.
    pub fn ir_json(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(&self.ir)?)
    }

    /// Writes the testbench and preload tables into `dir`, creating it if needed.
    ///
    /// Returns the written paths, testbench first.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, SynthError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(1 + self.preloads.len());
        for file in std::iter::once(&self.testbench).chain(&self.preloads) {
            let path = dir.join(&file.name);
            fs::write(&path, &file.contents)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Synthesizes the testbench and preload tables of one test case.
///
/// Fails if the plan does not validate; nothing is emitted in that case.
pub fn synthesize(plan: &TestPlan, options: &RenderOptions) -> Result<Artifacts, SynthError> {
    let validated = plan.validate()?;
    let ir = build_ir(&validated);

    let preloads = ir
        .domains
        .iter()
        .filter_map(|d| {
            d.input.as_ref().map(|input| GeneratedFile {
                name: preload_file(&ir.module, &ir.test, &d.clock),
                contents: preload::render_table(&input.rows),
            })
        })
        .collect();
    let testbench = GeneratedFile {
        name: testbench_file(&ir.module, &ir.test),
        contents: render(&ir, options),
    };

    tracing::debug!(
        module = %ir.module,
        test = %ir.test,
        domains = ir.domains.len(),
        stop_time = ir.stop_time,
        "synthesized testbench"
    );

    Ok(Artifacts {
        ir,
        testbench,
        preloads,
    })
}
