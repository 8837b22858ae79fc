//! SystemVerilog rendering of a [`TestbenchIr`].
//!
//! The emitted module instantiates the unit under test, forks one process
//! per clock domain plus a watcher that raises `AUTOGEN_TEST_DONE` at the
//! stop time, and dumps every capture table once the flag is up.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ir::{capture_file, preload_file, DomainRecord, TestbenchIr};

/// How the testbench is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Harness {
    /// A VUnit test suite with a single test case named after the test.
    #[default]
    Vunit,
    /// A bare module that dumps its captures and calls `$finish`.
    Plain,
}

/// Rendering options shared by every test case of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emitted `` `timescale `` directive.
    pub timescale: String,
    /// Testbench framing.
    pub harness: Harness,
    /// Directory prefixed to preload and capture file paths, if any.
    pub data_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timescale: "1ns/100ps".to_string(),
            harness: Harness::Vunit,
            data_dir: None,
        }
    }
}

/// Renders the testbench source for `ir`.
pub fn render(ir: &TestbenchIr, options: &RenderOptions) -> String {
    Testbench { ir, options }.to_string()
}

struct Testbench<'a> {
    ir: &'a TestbenchIr,
    options: &'a RenderOptions,
}

impl Testbench<'_> {
    fn data_path(&self, file: String) -> String {
        match &self.options.data_dir {
            Some(dir) => dir.join(file).display().to_string().replace('\\', "\\\\"),
            None => file,
        }
    }

    fn declarations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.ir.statics {
            writeln!(
                f,
                "wire[0:{}] AUTOGEN_static_{} = {}'b{};",
                s.width - 1,
                s.port,
                s.width,
                s.bits
            )?;
        }
        for d in &self.ir.domains {
            writeln!(f, "integer {};", d.counter())?;
            if let Some(input) = &d.input {
                writeln!(f, "logic[0:{}] {};", input.width - 1, d.input_bus())?;
                writeln!(
                    f,
                    "logic[0:{}] {}[0:{}];",
                    input.width - 1,
                    d.input_table(),
                    input.rows.len().saturating_sub(1)
                )?;
            }
            if let Some(output) = &d.output {
                writeln!(f, "wire[0:{}] {};", output.width - 1, d.output_bus())?;
                writeln!(
                    f,
                    "logic[0:{}] {}[0:{}];",
                    output.width - 1,
                    d.output_table(),
                    output.rows.saturating_sub(1)
                )?;
            }
        }
        Ok(())
    }

    fn initializers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.ir.domains {
            if let Some(input) = &d.input {
                writeln!(f, "  {} = {}'b{};", d.input_bus(), input.width, input.init)?;
                let path = self.data_path(preload_file(&self.ir.module, &self.ir.test, &d.clock));
                writeln!(f, "  $readmemb(\"{path}\", {});", d.input_table())?;
            }
        }
        Ok(())
    }

    fn tick(&self, f: &mut fmt::Formatter<'_>, d: &DomainRecord, delay: u64) -> fmt::Result {
        let cnt = d.counter();
        writeln!(f, "      #{delay}")?;
        if let Some(input) = &d.input {
            writeln!(f, "        if ({cnt} < {})", input.rows.len())?;
            writeln!(f, "        begin")?;
            writeln!(f, "          {} = {}[{cnt}];", d.input_bus(), d.input_table())?;
            writeln!(f, "        end")?;
        }
        if let Some(output) = &d.output {
            writeln!(f, "        if ({cnt} < {})", output.rows)?;
            writeln!(f, "        begin")?;
            writeln!(f, "          {}[{cnt}] = {};", d.output_table(), d.output_bus())?;
            writeln!(f, "        end")?;
        }
        writeln!(f, "        {cnt} = {cnt} + 1;")
    }

    fn process(&self, f: &mut fmt::Formatter<'_>, d: &DomainRecord) -> fmt::Result {
        let schedule = &d.schedule;
        writeln!(f, "    begin")?;
        match schedule.start {
            Some(delay) => writeln!(f, "      #{delay} {} = 0;", d.counter())?,
            None => writeln!(f, "      {} = 0;", d.counter())?,
        }
        for &delay in &schedule.prelude {
            self.tick(f, d, delay)?;
        }
        if schedule.repeats > 0 {
            writeln!(f, "      repeat ({})", schedule.repeats)?;
            writeln!(f, "      begin")?;
            for &step in &schedule.steps {
                self.tick(f, d, step)?;
            }
            writeln!(f, "      end")?;
        }
        for &step in &schedule.tail {
            self.tick(f, d, step)?;
        }
        writeln!(f, "    end")
    }

    fn instance(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.ir.module)?;
        if !self.ir.parameters.is_empty() {
            let params: Vec<String> = self
                .ir
                .parameters
                .iter()
                .map(|p| format!("    .{}({})", p.name, p.value))
                .collect();
            writeln!(f, "  #(")?;
            writeln!(f, "{}", params.join(",\n"))?;
            writeln!(f, "  )")?;
        }

        let mut connections = Vec::new();
        for s in &self.ir.statics {
            connections.push(format!("    .{0}(AUTOGEN_static_{0}[0:{1}])", s.port, s.width - 1));
        }
        for d in &self.ir.domains {
            let buses = [
                (d.input.as_ref().map(|b| &b.ports), d.input_bus()),
                (d.output.as_ref().map(|b| &b.ports), d.output_bus()),
            ];
            for (ports, bus) in buses {
                for slice in ports.into_iter().flatten() {
                    connections.push(format!(
                        "    .{}({bus}[{}:{}])",
                        slice.port,
                        slice.offset,
                        slice.end()
                    ));
                }
            }
        }
        writeln!(f, "  uut")?;
        writeln!(f, "  (")?;
        if !connections.is_empty() {
            writeln!(f, "{}", connections.join(",\n"))?;
        }
        writeln!(f, "  );")
    }

    fn dumps(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        for d in self.ir.domains.iter().filter(|d| d.output.is_some()) {
            let path = self.data_path(capture_file(&self.ir.module, &self.ir.test, &d.clock));
            writeln!(f, "{indent}$writememb(\"{path}\", {});", d.output_table())?;
        }
        Ok(())
    }

    fn epilogue(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.options.harness {
            Harness::Vunit => {
                writeln!(f, "`TEST_SUITE")?;
                writeln!(f, "begin")?;
                writeln!(f, "  `TEST_CASE(\"{}\")", self.ir.test)?;
                writeln!(f, "  begin")?;
                writeln!(f, "    while(1) begin")?;
                writeln!(f, "      #1 if (AUTOGEN_TEST_DONE) begin")?;
                writeln!(f, "        break;")?;
                writeln!(f, "      end")?;
                writeln!(f, "    end")?;
                self.dumps(f, "    ")?;
                writeln!(f, "  end")?;
                writeln!(f, "end")
            }
            Harness::Plain => {
                writeln!(f, "initial")?;
                writeln!(f, "begin")?;
                writeln!(f, "  wait (AUTOGEN_TEST_DONE);")?;
                self.dumps(f, "  ")?;
                writeln!(f, "  $finish;")?;
                writeln!(f, "end")
            }
        }
    }
}

impl fmt::Display for Testbench<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "`timescale {}", self.options.timescale)?;
        if self.options.harness == Harness::Vunit {
            writeln!(f, "`include \"vunit_defines.svh\"")?;
        }
        writeln!(f)?;
        writeln!(f, "module {};", self.ir.bench_name())?;
        writeln!(f)?;
        writeln!(f, "logic AUTOGEN_TEST_DONE;")?;
        self.declarations(f)?;
        writeln!(f)?;
        writeln!(f, "initial")?;
        writeln!(f, "begin")?;
        writeln!(f, "  AUTOGEN_TEST_DONE = 1'b0;")?;
        self.initializers(f)?;
        writeln!(f, "  fork")?;
        writeln!(f, "  begin")?;
        writeln!(f, "    #{} AUTOGEN_TEST_DONE = 1'b1;", self.ir.stop_time)?;
        writeln!(f, "  end")?;
        for d in &self.ir.domains {
            self.process(f, d)?;
        }
        writeln!(f, "  join")?;
        writeln!(f, "end")?;
        writeln!(f)?;
        self.instance(f)?;
        writeln!(f)?;
        self.epilogue(f)?;
        writeln!(f)?;
        writeln!(f, "endmodule")
    }
}
