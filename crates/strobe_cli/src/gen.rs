//! `strobe gen`: synthesize testbenches and preload tables.

use std::fs;
use std::path::PathBuf;

use strobe_synth::{synthesize, RenderOptions};

use crate::project::load_project;
use crate::{GenArgs, GlobalArgs};

/// Runs the `strobe gen` command.
///
/// Every selected test is synthesized into the output directory. The first
/// test that fails to build or validate aborts the run.
pub fn run(args: &GenArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let tests = project.select(args.test.as_deref())?;

    let mut out_dir = project.dir_or_output(args.out.as_deref());
    if out_dir.is_relative() {
        out_dir = std::env::current_dir()?.join(out_dir);
    }
    let options = RenderOptions {
        timescale: project.config.project.timescale.clone(),
        harness: project.config.project.harness,
        data_dir: Some(out_dir.clone()),
    };

    for test in &tests {
        let plan = strobe_config::build_plan(test)?;
        let artifacts = synthesize(&plan, &options)
            .map_err(|e| format!("{}/{}: {e}", test.module, test.name))?;
        let mut written = artifacts.write_to(&out_dir)?;
        if args.emit_ir {
            let path = out_dir.join(format!("{}.json", artifacts.ir.bench_name()));
            fs::write(&path, artifacts.ir_json()?)?;
            written.push(path);
        }

        if !global.quiet {
            eprintln!(
                "   Generated {} (stop time {})",
                file_names(&written),
                artifacts.stop_time()
            );
        }
    }

    if !global.quiet {
        eprintln!(
            "   Wrote {} testbench(es) to {}",
            tests.len(),
            out_dir.display()
        );
    }
    Ok(0)
}

fn file_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
