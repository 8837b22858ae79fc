//! Strobe CLI: generates SystemVerilog testbenches from `strobe.toml` test
//! plans and checks the capture dumps a simulator leaves behind.
//!
//! `strobe gen` writes one testbench and its preload tables per test case;
//! `strobe check` compares the dumped capture tables against the expected
//! outputs and exits non-zero if any test fails.

#![warn(missing_docs)]

mod check;
mod gen;
mod project;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Strobe: a testbench compiler for HDL modules.
#[derive(Parser, Debug)]
#[command(name = "strobe", version, about = "Strobe testbench compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `strobe.toml` file or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate testbenches and preload tables.
    Gen(GenArgs),
    /// Compare capture dumps against the expected outputs.
    Check(CheckArgs),
}

/// Arguments for the `strobe gen` subcommand.
#[derive(Parser, Debug)]
pub struct GenArgs {
    /// Only generate this test (`name` or `module/name`).
    #[arg(short, long)]
    pub test: Option<String>,

    /// Output directory (default: `project.output_dir`).
    #[arg(short, long)]
    pub out: Option<String>,

    /// Also write the laid-out testbench as JSON.
    #[arg(long)]
    pub emit_ir: bool,
}

/// Arguments for the `strobe check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Only check this test (`name` or `module/name`).
    #[arg(short, long)]
    pub test: Option<String>,

    /// Directory holding the capture dumps (default: `project.output_dir`).
    #[arg(short, long)]
    pub dump_dir: Option<String>,

    /// Report every mismatch instead of only the earliest ones.
    #[arg(short, long)]
    pub all: bool,
}

/// Global flags resolved from the command line.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Suppress all output except errors.
    pub quiet: bool,
    /// Enable verbose output.
    pub verbose: bool,
    /// Path to a custom configuration file or directory.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Gen(ref args) => gen::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// level picked by `--quiet`/`--verbose`.
fn init_logging(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}
