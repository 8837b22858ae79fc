//! `strobe check`: compare capture dumps against expected outputs.

use strobe_check::{CheckReport, Expectations, ReportMode};
use strobe_config::TestDef;

use crate::project::load_project;
use crate::{CheckArgs, GlobalArgs};

/// Outcome of checking one test.
struct TestResult {
    /// `module/name` of the test.
    name: String,
    /// Mismatches found, if the comparison ran.
    report: Option<CheckReport>,
    /// Why the comparison could not run.
    error: Option<String>,
    /// How mismatches of this test are reported.
    mode: ReportMode,
}

impl TestResult {
    fn passed(&self) -> bool {
        self.error.is_none() && self.report.as_ref().is_some_and(CheckReport::passed)
    }
}

/// Runs the `strobe check` command.
///
/// Reads the capture dumps of every selected test from the dump directory,
/// prints per-test status and the reported mismatches, plus a summary.
/// Returns exit code 0 if all pass, 1 if any fail.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let tests = project.select(args.test.as_deref())?;
    let dump_dir = project.dir_or_output(args.dump_dir.as_deref());

    let mut results = Vec::with_capacity(tests.len());
    for test in tests {
        let report_all = args.all
            || test
                .report_all_errors
                .unwrap_or(project.config.project.report_all_errors);
        let mut result = TestResult {
            name: format!("{}/{}", test.module, test.name),
            report: None,
            error: None,
            mode: ReportMode::from_flag(report_all),
        };
        match check_test(test, &dump_dir) {
            Ok(report) => result.report = Some(report),
            Err(e) => result.error = Some(e.to_string()),
        }
        if !global.quiet {
            print_result(&result);
        }
        results.push(result);
    }

    let passed = results.iter().filter(|r| r.passed()).count();
    let failed = results.len() - passed;
    if !global.quiet {
        eprintln!();
        eprintln!(
            "   Result: {passed} passed, {failed} failed out of {} test(s)",
            results.len()
        );
    }

    if failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn check_test(
    test: &TestDef,
    dump_dir: &std::path::Path,
) -> Result<CheckReport, Box<dyn std::error::Error>> {
    let plan = strobe_config::build_plan(test)?;
    let validated = plan.validate()?;
    let expectations = Expectations::from_plan(&validated);
    Ok(expectations.check_dir(dump_dir)?)
}

fn print_result(result: &TestResult) {
    if result.passed() {
        eprintln!("   PASS  {}", result.name);
        return;
    }
    eprintln!("   FAIL  {}", result.name);
    if let Some(ref err) = result.error {
        eprintln!("         {err}");
    }
    if let Some(ref report) = result.report {
        for mismatch in report.reported(result.mode) {
            eprintln!("{mismatch}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use strobe_config::CONFIG_FILE;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[[test]]
module = "adder"
name = "sum_test"
inputs = ["a"]
outputs = [{ name = "sum", width = 2 }]

[test.clocks.ec]
steps = [2]

[[test.signals]]
port = "a"
clock = "ec"
dense = [0, 1]

[[test.signals]]
port = "sum"
clock = "ec"
dense = ["xx", 1, 2]
"#;

    fn setup(dump: Option<&str>) -> (TempDir, GlobalArgs) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), CONFIG).unwrap();
        if let Some(dump) = dump {
            let build = tmp.path().join("build");
            fs::create_dir_all(&build).unwrap();
            fs::write(build.join("tb_adder_sum_test_ec.out"), dump).unwrap();
        }
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(tmp.path().to_str().unwrap().to_string()),
        };
        (tmp, global)
    }

    fn args() -> CheckArgs {
        CheckArgs {
            test: None,
            dump_dir: None,
            all: false,
        }
    }

    #[test]
    fn matching_dump_exits_zero() {
        let (_tmp, global) = setup(Some("// header\n11\n01\n10\n"));
        assert_eq!(run(&args(), &global).unwrap(), 0);
    }

    #[test]
    fn mismatching_dump_exits_one() {
        let (_tmp, global) = setup(Some("00\n01\n11\n"));
        assert_eq!(run(&args(), &global).unwrap(), 1);
    }

    #[test]
    fn missing_dump_fails_the_test() {
        let (_tmp, global) = setup(None);
        assert_eq!(run(&args(), &global).unwrap(), 1);
    }
}
