//! Configuration file loading and validation.

use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::{SignalSpec, StrobeConfig};

/// The configuration file name looked up in a project directory.
pub const CONFIG_FILE: &str = "strobe.toml";

/// Loads and validates `strobe.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<StrobeConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<StrobeConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<StrobeConfig, ConfigError> {
    let config: StrobeConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates required fields, test name uniqueness and signal shapes.
fn validate_config(config: &StrobeConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (i, test) in config.tests.iter().enumerate() {
        if test.module.is_empty() {
            return Err(ConfigError::MissingField(format!("test[{i}].module")));
        }
        if test.name.is_empty() {
            return Err(ConfigError::MissingField(format!("test[{i}].name")));
        }
        if !seen.insert((test.module.as_str(), test.name.as_str())) {
            return Err(ConfigError::DuplicateTest {
                module: test.module.clone(),
                test: test.name.clone(),
            });
        }
        for signal in &test.signals {
            validate_signal(&test.name, signal)?;
        }
    }
    Ok(())
}

fn validate_signal(test: &str, signal: &SignalSpec) -> Result<(), ConfigError> {
    let shapes = [
        signal.dense.is_some(),
        signal.sparse.is_some(),
        signal.packed.is_some(),
    ];
    if shapes.iter().filter(|&&s| s).count() > 1 {
        return Err(ConfigError::ValidationError(format!(
            "test '{test}', port '{}': only one of dense, sparse or packed may be given",
            signal.port
        )));
    }
    if let Some(sparse) = &signal.sparse {
        if let Some(key) = sparse.keys().find(|k| k.parse::<usize>().is_err()) {
            return Err(ConfigError::ValidationError(format!(
                "test '{test}', port '{}': sparse index '{key}' is not a sample index",
                signal.port
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamValue, PortSpec, StepsSpec, ValueSpec};
    use strobe_synth::Harness;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[[test]]
module = "adder"
name = "sum_test"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.tests.len(), 1);
        assert_eq!(config.tests[0].module, "adder");
        assert_eq!(config.project.output_dir, "build");
        assert_eq!(config.project.timescale, "1ns/100ps");
        assert_eq!(config.project.harness, Harness::Vunit);
        assert!(!config.project.report_all_errors);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
output_dir = "__autogen__"
timescale = "1ns/1ps"
harness = "plain"
report_all_errors = true

[[test]]
module = "adder"
name = "sum_test"
inputs = ["clk", "a", { name = "b", width = -4 }]
outputs = [{ name = "sum", width = 2 }]
parameters = { WIDTH = 2, MODE = "fast", EN = true }
report_all_errors = false

[test.clocks.ec]
steps = [2, 3]
offset = -1

[test.clocks.ec_clk]
steps = 5

[[test.signals]]
port = "a"
clock = "ec"
init = 0
dense = [0, 1, "x", true]

[[test.signals]]
port = "b"
sparse = { "2" = -3 }
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.output_dir, "__autogen__");
        assert_eq!(config.project.harness, Harness::Plain);
        assert!(config.project.report_all_errors);

        let test = &config.tests[0];
        assert_eq!(test.inputs[0], PortSpec::Name("clk".into()));
        assert_eq!(
            test.inputs[2],
            PortSpec::Sized {
                name: "b".into(),
                width: -4
            }
        );
        let params: Vec<(&str, String)> = test
            .parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_string()))
            .collect();
        assert_eq!(params, [("WIDTH", "2".into()), ("MODE", "fast".into()), ("EN", "1".into())]);
        assert_eq!(test.parameters[0].1, ParamValue::Int(2));
        assert_eq!(test.clocks["ec"].steps, StepsSpec::List(vec![2, 3]));
        assert_eq!(test.clocks["ec"].offset, -1);
        assert_eq!(test.clocks["ec_clk"].steps.to_vec(), [5]);
        assert_eq!(test.report_all_errors, Some(false));

        let a = &test.signals[0];
        assert_eq!(a.init, Some(ValueSpec::Int(0)));
        assert_eq!(
            a.dense.as_deref(),
            Some(
                &[
                    ValueSpec::Int(0),
                    ValueSpec::Int(1),
                    ValueSpec::Bits("x".into()),
                    ValueSpec::Bool(true)
                ][..]
            )
        );
        assert_eq!(test.signals[1].sparse.as_ref().unwrap()["2"], ValueSpec::Int(-3));
    }

    #[test]
    fn missing_module_errors() {
        let toml = r#"
[[test]]
module = ""
name = "t"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn duplicate_test_errors() {
        let toml = r#"
[[test]]
module = "adder"
name = "t"

[[test]]
module = "mul"
name = "t"

[[test]]
module = "adder"
name = "t"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateTest { ref module, ref test } if module == "adder" && test == "t"
        ));
    }

    #[test]
    fn conflicting_signal_shapes_error() {
        let toml = r#"
[[test]]
module = "adder"
name = "t"
inputs = ["a"]

[[test.signals]]
port = "a"
dense = [1]
packed = "ff"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_sparse_index_errors() {
        let toml = r#"
[[test]]
module = "adder"
name = "t"
inputs = ["a"]

[[test.signals]]
port = "a"
sparse = { "two" = 1 }
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("'two'")));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
