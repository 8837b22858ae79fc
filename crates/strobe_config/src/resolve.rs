//! Turns parsed test definitions into [`TestPlan`]s.

use strobe_common::Value;
use strobe_plan::{PlanError, PortDecl, PortDirection, SignalDef, TestPlan};

use crate::error::ConfigError;
use crate::types::{PortSpec, SignalSpec, StrobeConfig, TestDef};

/// Builds the plans of every test case, in file order.
pub fn build_plans(config: &StrobeConfig) -> Result<Vec<TestPlan>, ConfigError> {
    config.tests.iter().map(build_plan).collect()
}

/// Builds the plan of one test case.
///
/// Ports are declared first, then parameters and clocks, then signal
/// entries are applied in file order.
pub fn build_plan(test: &TestDef) -> Result<TestPlan, ConfigError> {
    let plan_err = |source| ConfigError::Plan {
        test: test.name.clone(),
        source,
    };

    let mut plan = TestPlan::with_ports(
        test.module.as_str(),
        test.name.as_str(),
        test.inputs.iter().map(port_decl),
        test.outputs.iter().map(port_decl),
    )
    .map_err(plan_err)?;
    for (name, value) in &test.parameters {
        plan.set_parameter(name.as_str(), value).map_err(plan_err)?;
    }
    for (name, clock) in &test.clocks {
        plan.add_clock(name, &clock.steps.to_vec(), clock.offset)
            .map_err(plan_err)?;
    }
    for spec in &test.signals {
        let signal = signal_def(&test.name, spec)?;
        apply_signal(&mut plan, spec, signal).map_err(plan_err)?;
    }

    tracing::debug!(
        module = %test.module,
        test = %test.name,
        inputs = plan.inputs().len(),
        outputs = plan.outputs().len(),
        "built test plan"
    );
    Ok(plan)
}

fn port_decl(spec: &PortSpec) -> PortDecl {
    match spec {
        PortSpec::Name(name) => PortDecl::from(name.as_str()),
        PortSpec::Sized { name, width } => PortDecl::from((name.as_str(), *width)),
    }
}

fn signal_def(test: &str, spec: &SignalSpec) -> Result<Option<SignalDef>, ConfigError> {
    if let Some(values) = &spec.dense {
        return Ok(Some(SignalDef::dense(values.iter().map(Value::from))));
    }
    if let Some(entries) = &spec.sparse {
        let entries = entries
            .iter()
            .map(|(k, v)| {
                k.parse::<usize>().map(|i| (i, Value::from(v))).map_err(|_| {
                    ConfigError::ValidationError(format!(
                        "test '{test}', port '{}': sparse index '{k}' is not a sample index",
                        spec.port
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(SignalDef::sparse(entries)));
    }
    if let Some(hex) = &spec.packed {
        return decode_hex(hex)
            .map(|bytes| Some(SignalDef::packed(bytes)))
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "test '{test}', port '{}': packed value '{hex}' is not an even number of hex digits",
                    spec.port
                ))
            });
    }
    Ok(None)
}

fn apply_signal(
    plan: &mut TestPlan,
    spec: &SignalSpec,
    signal: Option<SignalDef>,
) -> Result<(), PlanError> {
    let direction = plan
        .port(&spec.port)
        .map(|p| p.direction())
        .ok_or_else(|| PlanError::UnknownPort(spec.port.clone()))?;
    let mut handle = match direction {
        PortDirection::Input => plan.input(&spec.port)?,
        PortDirection::Output => plan.output(&spec.port)?,
    };
    if let Some(clock) = &spec.clock {
        handle = handle.clock(clock)?;
    }
    if let Some(init) = &spec.init {
        handle = handle.init(Value::from(init))?;
    }
    match (signal, direction) {
        (Some(signal), PortDirection::Input) => {
            handle.drive(signal)?;
        }
        (Some(signal), PortDirection::Output) => {
            handle.expect(signal)?;
        }
        (None, _) => {}
    }
    Ok(())
}

/// Decodes hex digits, ignoring `_` and whitespace.
fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text
        .chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const ADDER: &str = r#"
[[test]]
module = "adder"
name = "sum_test"
inputs = ["clk", "a", "b"]
outputs = [{ name = "sum", width = 2 }]
parameters = { WIDTH = 2 }

[test.clocks.ec]
steps = [2]

[[test.signals]]
port = "a"
clock = "ec"
init = 0
dense = [0, 1]

[[test.signals]]
port = "a"
sparse = { "4" = 1 }

[[test.signals]]
port = "b"
init = 1

[[test.signals]]
port = "sum"
clock = "ec"
dense = ["xx", 1, 2]
"#;

    #[test]
    fn parameters_keep_file_order() {
        let toml = r#"
[[test]]
module = "fifo"
name = "order"
parameters = { ZED = 1, ALPHA = "fast", MID = true }
"#;
        let config = load_config_from_str(toml).unwrap();
        let plans = build_plans(&config).unwrap();
        assert_eq!(
            plans[0].parameters().collect::<Vec<_>>(),
            [("ZED", "1"), ("ALPHA", "fast"), ("MID", "1")]
        );
    }

    #[test]
    fn builds_plan_in_file_order() {
        let config = load_config_from_str(ADDER).unwrap();
        let plans = build_plans(&config).unwrap();
        let plan = &plans[0];
        assert_eq!(plan.module_name(), "adder");
        assert_eq!(plan.parameters().collect::<Vec<_>>(), [("WIDTH", "2")]);

        let a: Vec<String> = plan
            .port("a")
            .unwrap()
            .samples()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(a, ["0", "1", "1", "1", "1"]);
        assert_eq!(plan.port("b").unwrap().samples().len(), 0);
        assert_eq!(plan.port("sum").unwrap().samples().len(), 3);

        let validated = plan.validate().unwrap();
        assert_eq!(validated.statics.len(), 1);
        assert_eq!(validated.domains.len(), 1);
    }

    #[test]
    fn plan_errors_name_the_test() {
        let toml = r#"
[[test]]
module = "adder"
name = "broken"
inputs = ["a"]

[[test.signals]]
port = "a"
clock = "nope"
"#;
        let config = load_config_from_str(toml).unwrap();
        let err = build_plans(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Plan {
                ref test,
                source: PlanError::UnknownClock { .. }
            } if test == "broken"
        ));
    }

    #[test]
    fn packed_signals_decode_hex() {
        let toml = r#"
[[test]]
module = "m"
name = "t"
inputs = [{ name = "nib", width = 4 }]

[test.clocks.ec]
steps = 1

[[test.signals]]
port = "nib"
clock = "ec"
packed = "d_f"
"#;
        let config = load_config_from_str(toml);
        // "d_f" is three digits once separators are dropped.
        let err = build_plans(&config.unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        assert_eq!(decode_hex("df_01"), Some(vec![0xdf, 0x01]));
        assert_eq!(decode_hex("zz"), None);
    }

    #[test]
    fn packed_signals_slice_into_samples() {
        let toml = r#"
[[test]]
module = "m"
name = "t"
inputs = [{ name = "nib", width = 4 }]

[test.clocks.ec]
steps = 1

[[test.signals]]
port = "nib"
clock = "ec"
packed = "df"
"#;
        let plans = build_plans(&load_config_from_str(toml).unwrap()).unwrap();
        let samples: Vec<String> = plans[0]
            .port("nib")
            .unwrap()
            .samples()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(samples, ["1101", "1111"]);
    }
}
