//! Configuration types deserialized from `strobe.toml`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use strobe_common::Value;
use strobe_synth::Harness;

/// The top-level configuration parsed from `strobe.toml`.
#[derive(Debug, Deserialize)]
pub struct StrobeConfig {
    /// Settings shared by every test case.
    #[serde(default)]
    pub project: ProjectSettings,
    /// Test cases, in file order.
    #[serde(default, rename = "test")]
    pub tests: Vec<TestDef>,
}

/// Settings shared by every test case.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSettings {
    /// Directory generated files are written to, relative to the config file.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Emitted `` `timescale `` directive.
    #[serde(default = "default_timescale")]
    pub timescale: String,
    /// Testbench framing.
    #[serde(default)]
    pub harness: Harness,
    /// Report every mismatch instead of only the earliest ones.
    #[serde(default)]
    pub report_all_errors: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timescale: default_timescale(),
            harness: Harness::default(),
            report_all_errors: false,
        }
    }
}

fn default_output_dir() -> String {
    "build".to_string()
}

fn default_timescale() -> String {
    "1ns/100ps".to_string()
}

/// One test case of one module.
#[derive(Debug, Clone, Deserialize)]
pub struct TestDef {
    /// The module under test.
    pub module: String,
    /// The test case name.
    pub name: String,
    /// Input ports in bus order.
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    /// Output ports in bus order.
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
    /// Module parameter overrides, in file order.
    #[serde(default, deserialize_with = "deserialize_ordered_params")]
    pub parameters: Vec<(String, ParamValue)>,
    /// Event clocks, by name.
    #[serde(default)]
    pub clocks: BTreeMap<String, ClockSpec>,
    /// Signal definitions, applied in file order.
    #[serde(default)]
    pub signals: Vec<SignalSpec>,
    /// Overrides `project.report_all_errors` for this test.
    #[serde(default)]
    pub report_all_errors: Option<bool>,
}

/// Deserializes a parameter table into a list that keeps the file order.
fn deserialize_ordered_params<'de, D>(
    deserializer: D,
) -> Result<Vec<(String, ParamValue)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedParams;

    impl<'de> Visitor<'de> for OrderedParams {
        type Value = Vec<(String, ParamValue)>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a table of parameter values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut params = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                params.push(entry);
            }
            Ok(params)
        }
    }

    deserializer.deserialize_map(OrderedParams)
}

/// A port declaration: a bare name (1 bit) or a name with a width.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    /// A 1-bit unsigned port.
    Name(String),
    /// A port with an explicit width; negative means signed.
    Sized {
        /// The port name.
        name: String,
        /// The width.
        width: i64,
    },
}

/// A module parameter value, emitted verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A boolean, emitted as `1` or `0`.
    Bool(bool),
    /// Any other text, such as `"8'hff"` or a string literal.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{}", u8::from(*b)),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Event clock steps: one period or a repeating list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StepsSpec {
    /// A single period.
    Period(i64),
    /// A repeating list of step deltas.
    List(Vec<i64>),
}

impl StepsSpec {
    /// Returns the steps as a list.
    pub fn to_vec(&self) -> Vec<i64> {
        match self {
            StepsSpec::Period(p) => vec![*p],
            StepsSpec::List(steps) => steps.clone(),
        }
    }
}

/// An event clock definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockSpec {
    /// Step deltas.
    pub steps: StepsSpec,
    /// Time offset; negative anchors the first period before time zero.
    #[serde(default)]
    pub offset: i64,
}

/// A single sample as written in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    /// An integer.
    Int(i64),
    /// A single bit.
    Bool(bool),
    /// A bit string, or `"x"`/`"z"`.
    Bits(String),
    /// One boolean per bit.
    Bools(Vec<bool>),
}

impl From<&ValueSpec> for Value {
    fn from(spec: &ValueSpec) -> Self {
        match spec {
            ValueSpec::Int(n) => Value::from(*n),
            ValueSpec::Bool(b) => Value::from(*b),
            ValueSpec::Bits(s) => Value::from(s.as_str()),
            ValueSpec::Bools(bs) => Value::from(bs.clone()),
        }
    }
}

/// Signal settings for one port.
///
/// At most one of `dense`, `sparse` and `packed` may be given. Entries for
/// the same port concatenate in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalSpec {
    /// The port name.
    pub port: String,
    /// Clock to attach the port to.
    #[serde(default)]
    pub clock: Option<String>,
    /// Initial value of an input.
    #[serde(default)]
    pub init: Option<ValueSpec>,
    /// Samples in order.
    #[serde(default)]
    pub dense: Option<Vec<ValueSpec>>,
    /// Samples by index; keys are decimal sample indices.
    #[serde(default)]
    pub sparse: Option<BTreeMap<String, ValueSpec>>,
    /// Hex-encoded bytes sliced into port-width samples.
    #[serde(default)]
    pub packed: Option<String>,
}
