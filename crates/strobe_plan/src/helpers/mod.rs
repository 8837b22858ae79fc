//! Builders that derive event clocks from timestamps or fixed periods.
//!
//! Writing event clocks and sample indices by hand is error-prone when a
//! test is naturally expressed as "at time 11 set `b` to 1" or "every 20
//! time units, at offsets 3 and 7". The helpers collect such events and
//! [`attach`](SignalHelper::attach) them to a [`TestPlan`], creating one
//! clock named `ec_<port>` per port.

mod cycle_helper;
mod signal_helper;

pub use cycle_helper::CycleHelper;
pub use signal_helper::SignalHelper;

use strobe_common::{BitVec, Value};

use crate::error::PlanError;
use crate::plan::TestPlan;
use crate::port::{PortDirection, SignalDef};

/// The declared shape of a port, captured when a helper is created.
#[derive(Debug, Clone)]
struct PortShape {
    name: String,
    direction: PortDirection,
    width: u32,
    signed: bool,
}

impl PortShape {
    fn encode(&self, value: impl Into<Value>) -> Result<BitVec, PlanError> {
        value
            .into()
            .to_bit_vec(self.width, self.signed)
            .map_err(PlanError::value(&self.name))
    }

    fn unknown(&self) -> Result<BitVec, PlanError> {
        BitVec::unknown(self.width, self.signed).map_err(PlanError::value(&self.name))
    }
}

fn shapes_of(plan: &TestPlan) -> Vec<PortShape> {
    plan.inputs()
        .iter()
        .chain(plan.outputs())
        .map(|p| PortShape {
            name: p.name().to_string(),
            direction: p.direction(),
            width: p.width(),
            signed: p.is_signed(),
        })
        .collect()
}

fn find_shape<'a>(
    shapes: &'a [PortShape],
    port: &str,
    direction: PortDirection,
) -> Result<&'a PortShape, PlanError> {
    let shape = shapes
        .iter()
        .find(|s| s.name == port)
        .ok_or_else(|| PlanError::UnknownPort(port.to_string()))?;
    if shape.direction != direction {
        return Err(PlanError::WrongDirection {
            port: port.to_string(),
            expected: direction.as_str(),
            actual: shape.direction.as_str(),
        });
    }
    Ok(shape)
}

/// Creates `ec_<port>` and appends `samples` to the port on that clock.
fn attach_samples(
    plan: &mut TestPlan,
    shape: &PortShape,
    steps: &[i64],
    offset: i64,
    samples: Vec<BitVec>,
) -> Result<(), PlanError> {
    let clock = format!("ec_{}", shape.name);
    plan.add_clock(&clock, steps, offset)?;
    let signal = SignalDef::Dense(samples.into_iter().map(Value::Bits).collect());
    match shape.direction {
        PortDirection::Input => plan.input(&shape.name)?.clock(&clock)?.drive(signal)?,
        PortDirection::Output => plan.output(&shape.name)?.clock(&clock)?.expect(signal)?,
    };
    Ok(())
}

fn check_positive(port: &str, time: i64) -> Result<u64, PlanError> {
    u64::try_from(time)
        .ok()
        .filter(|&t| t > 0)
        .ok_or_else(|| PlanError::InvalidTime {
            port: port.to_string(),
            time,
        })
}
