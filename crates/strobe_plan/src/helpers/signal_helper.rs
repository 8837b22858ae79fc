//! Timestamp-driven signal builder: values at absolute times.

use std::collections::BTreeMap;

use strobe_common::{BitVec, Value};

use super::{attach_samples, check_positive, find_shape, shapes_of, PortShape};
use crate::error::PlanError;
use crate::plan::TestPlan;
use crate::port::PortDirection;

/// Collects `(time → value)` events per port with no fixed clock period.
///
/// ```ignore
/// let mut sh = SignalHelper::new(&plan);
/// sh.input(1, [("a", 0), ("b", 0)], false)?
///     .input(11, [("b", 1)], false)?
///     .output(6, [("sum", 0)], false)?;
/// sh.attach(&mut plan)?;
/// ```
#[derive(Debug, Clone)]
pub struct SignalHelper {
    ports: Vec<PortShape>,
    init: BTreeMap<String, BitVec>,
    events: BTreeMap<String, BTreeMap<u64, BitVec>>,
}

impl SignalHelper {
    /// Creates a helper for the ports declared on `plan`.
    pub fn new(plan: &TestPlan) -> Self {
        Self {
            ports: shapes_of(plan),
            init: BTreeMap::new(),
            events: BTreeMap::new(),
        }
    }

    /// Sets initial values of inputs.
    pub fn init<'a, V: Into<Value>>(
        &mut self,
        values: impl IntoIterator<Item = (&'a str, V)>,
    ) -> Result<&mut Self, PlanError> {
        for (port, value) in values {
            let shape = find_shape(&self.ports, port, PortDirection::Input)?;
            if self.init.contains_key(port) {
                return Err(PlanError::InitialValueAlreadySet(port.to_string()));
            }
            let bits = shape.encode(value)?;
            self.init.insert(port.to_string(), bits);
        }
        Ok(self)
    }

    /// Drives inputs to new values at time `ts`.
    ///
    /// Without `force`, a second value for the same port and time is an error.
    pub fn input<'a, V: Into<Value>>(
        &mut self,
        ts: i64,
        values: impl IntoIterator<Item = (&'a str, V)>,
        force: bool,
    ) -> Result<&mut Self, PlanError> {
        self.record(PortDirection::Input, ts, values, force)
    }

    /// Expects outputs to hold values at time `ts`.
    pub fn output<'a, V: Into<Value>>(
        &mut self,
        ts: i64,
        values: impl IntoIterator<Item = (&'a str, V)>,
        force: bool,
    ) -> Result<&mut Self, PlanError> {
        self.record(PortDirection::Output, ts, values, force)
    }

    fn record<'a, V: Into<Value>>(
        &mut self,
        direction: PortDirection,
        ts: i64,
        values: impl IntoIterator<Item = (&'a str, V)>,
        force: bool,
    ) -> Result<&mut Self, PlanError> {
        for (port, value) in values {
            let shape = find_shape(&self.ports, port, direction)?;
            let at = check_positive(port, ts)?;
            let bits = shape.encode(value)?;
            let events = self.events.entry(port.to_string()).or_default();
            if events.contains_key(&at) && !force {
                return Err(PlanError::DuplicateEvent {
                    port: port.to_string(),
                    at,
                });
            }
            events.insert(at, bits);
        }
        Ok(self)
    }

    /// Re-checks an output `setup_time` before each expected change.
    ///
    /// For every gap longer than `setup_time` between consecutive expected
    /// values, the earlier value is also expected at `next - setup_time`.
    pub fn fill_output(&mut self, port: &str, setup_time: i64) -> Result<&mut Self, PlanError> {
        let setup = check_positive(port, setup_time)?;
        find_shape(&self.ports, port, PortDirection::Output)?;
        let Some(events) = self.events.get_mut(port) else {
            return Ok(self);
        };
        let times: Vec<u64> = events.keys().copied().collect();
        for pair in times.windows(2) {
            let (last, next) = (pair[0], pair[1]);
            if next > last + setup {
                if let Some(held) = events.get(&last).cloned() {
                    events.insert(next - setup, held);
                }
            }
        }
        Ok(self)
    }

    /// Applies initial values and attaches every port's events to `plan`.
    pub fn attach(&self, plan: &mut TestPlan) -> Result<(), PlanError> {
        for (port, bits) in &self.init {
            plan.input(port)?.init(bits.clone())?;
        }
        for shape in &self.ports {
            let Some(events) = self.events.get(&shape.name).filter(|e| !e.is_empty()) else {
                continue;
            };
            let times: Vec<i64> = events.keys().map(|&t| t as i64).collect();
            let steps: Vec<i64> = times
                .iter()
                .take(1)
                .copied()
                .chain(times.windows(2).map(|w| w[1] - w[0]))
                .collect();
            attach_samples(plan, shape, &steps, 0, events.values().cloned().collect())?;
        }
        Ok(())
    }
}
