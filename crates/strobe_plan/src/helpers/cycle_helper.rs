//! Cycle-driven signal builder for ports with a fixed period.

use std::collections::BTreeMap;

use strobe_common::{BitVec, Value};

use super::{attach_samples, check_positive, find_shape, shapes_of, PortShape};
use crate::error::PlanError;
use crate::plan::TestPlan;
use crate::port::PortDirection;

#[derive(Debug, Clone)]
struct Cycle {
    interval: u64,
    /// Absolute time of the first tick of cycle 0.
    offset: i64,
    /// Tick offsets within a cycle, rebased so the first is 0.
    ticks: Vec<u64>,
    setup: Option<u64>,
}

impl Cycle {
    /// Tick offsets for outputs, with a setup check point inserted before
    /// each tick that follows its predecessor by more than the setup time.
    ///
    /// The second vector tells, per original tick, whether its value is
    /// expected twice (at the tick and at the following check point).
    fn output_ticks(&self) -> (Vec<u64>, Vec<bool>) {
        let mut ticks = vec![self.ticks[0]];
        let mut split = vec![false; self.ticks.len()];
        let Some(setup) = self.setup else {
            return (self.ticks.clone(), split);
        };
        for i in 1..self.ticks.len() {
            let (prev, tick) = (self.ticks[i - 1], self.ticks[i]);
            if tick > prev + setup {
                ticks.push(tick - setup);
                split[i - 1] = true;
            }
            ticks.push(tick);
        }
        let wrap = self.ticks[0] + self.interval;
        let last = self.ticks[self.ticks.len() - 1];
        if wrap > last + setup {
            ticks.push(wrap - setup);
            split[self.ticks.len() - 1] = true;
        }
        (ticks, split)
    }

    /// Step deltas and clock offset for a port whose first defined cycle is `first`.
    fn clock_for(&self, ticks: &[u64], first: u64) -> (Vec<i64>, i64) {
        let last = ticks[ticks.len() - 1];
        let interval = self.interval as i64;
        let steps: Vec<i64> = std::iter::once((ticks[0] + self.interval - last) as i64)
            .chain(ticks.windows(2).map(|w| (w[1] - w[0]) as i64))
            .collect();
        let offset = self.offset + (first as i64 - 1) * interval + last as i64;
        (steps, offset)
    }
}

/// Collects per-cycle values for ports paced by a fixed period.
///
/// Each port gets a cycle definition with [`add`](Self::add): an interval,
/// an offset, and the tick times within one cycle. Values are then given per
/// cycle index, one value per tick. Cycles skipped between the first and
/// last defined ones repeat the last value on inputs; on outputs they are
/// don't-care, or hold the last value when a setup time is configured.
#[derive(Debug, Clone)]
pub struct CycleHelper {
    ports: Vec<PortShape>,
    init: BTreeMap<String, BitVec>,
    cycles: BTreeMap<String, Cycle>,
    values: BTreeMap<String, BTreeMap<u64, Vec<BitVec>>>,
}

impl CycleHelper {
    /// Creates a helper for the ports declared on `plan`.
    pub fn new(plan: &TestPlan) -> Self {
        Self {
            ports: shapes_of(plan),
            init: BTreeMap::new(),
            cycles: BTreeMap::new(),
            values: BTreeMap::new(),
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

    /// Defines the cycle of `port`: ticks at `offset + c * interval + t` for
    /// every `t` in `ticks` and cycle index `c`.
    ///
    /// `ticks` must be strictly ascending and span less than one interval.
    pub fn add(
        &mut self,
        port: &str,
        interval: i64,
        offset: i64,
        ticks: &[i64],
    ) -> Result<&mut Self, PlanError> {
        let shape = self
            .ports
            .iter()
            .find(|s| s.name == port)
            .ok_or_else(|| PlanError::UnknownPort(port.to_string()))?;
        let period = check_positive(&shape.name, interval)?;
        let invalid = || PlanError::InvalidCycleTicks {
            port: port.to_string(),
            ticks: ticks.to_vec(),
            interval: period,
        };
        let first = *ticks.first().ok_or_else(invalid)?;
        if ticks.windows(2).any(|w| w[0] >= w[1]) || ticks[ticks.len() - 1] - first >= interval {
            return Err(invalid());
        }
        if self.cycles.contains_key(port) {
            return Err(PlanError::CycleAlreadyDefined(port.to_string()));
        }
        self.cycles.insert(
            port.to_string(),
            Cycle {
                interval: period,
                offset: offset + first,
                ticks: ticks.iter().map(|&t| (t - first) as u64).collect(),
                setup: None,
            },
        );
        Ok(self)
    }

    /// Drives an input during `cycle`, one value per tick.
    pub fn input<V: Into<Value>>(
        &mut self,
        port: &str,
        cycle: u64,
        values: impl IntoIterator<Item = V>,
        force: bool,
    ) -> Result<&mut Self, PlanError> {
        self.record(PortDirection::Input, port, cycle, values, force)
    }

    /// Expects an output during `cycle`, one value per tick.
    pub fn output<V: Into<Value>>(
        &mut self,
        port: &str,
        cycle: u64,
        values: impl IntoIterator<Item = V>,
        force: bool,
    ) -> Result<&mut Self, PlanError> {
        self.record(PortDirection::Output, port, cycle, values, force)
    }

    fn record<V: Into<Value>>(
        &mut self,
        direction: PortDirection,
        port: &str,
        cycle: u64,
        values: impl IntoIterator<Item = V>,
        force: bool,
    ) -> Result<&mut Self, PlanError> {
        let shape = find_shape(&self.ports, port, direction)?;
        let definition = self
            .cycles
            .get(port)
            .ok_or_else(|| PlanError::CycleNotDefined(port.to_string()))?;
        let bits = values
            .into_iter()
            .map(|v| shape.encode(v))
            .collect::<Result<Vec<_>, _>>()?;
        if bits.len() != definition.ticks.len() {
            return Err(PlanError::TickCountMismatch {
                port: port.to_string(),
                values: bits.len(),
                ticks: definition.ticks.len(),
            });
        }
        let cycles = self.values.entry(port.to_string()).or_default();
        if cycles.contains_key(&cycle) && !force {
            return Err(PlanError::DuplicateEvent {
                port: port.to_string(),
                at: cycle,
            });
        }
        cycles.insert(cycle, bits);
        Ok(self)
    }

    /// Expects each output value to already hold `setup_time` before the
    /// next tick, and makes skipped cycles hold the last value.
    pub fn fill_output(&mut self, port: &str, setup_time: i64) -> Result<&mut Self, PlanError> {
        let setup = check_positive(port, setup_time)?;
        find_shape(&self.ports, port, PortDirection::Output)?;
        let cycle = self
            .cycles
            .get_mut(port)
            .ok_or_else(|| PlanError::CycleNotDefined(port.to_string()))?;
        cycle.setup = Some(setup);
        Ok(self)
    }

    /// Applies initial values and attaches every port's cycles to `plan`.
    ///
    /// The first tick of each port must fall after time zero.
    pub fn attach(&self, plan: &mut TestPlan) -> Result<(), PlanError> {
        for (port, bits) in &self.init {
            plan.input(port)?.init(bits.clone())?;
        }
        for shape in &self.ports {
            let Some(values) = self.values.get(&shape.name) else {
                continue;
            };
            let (Some((&first, first_values)), Some(&last)) =
                (values.iter().next(), values.keys().next_back())
            else {
                continue;
            };
            let cycle = self
                .cycles
                .get(&shape.name)
                .ok_or_else(|| PlanError::CycleNotDefined(shape.name.clone()))?;

            let start = cycle.offset + first as i64 * cycle.interval as i64;
            if start <= 0 {
                return Err(PlanError::InvalidTime {
                    port: shape.name.clone(),
                    time: start,
                });
            }

            let mut held = first_values.last().cloned();
            let mut samples = Vec::new();
            let ticks = match shape.direction {
                PortDirection::Input => {
                    for c in first..=last {
                        match values.get(&c) {
                            Some(vs) => {
                                samples.extend(vs.iter().cloned());
                                held = vs.last().cloned();
                            }
                            None => samples.extend(held.iter().cycle().take(cycle.ticks.len()).cloned()),
                        }
                    }
                    cycle.ticks.clone()
                }
                PortDirection::Output => {
                    let (ticks, split) = cycle.output_ticks();
                    for c in first..=last {
                        match values.get(&c) {
                            Some(vs) => {
                                for (v, &twice) in vs.iter().zip(&split) {
                                    samples.push(v.clone());
                                    if twice {
                                        samples.push(v.clone());
                                    }
                                }
                                held = vs.last().cloned();
                            }
                            None if cycle.setup.is_some() => {
                                samples.extend(held.iter().cycle().take(ticks.len()).cloned())
                            }
                            None => {
                                let unknown = shape.unknown()?;
                                samples.extend(std::iter::repeat(unknown).take(ticks.len()));
                            }
                        }
                    }
                    ticks
                }
            };

            let (steps, offset) = cycle.clock_for(&ticks, first);
            tracing::debug!(port = %shape.name, ?steps, offset, samples = samples.len(), "attaching cycle clock");
            attach_samples(plan, shape, &steps, offset, samples)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adder() -> TestPlan {
        TestPlan::with_ports("adder", "cycle_test", ["clk", "a", "b"], [("sum", 2)]).unwrap()
    }

    fn times(plan: &TestPlan, clock: &str, n: u64) -> Vec<i64> {
        let clock = plan.clock(clock).unwrap();
        (0..n).map(|k| clock.time(k)).collect()
    }

    fn samples(plan: &TestPlan, port: &str) -> Vec<String> {
        plan.port(port)
            .unwrap()
            .samples()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn inputs_repeat_last_value_across_gaps() {
        let mut plan = adder();
        let mut ch = CycleHelper::new(&plan);
        ch.add("a", 10, 0, &[1])
            .unwrap()
            .input("a", 0, [0], false)
            .unwrap()
            .input("a", 3, [1], false)
            .unwrap()
            .input("a", 5, [0], false)
            .unwrap();
        ch.attach(&mut plan).unwrap();

        assert_eq!(times(&plan, "ec_a", 6), [1, 11, 21, 31, 41, 51]);
        assert_eq!(samples(&plan, "a"), ["0", "0", "0", "1", "1", "0"]);
    }

    #[test]
    fn multi_tick_inputs() {
        let mut plan = adder();
        let mut ch = CycleHelper::new(&plan);
        ch.add("b", 20, 0, &[3, 7])
            .unwrap()
            .input("b", 0, [0, 1], false)
            .unwrap()
            .input("b", 2, [1, 0], false)
            .unwrap();
        ch.attach(&mut plan).unwrap();

        assert_eq!(times(&plan, "ec_b", 6), [3, 7, 23, 27, 43, 47]);
        assert_eq!(samples(&plan, "b"), ["0", "1", "1", "1", "1", "0"]);
    }

    #[test]
    fn later_first_cycle_shifts_the_clock() {
        let mut plan = adder();
        let mut ch = CycleHelper::new(&plan);
        ch.add("a", 10, 0, &[1])
            .unwrap()
            .input("a", 2, [1], false)
            .unwrap();
        ch.attach(&mut plan).unwrap();
        assert_eq!(times(&plan, "ec_a", 2), [21, 31]);
    }

    #[test]
    fn outputs_with_setup_time() {
        let mut plan = adder();
        let mut ch = CycleHelper::new(&plan);
        ch.add("sum", 20, 0, &[6, 16])
            .unwrap()
            .output("sum", 0, [0, 1], false)
            .unwrap()
            .output("sum", 2, [2, 0], false)
            .unwrap()
            .fill_output("sum", 2)
            .unwrap();
        ch.attach(&mut plan).unwrap();

        assert_eq!(times(&plan, "ec_sum", 8), [6, 14, 16, 24, 26, 34, 36, 44]);
        assert_eq!(
            samples(&plan, "sum"),
            ["00", "00", "01", "01", "01", "01", "01", "01", "10", "10", "00", "00"]
        );
    }

    #[test]
    fn outputs_without_setup_skip_gaps() {
        let mut plan = adder();
        let mut ch = CycleHelper::new(&plan);
        ch.add("sum", 20, 0, &[6, 16])
            .unwrap()
            .output("sum", 0, [0, 1], false)
            .unwrap()
            .output("sum", 2, [2, 0], false)
            .unwrap();
        ch.attach(&mut plan).unwrap();

        assert_eq!(times(&plan, "ec_sum", 4), [6, 16, 26, 36]);
        assert_eq!(samples(&plan, "sum"), ["00", "01", "xx", "xx", "10", "00"]);
    }

    #[test]
    fn rejects_bad_definitions() {
        let plan = adder();
        let mut ch = CycleHelper::new(&plan);
        assert!(matches!(
            ch.add("a", 10, 0, &[]),
            Err(PlanError::InvalidCycleTicks { .. })
        ));
        assert!(matches!(
            ch.add("a", 10, 0, &[3, 3]),
            Err(PlanError::InvalidCycleTicks { .. })
        ));
        assert!(matches!(
            ch.add("a", 10, 0, &[1, 11]),
            Err(PlanError::InvalidCycleTicks { .. })
        ));
        assert!(matches!(
            ch.add("nope", 10, 0, &[1]),
            Err(PlanError::UnknownPort(_))
        ));
        assert!(matches!(
            ch.input("a", 0, [1], false),
            Err(PlanError::CycleNotDefined(_))
        ));
        ch.add("a", 10, 0, &[1]).unwrap();
        assert_eq!(
            ch.add("a", 10, 0, &[2]).unwrap_err(),
            PlanError::CycleAlreadyDefined("a".into())
        );
        assert!(matches!(
            ch.input("a", 0, [1, 0], false),
            Err(PlanError::TickCountMismatch {
                values: 2,
                ticks: 1,
                ..
            })
        ));
        ch.input("a", 0, [1], false).unwrap();
        assert!(matches!(
            ch.input("a", 0, [0], false),
            Err(PlanError::DuplicateEvent { at: 0, .. })
        ));
        ch.input("a", 0, [0], true).unwrap();
    }

    #[test]
    fn first_tick_must_follow_time_zero() {
        let mut plan = adder();
        let mut ch = CycleHelper::new(&plan);
        ch.add("a", 10, -5, &[5])
            .unwrap()
            .input("a", 0, [1], false)
            .unwrap();
        assert_eq!(
            ch.attach(&mut plan).unwrap_err(),
            PlanError::InvalidTime {
                port: "a".into(),
                time: 0
            }
        );
    }
}
