//! Clock-domain layout: turns a validated plan into a [`TestbenchIr`].
//!
//! Per domain the layout decides the bus bit order (port declaration
//! order), the number of ticks to run, the preload rows and the tick
//! schedule. The stop time is the latest tick following a domain's last
//! capture, plus one.

use strobe_plan::{Domain, EventClock, Port, ValidatedPlan};

use crate::ir::{
    BusSlice, DomainRecord, InputBus, OutputBus, Parameter, Schedule, StaticDriver, TestbenchIr,
};
use crate::preload::preload_rows;

/// Builds the IR of a validated plan.
pub fn build_ir(plan: &ValidatedPlan<'_>) -> TestbenchIr {
    let statics = plan
        .statics
        .iter()
        .filter_map(|p| {
            p.initial_value().map(|init| StaticDriver {
                port: p.name().to_string(),
                width: p.width(),
                bits: init.to_string(),
            })
        })
        .collect();

    let domains = plan.domains.iter().map(domain_record).collect();

    TestbenchIr {
        module: plan.plan.module_name().to_string(),
        test: plan.plan.test_name().to_string(),
        parameters: plan
            .plan
            .parameters()
            .map(|(name, value)| Parameter {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect(),
        statics,
        domains,
        stop_time: stop_time(&plan.domains),
    }
}

/// Places `ports` side by side on one bus and returns the total width.
pub fn bus_layout(ports: &[&Port]) -> (Vec<BusSlice>, u32) {
    let mut offset = 0;
    let slices = ports
        .iter()
        .map(|p| {
            let slice = BusSlice {
                port: p.name().to_string(),
                offset,
                width: p.width(),
            };
            offset += p.width();
            slice
        })
        .collect();
    (slices, offset)
}

fn domain_record(domain: &Domain<'_>) -> DomainRecord {
    let duration = domain.duration();

    let input = (!domain.inputs.is_empty()).then(|| {
        let (ports, width) = bus_layout(&domain.inputs);
        let init = domain
            .inputs
            .iter()
            .map(|p| match p.initial_value() {
                Some(v) => v.to_string(),
                None => "x".repeat(p.width() as usize),
            })
            .collect();
        InputBus {
            ports,
            width,
            init,
            rows: preload_rows(&domain.inputs, duration),
        }
    });

    let output = (!domain.outputs.is_empty()).then(|| {
        let (ports, width) = bus_layout(&domain.outputs);
        OutputBus {
            ports,
            width,
            rows: domain.output_len(),
        }
    });

    let schedule = schedule(domain.clock, duration);
    tracing::debug!(
        clock = domain.name,
        duration,
        inputs = domain.inputs.len(),
        outputs = domain.outputs.len(),
        repeats = schedule.repeats,
        "laid out clock domain"
    );

    DomainRecord {
        clock: domain.name.to_string(),
        duration,
        schedule,
        input,
        output,
    }
}

/// Splits `duration` ticks of `clock` into prelude, loop and tail.
fn schedule(clock: &EventClock, duration: usize) -> Schedule {
    let steps = clock.steps().to_vec();
    let prelude: Vec<u64> = clock.prelude().iter().take(duration).copied().collect();
    let mut rest = duration - prelude.len();
    let start = u64::try_from(clock.offset()).ok().filter(|&o| o > 0);

    let mut repeats = 0;
    if rest > steps.len() {
        repeats = rest / steps.len();
        rest %= steps.len();
    }
    let tail = steps[..rest].to_vec();

    Schedule {
        start,
        prelude,
        repeats,
        steps,
        tail,
    }
}

fn stop_time(domains: &[Domain<'_>]) -> i64 {
    domains
        .iter()
        .filter(|d| !d.outputs.is_empty())
        .map(|d| d.clock.time(d.output_len() as u64))
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strobe_plan::{SignalDef, TestPlan};

    fn clock(steps: &[i64], offset: i64) -> EventClock {
        EventClock::new("ec", steps, offset).unwrap()
    }

    #[test]
    fn schedule_unrolls_short_runs() {
        let s = schedule(&clock(&[2, 3], 0), 2);
        assert_eq!(s.repeats, 0);
        assert_eq!(s.tail, [2, 3]);
        assert_eq!(s.start, None);
    }

    #[test]
    fn schedule_loops_long_runs() {
        let s = schedule(&clock(&[2, 3], 5), 7);
        assert_eq!(s.start, Some(5));
        assert_eq!(s.repeats, 3);
        assert_eq!(s.tail, [2]);
        assert_eq!(s.ticks(), 7);
    }

    #[test]
    fn schedule_uses_prelude_first() {
        let s = schedule(&clock(&[2, 3], -1), 5);
        assert_eq!(s.prelude, [1, 3]);
        assert_eq!(s.repeats, 0);
        assert_eq!(s.tail, [2, 3]);
        assert_eq!(s.start, None);

        let short = schedule(&clock(&[2, 3], -1), 1);
        assert_eq!(short.prelude, [1]);
        assert_eq!(short.ticks(), 1);
    }

    #[test]
    fn bus_layout_follows_declaration_order() {
        let plan = TestPlan::with_ports("m", "t", [("a", 3), ("b", 1), ("c", -4)], Vec::<&str>::new())
            .unwrap();
        let ports: Vec<&Port> = plan.inputs().iter().collect();
        let (slices, width) = bus_layout(&ports);
        assert_eq!(width, 8);
        let placed: Vec<(&str, u32, u32)> = slices
            .iter()
            .map(|s| (s.port.as_str(), s.offset, s.end()))
            .collect();
        assert_eq!(placed, [("a", 0, 2), ("b", 3, 3), ("c", 4, 7)]);
    }

    #[test]
    fn stop_time_covers_every_output_domain() {
        let mut plan = TestPlan::with_ports("m", "t", ["a"], ["x", "y"]).unwrap();
        plan.add_clock("fast", &[4], 0).unwrap();
        plan.add_clock("slow", &[7], 0).unwrap();
        plan.output("x")
            .and_then(|h| h.clock("fast"))
            .and_then(|h| h.expect(SignalDef::dense([0, 1, 0, 1])))
            .unwrap();
        plan.output("y")
            .and_then(|h| h.clock("slow"))
            .and_then(|h| h.expect(SignalDef::dense([1, 1, 1])))
            .unwrap();
        let ir = build_ir(&plan.validate().unwrap());
        // Last captures at 16 and 21.
        assert!(ir.stop_time >= 22);
        assert_eq!(ir.stop_time, 29);
    }

    #[test]
    fn input_only_plan_stops_immediately() {
        let mut plan = TestPlan::with_ports("m", "t", ["a"], Vec::<&str>::new()).unwrap();
        plan.add_clock("ec", &[1], 0).unwrap();
        plan.input("a")
            .and_then(|h| h.clock("ec"))
            .and_then(|h| h.drive(SignalDef::dense([0, 1])))
            .unwrap();
        assert_eq!(build_ir(&plan.validate().unwrap()).stop_time, 1);
    }

    #[test]
    fn domain_records_carry_buses() {
        let mut plan = TestPlan::with_ports("adder", "t", ["a", "b"], [("sum", 2)]).unwrap();
        plan.add_clock("ec", &[2], 0).unwrap();
        plan.input("a")
            .and_then(|h| h.clock("ec"))
            .and_then(|h| h.init(0))
            .and_then(|h| h.drive(SignalDef::dense([0, 1])))
            .unwrap();
        plan.input("b")
            .and_then(|h| h.clock("ec"))
            .and_then(|h| h.drive(SignalDef::dense([1, 1, 0])))
            .unwrap();
        plan.output("sum")
            .and_then(|h| h.clock("ec"))
            .and_then(|h| h.expect(SignalDef::dense([1, 2, 1, 1])))
            .unwrap();
        let ir = build_ir(&plan.validate().unwrap());
        let d = &ir.domains[0];
        assert_eq!(d.duration, 4);
        let input = d.input.as_ref().unwrap();
        assert_eq!(input.width, 2);
        assert_eq!(input.init, "0x");
        assert_eq!(input.rows, ["0_1_", "1_1_", "1_0_", "1_0_"]);
        let output = d.output.as_ref().unwrap();
        assert_eq!(output.rows, 4);
        assert_eq!(output.width, 2);
    }
}
