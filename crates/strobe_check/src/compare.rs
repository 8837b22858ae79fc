//! Masked comparison of captured outputs against expectations.

use std::collections::HashMap;
use std::path::Path;

use strobe_common::{BitVec, Logic};
use strobe_plan::{EventClock, ValidatedPlan};
use strobe_synth::{bus_layout, capture_file, BusSlice};

use crate::dump::read_dump;
use crate::error::CheckError;
use crate::report::{CheckReport, Mismatch};

/// Returns the positions where `actual` differs from `expected`.
///
/// An `x` in `expected` is a don't-care and never differs. Returns `None`
/// when the widths differ, which always counts as a mismatch.
pub fn mismatched_bits(actual: &BitVec, expected: &BitVec) -> Option<Vec<u32>> {
    if actual.width() != expected.width() {
        return None;
    }
    Some(
        expected
            .iter()
            .zip(actual.iter())
            .enumerate()
            .filter(|&(_, (e, a))| e != Logic::X && e != a)
            .map(|(i, _)| i as u32)
            .collect(),
    )
}

/// Returns true if `actual` matches `expected` outside its don't-care bits.
pub fn matches_masked(actual: &BitVec, expected: &BitVec) -> bool {
    mismatched_bits(actual, expected).is_some_and(|bits| bits.is_empty())
}

#[derive(Debug, Clone)]
struct ExpectedPort {
    slice: BusSlice,
    signed: bool,
    samples: Vec<BitVec>,
}

/// The expected captures of one clock domain.
#[derive(Debug, Clone)]
pub struct ExpectedDomain {
    clock_name: String,
    clock: EventClock,
    width: u32,
    rows: usize,
    ports: Vec<ExpectedPort>,
}

impl ExpectedDomain {
    /// The clock name.
    pub fn clock(&self) -> &str {
        &self.clock_name
    }

    /// Width of the captured bus.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of captured rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn check(&self, captured: &[BitVec], report: &mut CheckReport) -> Result<(), CheckError> {
        if captured.len() < self.rows {
            return Err(CheckError::ShortDump {
                clock: self.clock_name.clone(),
                rows: captured.len(),
                expected: self.rows,
            });
        }
        for (index, row) in captured.iter().take(self.rows).enumerate() {
            for port in &self.ports {
                let Some(expected) = port.samples.get(index) else {
                    continue;
                };
                let actual = row
                    .range(port.slice.offset, port.slice.width, port.signed)
                    .map_err(|source| CheckError::MalformedRow {
                        clock: self.clock_name.clone(),
                        line: index + 1,
                        source,
                    })?;
                let bits = mismatched_bits(&actual, expected);
                if bits.as_ref().is_some_and(Vec::is_empty) {
                    continue;
                }
                report.push(Mismatch {
                    port: port.slice.port.clone(),
                    time: self.clock.time(index as u64),
                    index,
                    expected: expected.clone(),
                    actual,
                    bits,
                });
            }
        }
        Ok(())
    }
}

/// Expected output samples of a test case, grouped by clock domain.
#[derive(Debug, Clone)]
pub struct Expectations {
    module: String,
    test: String,
    domains: Vec<ExpectedDomain>,
}

impl Expectations {
    /// Collects the expected samples of every output domain of `plan`.
    pub fn from_plan(plan: &ValidatedPlan<'_>) -> Self {
        let domains = plan
            .domains
            .iter()
            .filter(|d| !d.outputs.is_empty())
            .map(|d| {
                let (slices, width) = bus_layout(&d.outputs);
                let ports = slices
                    .into_iter()
                    .zip(&d.outputs)
                    .map(|(slice, port)| ExpectedPort {
                        slice,
                        signed: port.is_signed(),
                        samples: port.samples().to_vec(),
                    })
                    .collect();
                ExpectedDomain {
                    clock_name: d.name.to_string(),
                    clock: d.clock.clone(),
                    width,
                    rows: d.output_len(),
                    ports,
                }
            })
            .collect();
        Self {
            module: plan.plan.module_name().to_string(),
            test: plan.plan.test_name().to_string(),
            domains,
        }
    }

    /// The domains that capture outputs.
    pub fn domains(&self) -> &[ExpectedDomain] {
        &self.domains
    }

    /// Compares parsed dumps, keyed by clock name, against the expectations.
    pub fn check(&self, dumps: &HashMap<String, Vec<BitVec>>) -> Result<CheckReport, CheckError> {
        let mut report = CheckReport::default();
        for domain in &self.domains {
            let captured = dumps
                .get(&domain.clock_name)
                .ok_or_else(|| CheckError::MissingDump(domain.clock_name.clone()))?;
            domain.check(captured, &mut report)?;
        }
        tracing::debug!(
            module = %self.module,
            test = %self.test,
            mismatches = report.len(),
            "compared captures"
        );
        Ok(report)
    }

    /// Reads every domain's dump from `dir` and compares it.
    pub fn check_dir(&self, dir: &Path) -> Result<CheckReport, CheckError> {
        let mut dumps = HashMap::new();
        for domain in &self.domains {
            let path = dir.join(capture_file(&self.module, &self.test, &domain.clock_name));
            let rows = read_dump(&domain.clock_name, &path, domain.width)?;
            dumps.insert(domain.clock_name.clone(), rows);
        }
        self.check(&dumps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> BitVec {
        BitVec::from_string(s, s.len() as u32, false).unwrap()
    }

    #[test]
    fn unknown_expected_bits_are_dont_care() {
        assert!(matches_masked(&bits("1010"), &bits("10xx")));
        assert_eq!(mismatched_bits(&bits("1010"), &bits("10xx")), Some(vec![]));
    }

    #[test]
    fn known_bits_must_match() {
        assert!(!matches_masked(&bits("1110"), &bits("10xx")));
        assert_eq!(mismatched_bits(&bits("1110"), &bits("10xx")), Some(vec![1]));
    }

    #[test]
    fn captured_unknowns_fail_known_expectations() {
        assert_eq!(mismatched_bits(&bits("1x"), &bits("10")), Some(vec![1]));
        assert_eq!(mismatched_bits(&bits("z0"), &bits("z0")), Some(vec![]));
    }

    #[test]
    fn width_mismatch_always_fails() {
        assert_eq!(mismatched_bits(&bits("10"), &bits("x")), None);
        assert!(!matches_masked(&bits("1"), &bits("xx")));
    }
}
