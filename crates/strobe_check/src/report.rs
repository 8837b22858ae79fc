//! Comparison reports and mismatch formatting.

use std::collections::BTreeMap;
use std::fmt;

use strobe_common::BitVec;

/// Which mismatches a report prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Only the mismatches at the earliest failing time.
    #[default]
    Earliest,
    /// Every mismatch, in time order.
    All,
}

impl ReportMode {
    /// Selects [`ReportMode::All`] when `report_all` is set.
    pub fn from_flag(report_all: bool) -> Self {
        if report_all {
            Self::All
        } else {
            Self::Earliest
        }
    }
}

/// One output sample that did not match its expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Output port name.
    pub port: String,
    /// Absolute time of the capture.
    pub time: i64,
    /// Sample index on the port's clock.
    pub index: usize,
    /// Expected value.
    pub expected: BitVec,
    /// Captured value.
    pub actual: BitVec,
    /// Differing bit positions, or `None` if the widths differ.
    pub bits: Option<Vec<u32>>,
}

fn describe(v: &BitVec) -> String {
    let w = v.width();
    match v.to_integer() {
        Ok(n) if n < 0 => format!("{w}'d{n} ({w}'h-{:x}) ({w}'b{v})", n.unsigned_abs()),
        Ok(n) => format!("{w}'d{n} ({w}'h{n:x}) ({w}'b{v})"),
        Err(_) => format!("{w}'b{v}"),
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} @{} ({}x) expected:", self.port, self.time, self.index)?;
        writeln!(f, ">> {}", describe(&self.expected))?;
        writeln!(f, "actual:")?;
        writeln!(f, ">> {}", describe(&self.actual))?;
        match &self.bits {
            Some(bits) => {
                let list: Vec<String> = bits.iter().map(ToString::to_string).collect();
                write!(f, "mismatched bits: {}", list.join(", "))
            }
            None => write!(
                f,
                "width mismatch: {} != {}",
                self.actual.width(),
                self.expected.width()
            ),
        }
    }
}

/// The outcome of comparing one test case's captures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    by_time: BTreeMap<i64, Vec<Mismatch>>,
}

impl CheckReport {
    /// Records a mismatch.
    pub fn push(&mut self, mismatch: Mismatch) {
        self.by_time.entry(mismatch.time).or_default().push(mismatch);
    }

    /// Returns true if nothing mismatched.
    pub fn passed(&self) -> bool {
        self.by_time.is_empty()
    }

    /// Total number of mismatches.
    pub fn len(&self) -> usize {
        self.by_time.values().map(Vec::len).sum()
    }

    /// Returns true if no mismatch was recorded.
    pub fn is_empty(&self) -> bool {
        self.passed()
    }

    /// Time of the earliest mismatch.
    pub fn first_failure(&self) -> Option<i64> {
        self.by_time.keys().next().copied()
    }

    /// The mismatches to print under `mode`, in time order.
    pub fn reported(&self, mode: ReportMode) -> impl Iterator<Item = &Mismatch> {
        let take = match mode {
            ReportMode::All => self.by_time.len(),
            ReportMode::Earliest => 1,
        };
        self.by_time.values().take(take).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str, signed: bool) -> BitVec {
        BitVec::from_string(s, s.len() as u32, signed).unwrap()
    }

    fn mismatch(port: &str, time: i64) -> Mismatch {
        Mismatch {
            port: port.into(),
            time,
            index: 0,
            expected: bits("01", false),
            actual: bits("10", false),
            bits: Some(vec![0, 1]),
        }
    }

    #[test]
    fn message_format() {
        let m = Mismatch {
            port: "sum".into(),
            time: 16,
            index: 1,
            expected: bits("1010", false),
            actual: bits("1x10", false),
            bits: Some(vec![1]),
        };
        assert_eq!(
            m.to_string(),
            "sum @16 (1x) expected:\n>> 4'd10 (4'ha) (4'b1010)\nactual:\n>> 4'b1x10\nmismatched bits: 1"
        );
    }

    #[test]
    fn signed_values_show_sign() {
        assert_eq!(describe(&bits("1011", true)), "4'd-5 (4'h-5) (4'b1011)");
    }

    #[test]
    fn earliest_mode_reports_first_time_only() {
        let mut report = CheckReport::default();
        report.push(mismatch("b", 20));
        report.push(mismatch("a", 10));
        report.push(mismatch("c", 10));
        assert!(!report.passed());
        assert_eq!(report.len(), 3);
        assert_eq!(report.first_failure(), Some(10));

        let earliest: Vec<&str> = report
            .reported(ReportMode::Earliest)
            .map(|m| m.port.as_str())
            .collect();
        assert_eq!(earliest, ["a", "c"]);
        let all: Vec<&str> = report
            .reported(ReportMode::All)
            .map(|m| m.port.as_str())
            .collect();
        assert_eq!(all, ["a", "c", "b"]);
    }

    #[test]
    fn empty_report_passes() {
        let report = CheckReport::default();
        assert!(report.passed());
        assert_eq!(report.reported(ReportMode::All).count(), 0);
        assert_eq!(ReportMode::from_flag(true), ReportMode::All);
    }
}
