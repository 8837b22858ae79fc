//! Event clocks: deterministic tick generators with a repeating step pattern.
//!
//! An [`EventClock`] fires on every step of a repeating list of positive
//! deltas, starting `offset` time units after time zero. Sample `k` of any
//! port attached to the clock takes effect at [`EventClock::time`]`(k)`.
//!
//! A negative offset anchors the first period before time zero. Ticks at or
//! before time zero are discarded and the surviving ticks of that first,
//! truncated period form the *prelude*. Offsets are wrapped into `(-L, 0]`
//! (`L` being the cycle length) before the prelude is built, so the prelude
//! of a negative-offset clock is never empty and every tick after time zero
//! is kept no matter how many periods the offset spans.

use serde::Serialize;

use crate::error::PlanError;

/// A repeating tick pattern with an integer time offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventClock {
    steps: Vec<u64>,
    /// Effective offset: as given when non-negative, else wrapped into `(-L, 0]`.
    offset: i64,
    /// Delays of the prelude ticks; the first is measured from time zero.
    prelude: Vec<u64>,
    /// Exclusive prefix sums of `steps`.
    cumulative: Vec<u64>,
}

impl EventClock {
    /// Creates a clock from its step deltas and offset.
    ///
    /// `name` is only used for error reporting. Every step must be positive.
    pub fn new(name: &str, steps: &[i64], offset: i64) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::EmptySteps(name.to_string()));
        }
        let steps = steps
            .iter()
            .map(|&s| {
                u64::try_from(s)
                    .ok()
                    .filter(|&s| s > 0)
                    .ok_or_else(|| PlanError::InvalidStep {
                        clock: name.to_string(),
                        step: s,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let overflow = || PlanError::ClockOverflow(name.to_string());
        let cycle = steps
            .iter()
            .try_fold(0u64, |acc, &s| acc.checked_add(s))
            .and_then(|sum| i64::try_from(sum).ok())
            .ok_or_else(overflow)?;
        // Truncating remainder keeps the sign of a negative offset: (-L, 0].
        let offset = if offset >= 0 {
            offset.checked_add(cycle).ok_or_else(overflow)?;
            offset
        } else {
            offset % cycle
        };

        let mut prelude = Vec::new();
        if offset < 0 {
            let mut t = offset;
            for &s in &steps {
                t += s as i64;
                if t > 0 {
                    prelude.push(t as u64);
                    t = 0;
                }
            }
        }

        let cumulative = steps
            .iter()
            .scan(0u64, |acc, &s| {
                let start = *acc;
                *acc += s;
                Some(start)
            })
            .collect();

        Ok(Self {
            steps,
            offset,
            prelude,
            cumulative,
        })
    }

    /// Creates a clock that ticks every `period` time units.
    pub fn periodic(name: &str, period: i64) -> Result<Self, PlanError> {
        Self::new(name, &[period], 0)
    }

    /// Returns the repeating step deltas.
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    /// Returns the effective offset.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Returns the prelude as delays, the first measured from time zero.
    pub fn prelude(&self) -> &[u64] {
        &self.prelude
    }

    /// Returns the sum of all steps.
    pub fn cycle_length(&self) -> u64 {
        self.steps.iter().sum()
    }

    /// Returns the absolute time of the zero-based sample index `k`.
    ///
    /// Saturates at `i64::MAX` for ticks past the end of the time range.
    pub fn time(&self, k: u64) -> i64 {
        let n = self.steps.len() as u128;
        let mut idx = u128::from(k) + 1;
        let base = if self.offset >= 0 {
            self.offset as u128
        } else {
            let p = self.prelude.len() as u128;
            if idx <= p {
                return self.prelude[..idx as usize].iter().sum::<u64>() as i64;
            }
            idx -= p;
            u128::from(self.prelude.iter().sum::<u64>())
        };
        // Cannot overflow u128: idx <= 2^64 and every other term is below 2^63.
        let periods = (idx / n) * u128::from(self.cycle_length());
        let t = base + periods + u128::from(self.cumulative[(idx % n) as usize]);
        i64::try_from(t).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(steps: &[i64], offset: i64) -> EventClock {
        EventClock::new("ec", steps, offset).unwrap()
    }

    fn times(c: &EventClock, n: u64) -> Vec<i64> {
        (0..n).map(|k| c.time(k)).collect()
    }

    #[test]
    fn positive_offset_example() {
        let c = clock(&[2, 3], 5);
        assert_eq!(times(&c, 4), [7, 10, 12, 15]);
    }

    #[test]
    fn zero_offset_fires_at_end_of_first_step() {
        let c = clock(&[4], 0);
        assert!(c.prelude().is_empty());
        assert_eq!(times(&c, 3), [4, 8, 12]);
    }

    #[test]
    fn irregular_steps() {
        let c = clock(&[16, 1, 19, 1], 0);
        assert_eq!(times(&c, 6), [16, 17, 36, 37, 53, 54]);
    }

    #[test]
    fn negative_offset_prelude() {
        let c = clock(&[2, 3], -1);
        assert_eq!(c.offset(), -1);
        assert_eq!(c.prelude(), [1, 3]);
        assert_eq!(times(&c, 6), [1, 4, 6, 9, 11, 14]);
    }

    #[test]
    fn negative_offset_skips_ticks_before_zero() {
        // Ticks at -1 (dropped), 2, 4, 7, 9.
        let c = clock(&[2, 3], -3);
        assert_eq!(c.prelude(), [2]);
        assert_eq!(times(&c, 4), [2, 4, 7, 9]);
    }

    #[test]
    fn tick_exactly_at_zero_is_dropped() {
        // Ticks at 0 (dropped), 3, 5, 8.
        let c = clock(&[2, 3], -2);
        assert_eq!(c.prelude(), [3]);
        assert_eq!(times(&c, 3), [3, 5, 8]);
    }

    #[test]
    fn negative_offset_beyond_one_cycle_wraps() {
        // -12 wraps to -2: the unwrapped clock ticks at ..., 0, 3, 5, 8.
        let wrapped = clock(&[2, 3], -12);
        assert_eq!(wrapped.offset(), -2);
        assert_eq!(times(&wrapped, 3), times(&clock(&[2, 3], -2), 3));
        assert!(!wrapped.prelude().is_empty());
    }

    #[test]
    fn whole_cycle_negative_offset_is_zero() {
        let c = clock(&[2, 3], -10);
        assert_eq!(c.offset(), 0);
        assert!(c.prelude().is_empty());
        assert_eq!(c.time(0), 2);
    }

    #[test]
    fn rejects_non_positive_steps() {
        assert_eq!(
            EventClock::new("ec", &[2, 0], 0),
            Err(PlanError::InvalidStep {
                clock: "ec".into(),
                step: 0
            })
        );
        assert!(matches!(
            EventClock::new("ec", &[-1], 0),
            Err(PlanError::InvalidStep { step: -1, .. })
        ));
        assert_eq!(
            EventClock::new("ec", &[], 0),
            Err(PlanError::EmptySteps("ec".into()))
        );
    }

    #[test]
    fn rejects_cycle_length_overflow() {
        assert_eq!(
            EventClock::new("ec", &[i64::MAX, i64::MAX, 2], 0),
            Err(PlanError::ClockOverflow("ec".into()))
        );
        assert_eq!(
            EventClock::new("ec", &[i64::MAX, 1], -1),
            Err(PlanError::ClockOverflow("ec".into()))
        );
    }

    #[test]
    fn rejects_offset_past_time_range() {
        assert_eq!(
            EventClock::new("ec", &[10], i64::MAX - 5),
            Err(PlanError::ClockOverflow("ec".into()))
        );
    }

    #[test]
    fn late_ticks_saturate() {
        let c = clock(&[10], i64::MAX - 20);
        assert_eq!(c.time(0), i64::MAX - 10);
        assert_eq!(c.time(1), i64::MAX);
        assert_eq!(c.time(2), i64::MAX);
        assert_eq!(c.time(u64::MAX), i64::MAX);

        let wide = clock(&[i64::MAX], 0);
        assert_eq!(wide.time(0), i64::MAX);
        assert_eq!(wide.time(u64::MAX), i64::MAX);
    }

    #[test]
    fn periodic_constructor() {
        let c = EventClock::periodic("clk", 5).unwrap();
        assert_eq!(c.steps(), [5]);
        assert_eq!(times(&c, 3), [5, 10, 15]);
    }

    #[test]
    fn serializes_steps_and_effective_offset() {
        let c = EventClock::new("ec", &[2, 3], 1).unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["steps"], serde_json::json!([2, 3]));
        assert_eq!(json["offset"], 1);
    }
}
