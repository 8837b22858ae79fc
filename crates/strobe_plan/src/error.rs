//! Configuration errors for test plans.
//!
//! Every variant is detected eagerly at the offending call and is
//! unrecoverable for that test case: the test definition has to be fixed.

use strobe_common::EncodingError;

/// Errors raised while building or validating a [`TestPlan`](crate::TestPlan).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A port name is already used by an input or an output.
    #[error("port '{0}' is already defined")]
    DuplicatePort(String),

    /// A clock name is already used.
    #[error("event clock '{0}' is already defined")]
    DuplicateClock(String),

    /// A module parameter is already set.
    #[error("parameter '{0}' is already defined")]
    DuplicateParameter(String),

    /// A port width of 0, or -1 (a signed port needs at least 2 bits).
    #[error("port '{port}' has invalid width {width}")]
    InvalidWidth {
        /// The port name.
        port: String,
        /// The declared width (negative means signed).
        width: i64,
    },

    /// A clock was declared without steps.
    #[error("event clock '{0}' has no steps")]
    EmptySteps(String),

    /// A clock step is zero or negative.
    #[error("event clock '{clock}' has non-positive step {step}")]
    InvalidStep {
        /// The clock name.
        clock: String,
        /// The offending step.
        step: i64,
    },

    /// A clock's cycle length or first period does not fit the time range.
    #[error("event clock '{0}' overflows the time range")]
    ClockOverflow(String),

    /// No port with this name exists.
    #[error("port '{0}' is not defined")]
    UnknownPort(String),

    /// No clock with this name exists.
    #[error("port '{port}' references undefined event clock '{clock}'")]
    UnknownClock {
        /// The port name.
        port: String,
        /// The missing clock name.
        clock: String,
    },

    /// A port already has a different clock.
    #[error("port '{port}' is already attached to event clock '{existing}', cannot attach '{requested}'")]
    ClockAlreadyAttached {
        /// The port name.
        port: String,
        /// The clock already attached.
        existing: String,
        /// The clock that was requested.
        requested: String,
    },

    /// Initial values must be set before any sample is appended.
    #[error("port '{0}' already has samples, its initial value can no longer be set")]
    InitialValueAfterSamples(String),

    /// Initial values may be set only once.
    #[error("port '{0}' already has an initial value")]
    InitialValueAlreadySet(String),

    /// Only inputs can be driven to an initial value.
    #[error("output port '{0}' cannot have an initial value")]
    InitialValueOnOutput(String),

    /// Stimulus on an output or expectations on an input.
    #[error("port '{port}' is an {actual}, not an {expected}")]
    WrongDirection {
        /// The port name.
        port: String,
        /// The direction the operation needs.
        expected: &'static str,
        /// The direction the port has.
        actual: &'static str,
    },

    /// A port has samples but no clock to pace them.
    #[error("port '{0}' has samples but is not attached to an event clock")]
    MissingClock(String),

    /// A sparse signal tried to write before the end of the committed sequence.
    #[error("port '{port}': sparse index {index} is before the current sequence length {len}")]
    SparseIndexRewrites {
        /// The port name.
        port: String,
        /// The smallest index in the mapping.
        index: usize,
        /// The committed sequence length.
        len: usize,
    },

    /// Packed buffers only fit ports whose width is a power of two.
    #[error("port '{port}': packed signals need a power-of-two width, got {width}")]
    PackedWidthNotPowerOfTwo {
        /// The port name.
        port: String,
        /// The port width.
        width: u32,
    },

    /// A packed buffer must hold a whole number of samples.
    #[error("port '{port}': packed signal of {bits} bits is not a multiple of width {width}")]
    PackedLengthMismatch {
        /// The port name.
        port: String,
        /// The buffer length in bits.
        bits: usize,
        /// The port width.
        width: u32,
    },

    /// A sample could not be encoded for a port.
    #[error("port '{port}': {source}")]
    InvalidValue {
        /// The port name.
        port: String,
        /// The underlying encoding failure.
        #[source]
        source: EncodingError,
    },

    /// Helper timestamps and setup times must be positive.
    #[error("port '{port}': time {time} must be positive")]
    InvalidTime {
        /// The port name.
        port: String,
        /// The rejected time.
        time: i64,
    },

    /// A helper already has a value for this port at this time or cycle.
    #[error("port '{port}' already has a value at {at}")]
    DuplicateEvent {
        /// The port name.
        port: String,
        /// The time or cycle index.
        at: u64,
    },

    /// A cycle definition for this port already exists.
    #[error("port '{0}' already has a cycle definition")]
    CycleAlreadyDefined(String),

    /// Cycle values were given for a port without a cycle definition.
    #[error("port '{0}' has no cycle definition")]
    CycleNotDefined(String),

    /// Cycle tick offsets are empty, unsorted, or outside the period.
    #[error("port '{port}': invalid cycle ticks {ticks:?} for interval {interval}")]
    InvalidCycleTicks {
        /// The port name.
        port: String,
        /// The ticks as given.
        ticks: Vec<i64>,
        /// The cycle interval.
        interval: u64,
    },

    /// The number of values in a cycle differs from its tick count.
    #[error("port '{port}': {values} values for {ticks} ticks per cycle")]
    TickCountMismatch {
        /// The port name.
        port: String,
        /// Values supplied.
        values: usize,
        /// Ticks per cycle.
        ticks: usize,
    },
}

impl PlanError {
    /// Wraps an encoding failure with the name of the port it happened on.
    pub fn value(port: &str) -> impl FnOnce(EncodingError) -> Self + '_ {
        move |source| PlanError::InvalidValue {
            port: port.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_clock_display() {
        let e = PlanError::MissingClock("a".into());
        assert_eq!(
            e.to_string(),
            "port 'a' has samples but is not attached to an event clock"
        );
    }

    #[test]
    fn wrong_direction_display() {
        let e = PlanError::WrongDirection {
            port: "sum".into(),
            expected: "input",
            actual: "output",
        };
        assert_eq!(e.to_string(), "port 'sum' is an output, not an input");
    }

    #[test]
    fn invalid_value_keeps_source() {
        let e = PlanError::value("b")(EncodingError::InvalidCharacter('q'));
        assert_eq!(e.to_string(), "port 'b': invalid logic character 'q'");
        assert!(std::error::Error::source(&e).is_some());
    }
}
