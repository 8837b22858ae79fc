//! Ports and the normalization of signal descriptions into samples.
//!
//! A [`Port`] owns an append-only sequence of committed [`BitVec`] samples.
//! Samples arrive as a [`SignalDef`] in one of three shapes:
//!
//! - **Dense**: one value per sample, appended in order.
//! - **Sparse**: `index → value`. Gaps on an output are filled with `x`
//!   ("don't care until proven otherwise"); gaps on an input repeat the most
//!   recent value, falling back to the initial value and then to `x`
//!   ("holds its last driven value").
//! - **Packed**: a byte buffer sliced into consecutive port-width samples.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use strobe_common::{BitVec, Value};

use crate::error::PlanError;

/// The direction of a port on the module under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PortDirection {
    /// Driven by the testbench.
    Input,
    /// Captured by the testbench and checked against expectations.
    Output,
}

impl PortDirection {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal description to append to a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalDef {
    /// One value per sample.
    Dense(Vec<Value>),
    /// Values at explicit sample indices.
    Sparse(BTreeMap<usize, Value>),
    /// A byte buffer reinterpreted as consecutive samples.
    Packed(Vec<u8>),
}

impl SignalDef {
    /// Builds a dense signal.
    pub fn dense<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        SignalDef::Dense(values.into_iter().map(Into::into).collect())
    }

    /// Builds a sparse signal from `(index, value)` pairs.
    pub fn sparse<V: Into<Value>>(entries: impl IntoIterator<Item = (usize, V)>) -> Self {
        SignalDef::Sparse(entries.into_iter().map(|(i, v)| (i, v.into())).collect())
    }

    /// Builds a packed signal.
    pub fn packed(bytes: impl Into<Vec<u8>>) -> Self {
        SignalDef::Packed(bytes.into())
    }
}

/// A named, fixed-width port of the module under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    name: String,
    direction: PortDirection,
    width: u32,
    signed: bool,
    clock: Option<String>,
    init: Option<BitVec>,
    samples: Vec<BitVec>,
}

impl Port {
    pub(crate) fn new(name: &str, direction: PortDirection, width: u32, signed: bool) -> Self {
        Self {
            name: name.to_string(),
            direction,
            width,
            signed,
            clock: None,
            init: None,
            samples: Vec::new(),
        }
    }

    /// Returns the port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the port direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Returns the width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns true for two's-complement ports.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Returns the attached clock name, if any.
    pub fn clock(&self) -> Option<&str> {
        self.clock.as_deref()
    }

    /// Returns the initial value, if any.
    pub fn initial_value(&self) -> Option<&BitVec> {
        self.init.as_ref()
    }

    /// Returns the committed samples.
    pub fn samples(&self) -> &[BitVec] {
        &self.samples
    }

    /// Returns the last committed sample.
    pub fn last_sample(&self) -> Option<&BitVec> {
        self.samples.last()
    }

    /// Attaches a clock. Re-attaching the same clock is a no-op.
    pub fn attach_clock(&mut self, clock: &str) -> Result<(), PlanError> {
        match &self.clock {
            Some(existing) if existing != clock => Err(PlanError::ClockAlreadyAttached {
                port: self.name.clone(),
                existing: existing.clone(),
                requested: clock.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.clock = Some(clock.to_string());
                Ok(())
            }
        }
    }

    /// Sets the value an input holds before its first sample.
    pub fn set_initial_value(&mut self, value: &Value) -> Result<(), PlanError> {
        if self.direction == PortDirection::Output {
            return Err(PlanError::InitialValueOnOutput(self.name.clone()));
        }
        if !self.samples.is_empty() {
            return Err(PlanError::InitialValueAfterSamples(self.name.clone()));
        }
        if self.init.is_some() {
            return Err(PlanError::InitialValueAlreadySet(self.name.clone()));
        }
        self.init = Some(self.encode(value)?);
        Ok(())
    }

    /// Normalizes `signal` and appends the resulting samples.
    ///
    /// Nothing is appended if normalization fails.
    pub fn append(&mut self, signal: &SignalDef) -> Result<(), PlanError> {
        let mut samples = self.normalize(signal)?;
        self.samples.append(&mut samples);
        Ok(())
    }

    /// Converts a signal description into the samples it would append.
    pub fn normalize(&self, signal: &SignalDef) -> Result<Vec<BitVec>, PlanError> {
        match signal {
            SignalDef::Dense(values) => values.iter().map(|v| self.encode(v)).collect(),
            SignalDef::Sparse(entries) => self.normalize_sparse(entries),
            SignalDef::Packed(bytes) => self.normalize_packed(bytes),
        }
    }

    /// Returns an error unless the port has the given direction.
    pub(crate) fn expect_direction(&self, expected: PortDirection) -> Result<(), PlanError> {
        if self.direction == expected {
            Ok(())
        } else {
            Err(PlanError::WrongDirection {
                port: self.name.clone(),
                expected: expected.as_str(),
                actual: self.direction.as_str(),
            })
        }
    }

    fn encode(&self, value: &Value) -> Result<BitVec, PlanError> {
        value
            .to_bit_vec(self.width, self.signed)
            .map_err(PlanError::value(&self.name))
    }

    fn unknown(&self) -> Result<BitVec, PlanError> {
        BitVec::unknown(self.width, self.signed).map_err(PlanError::value(&self.name))
    }

    fn normalize_sparse(&self, entries: &BTreeMap<usize, Value>) -> Result<Vec<BitVec>, PlanError> {
        let len = self.samples.len();
        let Some((&first, _)) = entries.first_key_value() else {
            return Ok(Vec::new());
        };
        if first < len {
            return Err(PlanError::SparseIndexRewrites {
                port: self.name.clone(),
                index: first,
                len,
            });
        }

        let unknown = self.unknown()?;
        let mut fill = match self.direction {
            PortDirection::Output => unknown.clone(),
            PortDirection::Input => self
                .samples
                .last()
                .or(self.init.as_ref())
                .cloned()
                .unwrap_or_else(|| unknown.clone()),
        };

        let mut out = Vec::new();
        let mut next = len;
        for (&index, value) in entries {
            let sample = self.encode(value)?;
            out.extend(std::iter::repeat(fill.clone()).take(index - next));
            if self.direction == PortDirection::Input {
                fill = sample.clone();
            }
            out.push(sample);
            next = index + 1;
        }
        Ok(out)
    }

    fn normalize_packed(&self, bytes: &[u8]) -> Result<Vec<BitVec>, PlanError> {
        if !self.width.is_power_of_two() {
            return Err(PlanError::PackedWidthNotPowerOfTwo {
                port: self.name.clone(),
                width: self.width,
            });
        }
        let bits = bytes.len() * 8;
        if bits % self.width as usize != 0 {
            return Err(PlanError::PackedLengthMismatch {
                port: self.name.clone(),
                bits,
                width: self.width,
            });
        }
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let total = u32::try_from(bits).map_err(|_| PlanError::PackedLengthMismatch {
            port: self.name.clone(),
            bits,
            width: self.width,
        })?;
        BitVec::from_bytes(bytes, total, false)
            .and_then(|buf| buf.slice(self.width, self.signed))
            .map_err(PlanError::value(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(samples: &[BitVec]) -> Vec<String> {
        samples.iter().map(ToString::to_string).collect()
    }

    fn input(width: u32) -> Port {
        Port::new("a", PortDirection::Input, width, false)
    }

    fn output(width: u32) -> Port {
        Port::new("y", PortDirection::Output, width, false)
    }

    #[test]
    fn dense_appends_in_order() {
        let mut p = input(2);
        p.append(&SignalDef::dense([0, 3, 1])).unwrap();
        assert_eq!(strs(p.samples()), ["00", "11", "01"]);
    }

    #[test]
    fn sparse_input_fills_from_initial_value() {
        let mut p = input(2);
        p.set_initial_value(&Value::from(0)).unwrap();
        p.append(&SignalDef::sparse([(2, 0b11)])).unwrap();
        assert_eq!(strs(p.samples()), ["00", "00", "11"]);
    }

    #[test]
    fn sparse_output_fills_with_unknown() {
        let mut p = output(2);
        p.append(&SignalDef::sparse([(2, 0b11)])).unwrap();
        assert_eq!(strs(p.samples()), ["xx", "xx", "11"]);
    }

    #[test]
    fn sparse_input_continues_last_sample() {
        let mut p = input(2);
        p.append(&SignalDef::dense([0b01, 0b10])).unwrap();
        p.append(&SignalDef::sparse([(4, 0b11)])).unwrap();
        assert_eq!(strs(p.samples()), ["01", "10", "10", "10", "11"]);
    }

    #[test]
    fn sparse_input_without_history_fills_unknown() {
        let mut p = input(1);
        p.append(&SignalDef::sparse([(1, 1), (3, 0)])).unwrap();
        assert_eq!(strs(p.samples()), ["x", "1", "1", "0"]);
    }

    #[test]
    fn sparse_output_gaps_between_entries() {
        let mut p = output(1);
        p.append(&SignalDef::sparse([(0, 1), (2, 0)])).unwrap();
        assert_eq!(strs(p.samples()), ["1", "x", "0"]);
    }

    #[test]
    fn sparse_rejects_rewrites() {
        let mut p = input(1);
        p.append(&SignalDef::dense([1, 0])).unwrap();
        let err = p.append(&SignalDef::sparse([(1, 1)])).unwrap_err();
        assert_eq!(
            err,
            PlanError::SparseIndexRewrites {
                port: "a".into(),
                index: 1,
                len: 2
            }
        );
        assert_eq!(p.samples().len(), 2);
    }

    #[test]
    fn sparse_empty_is_noop() {
        let mut p = output(1);
        p.append(&SignalDef::Sparse(BTreeMap::new())).unwrap();
        assert!(p.samples().is_empty());
    }

    #[test]
    fn packed_slices_bytes() {
        let mut p = input(2);
        p.append(&SignalDef::packed(vec![0b1101_1000])).unwrap();
        assert_eq!(strs(p.samples()), ["11", "01", "10", "00"]);

        let mut wide = input(16);
        wide.append(&SignalDef::packed(vec![0xab, 0xcd, 0x00, 0x01])).unwrap();
        assert_eq!(wide.samples()[0].to_integer().unwrap(), 0xabcd);
        assert_eq!(wide.samples()[1].to_integer().unwrap(), 1);
    }

    #[test]
    fn packed_signed_port() {
        let mut p = Port::new("s", PortDirection::Input, 4, true);
        p.append(&SignalDef::packed(vec![0xf7])).unwrap();
        let ints: Vec<i128> = p.samples().iter().map(|s| s.to_integer().unwrap()).collect();
        assert_eq!(ints, [-1, 7]);
    }

    #[test]
    fn packed_shape_errors() {
        let p = input(3);
        assert!(matches!(
            p.normalize(&SignalDef::packed(vec![0])),
            Err(PlanError::PackedWidthNotPowerOfTwo { width: 3, .. })
        ));
        let p = input(16);
        assert!(matches!(
            p.normalize(&SignalDef::packed(vec![0, 1, 2])),
            Err(PlanError::PackedLengthMismatch { bits: 24, .. })
        ));
    }

    #[test]
    fn initial_value_rules() {
        let mut p = input(1);
        p.append(&SignalDef::dense([1])).unwrap();
        assert_eq!(
            p.set_initial_value(&Value::from(0)),
            Err(PlanError::InitialValueAfterSamples("a".into()))
        );

        let mut p = input(1);
        p.set_initial_value(&Value::from(0)).unwrap();
        assert_eq!(
            p.set_initial_value(&Value::from(1)),
            Err(PlanError::InitialValueAlreadySet("a".into()))
        );

        let mut p = output(1);
        assert_eq!(
            p.set_initial_value(&Value::from(0)),
            Err(PlanError::InitialValueOnOutput("y".into()))
        );
    }

    #[test]
    fn clock_attaches_once() {
        let mut p = input(1);
        p.attach_clock("ec").unwrap();
        p.attach_clock("ec").unwrap();
        assert!(matches!(
            p.attach_clock("other"),
            Err(PlanError::ClockAlreadyAttached { .. })
        ));
        assert_eq!(p.clock(), Some("ec"));
    }

    #[test]
    fn encoding_errors_carry_port_name() {
        let mut p = input(2);
        let err = p.append(&SignalDef::dense([7])).unwrap_err();
        assert!(matches!(err, PlanError::InvalidValue { ref port, .. } if port == "a"));
        assert!(p.samples().is_empty());
    }
}
