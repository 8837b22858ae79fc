//! The per-test-case plan: ports, clocks and module parameters.

use strobe_common::Value;

use crate::error::PlanError;
use crate::event_clock::EventClock;
use crate::port::{Port, PortDirection, SignalDef};

/// A port declaration: a name plus a width.
///
/// A negative width declares a signed port of `|width|` bits. A bare name
/// declares a 1-bit unsigned port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    /// The port name.
    pub name: String,
    /// The width; negative for signed ports.
    pub width: i64,
}

impl From<&str> for PortDecl {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 1,
        }
    }
}

impl<S: Into<String>> From<(S, i64)> for PortDecl {
    fn from((name, width): (S, i64)) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

impl PortDecl {
    fn shape(&self) -> Result<(u32, bool), PlanError> {
        let invalid = || PlanError::InvalidWidth {
            port: self.name.clone(),
            width: self.width,
        };
        let signed = self.width < 0;
        let width = u32::try_from(self.width.unsigned_abs()).map_err(|_| invalid())?;
        if width == 0 || (signed && width < 2) {
            return Err(invalid());
        }
        Ok((width, signed))
    }
}

/// Everything needed to synthesize one test case of one module.
///
/// Inputs and outputs share one namespace; both keep declaration order,
/// which fixes the bit order of every clock-domain bus.
#[derive(Debug, Clone, Default)]
pub struct TestPlan {
    module_name: String,
    test_name: String,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    clocks: Vec<(String, EventClock)>,
    parameters: Vec<(String, String)>,
}

impl TestPlan {
    /// Creates an empty plan for `test_name` of `module_name`.
    pub fn new(module_name: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            test_name: test_name.into(),
            ..Self::default()
        }
    }

    /// Creates a plan and declares its ports in one go.
    pub fn with_ports<I, O>(
        module_name: impl Into<String>,
        test_name: impl Into<String>,
        inputs: I,
        outputs: O,
    ) -> Result<Self, PlanError>
    where
        I: IntoIterator,
        I::Item: Into<PortDecl>,
        O: IntoIterator,
        O::Item: Into<PortDecl>,
    {
        let mut plan = Self::new(module_name, test_name);
        for decl in inputs {
            plan.add_input(decl)?;
        }
        for decl in outputs {
            plan.add_output(decl)?;
        }
        Ok(plan)
    }

    /// Returns the name of the module under test.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Returns the test case name.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Declares an input port.
    pub fn add_input(&mut self, decl: impl Into<PortDecl>) -> Result<(), PlanError> {
        let port = self.declare(decl.into(), PortDirection::Input)?;
        self.inputs.push(port);
        Ok(())
    }

    /// Declares an output port.
    pub fn add_output(&mut self, decl: impl Into<PortDecl>) -> Result<(), PlanError> {
        let port = self.declare(decl.into(), PortDirection::Output)?;
        self.outputs.push(port);
        Ok(())
    }

    fn declare(&self, decl: PortDecl, direction: PortDirection) -> Result<Port, PlanError> {
        if self.port(&decl.name).is_some() {
            return Err(PlanError::DuplicatePort(decl.name));
        }
        let (width, signed) = decl.shape()?;
        Ok(Port::new(&decl.name, direction, width, signed))
    }

    /// Sets a scalar module parameter, emitted verbatim.
    pub fn set_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl ToString,
    ) -> Result<(), PlanError> {
        let name = name.into();
        if self.parameters.iter().any(|(n, _)| *n == name) {
            return Err(PlanError::DuplicateParameter(name));
        }
        self.parameters.push((name, value.to_string()));
        Ok(())
    }

    /// Declares an event clock.
    pub fn add_clock(&mut self, name: &str, steps: &[i64], offset: i64) -> Result<(), PlanError> {
        if self.has_clock(name) {
            return Err(PlanError::DuplicateClock(name.to_string()));
        }
        let clock = EventClock::new(name, steps, offset)?;
        self.clocks.push((name.to_string(), clock));
        Ok(())
    }

    /// Returns true if a clock with this name exists.
    pub fn has_clock(&self, name: &str) -> bool {
        self.clock(name).is_some()
    }

    /// Looks up a clock by name.
    pub fn clock(&self, name: &str) -> Option<&EventClock> {
        self.clocks.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Returns all clocks in declaration order.
    pub fn clocks(&self) -> impl Iterator<Item = (&str, &EventClock)> {
        self.clocks.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Returns the module parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the input ports in declaration order.
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// Returns the output ports in declaration order.
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Looks up an input or output port by name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .find(|p| p.name() == name)
    }

    /// Returns a handle for configuring an input port.
    pub fn input(&mut self, name: &str) -> Result<PortHandle<'_>, PlanError> {
        self.handle(name, PortDirection::Input)
    }

    /// Returns a handle for configuring an output port.
    pub fn output(&mut self, name: &str) -> Result<PortHandle<'_>, PlanError> {
        self.handle(name, PortDirection::Output)
    }

    fn handle(&mut self, name: &str, direction: PortDirection) -> Result<PortHandle<'_>, PlanError> {
        let clocks = &self.clocks;
        let port = self
            .inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .find(|p| p.name() == name)
            .ok_or_else(|| PlanError::UnknownPort(name.to_string()))?;
        port.expect_direction(direction)?;
        Ok(PortHandle { port, clocks })
    }

    /// Checks clock attachments and groups ports into clock domains.
    ///
    /// Every port with samples must be attached to an existing clock. Inputs
    /// without samples but with an initial value become static drivers.
    /// Clocks with no sampled port are left out.
    pub fn validate(&self) -> Result<ValidatedPlan<'_>, PlanError> {
        let mut statics = Vec::new();
        let mut domains: Vec<Domain<'_>> = self
            .clocks
            .iter()
            .map(|(name, clock)| Domain {
                name: name.as_str(),
                clock,
                inputs: Vec::new(),
                outputs: Vec::new(),
            })
            .collect();

        for port in self.inputs.iter().chain(&self.outputs) {
            if port.samples().is_empty() {
                if port.initial_value().is_some() {
                    statics.push(port);
                }
                continue;
            }
            let clock = port
                .clock()
                .ok_or_else(|| PlanError::MissingClock(port.name().to_string()))?;
            let domain = domains
                .iter_mut()
                .find(|d| d.name == clock)
                .ok_or_else(|| PlanError::UnknownClock {
                    port: port.name().to_string(),
                    clock: clock.to_string(),
                })?;
            match port.direction() {
                PortDirection::Input => domain.inputs.push(port),
                PortDirection::Output => domain.outputs.push(port),
            }
        }

        domains.retain(|d| {
            let used = !d.inputs.is_empty() || !d.outputs.is_empty();
            if !used {
                tracing::warn!(clock = d.name, test = %self.test_name, "event clock has no sampled ports, skipping");
            }
            used
        });

        Ok(ValidatedPlan {
            plan: self,
            statics,
            domains,
        })
    }
}

/// A mutable view of one port, with the plan's clocks for attachment checks.
#[derive(Debug)]
pub struct PortHandle<'p> {
    port: &'p mut Port,
    clocks: &'p [(String, EventClock)],
}

impl PortHandle<'_> {
    /// Attaches the port to an existing clock.
    pub fn clock(self, name: &str) -> Result<Self, PlanError> {
        if !self.clocks.iter().any(|(n, _)| n == name) {
            return Err(PlanError::UnknownClock {
                port: self.port.name().to_string(),
                clock: name.to_string(),
            });
        }
        self.port.attach_clock(name)?;
        Ok(self)
    }

    /// Sets the initial value of an input.
    pub fn init(self, value: impl Into<Value>) -> Result<Self, PlanError> {
        self.port.set_initial_value(&value.into())?;
        Ok(self)
    }

    /// Appends stimulus to an input.
    pub fn drive(self, signal: SignalDef) -> Result<Self, PlanError> {
        self.port.expect_direction(PortDirection::Input)?;
        self.port.append(&signal)?;
        Ok(self)
    }

    /// Appends expected samples to an output.
    pub fn expect(self, signal: SignalDef) -> Result<Self, PlanError> {
        self.port.expect_direction(PortDirection::Output)?;
        self.port.append(&signal)?;
        Ok(self)
    }

    /// Returns the port being configured.
    pub fn port(&self) -> &Port {
        &*self.port
    }
}

/// The ports attached to one event clock.
#[derive(Debug, Clone)]
pub struct Domain<'a> {
    /// The clock name.
    pub name: &'a str,
    /// The clock.
    pub clock: &'a EventClock,
    /// Sampled inputs, in declaration order.
    pub inputs: Vec<&'a Port>,
    /// Sampled outputs, in declaration order.
    pub outputs: Vec<&'a Port>,
}

impl Domain<'_> {
    /// Returns the longest input sequence length.
    pub fn input_len(&self) -> usize {
        self.inputs.iter().map(|p| p.samples().len()).max().unwrap_or(0)
    }

    /// Returns the longest output sequence length.
    pub fn output_len(&self) -> usize {
        self.outputs.iter().map(|p| p.samples().len()).max().unwrap_or(0)
    }

    /// Returns the number of ticks the domain runs for.
    pub fn duration(&self) -> usize {
        self.input_len().max(self.output_len())
    }
}

/// A plan whose ports have all been checked and grouped by clock.
#[derive(Debug, Clone)]
pub struct ValidatedPlan<'a> {
    /// The underlying plan.
    pub plan: &'a TestPlan,
    /// Clock-less inputs driven to a constant initial value.
    pub statics: Vec<&'a Port>,
    /// Clock domains with at least one sampled port, in clock declaration order.
    pub domains: Vec<Domain<'a>>,
}
