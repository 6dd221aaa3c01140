//! Compiled schedule types.
//!
//! A [`Schedule`] is the immutable output of [`compile()`](crate::compile): a
//! flat list of [`ScheduledStep`]s in execution order. Each step names a node,
//! the buffer bound to each of its inputs (plus the compensation delay to
//! apply first, if any) and the buffer bound to each of its outputs.
//!
//! The schedule holds no references into the graph and can be shared with an
//! audio thread via `Arc`. Swapping one schedule for another is the caller's
//! business.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::graph::{Connection, InputIndex, NodeId, OutputIndex};
use crate::pool::BufferId;

/// Buffer bound to one input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    /// Input port on the step's node.
    pub port: InputIndex,
    /// Buffer the input reads.
    pub buffer: BufferId,
    /// Delay in samples to apply to `buffer` before the node runs.
    ///
    /// `None` when the input is already time-aligned.
    pub compensation: Option<usize>,
    /// Upstream output writing `buffer`. `None` for an unconnected input,
    /// whose buffer is scratch memory nothing else writes.
    pub source: Option<Connection>,
}

/// Buffer bound to one output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBinding {
    /// Output port on the step's node.
    pub port: OutputIndex,
    /// Buffer the output writes.
    pub buffer: BufferId,
}

/// One node invocation in the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    /// Node to run.
    pub node: NodeId,
    /// Arrival time at the node's outputs, in samples.
    pub latency: usize,
    /// Input bindings in port order.
    pub inputs: Vec<InputBinding>,
    /// Output bindings in port order.
    pub outputs: Vec<OutputBinding>,
}

impl ScheduledStep {
    /// Returns the binding for `port`, if the node has it.
    pub fn input(&self, port: InputIndex) -> Option<&InputBinding> {
        self.inputs.get(port.0)
    }

    /// Returns the binding for `port`, if the node has it.
    pub fn output(&self, port: OutputIndex) -> Option<&OutputBinding> {
        self.outputs.get(port.0)
    }

    /// Inputs that need a compensation delay before the node runs.
    pub fn compensated_inputs(&self) -> impl Iterator<Item = (BufferId, usize)> + '_ {
        self.inputs
            .iter()
            .filter_map(|b| b.compensation.map(|amount| (b.buffer, amount)))
    }
}

/// Formats a binding as `label=buffer`, plus ` +delay` for a compensated
/// input. Returned by [`InputBinding::labeled`] and
/// [`OutputBinding::labeled`].
#[derive(Debug, Clone, Copy)]
pub struct LabeledBinding<'a, L, B> {
    label: L,
    binding: &'a B,
}

impl InputBinding {
    /// Displays this binding under `label` instead of the port index.
    pub fn labeled<L: core::fmt::Display>(&self, label: L) -> LabeledBinding<'_, L, Self> {
        LabeledBinding {
            label,
            binding: self,
        }
    }
}

impl OutputBinding {
    /// Displays this binding under `label` instead of the port index.
    pub fn labeled<L: core::fmt::Display>(&self, label: L) -> LabeledBinding<'_, L, Self> {
        LabeledBinding {
            label,
            binding: self,
        }
    }
}

impl<L: core::fmt::Display> core::fmt::Display for LabeledBinding<'_, L, InputBinding> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}={}", self.label, self.binding.buffer)?;
        match self.binding.compensation {
            Some(delay) => write!(f, " +{delay}"),
            None => Ok(()),
        }
    }
}

impl<L: core::fmt::Display> core::fmt::Display for LabeledBinding<'_, L, OutputBinding> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}={}", self.label, self.binding.buffer)
    }
}

impl core::fmt::Display for InputBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.labeled(self.port), f)
    }
}

impl core::fmt::Display for OutputBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.labeled(self.port), f)
    }
}

impl core::fmt::Display for ScheduledStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} [", self.node)?;
        for (i, binding) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{binding}")?;
        }
        f.write_str("] → [")?;
        for (i, binding) in self.outputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{binding}")?;
        }
        write!(f, "] latency={}", self.latency)
    }
}

/// Immutable compiled schedule.
///
/// Steps are in dependency order: every step's inputs are written by earlier
/// steps. Nodes that the root does not depend on are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub(crate) root: NodeId,
    pub(crate) steps: Vec<ScheduledStep>,
    /// Number of distinct buffer handles handed out during compilation.
    pub(crate) buffer_count: usize,
    /// Index of each node's step, indexed by `NodeId`.
    pub(crate) step_index: Vec<Option<usize>>,
}

impl Schedule {
    /// The node the schedule was compiled for.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[ScheduledStep] {
        &self.steps
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of distinct buffers the schedule binds.
    ///
    /// Buffer handles are dense: every [`BufferId::index()`] is below this.
    pub fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    /// Returns the step for `node`, or `None` if it is not scheduled.
    pub fn step_for(&self, node: NodeId) -> Option<&ScheduledStep> {
        let idx = (*self.step_index.get(node.0 as usize)?)?;
        self.steps.get(idx)
    }

    /// Computed latency of a scheduled node.
    pub fn latency_of(&self, node: NodeId) -> Option<usize> {
        self.step_for(node).map(|s| s.latency)
    }

    /// Latency at the root node's outputs.
    pub fn total_latency(&self) -> usize {
        self.latency_of(self.root).unwrap_or(0)
    }

    /// Returns the number of inputs carrying a compensation delay.
    pub fn compensation_count(&self) -> usize {
        self.steps
            .iter()
            .map(|s| s.compensated_inputs().count())
            .sum()
    }

    /// Scheduled nodes in execution order.
    pub fn order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().map(|s| s.node)
    }
}

impl core::fmt::Display for Schedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "step[{i}]: {step}")?;
        }
        Ok(())
    }
}
