//! Graph node types.
//!
//! A [`Node`] is one unit of computation: an ordered list of input ports, an
//! ordered list of output ports, the `delay` in samples it imparts to signals
//! passing through, and a caller-defined payload `P`. Nodes are built from a
//! [`NodeSpec`] and owned by the [`Graph`](super::Graph) arena.
//!
//! Nodes carry no traversal state. Visit marks and computed latencies belong
//! to a single compile pass and live in the compiler, so a graph can be
//! compiled any number of times without a reset step.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use super::port::{InputIndex, InputPort, OutputIndex, OutputPort};

/// Unique identifier for a node in the graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance.
/// They remain stable across graph mutations and compilations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Construction parameters for a node.
///
/// ```rust
/// use conduit_core::graph::NodeSpec;
///
/// let spec = NodeSpec::new("reverb", ())
///     .with_delay(64)
///     .with_input("in")
///     .with_output("out");
/// assert_eq!(spec.delay, 64);
/// ```
#[derive(Debug, Clone)]
pub struct NodeSpec<P> {
    /// Display name.
    pub name: String,
    /// Inherent processing delay in samples.
    pub delay: usize,
    /// Input port names, in port order.
    pub inputs: Vec<String>,
    /// Output port names, in port order.
    pub outputs: Vec<String>,
    /// Caller-defined payload (typically the processor).
    pub payload: P,
}

impl<P> NodeSpec<P> {
    /// Creates a spec with no ports and zero delay.
    pub fn new(name: impl Into<String>, payload: P) -> Self {
        Self {
            name: name.into(),
            delay: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            payload,
        }
    }

    /// Sets the processing delay in samples.
    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    /// Appends an input port.
    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    /// Appends an output port.
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }
}

/// A node stored in the graph.
#[derive(Debug)]
pub struct Node<P> {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) delay: usize,
    pub(crate) inputs: Vec<InputPort>,
    pub(crate) outputs: Vec<OutputPort>,
    pub(crate) payload: P,
}

impl<P> Node<P> {
    pub(crate) fn from_spec(id: NodeId, spec: NodeSpec<P>) -> Self {
        Self {
            id,
            name: spec.name,
            delay: spec.delay,
            inputs: spec.inputs.into_iter().map(InputPort::new).collect(),
            outputs: spec.outputs.into_iter().map(OutputPort::new).collect(),
            payload: spec.payload,
        }
    }

    /// This node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inherent processing delay in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Input ports in port order.
    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    /// Output ports in port order.
    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    /// Returns the input at `index`, if it exists.
    pub fn input(&self, index: InputIndex) -> Option<&InputPort> {
        self.inputs.get(index.0)
    }

    /// Returns the output at `index`, if it exists.
    pub fn output(&self, index: OutputIndex) -> Option<&OutputPort> {
        self.outputs.get(index.0)
    }

    /// Looks up an input port by name.
    pub fn input_index(&self, name: &str) -> Option<InputIndex> {
        self.inputs
            .iter()
            .position(|p| p.name == name)
            .map(InputIndex)
    }

    /// Looks up an output port by name.
    pub fn output_index(&self, name: &str) -> Option<OutputIndex> {
        self.outputs
            .iter()
            .position(|p| p.name == name)
            .map(OutputIndex)
    }

    /// Shared access to the payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutable access to the payload.
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}
