//! Port and connection types.
//!
//! Inputs and outputs are separate lists on a [`Node`](super::Node), addressed
//! by [`InputIndex`] and [`OutputIndex`]. A connection is owned by the input it
//! feeds: an [`InputPort`] holds at most one upstream [`Connection`], so
//! many-to-one fan-in cannot be represented. Output ports keep no list of
//! consumers; fan-out is several inputs naming the same output.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use super::node::NodeId;

/// Position of an input port within its node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputIndex(pub usize);

/// Position of an output port within its node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputIndex(pub usize);

impl InputIndex {
    /// Returns the raw port position.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl OutputIndex {
    /// Returns the raw port position.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for InputIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "in{}", self.0)
    }
}

impl core::fmt::Display for OutputIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "out{}", self.0)
    }
}

/// An input's reference to the upstream output feeding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Upstream node.
    pub node: NodeId,
    /// Output port on the upstream node.
    pub output: OutputIndex,
}

impl Connection {
    /// Creates a connection to `output` on `node`.
    pub fn new(node: NodeId, output: OutputIndex) -> Self {
        Self { node, output }
    }
}

/// Full address of an input port: the node plus the port position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputRef {
    /// Node owning the input.
    pub node: NodeId,
    /// Port position on that node.
    pub input: InputIndex,
}

/// An input slot on a node.
#[derive(Debug, Clone)]
pub struct InputPort {
    pub(crate) name: String,
    pub(crate) connection: Option<Connection>,
}

impl InputPort {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            connection: None,
        }
    }

    /// Port name, unique among this node's inputs by convention.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The upstream output feeding this input, if connected.
    pub fn connection(&self) -> Option<Connection> {
        self.connection
    }

    /// Returns true if an upstream output feeds this input.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// An output slot on a node.
#[derive(Debug, Clone)]
pub struct OutputPort {
    pub(crate) name: String,
}

impl OutputPort {
    pub(crate) fn new(name: String) -> Self {
        Self { name }
    }

    /// Port name, unique among this node's outputs by convention.
    pub fn name(&self) -> &str {
        &self.name
    }
}
