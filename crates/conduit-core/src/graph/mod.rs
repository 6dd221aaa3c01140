//! Graph model: nodes, ports, and input-owned connections.
//!
//! [`Graph`] is the persistent side of the scheduler. It owns the topology and
//! provides the mutation API (add, remove, connect, disconnect). Compilation
//! borrows it immutably, so the topology cannot change mid-pass.
//!
//! # Connections
//!
//! Every [`InputPort`] holds at most one upstream [`Connection`]. A second
//! [`connect()`](Graph::connect) into an already connected input is rejected
//! with [`GraphError::InputAlreadyConnected`]; mixing several sources needs an
//! explicit merge node. Fan-out is free: any number of inputs may name the
//! same output.
//!
//! # Example
//!
//! ```rust
//! use conduit_core::graph::{Graph, InputIndex, NodeSpec, OutputIndex};
//!
//! let mut graph = Graph::new();
//! let osc = graph.add_node(NodeSpec::new("osc", ()).with_output("out"));
//! let amp = graph.add_node(
//!     NodeSpec::new("amp", ()).with_input("in").with_output("out"),
//! );
//! graph.connect((osc, OutputIndex(0)), (amp, InputIndex(0))).unwrap();
//! assert_eq!(graph.connection_count(), 1);
//! ```

mod node;
mod port;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

pub use node::{Node, NodeId, NodeSpec};
pub use port::{Connection, InputIndex, InputPort, InputRef, OutputIndex, OutputPort};

/// Errors from graph mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    NodeNotFound(NodeId),
    /// The node has no input at this position.
    InputOutOfRange {
        /// Node that was addressed.
        node: NodeId,
        /// Requested input position.
        input: InputIndex,
    },
    /// The node has no output at this position.
    OutputOutOfRange {
        /// Node that was addressed.
        node: NodeId,
        /// Requested output position.
        output: OutputIndex,
    },
    /// The input already has an upstream connection (many-to-one fan-in).
    InputAlreadyConnected {
        /// Node owning the input.
        node: NodeId,
        /// The connected input.
        input: InputIndex,
        /// The connection already in place.
        existing: Connection,
    },
    /// A node may not feed its own input.
    SelfConnection(NodeId),
    /// Adding this connection would close a cycle.
    CycleDetected {
        /// Upstream end of the rejected connection.
        from: NodeId,
        /// Downstream end of the rejected connection.
        to: NodeId,
    },
    /// The input has no connection to remove.
    NotConnected {
        /// Node owning the input.
        node: NodeId,
        /// The unconnected input.
        input: InputIndex,
    },
}

impl core::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::InputOutOfRange { node, input } => {
                write!(f, "node {node} has no input {input}")
            }
            Self::OutputOutOfRange { node, output } => {
                write!(f, "node {node} has no output {output}")
            }
            Self::InputAlreadyConnected {
                node,
                input,
                existing,
            } => write!(
                f,
                "input {input} of {node} is already fed by {}.{}",
                existing.node, existing.output
            ),
            Self::SelfConnection(id) => write!(f, "node {id} cannot feed its own input"),
            Self::CycleDetected { from, to } => {
                write!(f, "connecting {from} to {to} would create a cycle")
            }
            Self::NotConnected { node, input } => {
                write!(f, "input {input} of {node} is not connected")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// Arena of nodes with input-owned connections.
///
/// `P` is the per-node payload: the processor in a render engine, a name or
/// `()` in tools and tests. The scheduler never touches it.
#[derive(Debug)]
pub struct Graph<P> {
    nodes: Vec<Option<Node<P>>>,
}

impl<P> Default for Graph<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Graph<P> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    // --- Node mutations ---

    /// Adds a node. Returns its ID.
    pub fn add_node(&mut self, spec: NodeSpec<P>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node::from_spec(id, spec)));
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: node {id}");
        id
    }

    /// Removes a node, clearing every input connection that names it.
    ///
    /// Returns the removed node. Its ID is never reused.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node<P>, GraphError> {
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(GraphError::NodeNotFound(id))?;

        for other in self.nodes.iter_mut().flatten() {
            for input in &mut other.inputs {
                if input.connection.is_some_and(|c| c.node == id) {
                    input.connection = None;
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(node)
    }

    /// Connects output `from` to input `to`.
    ///
    /// Returns an error if:
    /// - Either node doesn't exist, or a port index is out of range
    /// - `to` already has a connection (many-to-one is not representable)
    /// - Both ends are on the same node
    ///
    /// Longer cycles are not checked here; [`compile()`](crate::compile)
    /// rejects them. Use [`connect_acyclic()`](Self::connect_acyclic) to refuse
    /// them up front.
    pub fn connect(
        &mut self,
        from: (NodeId, OutputIndex),
        to: (NodeId, InputIndex),
    ) -> Result<(), GraphError> {
        let (from_node, output) = from;
        let (to_node, input) = to;

        let upstream = self.get(from_node)?;
        if output.0 >= upstream.outputs.len() {
            return Err(GraphError::OutputOutOfRange {
                node: from_node,
                output,
            });
        }
        if from_node == to_node {
            return Err(GraphError::SelfConnection(from_node));
        }

        let port = self.input_port_mut(to_node, input)?;
        if let Some(existing) = port.connection {
            return Err(GraphError::InputAlreadyConnected {
                node: to_node,
                input,
                existing,
            });
        }
        port.connection = Some(Connection::new(from_node, output));

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from_node}.{output} → {to_node}.{input}");
        Ok(())
    }

    /// Like [`connect()`](Self::connect), but also refuses connections that
    /// would close a cycle.
    pub fn connect_acyclic(
        &mut self,
        from: (NodeId, OutputIndex),
        to: (NodeId, InputIndex),
    ) -> Result<(), GraphError> {
        self.get(from.0)?;
        self.get(to.0)?;
        // A cycle exists if `from` already depends on `to`.
        if from.0 != to.0 && self.depends_on(from.0, to.0) {
            return Err(GraphError::CycleDetected {
                from: from.0,
                to: to.0,
            });
        }
        self.connect(from, to)
    }

    /// Removes the connection feeding input `to`, returning it.
    pub fn disconnect(&mut self, to: (NodeId, InputIndex)) -> Result<Connection, GraphError> {
        let (node, input) = to;
        let port = self.input_port_mut(node, input)?;
        let connection = port
            .connection
            .take()
            .ok_or(GraphError::NotConnected { node, input })?;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {node}.{input}");
        Ok(connection)
    }

    // --- Queries ---

    /// Returns the node with this ID, if present.
    pub fn node(&self, id: NodeId) -> Option<&Node<P>> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    /// Returns the node with this ID mutably, if present.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<P>> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Iterates over live nodes in ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<P>> {
        self.nodes.iter().flatten()
    }

    /// Finds the first live node with this name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|n| n.name == name).map(|n| n.id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Number of connected inputs across the graph.
    pub fn connection_count(&self) -> usize {
        self.nodes()
            .flat_map(|n| n.inputs.iter())
            .filter(|p| p.is_connected())
            .count()
    }

    /// One past the highest node ID ever assigned.
    ///
    /// Per-node side tables indexed by [`NodeId::index()`] need this length.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Connected inputs of `node`, with their upstream ends, in port order.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = (InputIndex, Connection)> + '_ {
        self.node(node).into_iter().flat_map(|n| {
            n.inputs
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.connection.map(|c| (InputIndex(i), c)))
        })
    }

    /// Inputs fed by `output` of `node`, in node then port order.
    ///
    /// Outputs store no consumer list, so this scans every input.
    pub fn outgoing(
        &self,
        node: NodeId,
        output: OutputIndex,
    ) -> impl Iterator<Item = InputRef> + '_ {
        let target = Connection::new(node, output);
        self.nodes().flat_map(move |n| {
            n.inputs
                .iter()
                .enumerate()
                .filter(move |(_, p)| p.connection == Some(target))
                .map(move |(i, _)| InputRef {
                    node: n.id,
                    input: InputIndex(i),
                })
        })
    }

    /// Number of connected inputs on `node`.
    pub fn indegree(&self, node: NodeId) -> usize {
        self.incoming(node).count()
    }

    /// Number of inputs fed by any output of `node`.
    pub fn outdegree(&self, node: NodeId) -> usize {
        self.nodes()
            .flat_map(|n| n.inputs.iter())
            .filter(|p| p.connection.is_some_and(|c| c.node == node))
            .count()
    }

    // --- Internal helpers ---

    fn get(&self, id: NodeId) -> Result<&Node<P>, GraphError> {
        self.node(id).ok_or(GraphError::NodeNotFound(id))
    }

    fn input_port_mut(
        &mut self,
        node: NodeId,
        input: InputIndex,
    ) -> Result<&mut InputPort, GraphError> {
        self.node_mut(node)
            .ok_or(GraphError::NodeNotFound(node))?
            .inputs
            .get_mut(input.0)
            .ok_or(GraphError::InputOutOfRange { node, input })
    }

    /// Returns true if `target` is reachable from `node` by following inputs upstream.
    fn depends_on(&self, node: NodeId, target: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            let idx = current.0 as usize;
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            stack.extend(self.incoming(current).map(|(_, c)| c.node));
        }
        false
    }
}
