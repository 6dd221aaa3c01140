//! Turning a [`GraphDescription`] into a live [`Graph`].

use std::collections::HashMap;

use conduit_core::{Graph, NodeId, NodeSpec, Schedule};

use crate::description::{Endpoint, GraphDescription};
use crate::error::ConfigError;
use crate::validation::ValidationError;

/// A graph built from a description. Each node's payload is its name.
#[derive(Debug)]
pub struct BuiltGraph {
    /// Description name.
    pub name: String,
    /// The built graph.
    pub graph: Graph<String>,
    /// The root node.
    pub root: NodeId,
}

impl BuiltGraph {
    /// Compiles the graph for its root.
    pub fn compile(&self) -> Result<Schedule, ConfigError> {
        Ok(self.graph.compile(self.root)?)
    }

    /// Name of a node, if it exists.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.graph.node(id).map(|n| n.name())
    }
}

impl GraphDescription {
    /// Validates the description and builds the graph it describes.
    ///
    /// Nodes are added in document order, so node IDs follow the file.
    pub fn build(&self) -> Result<BuiltGraph, ConfigError> {
        self.validate()?;

        let mut graph = Graph::new();
        let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let spec = NodeSpec {
                name: node.name.clone(),
                delay: node.delay,
                inputs: node.inputs.clone(),
                outputs: node.outputs.clone(),
                payload: node.name.clone(),
            };
            ids.insert(node.name.as_str(), graph.add_node(spec));
        }

        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ValidationError::UnknownNode(name.to_string()))
        };

        for conn in &self.connections {
            let from = Endpoint::parse(&conn.from)?;
            let to = Endpoint::parse(&conn.to)?;
            let from_id = lookup(from.node)?;
            let to_id = lookup(to.node)?;

            let output = graph
                .node(from_id)
                .and_then(|n| n.output_index(from.port))
                .ok_or_else(|| ValidationError::UnknownOutput {
                    node: from.node.to_string(),
                    port: from.port.to_string(),
                })?;
            let input = graph
                .node(to_id)
                .and_then(|n| n.input_index(to.port))
                .ok_or_else(|| ValidationError::UnknownInput {
                    node: to.node.to_string(),
                    port: to.port.to_string(),
                })?;
            graph.connect((from_id, output), (to_id, input))?;
        }

        let root_name = self.root.as_deref().ok_or(ValidationError::MissingRoot)?;
        let root = ids
            .get(root_name)
            .copied()
            .ok_or_else(|| ValidationError::UnknownRoot(root_name.to_string()))?;

        Ok(BuiltGraph {
            name: self.name.clone(),
            graph,
            root,
        })
    }
}
