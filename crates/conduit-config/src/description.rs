//! Serializable graph descriptions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IoOp};
use crate::validation::ValidationError;

/// A processing graph as written in a TOML file.
///
/// ```toml
/// name = "diamond"
/// root = "sink"
///
/// [[nodes]]
/// name = "source"
/// outputs = ["out"]
///
/// [[nodes]]
/// name = "left"
/// delay = 1
/// inputs = ["in"]
/// outputs = ["out"]
///
/// [[connections]]
/// from = "source.out"
/// to = "left.in"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Graph name.
    #[serde(default)]
    pub name: String,

    /// Name of the node to compile for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Nodes, in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,

    /// Connections from an output to an input.
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
}

/// One node entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Unique node name.
    pub name: String,

    /// Processing delay in samples.
    #[serde(default)]
    pub delay: usize,

    /// Input port names, in port order.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Output port names, in port order.
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// One connection entry, both ends written as `node.port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    /// Upstream output.
    pub from: String,
    /// Downstream input.
    pub to: String,
}

/// A parsed `node.port` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint<'a> {
    /// Node name.
    pub node: &'a str,
    /// Port name.
    pub port: &'a str,
}

impl<'a> Endpoint<'a> {
    /// Parses `node.port`. The port is everything after the last dot.
    pub fn parse(s: &'a str) -> Result<Self, ValidationError> {
        match s.rsplit_once('.') {
            Some((node, port)) if !node.is_empty() && !port.is_empty() => Ok(Self { node, port }),
            _ => Err(ValidationError::MalformedEndpoint(s.to_string())),
        }
    }
}

impl std::fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

impl GraphDescription {
    /// Create an empty description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the root node.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Append a node.
    pub fn with_node(mut self, node: NodeDescription) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append a connection from `from` to `to`, both `node.port`.
    pub fn with_connection(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connections.push(ConnectionDescription {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Load a description from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(IoOp::Read, path, e))?;
        Self::from_toml(&content)
    }

    /// Load a description from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the description to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::io(IoOp::CreateDir, parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::io(IoOp::Write, path, e))?;
        Ok(())
    }

    /// Convert the description to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find a node by name.
    pub fn node(&self, name: &str) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl NodeDescription {
    /// Create a node with no ports and zero delay.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the processing delay.
    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    /// Append an input port.
    pub fn with_input(mut self, port: impl Into<String>) -> Self {
        self.inputs.push(port.into());
        self
    }

    /// Append an output port.
    pub fn with_output(mut self, port: impl Into<String>) -> Self {
        self.outputs.push(port.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAMOND: &str = r#"
name = "diamond"
root = "sink"

[[nodes]]
name = "source"
outputs = ["out"]

[[nodes]]
name = "left"
delay = 1
inputs = ["in"]
outputs = ["out"]

[[nodes]]
name = "right"
delay = 2
inputs = ["in"]
outputs = ["out"]

[[nodes]]
name = "sink"
inputs = ["a", "b"]
outputs = ["out"]

[[connections]]
from = "source.out"
to = "left.in"

[[connections]]
from = "source.out"
to = "right.in"

[[connections]]
from = "left.out"
to = "sink.a"

[[connections]]
from = "right.out"
to = "sink.b"
"#;

    #[test]
    fn parse_diamond() {
        let desc = GraphDescription::from_toml(DIAMOND).unwrap();
        assert_eq!(desc.name, "diamond");
        assert_eq!(desc.root.as_deref(), Some("sink"));
        assert_eq!(desc.nodes.len(), 4);
        assert_eq!(desc.connections.len(), 4);

        let source = desc.node("source").unwrap();
        assert_eq!(source.delay, 0);
        assert!(source.inputs.is_empty());
        assert_eq!(desc.node("right").unwrap().delay, 2);
    }

    #[test]
    fn toml_round_trip() {
        let desc = GraphDescription::from_toml(DIAMOND).unwrap();
        let text = desc.to_toml().unwrap();
        assert_eq!(GraphDescription::from_toml(&text).unwrap(), desc);
    }

    #[test]
    fn empty_document_is_empty_graph() {
        let desc = GraphDescription::from_toml("").unwrap();
        assert!(desc.nodes.is_empty());
        assert!(desc.root.is_none());
    }

    #[test]
    fn unknown_field_type_fails() {
        let err = GraphDescription::from_toml("[[nodes]]\nname = \"x\"\ndelay = \"slow\"\n");
        assert!(matches!(err, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn endpoint_parse() {
        assert_eq!(
            Endpoint::parse("amp.out").unwrap(),
            Endpoint {
                node: "amp",
                port: "out"
            }
        );
        // Only the last dot separates the port.
        let ep = Endpoint::parse("bus.l.in").unwrap();
        assert_eq!((ep.node, ep.port), ("bus.l", "in"));
        assert_eq!(ep.to_string(), "bus.l.in");

        for bad in ["amp", "amp.", ".out", ""] {
            assert_eq!(
                Endpoint::parse(bad),
                Err(ValidationError::MalformedEndpoint(bad.to_string()))
            );
        }
    }

    #[test]
    fn builder_matches_parsed() {
        let built = GraphDescription::new("chain")
            .with_root("fx")
            .with_node(NodeDescription::new("in").with_output("out"))
            .with_node(
                NodeDescription::new("fx")
                    .with_delay(3)
                    .with_input("in")
                    .with_output("out"),
            )
            .with_connection("in.out", "fx.in");

        let parsed = GraphDescription::from_toml(
            r#"
name = "chain"
root = "fx"

[[nodes]]
name = "in"
outputs = ["out"]

[[nodes]]
name = "fx"
delay = 3
inputs = ["in"]
outputs = ["out"]

[[connections]]
from = "in.out"
to = "fx.in"
"#,
        )
        .unwrap();
        assert_eq!(built, parsed);
    }
}
