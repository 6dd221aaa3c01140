//! Graph description validation.
//!
//! [`GraphDescription::issues()`] walks the whole description and reports
//! every problem it finds instead of stopping at the first, so a user fixing
//! a hand-written file sees everything at once. [`GraphDescription::validate()`]
//! folds the issues into a single [`ValidationError`].
//!
//! Cycles are not checked here; they surface when the built graph is
//! compiled.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::description::{Endpoint, GraphDescription, NodeDescription};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two nodes share a name.
    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),

    /// A node lists the same port name twice on one side.
    #[error("node '{node}' has duplicate port '{port}'")]
    DuplicatePort {
        /// Node name.
        node: String,
        /// Repeated port name.
        port: String,
    },

    /// An endpoint is not of the form `node.port`.
    #[error("malformed endpoint '{0}': expected 'node.port'")]
    MalformedEndpoint(String),

    /// A connection names a node that does not exist.
    #[error("connection references unknown node '{0}'")]
    UnknownNode(String),

    /// A connection names an output the node does not have.
    #[error("node '{node}' has no output '{port}'")]
    UnknownOutput {
        /// Node name.
        node: String,
        /// Missing output name.
        port: String,
    },

    /// A connection names an input the node does not have.
    #[error("node '{node}' has no input '{port}'")]
    UnknownInput {
        /// Node name.
        node: String,
        /// Missing input name.
        port: String,
    },

    /// Two connections feed the same input.
    #[error("input '{0}' is connected more than once")]
    InputConnectedTwice(String),

    /// A connection leads from a node back into itself.
    #[error("connection '{0}' feeds its own node")]
    SelfConnection(String),

    /// No root node was given.
    #[error("no root node specified")]
    MissingRoot,

    /// The root names a node that does not exist.
    #[error("root node '{0}' does not exist")]
    UnknownRoot(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn duplicate_ports<'a>(
    node: &'a NodeDescription,
    ports: &'a [String],
) -> impl Iterator<Item = ValidationError> + 'a {
    let mut seen = HashSet::new();
    ports
        .iter()
        .filter(move |&p| !seen.insert(p.as_str()))
        .map(|p| ValidationError::DuplicatePort {
            node: node.name.clone(),
            port: p.clone(),
        })
}

impl GraphDescription {
    /// Every problem with this description, in document order.
    pub fn issues(&self) -> Vec<ValidationError> {
        let mut issues = Vec::new();

        let mut by_name: HashMap<&str, &NodeDescription> = HashMap::new();
        for node in &self.nodes {
            if by_name.contains_key(node.name.as_str()) {
                issues.push(ValidationError::DuplicateNode(node.name.clone()));
            } else {
                by_name.insert(node.name.as_str(), node);
            }
            issues.extend(duplicate_ports(node, &node.inputs));
            issues.extend(duplicate_ports(node, &node.outputs));
        }

        let mut fed: HashSet<(&str, &str)> = HashSet::new();
        for conn in &self.connections {
            let from = Endpoint::parse(&conn.from);
            let to = Endpoint::parse(&conn.to);

            match &from {
                Ok(ep) => match by_name.get(ep.node) {
                    None => issues.push(ValidationError::UnknownNode(ep.node.to_string())),
                    Some(n) if !n.outputs.iter().any(|p| p == ep.port) => {
                        issues.push(ValidationError::UnknownOutput {
                            node: ep.node.to_string(),
                            port: ep.port.to_string(),
                        });
                    }
                    Some(_) => {}
                },
                Err(e) => issues.push(e.clone()),
            }

            match &to {
                Ok(ep) => {
                    match by_name.get(ep.node) {
                        None => issues.push(ValidationError::UnknownNode(ep.node.to_string())),
                        Some(n) if !n.inputs.iter().any(|p| p == ep.port) => {
                            issues.push(ValidationError::UnknownInput {
                                node: ep.node.to_string(),
                                port: ep.port.to_string(),
                            });
                        }
                        Some(_) => {}
                    }
                    if !fed.insert((ep.node, ep.port)) {
                        issues.push(ValidationError::InputConnectedTwice(conn.to.clone()));
                    }
                }
                Err(e) => issues.push(e.clone()),
            }

            if let (Ok(f), Ok(t)) = (&from, &to)
                && f.node == t.node
            {
                issues.push(ValidationError::SelfConnection(format!(
                    "{} → {}",
                    conn.from, conn.to
                )));
            }
        }

        match &self.root {
            None => issues.push(ValidationError::MissingRoot),
            Some(root) if !by_name.contains_key(root.as_str()) => {
                issues.push(ValidationError::UnknownRoot(root.clone()));
            }
            Some(_) => {}
        }

        issues
    }

    /// Checks the description, folding all issues into one error.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut issues = self.issues();
        match issues.len() {
            0 => Ok(()),
            1 => Err(issues.remove(0)),
            _ => Err(ValidationError::Multiple(issues)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> GraphDescription {
        GraphDescription::new("chain")
            .with_root("fx")
            .with_node(NodeDescription::new("in").with_output("out"))
            .with_node(
                NodeDescription::new("fx")
                    .with_delay(2)
                    .with_input("in")
                    .with_output("out"),
            )
            .with_connection("in.out", "fx.in")
    }

    #[test]
    fn valid_description_passes() {
        assert!(chain().issues().is_empty());
        assert_eq!(chain().validate(), Ok(()));
    }

    #[test]
    fn missing_and_unknown_root() {
        let mut desc = chain();
        desc.root = None;
        assert_eq!(desc.validate(), Err(ValidationError::MissingRoot));

        desc.root = Some("nope".into());
        assert_eq!(
            desc.validate(),
            Err(ValidationError::UnknownRoot("nope".into()))
        );
    }

    #[test]
    fn duplicate_names_and_ports() {
        let desc = chain().with_node(
            NodeDescription::new("fx")
                .with_input("a")
                .with_input("a")
                .with_output("o"),
        );
        assert_eq!(
            desc.issues(),
            vec![
                ValidationError::DuplicateNode("fx".into()),
                ValidationError::DuplicatePort {
                    node: "fx".into(),
                    port: "a".into()
                },
            ]
        );
    }

    #[test]
    fn bad_connections_all_reported() {
        let desc = chain()
            .with_connection("ghost.out", "fx.in")
            .with_connection("in.wrong", "fx.nope")
            .with_connection("in", "fx.in")
            .with_connection("fx.out", "fx.in");

        let issues = desc.issues();
        assert!(issues.contains(&ValidationError::UnknownNode("ghost".into())));
        assert!(issues.contains(&ValidationError::UnknownOutput {
            node: "in".into(),
            port: "wrong".into()
        }));
        assert!(issues.contains(&ValidationError::UnknownInput {
            node: "fx".into(),
            port: "nope".into()
        }));
        assert!(issues.contains(&ValidationError::MalformedEndpoint("in".into())));
        assert!(issues.contains(&ValidationError::InputConnectedTwice("fx.in".into())));
        assert!(issues.contains(&ValidationError::SelfConnection("fx.out → fx.in".into())));

        let err = desc.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Multiple(ref v) if v.len() == issues.len()));
        assert!(err.to_string().starts_with("multiple validation errors: "));
    }
}
