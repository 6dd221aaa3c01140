//! Error types for configuration operations.

use std::path::PathBuf;

use conduit_core::{CompileError, GraphError};
use thiserror::Error;

/// File operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Reading a graph file.
    Read,
    /// Writing a graph file.
    Write,
    /// Creating the directory a graph file is saved into.
    CreateDir,
}

impl std::fmt::Display for IoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Read => "read graph file",
            Self::Write => "write graph file",
            Self::CreateDir => "create directory",
        })
    }
}

/// Errors that can occur while loading, saving or building a graph description.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file operation on a graph description failed.
    #[error("could not {op} '{path}': {source}")]
    Io {
        /// What was being done.
        op: IoOp,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The description is inconsistent
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// The graph rejected a connection
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The graph could not be compiled
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

impl ConfigError {
    /// Wraps an I/O error with the operation and path it came from.
    pub fn io(op: IoOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{Graph, NodeSpec};
    use std::error::Error as _;

    #[test]
    fn io_errors_keep_source() {
        let err = ConfigError::io(
            IoOp::Read,
            "graphs/missing.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            err.to_string(),
            "could not read graph file 'graphs/missing.toml': no such file"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn io_op_wording() {
        let denied = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            ConfigError::io(IoOp::Write, "out.toml", denied()).to_string(),
            "could not write graph file 'out.toml': denied"
        );
        assert_eq!(
            ConfigError::io(IoOp::CreateDir, "graphs", denied()).to_string(),
            "could not create directory 'graphs': denied"
        );
    }

    #[test]
    fn wraps_core_errors() {
        let mut graph = Graph::new();
        let gone = graph.add_node(NodeSpec::new("gone", ()));
        graph.remove_node(gone).unwrap();
        let err: ConfigError = graph.compile(gone).unwrap_err().into();
        assert_eq!(err.to_string(), "compile error: node NodeId(0) not found");
    }
}
