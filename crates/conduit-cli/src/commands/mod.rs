//! CLI command implementations.

pub mod check;
pub mod compile;

use std::path::Path;

use anyhow::Context;
use conduit_config::GraphDescription;

/// Load a graph description, naming the file in any error.
pub fn load_description(path: &Path) -> anyhow::Result<GraphDescription> {
    let desc = GraphDescription::load(path)
        .with_context(|| format!("could not load graph from {}", path.display()))?;
    tracing::info!(
        file = %path.display(),
        nodes = desc.nodes.len(),
        connections = desc.connections.len(),
        "loaded graph description"
    );
    Ok(desc)
}
