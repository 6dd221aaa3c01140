//! Validate a graph file.

use std::path::PathBuf;

use clap::Args;

use super::load_description;

#[derive(Args)]
pub struct CheckArgs {
    /// Graph description (TOML)
    pub file: PathBuf,
}

/// Run the check command.
///
/// Prints every validation issue, then tries a compile so cycles are caught
/// too. Fails if anything was found.
pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let desc = load_description(&args.file)?;

    let issues = desc.issues();
    if !issues.is_empty() {
        for issue in &issues {
            println!("error: {issue}");
        }
        anyhow::bail!(
            "{} has {} issue(s)",
            args.file.display(),
            issues.len()
        );
    }

    let built = desc.build()?;
    let schedule = built.compile()?;
    let scheduled = schedule.len();
    let unreachable = built.graph.node_count() - scheduled;

    println!(
        "ok: {} nodes, {} connections, latency {} samples",
        built.graph.node_count(),
        built.graph.connection_count(),
        schedule.total_latency()
    );
    if unreachable > 0 {
        println!("note: {unreachable} node(s) not reachable from the root");
        tracing::warn!(unreachable, "graph has nodes the root does not depend on");
    }
    Ok(())
}
