//! Compile a graph file and print the resulting schedule.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use conduit_config::BuiltGraph;
use conduit_core::{InputBinding, OutputBinding, Schedule, ScheduledStep};
use serde::Serialize;

use super::load_description;

/// Output format for the schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Graph description (TOML)
    pub file: PathBuf,

    /// Compile for this node instead of the file's root
    #[arg(long, value_name = "NODE")]
    pub root: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Schedule as printed by `--format json`.
#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    name: String,
    root: String,
    total_latency: usize,
    buffer_count: usize,
    compensations: usize,
    steps: Vec<StepReport>,
}

#[derive(Debug, Serialize)]
struct StepReport {
    node: String,
    latency: usize,
    inputs: Vec<InputReport>,
    outputs: Vec<OutputReport>,
}

#[derive(Debug, Serialize)]
struct InputReport {
    port: String,
    buffer: u32,
    #[serde(skip)]
    binding: InputBinding,
    #[serde(skip_serializing_if = "Option::is_none")]
    compensation: Option<usize>,
    /// `node.port` of the upstream output, absent for unconnected inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputReport {
    port: String,
    buffer: u32,
    #[serde(skip)]
    binding: OutputBinding,
}

impl ScheduleReport {
    /// Resolves node and port names of `schedule` against `built`.
    pub fn new(built: &BuiltGraph, schedule: &Schedule) -> Self {
        Self {
            name: built.name.clone(),
            root: name_of(built, schedule.root()),
            total_latency: schedule.total_latency(),
            buffer_count: schedule.buffer_count(),
            compensations: schedule.compensation_count(),
            steps: schedule
                .steps()
                .iter()
                .map(|s| StepReport::new(built, s))
                .collect(),
        }
    }
}

impl StepReport {
    fn new(built: &BuiltGraph, step: &ScheduledStep) -> Self {
        let node = built.graph.node(step.node);
        Self {
            node: name_of(built, step.node),
            latency: step.latency,
            inputs: step
                .inputs
                .iter()
                .map(|b| InputReport {
                    port: node
                        .and_then(|n| n.input(b.port))
                        .map_or_else(|| b.port.to_string(), |p| p.name().to_string()),
                    buffer: b.buffer.index(),
                    binding: *b,
                    compensation: b.compensation,
                    source: b.source.map(|c| {
                        let port = built
                            .graph
                            .node(c.node)
                            .and_then(|n| n.output(c.output))
                            .map_or_else(|| c.output.to_string(), |p| p.name().to_string());
                        format!("{}.{}", name_of(built, c.node), port)
                    }),
                })
                .collect(),
            outputs: step
                .outputs
                .iter()
                .map(|b| OutputReport {
                    port: node
                        .and_then(|n| n.output(b.port))
                        .map_or_else(|| b.port.to_string(), |p| p.name().to_string()),
                    buffer: b.buffer.index(),
                    binding: *b,
                })
                .collect(),
        }
    }
}

fn name_of(built: &BuiltGraph, id: conduit_core::NodeId) -> String {
    built
        .node_name(id)
        .map_or_else(|| id.to_string(), str::to_string)
}

fn print_text(report: &ScheduleReport) {
    println!(
        "{} (root '{}'): {} steps, {} buffers, latency {} samples",
        report.name,
        report.root,
        report.steps.len(),
        report.buffer_count,
        report.total_latency
    );
    println!();

    let width = report
        .steps
        .iter()
        .map(|s| s.node.len())
        .max()
        .unwrap_or(4)
        .max(4);
    println!("  {:>3}  {:width$}  {:>7}  {}", "#", "Node", "Latency", "Bindings");
    println!("  {:>3}  {:width$}  {:>7}  {}", "-", "----", "-------", "--------");

    for (i, step) in report.steps.iter().enumerate() {
        let inputs: Vec<String> = step
            .inputs
            .iter()
            .map(|b| b.binding.labeled(&b.port).to_string())
            .collect();
        let outputs: Vec<String> = step
            .outputs
            .iter()
            .map(|b| b.binding.labeled(&b.port).to_string())
            .collect();
        println!(
            "  {:>3}  {:width$}  {:>7}  [{}] -> [{}]",
            i,
            step.node,
            step.latency,
            inputs.join(", "),
            outputs.join(", ")
        );
    }

    if report.compensations > 0 {
        println!();
        println!("{} input(s) delayed for alignment", report.compensations);
    }
}

/// Run the compile command.
pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    let mut desc = load_description(&args.file)?;
    if let Some(root) = args.root {
        desc.root = Some(root);
    }

    let built = desc.build()?;
    let schedule = built.compile()?;
    tracing::info!(
        steps = schedule.len(),
        buffers = schedule.buffer_count(),
        latency = schedule.total_latency(),
        "compiled schedule"
    );

    let report = ScheduleReport::new(&built, &schedule);
    match args.format {
        Format::Text => print_text(&report),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_config::{GraphDescription, NodeDescription};

    fn built() -> BuiltGraph {
        GraphDescription::new("mix")
            .with_root("sum")
            .with_node(NodeDescription::new("a").with_delay(3).with_output("out"))
            .with_node(
                NodeDescription::new("sum")
                    .with_input("x")
                    .with_input("y")
                    .with_input("z")
                    .with_output("out"),
            )
            .with_connection("a.out", "sum.x")
            .build()
            .unwrap()
    }

    #[test]
    fn report_resolves_names() {
        let built = built();
        let schedule = built.compile().unwrap();
        let report = ScheduleReport::new(&built, &schedule);

        assert_eq!(report.root, "sum");
        assert_eq!(report.total_latency, 3);
        assert_eq!(report.steps.len(), 2);
        let sum = &report.steps[1];
        assert_eq!(sum.node, "sum");
        assert_eq!(sum.inputs[0].source.as_deref(), Some("a.out"));
        assert_eq!(sum.inputs[1].source, None);
        assert_eq!(sum.outputs[0].port, "out");
        let x = &sum.inputs[0];
        assert_eq!(x.binding.labeled(&x.port).to_string(), "x=buf[0]");
    }

    #[test]
    fn json_omits_empty_fields() {
        let built = built();
        let schedule = built.compile().unwrap();
        let json = serde_json::to_value(ScheduleReport::new(&built, &schedule)).unwrap();

        assert_eq!(json["name"], "mix");
        assert_eq!(json["steps"][1]["inputs"][0]["source"], "a.out");
        assert!(json["steps"][1]["inputs"][1].get("source").is_none());
        assert!(json["steps"][1]["inputs"][0].get("compensation").is_none());
    }
}
