//! Property-based tests for the schedule compiler.
//!
//! Generates random acyclic graphs (nodes only read from earlier nodes, with
//! some inputs left unconnected and some outputs unread) and checks ordering,
//! buffer safety, buffer economy and latency arithmetic of the compiled
//! schedule for the last node.

use std::collections::{HashMap, HashSet};

use conduit_core::{
    BufferId, Connection, Graph, InputIndex, NodeId, NodeSpec, OutputIndex, Schedule, compile,
};
use proptest::prelude::*;

/// One generated node: delay, output count, and per input an optional
/// (upstream seed, output seed) pair.
type NodeShape = (usize, usize, Vec<Option<(usize, usize)>>);

fn node_shapes() -> impl Strategy<Value = Vec<NodeShape>> {
    prop::collection::vec(
        (
            0usize..4,
            1usize..3,
            prop::collection::vec(prop::option::weighted(0.8, (any::<usize>(), any::<usize>())), 0..4),
        ),
        1..16,
    )
}

/// Builds a DAG from shapes. Returns the graph and its last node.
fn build(shapes: &[NodeShape]) -> (Graph<()>, NodeId) {
    let mut graph = Graph::new();
    let mut ids: Vec<NodeId> = Vec::new();
    let mut outputs: Vec<usize> = Vec::new();

    for (i, (delay, n_out, inputs)) in shapes.iter().enumerate() {
        let mut spec = NodeSpec::new(format!("n{i}"), ()).with_delay(*delay);
        for k in 0..inputs.len() {
            spec = spec.with_input(format!("in{k}"));
        }
        for k in 0..*n_out {
            spec = spec.with_output(format!("out{k}"));
        }
        let id = graph.add_node(spec);

        for (k, input) in inputs.iter().enumerate() {
            if let Some((up_seed, out_seed)) = input
                && i > 0
            {
                let up = up_seed % i;
                let out = out_seed % outputs[up];
                graph
                    .connect((ids[up], OutputIndex(out)), (id, InputIndex(k)))
                    .unwrap();
            }
        }
        ids.push(id);
        outputs.push(*n_out);
    }
    (graph, *ids.last().unwrap())
}

/// Nodes the root transitively reads from, root included.
fn reachable(graph: &Graph<()>, root: NodeId) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(graph.incoming(id).map(|(_, c)| c.node));
        }
    }
    seen
}

/// Upper bound on simultaneously live buffers: at each step, outputs written
/// at or before it and still to be read at or after it, plus one scratch.
fn max_live(schedule: &Schedule) -> usize {
    let steps = schedule.steps();
    let mut last_read: HashMap<Connection, usize> = HashMap::new();
    for (i, step) in steps.iter().enumerate() {
        for src in step.inputs.iter().filter_map(|b| b.source) {
            last_read.insert(src, i);
        }
    }

    (0..steps.len())
        .map(|s| {
            let live = steps[..=s]
                .iter()
                .enumerate()
                .flat_map(|(p, step)| {
                    step.outputs
                        .iter()
                        .map(move |o| (p, Connection::new(step.node, o.port)))
                })
                .filter(|(p, conn)| *p == s || last_read.get(conn).is_some_and(|&r| r >= s))
                .count();
            let scratch = usize::from(steps[s].inputs.iter().any(|b| b.source.is_none()));
            live + scratch
        })
        .max()
        .unwrap_or(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Exactly the reachable nodes are scheduled, each once, after everything
    /// they read from.
    #[test]
    fn schedule_is_topological_over_reachable(shapes in node_shapes()) {
        let (graph, root) = build(&shapes);
        let schedule = compile(&graph, root).unwrap();

        let scheduled: Vec<NodeId> = schedule.order().collect();
        let unique: HashSet<NodeId> = scheduled.iter().copied().collect();
        prop_assert_eq!(unique.len(), scheduled.len(), "node scheduled twice");
        prop_assert_eq!(unique, reachable(&graph, root));
        prop_assert_eq!(scheduled.last().copied(), Some(root));

        for (i, step) in schedule.steps().iter().enumerate() {
            for src in step.inputs.iter().filter_map(|b| b.source) {
                let up = scheduled.iter().position(|&n| n == src.node).unwrap();
                prop_assert!(up < i, "{} runs before its input {}", step.node, src.node);
            }
        }
    }

    /// Every connected input reads the buffer its upstream output wrote, and
    /// nothing overwrites that buffer in between.
    #[test]
    fn buffers_never_clobbered_before_read(shapes in node_shapes()) {
        let (graph, root) = build(&shapes);
        let schedule = compile(&graph, root).unwrap();
        let steps = schedule.steps();

        for (i, step) in steps.iter().enumerate() {
            let own: Vec<BufferId> = step.outputs.iter().map(|o| o.buffer).collect();
            for binding in &step.inputs {
                prop_assert!(!own.contains(&binding.buffer), "step {} reads its own output", i);
                let Some(src) = binding.source else { continue };
                let p = steps.iter().position(|s| s.node == src.node).unwrap();
                let written = steps[p].output(src.output).unwrap().buffer;
                prop_assert_eq!(binding.buffer, written);
                for between in &steps[p + 1..i] {
                    prop_assert!(
                        between.outputs.iter().all(|o| o.buffer != written),
                        "{} overwrites {} before {} reads it",
                        between.node, written, step.node
                    );
                }
            }
        }
    }

    /// The compiler never uses more buffers than are simultaneously live.
    #[test]
    fn buffer_count_within_live_bound(shapes in node_shapes()) {
        let (graph, root) = build(&shapes);
        let schedule = compile(&graph, root).unwrap();
        prop_assert!(schedule.buffer_count() <= max_live(&schedule));
        for step in schedule.steps() {
            for b in step.inputs.iter().map(|b| b.buffer).chain(step.outputs.iter().map(|b| b.buffer)) {
                prop_assert!((b.index() as usize) < schedule.buffer_count());
            }
        }
    }

    /// latency = max(input latencies) + delay; compensation fills the gap.
    #[test]
    fn latency_recurrence_holds(shapes in node_shapes()) {
        let (graph, root) = build(&shapes);
        let schedule = compile(&graph, root).unwrap();

        for step in schedule.steps() {
            let node = graph.node(step.node).unwrap();
            let arrivals: Vec<Option<usize>> = step
                .inputs
                .iter()
                .map(|b| b.source.map(|s| schedule.latency_of(s.node).unwrap()))
                .collect();
            let max_in = arrivals.iter().map(|a| a.unwrap_or(0)).max().unwrap_or(0);
            prop_assert_eq!(step.latency, max_in + node.delay());

            for (binding, arrival) in step.inputs.iter().zip(&arrivals) {
                match arrival {
                    Some(a) if *a < max_in => prop_assert_eq!(binding.compensation, Some(max_in - a)),
                    _ => prop_assert_eq!(binding.compensation, None),
                }
            }
        }
    }

    /// Compiling twice yields the same schedule.
    #[test]
    fn compile_is_deterministic(shapes in node_shapes()) {
        let (graph, root) = build(&shapes);
        prop_assert_eq!(compile(&graph, root).unwrap(), compile(&graph, root).unwrap());
    }
}
