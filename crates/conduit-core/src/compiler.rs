//! Depth-first schedule compiler.
//!
//! [`compile()`] turns a [`Graph`] and a designated root node into a
//! [`Schedule`] in one traversal that does three jobs at once:
//!
//! - **Ordering**: a node's step is appended only after every node it reads
//!   from has been appended ("visit upstream, then append"), which yields a
//!   topological order. Nodes the root does not depend on are never visited
//!   and so never scheduled.
//! - **Buffer binding**: output buffers come from a LIFO [`BufferPool`]. A
//!   buffer is held from the step that writes it until the step of its last
//!   reader, then released for the next node to reuse. A linear chain of any
//!   length ping-pongs between two buffers.
//! - **Latency**: each node's latency is the latest arrival among its inputs
//!   plus its own delay; faster inputs get a compensation delay (see
//!   [`latency`](crate::latency)).
//!
//! The traversal runs on an explicit work stack, one frame per node in
//! progress, so graph depth never translates into call-stack depth. All
//! per-pass state (visit marks, resolved buffers, reader counts) lives in the
//! compiler, not on the graph, so compiling the same graph twice gives the
//! same schedule without any reset.
//!
//! # Buffer lifetime
//!
//! When a node's frame finishes, in this order:
//!
//! 1. one buffer is acquired per output port;
//! 2. each unconnected input gets a scratch buffer that is released at once;
//! 3. upstream buffers whose last reachable reader is this node are released.
//!
//! Outputs are acquired while the node's inputs are still held, so a step
//! never writes a buffer it reads. Reader counts are taken over the
//! reachable subgraph before the traversal, so consumers the root does not
//! depend on keep nothing alive.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::graph::{Connection, Graph, InputIndex, Node, NodeId, OutputIndex};
use crate::latency;
use crate::pool::{BufferId, BufferPool, id_pool};
use crate::schedule::{InputBinding, OutputBinding, Schedule, ScheduledStep};

/// Errors that abort a compile. No partial schedule is ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The root, or a node named by a connection, does not exist.
    NodeNotFound(NodeId),
    /// An input names an output its upstream node does not have.
    MissingOutput {
        /// Node owning the input.
        node: NodeId,
        /// The offending input.
        input: InputIndex,
        /// The connection that could not be resolved.
        upstream: Connection,
    },
    /// A node's latency does not fit in a `usize`.
    LatencyOverflow {
        /// Node whose latency overflowed.
        node: NodeId,
    },
    /// The root depends on a cycle.
    CycleDetected {
        /// Nodes on the cycle, each one reading from the next, the last one
        /// reading from the first.
        cycle: Vec<NodeId>,
    },
}

impl core::fmt::Display for CompileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::MissingOutput {
                node,
                input,
                upstream,
            } => write!(
                f,
                "input {input} of {node} reads {}.{}, which does not exist",
                upstream.node, upstream.output
            ),
            Self::LatencyOverflow { node } => {
                write!(f, "latency of {node} overflows")
            }
            Self::CycleDetected { cycle } => {
                f.write_str("cycle detected: ")?;
                for id in cycle {
                    write!(f, "{id} ← ")?;
                }
                match cycle.first() {
                    Some(first) => write!(f, "{first}"),
                    None => Ok(()),
                }
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CompileError {}

/// Compiles the part of `graph` that `root` depends on into a [`Schedule`].
///
/// # Errors
///
/// Returns [`CompileError`] if:
/// - `root` (or a node some connection names) does not exist
/// - an input names an output its upstream node lacks
/// - the root depends on a cycle
/// - accumulated delay along some path overflows `usize`
pub fn compile<P>(graph: &Graph<P>, root: NodeId) -> Result<Schedule, CompileError> {
    compiler(graph).run(root)
}

impl<P> Graph<P> {
    /// Compiles this graph for `root`. See [`compile()`].
    pub fn compile(&self, root: NodeId) -> Result<Schedule, CompileError> {
        compile(self, root)
    }
}

/// Per-pass visit state of one node.
enum Visit {
    Unvisited,
    InProgress,
    Done {
        latency: usize,
        outputs: Vec<BufferId>,
    },
}

/// A resolved connected input, waiting for its node to finish.
#[derive(Clone, Copy)]
struct Bound {
    buffer: BufferId,
    latency: usize,
    source: Connection,
}

/// Work-stack frame: a node whose inputs are being resolved in port order.
struct Frame {
    node: NodeId,
    /// One entry per input already visited. `None` = unconnected.
    bound: Vec<Option<Bound>>,
}

impl Frame {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            bound: Vec::new(),
        }
    }
}

struct Compiler<'g, P, F> {
    graph: &'g Graph<P>,
    visits: Vec<Visit>,
    /// Remaining reachable readers per node output, indexed `[node][output]`.
    readers: Vec<Vec<usize>>,
    pool: BufferPool<BufferId, F>,
    steps: Vec<ScheduledStep>,
    step_index: Vec<Option<usize>>,
}

fn compiler<P>(graph: &Graph<P>) -> Compiler<'_, P, impl FnMut() -> BufferId> {
    let n = graph.capacity();
    Compiler {
        graph,
        visits: (0..n).map(|_| Visit::Unvisited).collect(),
        readers: Vec::with_capacity(n),
        pool: id_pool(),
        steps: Vec::new(),
        step_index: vec![None; n],
    }
}

impl<'g, P, F> Compiler<'g, P, F>
where
    F: FnMut() -> BufferId,
{
    fn run(mut self, root: NodeId) -> Result<Schedule, CompileError> {
        self.node(root)?;
        self.count_readers(root);

        let mut stack = vec![Frame::new(root)];
        self.visits[root.0 as usize] = Visit::InProgress;

        while let Some(frame) = stack.last_mut() {
            let node = self.node(frame.node)?;
            let Some(port) = node.inputs.get(frame.bound.len()) else {
                // All inputs resolved: finish the node.
                if let Some(frame) = stack.pop() {
                    self.finish(frame)?;
                }
                continue;
            };
            let Some(conn) = port.connection else {
                frame.bound.push(None);
                continue;
            };

            let input = InputIndex(frame.bound.len());
            let upstream = self.node(conn.node)?;
            match &self.visits[conn.node.0 as usize] {
                Visit::Done { latency, outputs } => {
                    let buffer = *outputs.get(conn.output.0).ok_or(CompileError::MissingOutput {
                        node: frame.node,
                        input,
                        upstream: conn,
                    })?;
                    frame.bound.push(Some(Bound {
                        buffer,
                        latency: *latency,
                        source: conn,
                    }));
                }
                Visit::InProgress => {
                    let start = stack
                        .iter()
                        .position(|f| f.node == conn.node)
                        .unwrap_or(0);
                    let cycle = stack[start..].iter().map(|f| f.node).collect();
                    return Err(CompileError::CycleDetected { cycle });
                }
                Visit::Unvisited => {
                    if conn.output.0 >= upstream.outputs.len() {
                        return Err(CompileError::MissingOutput {
                            node: frame.node,
                            input,
                            upstream: conn,
                        });
                    }
                    self.visits[conn.node.0 as usize] = Visit::InProgress;
                    stack.push(Frame::new(conn.node));
                }
            }
        }

        let buffer_count = self
            .steps
            .iter()
            .flat_map(|s| {
                s.inputs
                    .iter()
                    .map(|b| b.buffer)
                    .chain(s.outputs.iter().map(|b| b.buffer))
            })
            .map(|b| b.0 as usize + 1)
            .max()
            .unwrap_or(0);

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                "graph_compile: {} steps, {} buffers, root latency {}",
                self.steps.len(),
                buffer_count,
                self.steps.last().map_or(0, |s| s.latency)
            );
            for (i, step) in self.steps.iter().enumerate() {
                tracing::debug!("  step[{i}]: {step}");
            }
        }

        Ok(Schedule {
            root,
            steps: self.steps,
            buffer_count,
            step_index: self.step_index,
        })
    }

    fn node(&self, id: NodeId) -> Result<&'g Node<P>, CompileError> {
        let graph: &'g Graph<P> = self.graph;
        graph.node(id).ok_or(CompileError::NodeNotFound(id))
    }

    /// Counts, for every output, the inputs reading it among nodes reachable
    /// upstream from `root`.
    fn count_readers(&mut self, root: NodeId) {
        let graph = self.graph;
        self.readers = (0..graph.capacity())
            .map(|i| {
                graph
                    .node(NodeId(i as u32))
                    .map_or_else(Vec::new, |n| vec![0; n.outputs.len()])
            })
            .collect();

        let mut seen = vec![false; graph.capacity()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match seen.get_mut(id.0 as usize) {
                Some(s) if !*s => *s = true,
                _ => continue,
            }
            for (_, conn) in graph.incoming(id) {
                if let Some(count) = self
                    .readers
                    .get_mut(conn.node.0 as usize)
                    .and_then(|r| r.get_mut(conn.output.0))
                {
                    *count += 1;
                }
                stack.push(conn.node);
            }
        }
    }

    /// Binds buffers, solves latency, and appends the step for `frame.node`.
    fn finish(&mut self, frame: Frame) -> Result<(), CompileError> {
        let node = self.node(frame.node)?;

        let outputs: Vec<OutputBinding> = (0..node.outputs.len())
            .map(|i| OutputBinding {
                port: OutputIndex(i),
                buffer: self.pool.acquire(),
            })
            .collect();

        let input_latencies: Vec<Option<usize>> =
            frame.bound.iter().map(|b| b.map(|b| b.latency)).collect();
        let solved = latency::solve(&input_latencies, node.delay).ok_or(
            CompileError::LatencyOverflow { node: frame.node },
        )?;

        let inputs: Vec<InputBinding> = frame
            .bound
            .iter()
            .zip(solved.compensations)
            .enumerate()
            .map(|(i, (bound, compensation))| {
                let (buffer, source) = match bound {
                    Some(b) => (b.buffer, Some(b.source)),
                    None => {
                        // Nothing writes an unconnected input: zero hold time.
                        let scratch = self.pool.acquire();
                        self.pool.release(scratch);
                        (scratch, None)
                    }
                };
                InputBinding {
                    port: InputIndex(i),
                    buffer,
                    compensation,
                    source,
                }
            })
            .collect();

        // Reverse port order, so the first input's buffer is reused first.
        for bound in frame.bound.iter().rev().flatten() {
            self.release_read(bound.source, bound.buffer);
        }

        let node_idx = frame.node.0 as usize;
        // Outputs nobody reachable reads are dead as soon as they are written.
        for binding in outputs.iter().rev() {
            if self.readers[node_idx][binding.port.0] == 0 {
                self.pool.release(binding.buffer);
            }
        }

        self.visits[node_idx] = Visit::Done {
            latency: solved.latency,
            outputs: outputs.iter().map(|b| b.buffer).collect(),
        };
        self.step_index[node_idx] = Some(self.steps.len());
        self.steps.push(ScheduledStep {
            node: frame.node,
            latency: solved.latency,
            inputs,
            outputs,
        });
        Ok(())
    }

    /// Records that one reader of `source` is done; frees the buffer after the last.
    fn release_read(&mut self, source: Connection, buffer: BufferId) {
        let Some(count) = self
            .readers
            .get_mut(source.node.0 as usize)
            .and_then(|r| r.get_mut(source.output.0))
        else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.pool.release(buffer);
        }
    }
}
