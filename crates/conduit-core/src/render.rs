//! Executing a compiled schedule.
//!
//! [`render()`] is the contract between a [`Schedule`] and whatever owns the
//! buffer memory: walk the steps in order, and for each step first apply the
//! compensation delay of every input that carries one, then run the node.
//! What a buffer holds and how a delay is realised are up to the
//! [`RenderTarget`].
//!
//! [`BlockRenderer`] is a ready-made target for graphs whose payloads
//! implement [`Processor`]: every buffer handle is backed by a mono `f32`
//! block, compensation uses one [`CompensationDelay`] line per delayed input,
//! and unconnected inputs read silence.
//!
//! ```rust
//! use conduit_core::graph::{Graph, InputIndex, NodeSpec, OutputIndex};
//! use conduit_core::render::{BlockRenderer, Processor};
//!
//! struct Dc(f32);
//! impl Processor for Dc {
//!     fn process(&mut self, _inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
//!         outputs[0].fill(self.0);
//!     }
//! }
//! struct Gain(f32);
//! impl Processor for Gain {
//!     fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
//!         for (o, i) in outputs[0].iter_mut().zip(inputs[0]) {
//!             *o = i * self.0;
//!         }
//!     }
//! }
//!
//! let mut graph: Graph<Box<dyn Processor>> = Graph::new();
//! let dc = graph.add_node(NodeSpec::new("dc", Box::new(Dc(0.5)) as Box<dyn Processor>).with_output("out"));
//! let gain = graph.add_node(
//!     NodeSpec::new("gain", Box::new(Gain(2.0)) as Box<dyn Processor>)
//!         .with_input("in")
//!         .with_output("out"),
//! );
//! graph.connect((dc, OutputIndex(0)), (gain, InputIndex(0))).unwrap();
//!
//! let schedule = graph.compile(gain).unwrap();
//! let mut renderer = BlockRenderer::new(4);
//! renderer.run(&mut graph, &schedule);
//! assert_eq!(renderer.output(&schedule, OutputIndex(0)), Some(&[1.0; 4][..]));
//! ```

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec, vec::Vec};

use crate::graph::{Graph, InputRef, OutputIndex};
use crate::pool::BufferId;
use crate::schedule::{Schedule, ScheduledStep};

/// Memory side of schedule execution.
pub trait RenderTarget {
    /// Delays the contents of `buffer` by `amount` samples before the input
    /// at `at` reads it.
    ///
    /// The buffer may feed other inputs too, so implementations that delay
    /// in place must make sure no other reader of `buffer` runs afterwards.
    fn delay(&mut self, at: InputRef, buffer: BufferId, amount: usize);

    /// Runs the step's node over its bound buffers.
    fn process(&mut self, step: &ScheduledStep);
}

/// Runs every step of `schedule` against `target`, in order.
pub fn render<T: RenderTarget + ?Sized>(schedule: &Schedule, target: &mut T) {
    for step in schedule.steps() {
        for binding in &step.inputs {
            if let Some(amount) = binding.compensation {
                let at = InputRef {
                    node: step.node,
                    input: binding.port,
                };
                target.delay(at, binding.buffer, amount);
            }
        }
        target.process(step);
    }
}

/// A node's block processing callback.
///
/// `inputs` and `outputs` are in port order and all have the renderer's
/// block length. Implementations must write every output sample.
pub trait Processor {
    /// Processes one block.
    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]);
}

impl<T: Processor + ?Sized> Processor for Box<T> {
    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        (**self).process(inputs, outputs);
    }
}

/// Fixed-delay mono ring buffer for latency compensation.
#[derive(Debug, Clone)]
pub struct CompensationDelay {
    line: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
}

impl CompensationDelay {
    /// Creates a delay line. A delay of 0 passes samples through unchanged.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            line: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            delay_samples,
        }
    }

    /// Returns the delay in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Pushes one sample, returning the sample from `delay_samples` ago.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.delay_samples == 0 {
            return input;
        }
        let out = self.line[self.write_pos];
        self.line[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.delay_samples;
        out
    }

    /// Delays `input` into `output`, up to the shorter of the two.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for (o, &i) in output.iter_mut().zip(input) {
            *o = self.process(i);
        }
    }

    /// Clears the line to silence.
    pub fn clear(&mut self) {
        self.line.fill(0.0);
        self.write_pos = 0;
    }
}

/// Delay state for one compensated input.
#[derive(Debug)]
struct DelayedInput {
    at: InputRef,
    line: CompensationDelay,
    /// Delayed copy the input reads instead of the shared buffer.
    block: Vec<f32>,
}

/// Renders schedules over mono `f32` blocks.
///
/// Compensated inputs read a private delayed copy of their buffer, so a
/// buffer shared by several readers is never modified in place.
///
/// Buffers and delay lines are laid out by [`prepare()`](Self::prepare).
/// [`run()`](Self::run) prepares again whenever the schedule's buffer count
/// or set of compensated inputs differs from the current layout, which
/// resets all delay state.
#[derive(Debug)]
pub struct BlockRenderer {
    block_size: usize,
    buffers: Vec<Vec<f32>>,
    silence: Vec<f32>,
    delays: Vec<DelayedInput>,
}

impl BlockRenderer {
    /// Creates a renderer processing `block_size` samples per run.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            buffers: Vec::new(),
            silence: vec![0.0; block_size],
            delays: Vec::new(),
        }
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Allocates buffers and delay lines for `schedule`, clearing all state.
    pub fn prepare(&mut self, schedule: &Schedule) {
        let block_size = self.block_size;
        self.buffers = vec![vec![0.0; block_size]; schedule.buffer_count()];
        self.delays = delay_layout(schedule)
            .map(|(at, amount)| DelayedInput {
                at,
                line: CompensationDelay::new(amount),
                block: vec![0.0; block_size],
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_render: prepared {} buffers, {} delay lines, block {}",
            self.buffers.len(),
            self.delays.len(),
            self.block_size
        );
    }

    /// Renders one block of `schedule`, running the graph's processors.
    pub fn run<P: Processor>(&mut self, graph: &mut Graph<P>, schedule: &Schedule) {
        if !self.is_prepared_for(schedule) {
            self.prepare(schedule);
        }
        render(
            schedule,
            &mut GraphTarget {
                graph,
                renderer: self,
            },
        );
    }

    /// Contents of a buffer after the last run.
    pub fn buffer(&self, id: BufferId) -> Option<&[f32]> {
        self.buffers.get(id.index() as usize).map(Vec::as_slice)
    }

    /// What the schedule's root wrote to `port` in the last run.
    pub fn output(&self, schedule: &Schedule, port: OutputIndex) -> Option<&[f32]> {
        let step = schedule.step_for(schedule.root())?;
        self.buffer(step.output(port)?.buffer)
    }

    /// Whether buffers and delay lines match `schedule`.
    fn is_prepared_for(&self, schedule: &Schedule) -> bool {
        self.buffers.len() == schedule.buffer_count()
            && self
                .delays
                .iter()
                .map(|d| (d.at, d.line.delay_samples()))
                .eq(delay_layout(schedule))
    }

    fn delayed(&self, at: InputRef) -> Option<&[f32]> {
        self.delays
            .iter()
            .find(|d| d.at == at)
            .map(|d| d.block.as_slice())
    }
}

/// Every compensated input of `schedule` with its delay, in step order.
fn delay_layout(schedule: &Schedule) -> impl Iterator<Item = (InputRef, usize)> + '_ {
    schedule.steps().iter().flat_map(|step| {
        step.inputs.iter().filter_map(move |b| {
            b.compensation.map(|amount| {
                let at = InputRef {
                    node: step.node,
                    input: b.port,
                };
                (at, amount)
            })
        })
    })
}

struct GraphTarget<'a, P> {
    graph: &'a mut Graph<P>,
    renderer: &'a mut BlockRenderer,
}

impl<P: Processor> RenderTarget for GraphTarget<'_, P> {
    fn delay(&mut self, at: InputRef, buffer: BufferId, _amount: usize) {
        let r = &mut *self.renderer;
        let Some(src) = r.buffers.get(buffer.index() as usize) else {
            return;
        };
        if let Some(d) = r.delays.iter_mut().find(|d| d.at == at) {
            d.line.process_block(src, &mut d.block);
        }
    }

    fn process(&mut self, step: &ScheduledStep) {
        let Some(node) = self.graph.node_mut(step.node) else {
            return;
        };
        let r = &mut *self.renderer;

        // Outputs never alias inputs, so they can be moved out while the
        // inputs are borrowed.
        let mut outputs: Vec<Vec<f32>> = step
            .outputs
            .iter()
            .map(|b| {
                r.buffers
                    .get_mut(b.buffer.index() as usize)
                    .map(core::mem::take)
                    .unwrap_or_default()
            })
            .collect();

        {
            let inputs: Vec<&[f32]> = step
                .inputs
                .iter()
                .map(|b| {
                    let at = InputRef {
                        node: step.node,
                        input: b.port,
                    };
                    match (b.source, b.compensation) {
                        (None, _) => r.silence.as_slice(),
                        (Some(_), Some(_)) => r.delayed(at).unwrap_or(r.silence.as_slice()),
                        (Some(_), None) => r
                            .buffers
                            .get(b.buffer.index() as usize)
                            .map_or(r.silence.as_slice(), Vec::as_slice),
                    }
                })
                .collect();
            let mut slices: Vec<&mut [f32]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
            node.payload_mut().process(&inputs, &mut slices);
        }

        for (binding, block) in step.outputs.iter().zip(outputs) {
            if let Some(slot) = r.buffers.get_mut(binding.buffer.index() as usize) {
                *slot = block;
            }
        }
    }
}
