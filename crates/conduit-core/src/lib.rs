//! Conduit Core - audio dataflow graph scheduler
//!
//! This crate turns a graph of audio processing nodes into a flat execution
//! schedule. Compilation happens once, off the audio thread; the resulting
//! [`Schedule`] is immutable and can be executed every block without further
//! graph traversal.
//!
//! # Core Abstractions
//!
//! ## Graph Model
//!
//! - [`Graph`] - Arena of nodes addressed by stable [`NodeId`]s
//! - [`NodeSpec`] - Construction parameters: ports, delay, payload
//! - [`Connection`] - Upstream end of a connected input
//!
//! ## Compilation
//!
//! - [`compile()`] - Depth-first schedule compiler for a root node
//! - [`Schedule`] / [`ScheduledStep`] - Steps in dependency order with
//!   buffer bindings and per-input compensation delays
//! - [`BufferPool`] - LIFO free list the compiler draws buffer handles from
//! - [`latency`] - Latency propagation and compensation math
//!
//! ## Execution
//!
//! - [`render()`] - Walks a schedule against a [`RenderTarget`]
//! - [`BlockRenderer`] - Mono block renderer for [`Processor`] payloads
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! conduit-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use conduit_core::{Graph, InputIndex, NodeSpec, OutputIndex};
//!
//! let mut graph = Graph::new();
//! let source = graph.add_node(NodeSpec::new("source", ()).with_output("out"));
//! let left = graph.add_node(NodeSpec::new("left", ()).with_delay(1).with_input("in").with_output("out"));
//! let right = graph.add_node(NodeSpec::new("right", ()).with_delay(2).with_input("in").with_output("out"));
//! let sink = graph.add_node(NodeSpec::new("sink", ()).with_input("a").with_input("b").with_output("out"));
//!
//! graph.connect((source, OutputIndex(0)), (left, InputIndex(0))).unwrap();
//! graph.connect((source, OutputIndex(0)), (right, InputIndex(0))).unwrap();
//! graph.connect((left, OutputIndex(0)), (sink, InputIndex(0))).unwrap();
//! graph.connect((right, OutputIndex(0)), (sink, InputIndex(1))).unwrap();
//!
//! let schedule = conduit_core::compile(&graph, sink).unwrap();
//! assert_eq!(schedule.order().collect::<Vec<_>>(), vec![source, left, right, sink]);
//! assert_eq!(schedule.total_latency(), 2);
//! // The faster branch is held back by one sample.
//! assert_eq!(schedule.step_for(sink).unwrap().inputs[0].compensation, Some(1));
//! ```
//!
//! # Design Principles
//!
//! - **Compile once, run many**: all graph walking happens in [`compile()`]
//! - **Minimal memory**: buffers are recycled as soon as their last reader runs
//! - **No hidden state**: graphs carry no traversal marks, recompiling is always safe

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod compiler;
pub mod graph;
pub mod latency;
pub mod pool;
pub mod render;
pub mod schedule;

// Re-export main types at crate root
pub use compiler::{CompileError, compile};
pub use graph::{
    Connection, Graph, GraphError, InputIndex, InputPort, InputRef, Node, NodeId, NodeSpec,
    OutputIndex, OutputPort,
};
pub use latency::NodeLatency;
pub use pool::{BufferId, BufferPool};
pub use render::{BlockRenderer, CompensationDelay, Processor, RenderTarget, render};
pub use schedule::{InputBinding, LabeledBinding, OutputBinding, Schedule, ScheduledStep};
