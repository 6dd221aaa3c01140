//! Latency propagation and per-input compensation.
//!
//! Every node imparts a fixed `delay` to the signals passing through it. The
//! arrival time of data at a node is
//!
//! ```text
//! latency(node) = max(latency(input) for each input, default 0) + delay(node)
//! ```
//!
//! where an unconnected input contributes 0. When a node's inputs arrive at
//! different times, the faster ones are held back so all inputs line up:
//!
//! ```text
//! compensation(input) = max_input_latency(node) - latency(input)
//! ```
//!
//! A compensation of zero is reported as `None`, so only inputs that actually
//! need a delay line carry one.
//!
//! The compiler evaluates this once per node, after every upstream node has
//! been resolved and before the node's step is appended.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Latency solution for a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLatency {
    /// Latest arrival among the node's inputs.
    pub max_input: usize,
    /// Arrival time at the node's outputs (`max_input + delay`).
    pub latency: usize,
    /// Per-input compensation, in port order. `None` means no delay needed.
    pub compensations: Vec<Option<usize>>,
}

/// Solves the latency recurrence for one node.
///
/// `inputs` holds one entry per input port, in port order: the resolved
/// latency of the upstream node for connected inputs, `None` for unconnected
/// ones. Unconnected inputs count as latency 0 and never get compensation.
///
/// Returns `None` if `max_input + delay` does not fit in a `usize`.
pub fn solve(inputs: &[Option<usize>], delay: usize) -> Option<NodeLatency> {
    let max_input = max_input_latency(inputs.iter().map(|l| l.unwrap_or(0)));
    let latency = max_input.checked_add(delay)?;
    let compensations = inputs
        .iter()
        .map(|l| l.and_then(|lat| compensation(max_input, lat)))
        .collect();
    Some(NodeLatency {
        max_input,
        latency,
        compensations,
    })
}

/// Maximum of the given input latencies, or 0 when there are none.
#[inline]
pub fn max_input_latency(latencies: impl IntoIterator<Item = usize>) -> usize {
    latencies.into_iter().max().unwrap_or(0)
}

/// Delay needed to align an input arriving at `input_latency` with the
/// slowest input at `max_input`. Returns `None` when no delay is needed.
#[inline]
pub fn compensation(max_input: usize, input_latency: usize) -> Option<usize> {
    match max_input.saturating_sub(input_latency) {
        0 => None,
        delay => Some(delay),
    }
}
