//! Operator trait + chain composition.
//!
//! A chain is a linear sequence N₁ → N₂ → … → sink, composed tail-first:
//! each node is constructed around a shared handle to its successor, so a
//! successor is always present after construction. Ownership of a node is
//! shared between whoever built the chain and whoever feeds it; the chain
//! lives as long as the longest-lived handle.

use std::fmt;
use std::sync::{Arc, Mutex};

use tsflow_core::prelude::{Sample, Status};

/// Shared handle to a chained node.
///
/// Chains are single-threaded by contract (one `put` at a time, on the
/// producer's thread), but handles are `Send` so independent queries can run
/// on worker threads. Lock acquisition follows the poisoning-panics
/// convention.
pub type SharedNode = Arc<Mutex<dyn Node>>;

/// Runtime tag for a node, used by tests and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sink,
    FilterById,
    RandomSampler,
    MovingAverage,
    MovingMedian,
    SpaceSaver,
    AnomalyDetector,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Sink => "sink",
            NodeKind::FilterById => "filter-by-id",
            NodeKind::RandomSampler => "reservoir",
            NodeKind::MovingAverage => "moving-average",
            NodeKind::MovingMedian => "moving-median",
            NodeKind::SpaceSaver => "space-saver",
            NodeKind::AnomalyDetector => "anomaly-detector",
        };
        f.write_str(s)
    }
}

/// Trait that all operators must implement.
///
/// Invariants:
/// - `put` must be total: expected data conditions are handled by dropping
///   or transforming the sample, never by panicking.
/// - A `false` return from `put` means downstream is full or closed; the
///   caller must stop producing and the signal must reach the producer.
/// - `complete` is forwarded exactly once per stream; `set_error` is
///   forwarded unchanged.
/// - The empty sentinel must be recognized and acted on (usually
///   flush-and-forward); it is never filtered as data.
pub trait Node: Send {
    /// Consume one sample; `true` to continue, `false` to stop the producer.
    fn put(&mut self, sample: &Sample) -> bool;

    /// End-of-stream. Flush residual state, then complete the successor.
    fn complete(&mut self);

    /// Abort with a status, forwarded tail-ward to the sink.
    fn set_error(&mut self, status: Status);

    /// Runtime tag for tests and logging.
    fn kind(&self) -> NodeKind;
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:?})", self.kind())
    }
}

/// Wrap a node into a shared chain handle.
pub fn shared<N: Node + 'static>(node: N) -> SharedNode {
    Arc::new(Mutex::new(node))
}
