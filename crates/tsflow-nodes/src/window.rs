//! Generic per-series sliding-window aggregation.
//!
//! `SlidingWindowNode<S>` keeps one `S` per series within the current time
//! bucket. Data samples feed their series' state; the empty sentinel closes
//! the bucket: every ready series emits one synthetic float sample stamped
//! with the boundary timestamp, states reset, and the sentinel is forwarded.
//! `complete` does not auto-flush; a producer that wants the tail bucket
//! emitted sends a terminal sentinel first.

use std::collections::HashMap;

use tsflow_core::prelude::{ParamId, Sample, Status, Timestamp};

use crate::node::{Node, NodeKind, SharedNode};

/// Per-series aggregation state, reset at each bucket boundary.
pub trait WindowState: Default + Send {
    fn add(&mut self, sample: &Sample);
    fn ready(&self) -> bool;
    fn value(&mut self) -> f64;
    fn reset(&mut self);
}

pub struct SlidingWindowNode<S: WindowState> {
    kind: NodeKind,
    counters: HashMap<ParamId, S>,
    next: SharedNode,
}

impl<S: WindowState> SlidingWindowNode<S> {
    fn with_kind(kind: NodeKind, next: SharedNode) -> Self {
        Self {
            kind,
            counters: HashMap::new(),
            next,
        }
    }

    /// Emit every ready series for the closing bucket, then forward the
    /// sentinel. Emission order across series is unspecified.
    fn flush(&mut self, boundary: &Sample) -> bool {
        let ts: Timestamp = boundary.timestamp;
        for (&paramid, state) in self.counters.iter_mut() {
            if state.ready() {
                let sample = Sample::float(paramid, ts, state.value());
                state.reset();
                if !self.next.lock().unwrap().put(&sample) {
                    return false;
                }
            }
        }
        self.next.lock().unwrap().put(boundary)
    }
}

impl<S: WindowState> Node for SlidingWindowNode<S> {
    fn put(&mut self, sample: &Sample) -> bool {
        if sample.is_sentinel() {
            return self.flush(sample);
        }
        // Blobs and id-only samples are ignored.
        if sample.float_value().is_some() {
            self.counters.entry(sample.paramid).or_default().add(sample);
        }
        true
    }

    fn complete(&mut self) {
        self.next.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.next.lock().unwrap().set_error(status);
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// Arithmetic mean of a bucket.
#[derive(Debug, Default)]
pub struct MeanState {
    acc: f64,
    num: usize,
}

impl WindowState for MeanState {
    fn add(&mut self, sample: &Sample) {
        if let Some(v) = sample.float_value() {
            self.acc += v;
            self.num += 1;
        }
    }

    fn ready(&self) -> bool {
        self.num != 0
    }

    fn value(&mut self) -> f64 {
        self.acc / self.num as f64
    }

    fn reset(&mut self) {
        self.acc = 0.0;
        self.num = 0;
    }
}

/// Median of a bucket: the element at position ⌊n/2⌋ of the sorted values.
#[derive(Debug, Default)]
pub struct MedianState {
    values: Vec<f64>,
}

impl WindowState for MedianState {
    fn add(&mut self, sample: &Sample) {
        if let Some(v) = sample.float_value() {
            self.values.push(v);
        }
    }

    fn ready(&self) -> bool {
        !self.values.is_empty()
    }

    fn value(&mut self) -> f64 {
        let mid = self.values.len() / 2;
        let (_, element, _) = self
            .values
            .select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        *element
    }

    fn reset(&mut self) {
        self.values = Vec::new();
    }
}

pub type MovingAverageNode = SlidingWindowNode<MeanState>;
pub type MovingMedianNode = SlidingWindowNode<MedianState>;

impl MovingAverageNode {
    pub fn new(next: SharedNode) -> Self {
        Self::with_kind(NodeKind::MovingAverage, next)
    }
}

impl MovingMedianNode {
    pub fn new(next: SharedNode) -> Self {
        Self::with_kind(NodeKind::MovingMedian, next)
    }
}
