//! Reservoir sampler (Vitter's Algorithm R).
//!
//! Keeps a uniform random subset of at most `capacity` data samples per time
//! bucket. On flush the buffer is sorted by `(timestamp, paramid)` before
//! emission: sampling destroys arrival order and downstream expects buckets
//! in stream order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tsflow_core::prelude::{Sample, Status};

use crate::node::{Node, NodeKind, SharedNode};

pub struct RandomSamplerNode {
    capacity: usize,
    /// Data samples observed since the last flush.
    seen: u64,
    buffer: Vec<Sample>,
    rng: StdRng,
    next: SharedNode,
}

impl RandomSamplerNode {
    pub fn new(capacity: u32, next: SharedNode) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy(), next)
    }

    /// Seeded variant for reproducible runs and statistical tests.
    pub fn with_seed(capacity: u32, seed: u64, next: SharedNode) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed), next)
    }

    fn with_rng(capacity: u32, rng: StdRng, next: SharedNode) -> Self {
        let capacity = capacity as usize;
        Self {
            capacity,
            seen: 0,
            buffer: Vec::with_capacity(capacity),
            rng,
            next,
        }
    }

    fn flush(&mut self) -> bool {
        // Stable, so equal (ts, id) keys keep arrival order.
        self.buffer.sort_by_key(Sample::order_key);
        for sample in &self.buffer {
            if !self.next.lock().unwrap().put(sample) {
                return false;
            }
        }
        self.buffer.clear();
        self.seen = 0;
        true
    }
}

impl Node for RandomSamplerNode {
    fn put(&mut self, sample: &Sample) -> bool {
        if sample.is_sentinel() {
            // The sorted flush replaces the bucket; the sentinel itself is
            // consumed.
            return self.flush();
        }
        self.seen += 1;
        if self.buffer.len() < self.capacity {
            self.buffer.push(sample.clone());
        } else if self.capacity > 0 {
            // Sample n survives with probability k/n; earlier samples are
            // evicted uniformly.
            let slot = self.rng.gen_range(0..self.seen);
            if (slot as usize) < self.capacity {
                self.buffer[slot as usize] = sample.clone();
            }
        }
        true
    }

    fn complete(&mut self) {
        self.flush();
        self.next.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.next.lock().unwrap().set_error(status);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::RandomSampler
    }
}
