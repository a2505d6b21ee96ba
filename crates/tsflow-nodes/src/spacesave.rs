//! Space-Saving frequent-items / heavy-hitters.
//!
//! Tracks at most `M = ⌈1/ε⌉` counters. Any series whose true weight is at
//! least `(φ+ε)·N` is reported, and a reported count overstates the truth by
//! at most `ε·N`. The weighted variant (`WEIGHTED = true`) counts each
//! sample's float value instead of 1.

use std::collections::HashMap;

use tsflow_core::prelude::{ParamId, PayloadKind, Sample, Status, Timestamp};

use crate::node::{Node, NodeKind, SharedNode};

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: f64,
    /// Count inherited from the evicted minimum at insertion time.
    error: f64,
}

pub struct SpaceSaverNode<const WEIGHTED: bool> {
    counters: HashMap<ParamId, Counter>,
    /// Cumulative weight of the current bucket.
    total_weight: f64,
    capacity: usize,
    portion: f64,
    last_ts: Timestamp,
    next: SharedNode,
}

/// Unweighted: every sample counts 1.
pub type FrequentItemsNode = SpaceSaverNode<false>;
/// Weighted: every float sample counts its value; others are ignored.
pub type HeavyHittersNode = SpaceSaverNode<true>;

impl<const WEIGHTED: bool> SpaceSaverNode<WEIGHTED> {
    /// `error` is the allowed overcount fraction ε ∈ (0, 1]; `portion` is
    /// the support fraction φ ∈ [0, 1]. Entries whose estimated weight
    /// exceeds `φ·N` are reported at flush.
    pub fn new(error: f64, portion: f64, next: SharedNode) -> Self {
        debug_assert!(error > 0.0 && error <= 1.0);
        debug_assert!((0.0..=1.0).contains(&portion));
        Self {
            counters: HashMap::new(),
            total_weight: 0.0,
            capacity: (1.0 / error).ceil() as usize,
            portion,
            last_ts: 0,
            next,
        }
    }

    /// Bounded counter capacity `M`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn flush(&mut self, ts: Timestamp) -> bool {
        let support = self.total_weight * self.portion;
        let mut reported: Vec<Sample> = Vec::new();
        for (&paramid, counter) in &self.counters {
            let estimate = counter.count - counter.error;
            if support < estimate {
                let mut sample = Sample::float(paramid, ts, counter.count);
                sample.payload.kind |= PayloadKind::PARAMID;
                reported.push(sample);
            }
        }
        reported.sort_by(|lhs, rhs| {
            let l = lhs.float_value().unwrap_or_default();
            let r = rhs.float_value().unwrap_or_default();
            r.total_cmp(&l)
        });
        for sample in &reported {
            if !self.next.lock().unwrap().put(sample) {
                return false;
            }
        }
        self.counters.clear();
        self.total_weight = 0.0;
        true
    }
}

impl<const WEIGHTED: bool> Node for SpaceSaverNode<WEIGHTED> {
    fn put(&mut self, sample: &Sample) -> bool {
        if sample.is_sentinel() {
            return self.flush(sample.timestamp);
        }
        let weight = if WEIGHTED {
            match sample.float_value() {
                Some(v) => v,
                None => return true,
            }
        } else {
            1.0
        };
        self.last_ts = sample.timestamp;
        if let Some(counter) = self.counters.get_mut(&sample.paramid) {
            counter.count += weight;
        } else {
            let mut evicted = 0.0;
            if self.counters.len() >= self.capacity {
                // Evict the minimum; the newcomer inherits its count as
                // error, preserving the overcount bound.
                let min = self
                    .counters
                    .iter()
                    .min_by(|a, b| a.1.count.total_cmp(&b.1.count))
                    .map(|(&id, c)| (id, c.count));
                if let Some((min_id, min_count)) = min {
                    self.counters.remove(&min_id);
                    evicted = min_count;
                }
            }
            self.counters.insert(
                sample.paramid,
                Counter {
                    count: evicted + weight,
                    error: evicted,
                },
            );
        }
        self.total_weight += weight;
        true
    }

    fn complete(&mut self) {
        self.flush(self.last_ts);
        self.next.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.next.lock().unwrap().set_error(status);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SpaceSaver
    }
}
