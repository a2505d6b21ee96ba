//! Group-by-time driver.
//!
//! Sits between the producer and the chain head, watching data timestamps
//! and injecting empty sentinels at bucket boundaries. Buckets are half-open
//! intervals `[lower, upper)` of width `step`, aligned to multiples of
//! `step` by the first sample. Works in both scan directions; a gap wider
//! than one bucket emits one sentinel per crossed boundary, `step` apart.

use tsflow_core::prelude::{Sample, Timestamp, MIN_TIMESTAMP};
use tsflow_nodes::SharedNode;

#[derive(Debug, Clone)]
pub struct GroupByTime {
    step: Timestamp,
    first_hit: bool,
    lower: Timestamp,
    upper: Timestamp,
}

impl GroupByTime {
    /// A driver with bucket width `step`. Zero disables bucketing and makes
    /// `put` a plain forward.
    pub fn new(step: Timestamp) -> Self {
        Self {
            step,
            first_hit: true,
            // Placeholder bounds until the first sample aligns them.
            lower: MIN_TIMESTAMP,
            upper: MIN_TIMESTAMP,
        }
    }

    /// Disabled driver (no bucketing).
    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn step(&self) -> Timestamp {
        self.step
    }

    /// Feed one sample into `next`, preceded by any boundary sentinels its
    /// timestamp crosses. Boundary sentinels always precede the sample that
    /// crossed them.
    pub fn put(&mut self, sample: &Sample, next: &SharedNode) -> bool {
        if self.step != 0 {
            let ts = sample.timestamp;
            if self.first_hit {
                self.first_hit = false;
                let aligned = ts / self.step * self.step;
                self.lower = aligned;
                self.upper = aligned + self.step;
            }
            while ts >= self.upper {
                // Forward crossing.
                if !next.lock().unwrap().put(&Sample::sentinel(self.upper)) {
                    return false;
                }
                self.lower += self.step;
                self.upper += self.step;
            }
            while ts < self.lower {
                // Backward crossing.
                if !next.lock().unwrap().put(&Sample::sentinel(self.upper)) {
                    return false;
                }
                self.lower -= self.step;
                self.upper -= self.step;
            }
        }
        next.lock().unwrap().put(sample)
    }
}
