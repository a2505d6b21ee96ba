//! Top-level query processors.
//!
//! A query processor is the producer-facing surface of a built chain: the
//! storage cursor asks it for scan bounds and direction, feeds it samples
//! with `put`, and closes it with `stop` or `set_error`.

use tracing::debug;

use tsflow_core::prelude::{ParamId, Sample, Status, Timestamp, MAX_TIMESTAMP};
use tsflow_nodes::SharedNode;

use crate::groupby::GroupByTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

pub trait QueryProcessor: Send {
    /// Called before the first `put`; a `false` return aborts the query.
    fn start(&mut self) -> bool;

    /// Feed one sample from the producer. `false` means stop producing.
    fn put(&mut self, sample: &Sample) -> bool;

    /// End-of-stream; completes the chain exactly once.
    fn stop(&mut self);

    /// Abort the chain with a status.
    fn set_error(&mut self, status: Status);

    fn lowerbound(&self) -> Timestamp;
    fn upperbound(&self) -> Timestamp;
    fn direction(&self) -> Direction;
}

/// Drives a time-range scan through the group-by driver into the chain.
pub struct ScanQueryProcessor {
    lowerbound: Timestamp,
    upperbound: Timestamp,
    direction: Direction,
    metrics: Vec<String>,
    groupby: GroupByTime,
    root: SharedNode,
}

impl ScanQueryProcessor {
    pub fn new(
        root: SharedNode,
        metrics: Vec<String>,
        begin: Timestamp,
        end: Timestamp,
        groupby: GroupByTime,
    ) -> Self {
        let direction = if begin > end {
            Direction::Backward
        } else {
            Direction::Forward
        };
        debug!(
            begin,
            end,
            step = groupby.step(),
            ?direction,
            "starting scan query"
        );
        Self {
            lowerbound: begin.min(end),
            upperbound: begin.max(end),
            direction,
            metrics,
            groupby,
            root,
        }
    }

    /// Metric names this query was issued for.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }
}

impl QueryProcessor for ScanQueryProcessor {
    fn start(&mut self) -> bool {
        true
    }

    fn put(&mut self, sample: &Sample) -> bool {
        self.groupby.put(sample, &self.root)
    }

    fn stop(&mut self) {
        self.root.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.root.lock().unwrap().set_error(status);
    }

    fn lowerbound(&self) -> Timestamp {
        self.lowerbound
    }

    fn upperbound(&self) -> Timestamp {
        self.upperbound
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}

/// Source-driven processor: `start` synthesizes one id-only sample per
/// series and pushes them through the chain itself. The producer-facing
/// `put` always refuses.
pub struct MetadataQueryProcessor {
    ids: Vec<ParamId>,
    root: SharedNode,
}

impl MetadataQueryProcessor {
    pub fn new(ids: Vec<ParamId>, root: SharedNode) -> Self {
        Self { ids, root }
    }
}

impl QueryProcessor for MetadataQueryProcessor {
    fn start(&mut self) -> bool {
        debug!(ids = self.ids.len(), "starting metadata query");
        for &id in &self.ids {
            if !self.root.lock().unwrap().put(&Sample::ident(id)) {
                return false;
            }
        }
        true
    }

    fn put(&mut self, _sample: &Sample) -> bool {
        // Source-driven; nothing to accept.
        false
    }

    fn stop(&mut self) {
        self.root.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.root.lock().unwrap().set_error(status);
    }

    fn lowerbound(&self) -> Timestamp {
        MAX_TIMESTAMP
    }

    fn upperbound(&self) -> Timestamp {
        MAX_TIMESTAMP
    }

    fn direction(&self) -> Direction {
        Direction::Forward
    }
}
