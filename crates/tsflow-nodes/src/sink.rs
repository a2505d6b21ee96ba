//! Terminal nodes: the boundary between the chain and the caller.

use tsflow_core::prelude::{Sample, Status};

use crate::node::{Node, NodeKind};

/// Sink that buffers everything it receives.
///
/// The workhorse terminus for tests and the CLI: samples are collected in
/// arrival order, completion is counted, and the latest status is recorded
/// for the caller to inspect after the stream ends.
#[derive(Debug, Default)]
pub struct CollectorSink {
    samples: Vec<Sample>,
    completed: u32,
    status: Option<Status>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn take_samples(&mut self) -> Vec<Sample> {
        std::mem::take(&mut self.samples)
    }

    /// How many times `complete` has been observed. More than once is a
    /// chain bug.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed > 0
    }

    /// Latest status delivered through `set_error`, or `Ok`.
    pub fn status(&self) -> Status {
        self.status.unwrap_or(Status::Ok)
    }
}

impl Node for CollectorSink {
    fn put(&mut self, sample: &Sample) -> bool {
        if self.completed > 0 {
            return false;
        }
        self.samples.push(sample.clone());
        true
    }

    fn complete(&mut self) {
        self.completed += 1;
    }

    fn set_error(&mut self, status: Status) {
        self.status = Some(status);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Sink
    }
}

/// Sink that delivers each sample to a caller-supplied callback.
///
/// The callback's `bool` return is the backpressure signal: `false` stops
/// the producer, exactly as if a downstream node had refused the sample.
pub struct FnSink<F: FnMut(&Sample) -> bool + Send> {
    callback: F,
    completed: u32,
    status: Option<Status>,
}

impl<F: FnMut(&Sample) -> bool + Send> FnSink<F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            completed: 0,
            status: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed > 0
    }

    pub fn status(&self) -> Status {
        self.status.unwrap_or(Status::Ok)
    }
}

impl<F: FnMut(&Sample) -> bool + Send> Node for FnSink<F> {
    fn put(&mut self, sample: &Sample) -> bool {
        if self.completed > 0 {
            return false;
        }
        (self.callback)(sample)
    }

    fn complete(&mut self) {
        self.completed += 1;
    }

    fn set_error(&mut self, status: Status) {
        self.status = Some(status);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Sink
    }
}
