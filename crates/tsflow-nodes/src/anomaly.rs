//! Anomaly detector adapter node.
//!
//! Wraps a [`ForecastingDetector`] as an event filter: candidate samples are
//! forwarded with the `URGENT` flag set, everything else is dropped. The
//! empty sentinel advances the detector's sliding window and passes through.

use tsflow_core::prelude::{PayloadKind, Sample, Status};

use crate::detector::ForecastingDetector;
use crate::node::{Node, NodeKind, SharedNode};

pub struct AnomalyDetectorNode {
    detector: Box<dyn ForecastingDetector>,
    next: SharedNode,
}

impl AnomalyDetectorNode {
    pub fn new(detector: Box<dyn ForecastingDetector>, next: SharedNode) -> Self {
        Self { detector, next }
    }
}

impl Node for AnomalyDetectorNode {
    fn put(&mut self, sample: &Sample) -> bool {
        if sample.is_sentinel() {
            self.detector.move_sliding_window();
            return self.next.lock().unwrap().put(sample);
        }
        if let Some(value) = sample.float_value() {
            if value < 0.0 {
                self.set_error(Status::AnomalyNegativeValue);
                return false;
            }
            self.detector.add(sample.paramid, value);
            if self.detector.is_anomaly_candidate(sample.paramid) {
                let mut anomaly = sample.clone();
                anomaly.payload.kind |= PayloadKind::URGENT;
                return self.next.lock().unwrap().put(&anomaly);
            }
        }
        // Blobs and non-candidates are dropped.
        true
    }

    fn complete(&mut self) {
        self.next.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.next.lock().unwrap().set_error(status);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::AnomalyDetector
    }
}
