//! Shared helpers for the integration tests.

use std::sync::{Arc, Mutex};

use tsflow_nodes::{CollectorSink, SharedNode};

/// A collector sink plus a chain handle to it. Keep the typed handle to
/// inspect what arrived after the stream ends.
pub fn collector() -> (Arc<Mutex<CollectorSink>>, SharedNode) {
    let sink = Arc::new(Mutex::new(CollectorSink::new()));
    let node: SharedNode = sink.clone();
    (sink, node)
}
