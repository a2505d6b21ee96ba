#![forbid(unsafe_code)]
//! tsflow-nodes: the stream operators of the query pipeline.
//!
//! Design intent:
//! - Keep this crate pure and synchronous (no async, no I/O).
//! - Every operator implements [`node::Node`] and holds a shared handle to
//!   its successor; chains are composed tail-first.
//! - The empty sentinel is the only flush mechanism. Operators that buffer
//!   per-bucket state flush when they see one; there is no out-of-band
//!   flush call.

pub mod anomaly;
pub mod detector;
pub mod filter;
pub mod node;
pub mod reservoir;
pub mod sink;
pub mod spacesave;
pub mod window;

pub use node::{shared, Node, NodeKind, SharedNode};
pub use sink::{CollectorSink, FnSink};
