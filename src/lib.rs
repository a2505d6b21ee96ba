#![forbid(unsafe_code)]
//! tsflow: streaming query-processing pipeline for time-series data.
//!
//! Facade crate. The actual machinery lives in the member crates:
//! - `tsflow-core`: sample model, status codes, configuration.
//! - `tsflow-nodes`: the `Node` trait and the stream operators.
//! - `tsflow-query`: JSON node builder, group-by-time driver, query
//!   processors.

pub use tsflow_core;
pub use tsflow_nodes;
pub use tsflow_query;
