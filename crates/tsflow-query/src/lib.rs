#![forbid(unsafe_code)]
//! tsflow-query: from a declarative JSON description → an operator chain →
//! a running query.
//!
//! This crate adds, on top of `tsflow-nodes`:
//! - a node builder that turns `{"name": ..., ...}` JSON fragments into
//!   chained operators, with typed construction errors;
//! - the group-by-time driver that injects bucket-boundary sentinels;
//! - the two top-level query processors (scan and metadata) that expose the
//!   producer-facing contract.

pub mod builder;
pub mod groupby;
pub mod processor;

pub use builder::{BuildError, NodeBuilder};
pub use groupby::GroupByTime;
pub use processor::{Direction, MetadataQueryProcessor, QueryProcessor, ScanQueryProcessor};
