//! Convenient re-exports for downstream crates.

pub use crate::config::PipelineConfig;
pub use crate::error::{Error, Result};
pub use crate::sample::{
    ParamId, Payload, PayloadKind, Sample, Timestamp, Value, MAX_TIMESTAMP, MIN_TIMESTAMP,
};
pub use crate::status::Status;
