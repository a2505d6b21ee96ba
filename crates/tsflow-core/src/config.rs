//! Pipeline configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::sample::Timestamp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed for reservoir sampler RNGs. Unset means entropy-seeded; set it
    /// for reproducible runs.
    pub seed: Option<u64>,

    /// Default group-by-time bucket width, applied when the query document
    /// omits one. Zero or unset disables bucketing.
    pub group_by_step: Option<Timestamp>,

    /// Default reservoir capacity, applied when a reservoir description
    /// omits `size`. Unset means `size` is required.
    pub reservoir_size: Option<u32>,
}

impl PipelineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TSFLOW_SEED`: reservoir RNG seed
    /// - `TSFLOW_GROUP_BY_STEP`: default bucket width
    /// - `TSFLOW_RESERVOIR_SIZE`: default reservoir capacity
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TSFLOW_SEED") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.seed = Some(v);
            }
        }

        if let Ok(s) = std::env::var("TSFLOW_GROUP_BY_STEP") {
            if let Ok(v) = s.parse::<Timestamp>() {
                cfg.group_by_step = Some(v);
            }
        }

        if let Ok(s) = std::env::var("TSFLOW_RESERVOIR_SIZE") {
            if let Ok(v) = s.parse::<u32>() {
                cfg.reservoir_size = Some(v);
            }
        }

        cfg
    }
}
