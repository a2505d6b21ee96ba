//! Node builder: JSON sampler descriptions → chained operators.
//!
//! A description is a JSON object `{"name": <algorithm>, ...params}`.
//! Scalar parameters are accepted both as native JSON numbers and as
//! strings. Malformed descriptions produce a typed [`BuildError`] carrying
//! the offending node's tag; nothing here is reachable from the hot path.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use tsflow_core::prelude::ParamId;
use tsflow_nodes::anomaly::AnomalyDetectorNode;
use tsflow_nodes::detector::{
    create_approx_ewma, create_approx_sma, create_precise_ewma, create_precise_sma,
    ForecastingDetector,
};
use tsflow_nodes::filter::FilterByIdNode;
use tsflow_nodes::reservoir::RandomSamplerNode;
use tsflow_nodes::spacesave::{FrequentItemsNode, HeavyHittersNode};
use tsflow_nodes::window::{MovingAverageNode, MovingMedianNode};
use tsflow_nodes::{shared, NodeKind, SharedNode};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("sampler description is not a JSON object")]
    NotAnObject,

    #[error("sampler description has no name")]
    MissingName,

    #[error("unknown sampler algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("invalid {kind} description: {reason}")]
    InvalidDescription { kind: NodeKind, reason: String },

    #[error("anomaly detector method '{0}' is not implemented")]
    Unimplemented(String),
}

impl BuildError {
    fn invalid(kind: NodeKind, reason: impl Into<String>) -> Self {
        BuildError::InvalidDescription {
            kind,
            reason: reason.into(),
        }
    }
}

/// Builds operators around a given successor.
///
/// The optional seed makes reservoir nodes reproducible; successive
/// reservoirs built by one builder get distinct derived seeds.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    seed: Option<u64>,
    default_reservoir_size: Option<u32>,
    built: u64,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Reservoir capacity used when a description has no `size` field.
    pub fn with_default_reservoir_size(mut self, size: Option<u32>) -> Self {
        self.default_reservoir_size = size;
        self
    }

    /// Build one sampler node from its JSON description, wrapping `next`.
    pub fn make_sampler(
        &mut self,
        description: &Value,
        next: SharedNode,
    ) -> Result<SharedNode, BuildError> {
        let obj = description.as_object().ok_or(BuildError::NotAnObject)?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or(BuildError::MissingName)?;

        match name {
            "reservoir" => {
                let size = match self.default_reservoir_size {
                    Some(default) if !obj.contains_key("size") => default,
                    _ => param_u32(obj, "size", NodeKind::RandomSampler)?,
                };
                trace!(size, "creating reservoir sampler node");
                let node = match self.next_seed() {
                    Some(seed) => RandomSamplerNode::with_seed(size, seed, next),
                    None => RandomSamplerNode::new(size, next),
                };
                Ok(shared(node))
            }
            "moving-average" => {
                trace!("creating moving average node");
                Ok(shared(MovingAverageNode::new(next)))
            }
            "moving-median" => {
                trace!("creating moving median node");
                Ok(shared(MovingMedianNode::new(next)))
            }
            "frequent-items" => {
                let (error, portion) = space_saving_params(obj)?;
                trace!(error, portion, "creating frequent items node");
                Ok(shared(FrequentItemsNode::new(error, portion, next)))
            }
            "heavy-hitters" => {
                let (error, portion) = space_saving_params(obj)?;
                trace!(error, portion, "creating heavy hitters node");
                Ok(shared(HeavyHittersNode::new(error, portion, next)))
            }
            "anomaly-detector" => {
                let detector = make_detector(obj)?;
                trace!("creating anomaly detector node");
                Ok(shared(AnomalyDetectorNode::new(detector, next)))
            }
            other => Err(BuildError::UnknownAlgorithm(other.to_string())),
        }
    }

    /// Fold a list of descriptions into a chain ending at `sink`. The first
    /// element ends up closest to the producer.
    pub fn build_pipeline(
        &mut self,
        descriptions: &[Value],
        sink: SharedNode,
    ) -> Result<SharedNode, BuildError> {
        let mut next = sink;
        for description in descriptions.iter().rev() {
            next = self.make_sampler(description, next)?;
        }
        Ok(next)
    }

    pub fn make_filter_by_id(&self, id: ParamId, next: SharedNode) -> SharedNode {
        trace!(id, "creating id filter node");
        shared(FilterByIdNode::new(move |candidate| candidate == id, next))
    }

    pub fn make_filter_by_id_list(&self, ids: Vec<ParamId>, next: SharedNode) -> SharedNode {
        trace!(ids = ids.len(), "creating id-list filter node");
        let idset: std::collections::HashSet<ParamId> = ids.into_iter().collect();
        shared(FilterByIdNode::new(
            move |candidate| idset.contains(&candidate),
            next,
        ))
    }

    pub fn make_filter_out_by_id_list(&self, ids: Vec<ParamId>, next: SharedNode) -> SharedNode {
        trace!(ids = ids.len(), "creating id-list filter out node");
        let idset: std::collections::HashSet<ParamId> = ids.into_iter().collect();
        shared(FilterByIdNode::new(
            move |candidate| !idset.contains(&candidate),
            next,
        ))
    }

    fn next_seed(&mut self) -> Option<u64> {
        let seed = self.seed.map(|s| s.wrapping_add(self.built));
        self.built += 1;
        seed
    }
}

fn space_saving_params(obj: &Map<String, Value>) -> Result<(f64, f64), BuildError> {
    let kind = NodeKind::SpaceSaver;
    let error = param_f64(obj, "error", kind)?;
    let portion = param_f64(obj, "portion", kind)?;
    if !(error > 0.0 && error <= 1.0) {
        return Err(BuildError::invalid(kind, "`error` must be in (0, 1]"));
    }
    if !(0.0..=1.0).contains(&portion) {
        return Err(BuildError::invalid(kind, "`portion` must be in [0, 1]"));
    }
    Ok((error, portion))
}

fn make_detector(obj: &Map<String, Value>) -> Result<Box<dyn ForecastingDetector>, BuildError> {
    let kind = NodeKind::AnomalyDetector;
    let threshold = param_f64(obj, "threshold", kind)?;
    let method = param_str(obj, "method", kind)?;
    let approx = param_bool(obj, "approx", kind)?;
    match method {
        "sma" | "ewma" => {
            let window = param_u32(obj, "window", kind)?;
            if approx {
                let bits = param_u32_or(obj, "bits", 10, kind)?;
                let hashes = param_u32_or(obj, "hashes", 3, kind)?;
                let cells = 1u32
                    .checked_shl(bits)
                    .ok_or_else(|| BuildError::invalid(kind, "`bits` is too large"))?;
                Ok(if method == "sma" {
                    create_approx_sma(hashes, cells, threshold, window)
                } else {
                    create_approx_ewma(hashes, cells, threshold, window)
                })
            } else {
                Ok(if method == "sma" {
                    create_precise_sma(threshold, window)
                } else {
                    create_precise_ewma(threshold, window)
                })
            }
        }
        "double-hw" => Err(BuildError::Unimplemented(method.to_string())),
        other => Err(BuildError::invalid(
            kind,
            format!("unknown forecasting method '{other}'"),
        )),
    }
}

// --- parameter helpers: scalars may be JSON numbers or strings ---

fn param_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    kind: NodeKind,
) -> Result<&'a str, BuildError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(BuildError::invalid(kind, format!("`{key}` must be a string"))),
        None => Err(BuildError::invalid(kind, format!("missing field `{key}`"))),
    }
}

fn param_f64(obj: &Map<String, Value>, key: &str, kind: NodeKind) -> Result<f64, BuildError> {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| BuildError::invalid(kind, format!("`{key}` is not a valid number"))),
        Some(Value::String(s)) => s.parse::<f64>().map_err(|_| {
            BuildError::invalid(kind, format!("`{key}`: expected a number, got '{s}'"))
        }),
        Some(_) => Err(BuildError::invalid(kind, format!("`{key}` must be a number"))),
        None => Err(BuildError::invalid(kind, format!("missing field `{key}`"))),
    }
}

fn param_u32(obj: &Map<String, Value>, key: &str, kind: NodeKind) -> Result<u32, BuildError> {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                BuildError::invalid(kind, format!("`{key}` is not a valid unsigned integer"))
            }),
        Some(Value::String(s)) => s.parse::<u32>().map_err(|_| {
            BuildError::invalid(kind, format!("`{key}`: expected an integer, got '{s}'"))
        }),
        Some(_) => Err(BuildError::invalid(
            kind,
            format!("`{key}` must be an integer"),
        )),
        None => Err(BuildError::invalid(kind, format!("missing field `{key}`"))),
    }
}

fn param_u32_or(
    obj: &Map<String, Value>,
    key: &str,
    default: u32,
    kind: NodeKind,
) -> Result<u32, BuildError> {
    if obj.contains_key(key) {
        param_u32(obj, key, kind)
    } else {
        Ok(default)
    }
}

fn param_bool(obj: &Map<String, Value>, key: &str, kind: NodeKind) -> Result<bool, BuildError> {
    match obj.get(key) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => s.parse::<bool>().map_err(|_| {
            BuildError::invalid(kind, format!("`{key}`: expected a boolean, got '{s}'"))
        }),
        Some(_) => Err(BuildError::invalid(
            kind,
            format!("`{key}` must be a boolean"),
        )),
        None => Err(BuildError::invalid(kind, format!("missing field `{key}`"))),
    }
}
