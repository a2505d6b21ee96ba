//! Forecasting detectors behind the anomaly adapter.
//!
//! A detector accumulates values into the *current frame*; the adapter
//! closes a frame on each bucket boundary via `move_sliding_window`, which
//! folds the frame into per-series forecast state. A sample is an anomaly
//! candidate once the window is primed and the observed frame value deviates
//! from the forecast by more than the threshold.
//!
//! Two families: precise (exact per-series maps) and approximate (per-frame
//! count-min sketch, estimating by cell minimum). Forecasting is either a
//! simple moving average over the last `depth` frames or an EWMA with
//! `α = 2/(depth+1)`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::mem;

use tsflow_core::prelude::ParamId;

pub trait ForecastingDetector: Send {
    /// Accumulate a value into the current frame for `id`.
    fn add(&mut self, id: ParamId, value: f64);

    /// True iff the forecast window is primed for `id` and the current
    /// frame's accumulated value deviates from the forecast by more than
    /// the threshold.
    fn is_anomaly_candidate(&self, id: ParamId) -> bool;

    /// Close the current frame, folding it into the forecast state.
    fn move_sliding_window(&mut self);
}

fn ewma_alpha(depth: u32) -> f64 {
    2.0 / (f64::from(depth) + 1.0)
}

// --- precise detectors ---

#[derive(Debug, Clone)]
enum SeriesForecast {
    Sma(VecDeque<f64>),
    Ewma(f64),
}

impl SeriesForecast {
    fn forecast(&self) -> Option<f64> {
        match self {
            SeriesForecast::Sma(frames) => {
                if frames.is_empty() {
                    None
                } else {
                    Some(frames.iter().sum::<f64>() / frames.len() as f64)
                }
            }
            SeriesForecast::Ewma(v) => Some(*v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Smoothing {
    Sma { depth: usize },
    Ewma { alpha: f64 },
}

pub struct PreciseDetector {
    threshold: f64,
    smoothing: Smoothing,
    current: HashMap<ParamId, f64>,
    history: HashMap<ParamId, SeriesForecast>,
}

impl PreciseDetector {
    fn new(threshold: f64, smoothing: Smoothing) -> Self {
        Self {
            threshold,
            smoothing,
            current: HashMap::new(),
            history: HashMap::new(),
        }
    }
}

impl ForecastingDetector for PreciseDetector {
    fn add(&mut self, id: ParamId, value: f64) {
        *self.current.entry(id).or_insert(0.0) += value;
    }

    fn is_anomaly_candidate(&self, id: ParamId) -> bool {
        let Some(&observed) = self.current.get(&id) else {
            return false;
        };
        let Some(forecast) = self.history.get(&id).and_then(SeriesForecast::forecast) else {
            return false;
        };
        (observed - forecast).abs() > self.threshold
    }

    fn move_sliding_window(&mut self) {
        // Series absent from the frame fold a zero, so a silent series
        // decays toward a zero forecast instead of freezing.
        let mut ids: HashSet<ParamId> = self.history.keys().copied().collect();
        ids.extend(self.current.keys());
        for id in ids {
            let observed = self.current.get(&id).copied().unwrap_or(0.0);
            match self.smoothing {
                Smoothing::Sma { depth } => {
                    let entry = self
                        .history
                        .entry(id)
                        .or_insert_with(|| SeriesForecast::Sma(VecDeque::new()));
                    if let SeriesForecast::Sma(frames) = entry {
                        frames.push_back(observed);
                        if frames.len() > depth {
                            frames.pop_front();
                        }
                    }
                }
                Smoothing::Ewma { alpha } => match self.history.get_mut(&id) {
                    Some(SeriesForecast::Ewma(state)) => {
                        *state = alpha * observed + (1.0 - alpha) * *state;
                    }
                    _ => {
                        self.history.insert(id, SeriesForecast::Ewma(observed));
                    }
                },
            }
        }
        self.current.clear();
    }
}

// --- approximate detectors ---

/// Count-min sketch over per-frame series sums. Up to 8 hash rows, derived
/// from disjoint 4-byte windows of one blake3 digest of the series id.
#[derive(Debug, Clone)]
struct Sketch {
    rows: usize,
    cells: usize,
    table: Vec<f64>,
}

impl Sketch {
    fn new(rows: usize, cells: usize) -> Self {
        Self {
            rows,
            cells,
            table: vec![0.0; rows * cells],
        }
    }

    fn cell_indexes(&self, id: ParamId) -> Vec<usize> {
        let digest = blake3::hash(&id.to_le_bytes());
        let bytes = digest.as_bytes();
        (0..self.rows)
            .map(|row| {
                let off = row * 4;
                let word = u32::from_le_bytes([
                    bytes[off],
                    bytes[off + 1],
                    bytes[off + 2],
                    bytes[off + 3],
                ]);
                word as usize % self.cells
            })
            .collect()
    }

    fn add(&mut self, id: ParamId, value: f64) {
        for (row, idx) in self.cell_indexes(id).into_iter().enumerate() {
            self.table[row * self.cells + idx] += value;
        }
    }

    /// Point estimate: minimum over the hash rows. Never underestimates.
    fn estimate(&self, id: ParamId) -> f64 {
        self.cell_indexes(id)
            .into_iter()
            .enumerate()
            .map(|(row, idx)| self.table[row * self.cells + idx])
            .fold(f64::INFINITY, f64::min)
    }

    /// Cellwise `self = alpha·other + (1−alpha)·self`.
    fn fold(&mut self, alpha: f64, other: &Sketch) {
        for (cell, incoming) in self.table.iter_mut().zip(other.table.iter()) {
            *cell = alpha * incoming + (1.0 - alpha) * *cell;
        }
    }

    fn clear(&mut self) {
        self.table.iter_mut().for_each(|cell| *cell = 0.0);
    }
}

enum SketchForecast {
    Sma {
        depth: usize,
        frames: VecDeque<Sketch>,
    },
    Ewma {
        alpha: f64,
        state: Option<Sketch>,
    },
}

pub struct SketchDetector {
    threshold: f64,
    current: Sketch,
    forecast: SketchForecast,
}

impl SketchDetector {
    fn new(hashes: u32, cells: u32, threshold: f64, smoothing: Smoothing) -> Self {
        let rows = (hashes as usize).clamp(1, 8);
        let cells = (cells as usize).max(1);
        let forecast = match smoothing {
            Smoothing::Sma { depth } => SketchForecast::Sma {
                depth,
                frames: VecDeque::new(),
            },
            Smoothing::Ewma { alpha } => SketchForecast::Ewma { alpha, state: None },
        };
        Self {
            threshold,
            current: Sketch::new(rows, cells),
            forecast,
        }
    }

    fn forecast_for(&self, id: ParamId) -> Option<f64> {
        match &self.forecast {
            SketchForecast::Sma { frames, .. } => {
                if frames.is_empty() {
                    None
                } else {
                    let sum: f64 = frames.iter().map(|frame| frame.estimate(id)).sum();
                    Some(sum / frames.len() as f64)
                }
            }
            SketchForecast::Ewma { state, .. } => state.as_ref().map(|s| s.estimate(id)),
        }
    }
}

impl ForecastingDetector for SketchDetector {
    fn add(&mut self, id: ParamId, value: f64) {
        self.current.add(id, value);
    }

    fn is_anomaly_candidate(&self, id: ParamId) -> bool {
        let Some(forecast) = self.forecast_for(id) else {
            return false;
        };
        let observed = self.current.estimate(id);
        (observed - forecast).abs() > self.threshold
    }

    fn move_sliding_window(&mut self) {
        match &mut self.forecast {
            SketchForecast::Sma { depth, frames } => {
                let rows = self.current.rows;
                let cells = self.current.cells;
                frames.push_back(mem::replace(&mut self.current, Sketch::new(rows, cells)));
                if frames.len() > *depth {
                    frames.pop_front();
                }
            }
            SketchForecast::Ewma { alpha, state } => {
                match state {
                    Some(s) => s.fold(*alpha, &self.current),
                    None => *state = Some(self.current.clone()),
                }
                self.current.clear();
            }
        }
    }
}

// --- factories ---

pub fn create_precise_sma(threshold: f64, depth: u32) -> Box<dyn ForecastingDetector> {
    Box::new(PreciseDetector::new(
        threshold,
        Smoothing::Sma {
            depth: depth as usize,
        },
    ))
}

pub fn create_precise_ewma(threshold: f64, depth: u32) -> Box<dyn ForecastingDetector> {
    Box::new(PreciseDetector::new(
        threshold,
        Smoothing::Ewma {
            alpha: ewma_alpha(depth),
        },
    ))
}

pub fn create_approx_sma(
    hashes: u32,
    cells: u32,
    threshold: f64,
    depth: u32,
) -> Box<dyn ForecastingDetector> {
    Box::new(SketchDetector::new(
        hashes,
        cells,
        threshold,
        Smoothing::Sma {
            depth: depth as usize,
        },
    ))
}

pub fn create_approx_ewma(
    hashes: u32,
    cells: u32,
    threshold: f64,
    depth: u32,
) -> Box<dyn ForecastingDetector> {
    Box::new(SketchDetector::new(
        hashes,
        cells,
        threshold,
        Smoothing::Ewma {
            alpha: ewma_alpha(depth),
        },
    ))
}
