//! Summary statistics for irregularity and movement series
//!
//! σ is the population standard deviation, the primary track quality metric.

use crate::movement::{MovementRecord, TrackAxis};
use crate::series::MeasurementSeries;
use serde::{Deserialize, Serialize};

/// Read-only statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub sigma: f64,
    pub rms: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl Statistics {
    /// Compute statistics over raw values; empty input gives all zeros
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self::default();
        }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let mean_square = values.iter().map(|&v| v * v).sum::<f64>() / n;

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        Self {
            count,
            mean,
            sigma: variance.sqrt(),
            rms: mean_square.sqrt(),
            min,
            max,
            peak_to_peak: max - min,
        }
    }

    pub fn of_series(series: &MeasurementSeries) -> Self {
        Self::from_values(&series.values())
    }

    /// Statistics of the movement amounts along one axis
    pub fn of_movement(records: &[MovementRecord], axis: TrackAxis) -> Self {
        let values: Vec<f64> = records.iter().map(|r| r.amount(axis)).collect();
        Self::from_values(&values)
    }

    /// Statistics restricted to an index range (used for the reliable interior of filtered output)
    pub fn of_range(values: &[f64], range: std::ops::Range<usize>) -> Self {
        let end = range.end.min(values.len());
        let start = range.start.min(end);
        Self::from_values(&values[start..end])
    }
}
