//! Measurement series model, uniform resampling and smoothing

pub mod resample;
pub mod smoothing;

pub use resample::resample;
pub use smoothing::moving_average;

use crate::error::{RestorationError, Result};
use serde::{Deserialize, Serialize};

/// Default relative tolerance (fraction of the nominal interval) for spacing checks
pub const UNIFORM_TOLERANCE: f64 = 1e-6;

/// Single measurement: distance along the track in metres, irregularity in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    pub distance: f64,
    pub value: f64,
}

impl MeasurementPoint {
    pub fn new(distance: f64, value: f64) -> Self {
        Self { distance, value }
    }
}

/// Ordered measurement series with strictly increasing distances
///
/// Series are never modified in place by the engine. Every transform
/// builds a new series, usually through [`MeasurementSeries::with_values`].
/// Deserialized series go through [`MeasurementSeries::new`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<MeasurementPoint>", try_from = "Vec<MeasurementPoint>")]
pub struct MeasurementSeries {
    points: Vec<MeasurementPoint>,
}

impl MeasurementSeries {
    /// Build a series from points, checking that distances strictly increase
    pub fn new(points: Vec<MeasurementPoint>) -> Result<Self> {
        for (i, pair) in points.windows(2).enumerate() {
            if !(pair[1].distance > pair[0].distance) {
                return Err(RestorationError::invalid_input(format!(
                    "distances must strictly increase (index {}: {} -> {})",
                    i + 1,
                    pair[0].distance,
                    pair[1].distance
                )));
            }
        }
        if points.iter().any(|p| !p.distance.is_finite()) {
            return Err(RestorationError::invalid_input("distance is not finite"));
        }
        Ok(Self { points })
    }

    /// Build a uniformly sampled series starting at `start` with spacing `interval`
    pub fn uniform(start: f64, interval: f64, values: Vec<f64>) -> Result<Self> {
        if !(interval > 0.0) || !interval.is_finite() {
            return Err(RestorationError::invalid_input(format!(
                "sampling interval must be positive (got {interval})"
            )));
        }
        let points = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| MeasurementPoint::new(start + i as f64 * interval, value))
            .collect();
        Ok(Self { points })
    }

    /// Same distances, new values
    ///
    /// # Panics
    /// Panics if `values.len()` differs from the series length.
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), self.points.len(), "value count must match series length");
        let points = self
            .points
            .iter()
            .zip(values)
            .map(|(p, value)| MeasurementPoint::new(p.distance, value))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.distance).collect()
    }

    pub fn value(&self, index: usize) -> f64 {
        self.points[index].value
    }

    pub fn distance(&self, index: usize) -> f64 {
        self.points[index].distance
    }

    /// First and last distance, `None` for an empty series
    pub fn range(&self) -> Option<(f64, f64)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.distance, last.distance)),
            _ => None,
        }
    }

    /// Mean spacing between samples, `None` with fewer than two points
    pub fn sampling_interval(&self) -> Option<f64> {
        let (first, last) = self.range()?;
        if self.points.len() < 2 {
            return None;
        }
        Some((last - first) / (self.points.len() - 1) as f64)
    }

    /// True when every step is within `tolerance · Δ` of the mean spacing `Δ`
    pub fn is_uniform(&self, tolerance: f64) -> bool {
        let Some(interval) = self.sampling_interval() else {
            return true;
        };
        self.points
            .windows(2)
            .all(|w| ((w[1].distance - w[0].distance) - interval).abs() <= tolerance * interval)
    }

    /// Check that the series is uniform with the given spacing
    pub fn check_uniform(&self, interval: f64) -> Result<()> {
        if self.points.len() < 2 {
            return Ok(());
        }
        let tolerance = UNIFORM_TOLERANCE * 10.0;
        let actual = self.sampling_interval().unwrap_or(interval);
        let matches = (actual - interval).abs() <= tolerance * interval;
        if !matches || !self.is_uniform(tolerance) {
            return Err(RestorationError::invalid_input(format!(
                "series is not uniformly sampled at {interval} m \
                 (mean spacing {actual} m); resample first"
            )));
        }
        Ok(())
    }

    /// Return the series unchanged if already uniform at `interval`, otherwise resample it
    pub fn ensure_uniform(&self, interval: f64) -> Result<Self> {
        if self.check_uniform(interval).is_ok() && self.len() >= 2 {
            return Ok(self.clone());
        }
        resample(self, interval)
    }

    /// Nearest sample index for a distance, `None` if outside the series
    pub fn index_of(&self, distance: f64) -> Option<usize> {
        let (first, last) = self.range()?;
        let interval = self.sampling_interval().unwrap_or(1.0);
        let slack = interval * 1e-6;
        if distance < first - slack || distance > last + slack {
            return None;
        }
        let idx = ((distance - first) / interval).round() as usize;
        Some(idx.min(self.points.len() - 1))
    }
}

impl TryFrom<Vec<MeasurementPoint>> for MeasurementSeries {
    type Error = RestorationError;

    fn try_from(points: Vec<MeasurementPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<MeasurementSeries> for Vec<MeasurementPoint> {
    fn from(series: MeasurementSeries) -> Self {
        series.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_construction() {
        let series = MeasurementSeries::uniform(10.0, 0.25, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(series.len(), 4);
        assert!((series.distance(3) - 10.75).abs() < 1e-12);
        assert!((series.sampling_interval().unwrap() - 0.25).abs() < 1e-12);
        assert!(series.is_uniform(UNIFORM_TOLERANCE));
        assert!(series.check_uniform(0.25).is_ok());
        assert!(series.check_uniform(0.5).is_err());
    }

    #[test]
    fn test_rejects_non_increasing_distances() {
        let points = vec![
            MeasurementPoint::new(0.0, 1.0),
            MeasurementPoint::new(1.0, 1.0),
            MeasurementPoint::new(1.0, 2.0),
        ];
        assert!(matches!(
            MeasurementSeries::new(points),
            Err(RestorationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deserialize_validates_distances() {
        let json = r#"[
            {"distance": 0.0, "value": 1.0},
            {"distance": 1.0, "value": 2.0},
            {"distance": 1.0, "value": 3.0},
            {"distance": 0.5, "value": 4.0},
            {"distance": 2.0, "value": 5.0}
        ]"#;
        assert!(serde_json::from_str::<MeasurementSeries>(json).is_err());

        let series = MeasurementSeries::uniform(0.0, 0.5, vec![1.0, 2.0, 3.0]).unwrap();
        let text = serde_json::to_string(&series).unwrap();
        assert!(text.starts_with('['));
        let back: MeasurementSeries = serde_json::from_str(&text).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_with_values_keeps_distances() {
        let series = MeasurementSeries::uniform(0.0, 1.0, vec![1.0, 2.0, 3.0]).unwrap();
        let doubled = series.with_values(series.values().iter().map(|v| v * 2.0).collect());
        assert_eq!(doubled.distances(), series.distances());
        assert_eq!(doubled.values(), vec![2.0, 4.0, 6.0]);
        // original untouched
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_index_of() {
        let series = MeasurementSeries::uniform(100.0, 0.5, vec![0.0; 11]).unwrap();
        assert_eq!(series.index_of(100.0), Some(0));
        assert_eq!(series.index_of(102.4), Some(5));
        assert_eq!(series.index_of(105.0), Some(10));
        assert_eq!(series.index_of(99.0), None);
        assert_eq!(series.index_of(105.6), None);
    }

    #[test]
    fn test_irregular_series_is_not_uniform() {
        let points = vec![
            MeasurementPoint::new(0.0, 0.0),
            MeasurementPoint::new(0.25, 0.0),
            MeasurementPoint::new(0.6, 0.0),
            MeasurementPoint::new(0.75, 0.0),
        ];
        let series = MeasurementSeries::new(points).unwrap();
        assert!(!series.is_uniform(UNIFORM_TOLERANCE));
        let fixed = series.ensure_uniform(0.25).unwrap();
        assert!(fixed.check_uniform(0.25).is_ok());
        assert_eq!(fixed.len(), 4);
    }
}
