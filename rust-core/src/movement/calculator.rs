//! Tamping/lining movement between the restoration waveform and the plan line

use crate::error::{RestorationError, Result};
use crate::plan::PlanLine;
use crate::processing::ChunkOptions;
use crate::series::{moving_average, MeasurementSeries};
use crate::stats::Statistics;
use serde::{Deserialize, Serialize};

/// Which rail direction a series describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackAxis {
    /// Longitudinal level, corrected by tamping
    #[default]
    Vertical,

    /// Alignment, corrected by lining
    Lateral,
}

/// Movement at one sample in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementRecord {
    pub distance: f64,
    pub tamping: f64,
    pub lining: f64,
}

impl MovementRecord {
    pub fn new(distance: f64, amount: f64, axis: TrackAxis) -> Self {
        match axis {
            TrackAxis::Vertical => Self {
                distance,
                tamping: amount,
                lining: 0.0,
            },
            TrackAxis::Lateral => Self {
                distance,
                tamping: 0.0,
                lining: amount,
            },
        }
    }

    pub fn amount(&self, axis: TrackAxis) -> f64 {
        match axis {
            TrackAxis::Vertical => self.tamping,
            TrackAxis::Lateral => self.lining,
        }
    }
}

/// Per-sample movement plus the waveform expected after the work
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub axis: TrackAxis,
    pub records: Vec<MovementRecord>,

    /// Restoration waveform after applying the movement (the plan line)
    pub predicted: MeasurementSeries,
}

impl Movement {
    pub fn amounts(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.amount(self.axis)).collect()
    }

    pub fn as_series(&self) -> MeasurementSeries {
        self.predicted.with_values(self.amounts())
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::of_movement(&self.records, self.axis)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Movement needed to bring `restored` onto `plan`: `plan[i] - restored[i]`
///
/// # Arguments
/// * `restored` - Restoration waveform in millimetres
/// * `plan` - Plan line sampled at the same distances
/// * `axis` - Whether the amounts are tamping (vertical) or lining (lateral)
///
/// # Returns
/// One record per sample, with the plan line as the predicted waveform
pub fn calculate_movement(
    restored: &MeasurementSeries,
    plan: &PlanLine,
    axis: TrackAxis,
) -> Result<Movement> {
    if restored.len() != plan.len() {
        return Err(RestorationError::invalid_input(format!(
            "restoration waveform has {} samples but plan line has {}",
            restored.len(),
            plan.len()
        )));
    }

    let records = restored
        .points()
        .iter()
        .zip(plan.series().points())
        .map(|(r, p)| MovementRecord::new(r.distance, p.value - r.value, axis))
        .collect();

    Ok(Movement {
        axis,
        records,
        predicted: plan.series().clone(),
    })
}

/// Percentage reduction from `before` to `after`; 0 when `before` is 0 or not finite
pub fn improvement_rate(before: f64, after: f64) -> f64 {
    if before == 0.0 || !before.is_finite() || !after.is_finite() {
        return 0.0;
    }
    (before - after) / before * 100.0
}

/// Movement limits in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementLimits {
    /// Movement above this needs review
    pub standard: f64,

    /// Movement above this cannot be done in one pass
    pub maximum: f64,
}

impl Default for MovementLimits {
    fn default() -> Self {
        Self {
            standard: 30.0,
            maximum: 50.0,
        }
    }
}

impl MovementLimits {
    pub fn validate(&self) -> Result<()> {
        if !(self.standard >= 0.0) || !(self.maximum >= 0.0) {
            return Err(RestorationError::invalid_input(format!(
                "movement limits must be non-negative (standard {}, maximum {})",
                self.standard, self.maximum
            )));
        }
        if self.standard > self.maximum {
            return Err(RestorationError::invalid_input(format!(
                "standard limit {} exceeds maximum limit {}",
                self.standard, self.maximum
            )));
        }
        Ok(())
    }
}

/// Sample indices breaking the limits; the two sets never overlap
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionReport {
    /// `standard < |m| <= maximum`
    pub standard_exceeded: Vec<usize>,

    /// `|m| > maximum`
    pub maximum_exceeded: Vec<usize>,
}

impl RestrictionReport {
    pub fn is_clear(&self) -> bool {
        self.standard_exceeded.is_empty() && self.maximum_exceeded.is_empty()
    }
}

/// Sort movement amounts against the standard and maximum limits
///
/// # Arguments
/// * `movement` - Movement amounts in millimetres, signed
/// * `limits` - Limits compared with `|m|`
///
/// # Returns
/// Indices over each limit, or `InvalidInput` for inconsistent limits
pub fn check_restrictions(
    movement: &[f64],
    limits: &MovementLimits,
) -> Result<RestrictionReport> {
    limits.validate()?;
    let mut report = RestrictionReport::default();
    for (i, m) in movement.iter().map(|m| m.abs()).enumerate() {
        if m > limits.maximum {
            report.maximum_exceeded.push(i);
        } else if m > limits.standard {
            report.standard_exceeded.push(i);
        }
    }
    Ok(report)
}

/// Centred moving average of a series, edge windows truncated
pub fn smooth(series: &MeasurementSeries, window_size: usize) -> Result<MeasurementSeries> {
    let values = moving_average(&series.values(), window_size, &ChunkOptions::whole_series())?;
    Ok(series.with_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: Vec<f64>) -> MeasurementSeries {
        MeasurementSeries::uniform(100.0, 0.25, values).unwrap()
    }

    #[test]
    fn test_movement_identity() {
        let restored = series((0..64).map(|i| (i as f64 * 0.37).sin() * 6.0).collect());
        let ramp = series((0..64).map(|i| i as f64 * 0.01).collect());
        let plan = PlanLine::from_series(ramp).unwrap();
        let movement = calculate_movement(&restored, &plan, TrackAxis::Vertical).unwrap();

        for (i, record) in movement.records.iter().enumerate() {
            assert!((record.tamping + restored.value(i) - plan.series().value(i)).abs() < 1e-12);
            assert_eq!(record.lining, 0.0);
            assert_eq!(record.distance, restored.distance(i));
        }
        assert_eq!(&movement.predicted, plan.series());
    }

    #[test]
    fn test_lateral_axis_fills_lining() {
        let restored = series(vec![1.0, 2.0, 3.0]);
        let plan = PlanLine::from_series(series(vec![0.0; 3])).unwrap();
        let movement = calculate_movement(&restored, &plan, TrackAxis::Lateral).unwrap();
        assert_eq!(movement.amounts(), vec![-1.0, -2.0, -3.0]);
        assert!(movement.records.iter().all(|r| r.tamping == 0.0));
        assert_eq!(movement.statistics().max, -1.0);
    }

    #[test]
    fn test_length_mismatch() {
        let restored = series(vec![0.0; 5]);
        let plan = PlanLine::from_series(series(vec![0.0; 4])).unwrap();
        assert!(matches!(
            calculate_movement(&restored, &plan, TrackAxis::Vertical),
            Err(RestorationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_improvement_rate() {
        assert!((improvement_rate(4.0, 1.0) - 75.0).abs() < 1e-12);
        assert_eq!(improvement_rate(3.0, 3.0), 0.0);
        assert_eq!(improvement_rate(3.0, 0.0), 100.0);
        assert!(improvement_rate(2.0, 3.0) < 0.0);
        assert_eq!(improvement_rate(0.0, 1.0), 0.0);
        assert_eq!(improvement_rate(f64::NAN, 1.0), 0.0);
        for after in [0.0, 0.5, 1.9, 1.999] {
            let rate = improvement_rate(2.0, after);
            assert!(rate > 0.0 && rate <= 100.0);
        }
    }

    #[test]
    fn test_restrictions_are_disjoint() {
        let movement = [0.0, 25.0, -31.0, 50.0, -50.5, 80.0, 30.0];
        let report = check_restrictions(&movement, &MovementLimits::default()).unwrap();
        assert_eq!(report.standard_exceeded, vec![2, 3]);
        assert_eq!(report.maximum_exceeded, vec![4, 5]);
        assert!(!report.is_clear());
    }

    #[test]
    fn test_invalid_limits() {
        let inverted = MovementLimits {
            standard: 60.0,
            maximum: 50.0,
        };
        assert!(check_restrictions(&[1.0], &inverted).is_err());
        let negative = MovementLimits {
            standard: -1.0,
            maximum: 50.0,
        };
        assert!(check_restrictions(&[1.0], &negative).is_err());
    }

    #[test]
    fn test_smooth() {
        let s = series(vec![0.0, 3.0, 0.0, 3.0, 0.0]);
        let out = smooth(&s, 3).unwrap();
        assert!((out.value(0) - 1.5).abs() < 1e-12);
        assert!((out.value(2) - 2.0).abs() < 1e-12);
        assert_eq!(out.distances(), s.distances());
        assert!(smooth(&s, 0).is_err());
    }
}
