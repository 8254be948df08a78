//! Plan-line segments and the plan line itself
//!
//! Distances are in metres, values in millimetres. Circular arcs use the
//! small-angle approximation: the offset from the chord between the two
//! end points is `sign · x(L - x) / (2R)`, converted from m to mm.

use crate::error::{RestorationError, Result};
use crate::series::MeasurementSeries;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Millimetres per metre, for arc offsets computed in metres
pub const MM_PER_M: f64 = 1000.0;

/// Shape of a transition between two segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Curvature linear in arc length (cubic Hermite under the small-angle approximation)
    #[default]
    Clothoid,

    /// Tangent lines blended with 3t² - 2t³
    Cubic,

    /// Tangent lines blended with a half-wave sine, (1 - cos πt) / 2
    Sine,
}

/// One designed piece of the plan line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlanLineSegment {
    #[serde(rename_all = "camelCase")]
    Straight {
        start: f64,
        end: f64,
        start_value: f64,
        end_value: f64,
    },

    /// Arc of radius `radius` (m) bulging towards `sign` (±1) from the chord
    #[serde(rename_all = "camelCase")]
    Circular {
        start: f64,
        end: f64,
        radius: f64,
        sign: f64,
        start_value: f64,
        end_value: f64,
    },

    /// Joins value and slope of its neighbours at both ends (slopes in mm/m)
    #[serde(rename_all = "camelCase")]
    Transition {
        start: f64,
        end: f64,
        kind: TransitionKind,
        start_value: f64,
        end_value: f64,
        start_slope: f64,
        end_slope: f64,
    },
}

impl PlanLineSegment {
    pub fn start(&self) -> f64 {
        match *self {
            Self::Straight { start, .. }
            | Self::Circular { start, .. }
            | Self::Transition { start, .. } => start,
        }
    }

    pub fn end(&self) -> f64 {
        match *self {
            Self::Straight { end, .. }
            | Self::Circular { end, .. }
            | Self::Transition { end, .. } => end,
        }
    }

    pub fn length(&self) -> f64 {
        self.end() - self.start()
    }

    /// Value at distance `x`; straight and circular segments extend their geometry beyond the ends
    pub fn value_at(&self, x: f64) -> f64 {
        match *self {
            Self::Straight {
                start,
                end,
                start_value,
                end_value,
            } => start_value + (end_value - start_value) * (x - start) / (end - start),

            Self::Circular {
                start,
                end,
                radius,
                sign,
                start_value,
                end_value,
            } => {
                let chord = start_value + (end_value - start_value) * (x - start) / (end - start);
                chord + sign * (x - start) * (end - x) / (2.0 * radius) * MM_PER_M
            }

            Self::Transition {
                start,
                end,
                kind,
                start_value,
                end_value,
                start_slope,
                end_slope,
            } => {
                let length = end - start;
                let t = ((x - start) / length).clamp(0.0, 1.0);
                match kind {
                    TransitionKind::Clothoid => {
                        let (t2, t3) = (t * t, t * t * t);
                        (2.0 * t3 - 3.0 * t2 + 1.0) * start_value
                            + (t3 - 2.0 * t2 + t) * length * start_slope
                            + (-2.0 * t3 + 3.0 * t2) * end_value
                            + (t3 - t2) * length * end_slope
                    }
                    TransitionKind::Cubic | TransitionKind::Sine => {
                        let from = start_value + start_slope * (x - start);
                        let to = end_value + end_slope * (x - end);
                        let (w, _) = blend(kind, t);
                        from + w * (to - from)
                    }
                }
            }
        }
    }

    /// First derivative dy/dx in mm/m
    pub fn slope_at(&self, x: f64) -> f64 {
        match *self {
            Self::Straight {
                start,
                end,
                start_value,
                end_value,
            } => (end_value - start_value) / (end - start),

            Self::Circular {
                start,
                end,
                radius,
                sign,
                start_value,
                end_value,
            } => {
                (end_value - start_value) / (end - start)
                    + sign * (start + end - 2.0 * x) / (2.0 * radius) * MM_PER_M
            }

            Self::Transition {
                start,
                end,
                kind,
                start_value,
                end_value,
                start_slope,
                end_slope,
            } => {
                let length = end - start;
                let t = ((x - start) / length).clamp(0.0, 1.0);
                match kind {
                    TransitionKind::Clothoid => {
                        let t2 = t * t;
                        let rise = (6.0 * t2 - 6.0 * t) * (start_value - end_value) / length;
                        rise + (3.0 * t2 - 4.0 * t + 1.0) * start_slope
                            + (3.0 * t2 - 2.0 * t) * end_slope
                    }
                    TransitionKind::Cubic | TransitionKind::Sine => {
                        let from = start_value + start_slope * (x - start);
                        let to = end_value + end_slope * (x - end);
                        let (w, dw) = blend(kind, t);
                        start_slope + w * (end_slope - start_slope) + dw / length * (to - from)
                    }
                }
            }
        }
    }

    /// Same geometry restricted (or extended) to `[start, end]`
    ///
    /// Returns `None` for transitions, whose shape depends on their span.
    pub fn rewindowed(&self, start: f64, end: f64) -> Option<Self> {
        match *self {
            Self::Straight { .. } => Some(Self::Straight {
                start,
                end,
                start_value: self.value_at(start),
                end_value: self.value_at(end),
            }),
            Self::Circular { radius, sign, .. } => Some(Self::Circular {
                start,
                end,
                radius,
                sign,
                start_value: self.value_at(start),
                end_value: self.value_at(end),
            }),
            Self::Transition { .. } => None,
        }
    }

    fn is_transition(&self) -> bool {
        matches!(self, Self::Transition { .. })
    }
}

/// Blend weight and its derivative d/dt for the tangent-blending transitions
fn blend(kind: TransitionKind, t: f64) -> (f64, f64) {
    match kind {
        TransitionKind::Sine => ((1.0 - (PI * t).cos()) / 2.0, PI * (PI * t).sin() / 2.0),
        TransitionKind::Cubic | TransitionKind::Clothoid => {
            (3.0 * t * t - 2.0 * t * t * t, 6.0 * t - 6.0 * t * t)
        }
    }
}

/// Boundary between two touching segments whose values (or slopes) disagree
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuityError {
    pub distance: f64,
    pub value_gap: f64,
    pub slope_gap: Option<f64>,
}

/// Dense target alignment plus the designed segments that shaped it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLine {
    series: MeasurementSeries,
    segments: Vec<PlanLineSegment>,
}

impl PlanLine {
    /// Wrap a uniform dense series with no designed segments
    pub fn from_series(series: MeasurementSeries) -> Result<Self> {
        let interval = series.sampling_interval().ok_or_else(|| {
            RestorationError::invalid_input("plan line needs at least 2 samples")
        })?;
        series.check_uniform(interval)?;
        Ok(Self {
            series,
            segments: Vec::new(),
        })
    }

    pub fn series(&self) -> &MeasurementSeries {
        &self.series
    }

    pub fn into_series(self) -> MeasurementSeries {
        self.series
    }

    pub fn values(&self) -> Vec<f64> {
        self.series.values()
    }

    pub fn segments(&self) -> &[PlanLineSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn interval(&self) -> f64 {
        self.series.sampling_interval().unwrap_or(1.0)
    }

    fn tolerance(&self) -> f64 {
        self.interval() * 1e-6
    }

    /// Check `start < end` within the covered distance range
    pub fn check_range(&self, start: f64, end: f64) -> Result<()> {
        let (min, max) = self.series.range().unwrap_or((0.0, 0.0));
        let slack = self.tolerance();
        let finite = start.is_finite() && end.is_finite();
        if !finite || !(start < end) || start < min - slack || end > max + slack {
            return Err(RestorationError::InvalidRange { start, end, min, max });
        }
        Ok(())
    }

    /// Dense value at a distance, linearly interpolated between samples
    pub fn value_at(&self, distance: f64) -> f64 {
        let (first, _) = self.series.range().unwrap_or((0.0, 0.0));
        let last_index = self.series.len() - 1;
        let position = ((distance - first) / self.interval()).clamp(0.0, last_index as f64);
        let i = (position.floor() as usize).min(last_index.saturating_sub(1));
        let t = position - i as f64;
        let a = self.series.value(i);
        let b = self.series.value((i + 1).min(last_index));
        a + t * (b - a)
    }

    /// Value and slope approaching `distance` from the left
    ///
    /// Taken from the segment that ends at (or spans) the point when there
    /// is one, otherwise from a backward difference of the dense values.
    pub fn left_boundary(&self, distance: f64) -> (f64, f64) {
        let tol = self.tolerance();
        if let Some(seg) = self
            .segments
            .iter()
            .find(|s| s.start() < distance - tol && s.end() >= distance - tol)
        {
            return (seg.value_at(distance), seg.slope_at(distance));
        }
        let h = self.interval();
        let value = self.value_at(distance);
        let before = self.value_at(distance - h);
        let slope = if distance - h < self.series.distance(0) - tol {
            (self.value_at(distance + h) - value) / h
        } else {
            (value - before) / h
        };
        (value, slope)
    }

    /// Value and slope approaching `distance` from the right
    pub fn right_boundary(&self, distance: f64) -> (f64, f64) {
        let tol = self.tolerance();
        if let Some(seg) = self
            .segments
            .iter()
            .find(|s| s.start() <= distance + tol && s.end() > distance + tol)
        {
            return (seg.value_at(distance), seg.slope_at(distance));
        }
        let h = self.interval();
        let value = self.value_at(distance);
        let last = self.series.distance(self.series.len() - 1);
        let slope = if distance + h > last + tol {
            (value - self.value_at(distance - h)) / h
        } else {
            (self.value_at(distance + h) - value) / h
        };
        (value, slope)
    }

    /// Segment ending at `distance`, and segment starting there
    pub fn segments_meeting_at(&self, distance: f64) -> Option<(PlanLineSegment, PlanLineSegment)> {
        let tol = self.tolerance().max(1e-9);
        let left = self.segments.iter().find(|s| (s.end() - distance).abs() <= tol)?;
        let right = self.segments.iter().find(|s| (s.start() - distance).abs() <= tol)?;
        Some((*left, *right))
    }

    /// Remove designed segments from `[start, end]`, trimming partial overlaps
    ///
    /// Straight and circular segments keep their geometry on the part left
    /// outside; a partly covered transition is dropped. Dense values are
    /// not touched.
    pub(crate) fn carve(&mut self, start: f64, end: f64) {
        let tol = self.tolerance();
        let mut kept = Vec::with_capacity(self.segments.len() + 1);

        for seg in self.segments.drain(..) {
            let (a, b) = (seg.start(), seg.end());
            if b <= start + tol || a >= end - tol {
                kept.push(seg);
                continue;
            }
            if seg.is_transition() {
                continue;
            }
            if a < start - tol {
                kept.extend(seg.rewindowed(a, start));
            }
            if b > end + tol {
                kept.extend(seg.rewindowed(end, b));
            }
        }

        self.segments = kept;
    }

    /// Insert a designed segment, overwriting dense values it covers
    pub(crate) fn insert_segment(&mut self, segment: PlanLineSegment) {
        self.carve(segment.start(), segment.end());
        self.write_segment(&segment);
        self.segments.push(segment);
        self.segments.sort_by(|a, b| a.start().total_cmp(&b.start()));
    }

    /// Overwrite dense values inside `[start, end]` with `f(distance)`
    pub(crate) fn write_range(&mut self, start: f64, end: f64, f: impl Fn(f64) -> f64) {
        let tol = self.tolerance();
        let values: Vec<f64> = self
            .series
            .points()
            .iter()
            .map(|p| {
                if p.distance >= start - tol && p.distance <= end + tol {
                    f(p.distance)
                } else {
                    p.value
                }
            })
            .collect();
        self.series = self.series.with_values(values);
    }

    /// Replace all dense values, dropping designed segments inside `[start, end]`
    pub(crate) fn overwrite_values(&mut self, values: Vec<f64>, start: f64, end: f64) {
        self.carve(start, end);
        self.series = self.series.with_values(values);
    }

    fn write_segment(&mut self, segment: &PlanLineSegment) {
        self.write_range(segment.start(), segment.end(), |d| segment.value_at(d));
    }

    /// Touching segment boundaries whose values disagree by more than `tolerance`
    ///
    /// Slopes are compared too when either side is a transition.
    pub fn continuity_errors(&self, tolerance: f64) -> Vec<ContinuityError> {
        let tol = self.tolerance().max(1e-9);
        self.segments
            .windows(2)
            .filter(|pair| (pair[0].end() - pair[1].start()).abs() <= tol)
            .filter_map(|pair| {
                let x = pair[1].start();
                let value_gap = (pair[0].value_at(x) - pair[1].value_at(x)).abs();
                let slope_gap = (pair[0].is_transition() || pair[1].is_transition())
                    .then(|| (pair[0].slope_at(x) - pair[1].slope_at(x)).abs());
                let broken = value_gap > tolerance || slope_gap.is_some_and(|g| g > tolerance);
                broken.then_some(ContinuityError {
                    distance: x,
                    value_gap,
                    slope_gap,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize) -> PlanLine {
        PlanLine::from_series(MeasurementSeries::uniform(0.0, 0.5, vec![0.0; n]).unwrap()).unwrap()
    }

    #[test]
    fn test_straight_geometry() {
        let s = PlanLineSegment::Straight {
            start: 10.0,
            end: 20.0,
            start_value: 1.0,
            end_value: 6.0,
        };
        assert!((s.value_at(15.0) - 3.5).abs() < 1e-12);
        assert!((s.slope_at(12.0) - 0.5).abs() < 1e-12);
        assert!((s.value_at(22.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_circular_offset() {
        let c = PlanLineSegment::Circular {
            start: 0.0,
            end: 20.0,
            radius: 1000.0,
            sign: 1.0,
            start_value: 0.0,
            end_value: 0.0,
        };
        // Mid-ordinate of a 20 m chord on R = 1000 m: 10·10 / 2000 m = 50 mm
        assert!((c.value_at(10.0) - 50.0).abs() < 1e-9);
        assert!(c.slope_at(10.0).abs() < 1e-12);
        assert!(c.value_at(0.0).abs() < 1e-12);
        assert!(c.value_at(20.0).abs() < 1e-12);
    }

    #[test]
    fn test_rewindowed_circular_keeps_geometry() {
        let c = PlanLineSegment::Circular {
            start: 0.0,
            end: 40.0,
            radius: 600.0,
            sign: -1.0,
            start_value: 3.0,
            end_value: -7.0,
        };
        let part = c.rewindowed(12.5, 31.0).unwrap();
        for x in [12.5, 15.0, 20.0, 27.25, 31.0, 35.0] {
            assert!((part.value_at(x) - c.value_at(x)).abs() < 1e-9, "x = {x}");
            assert!((part.slope_at(x) - c.slope_at(x)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transitions_match_both_ends() {
        for kind in [TransitionKind::Clothoid, TransitionKind::Cubic, TransitionKind::Sine] {
            let t = PlanLineSegment::Transition {
                start: 5.0,
                end: 25.0,
                kind,
                start_value: 2.0,
                end_value: -4.0,
                start_slope: 0.3,
                end_slope: -1.2,
            };
            assert!((t.value_at(5.0) - 2.0).abs() < 1e-12, "{kind:?}");
            assert!((t.value_at(25.0) + 4.0).abs() < 1e-12, "{kind:?}");
            assert!((t.slope_at(5.0) - 0.3).abs() < 1e-12, "{kind:?}");
            assert!((t.slope_at(25.0) + 1.2).abs() < 1e-12, "{kind:?}");
        }
    }

    #[test]
    fn test_clothoid_curvature_is_linear() {
        let t = PlanLineSegment::Transition {
            start: 0.0,
            end: 30.0,
            kind: TransitionKind::Clothoid,
            start_value: 0.0,
            end_value: 10.0,
            start_slope: 0.0,
            end_slope: 1.5,
        };
        // Second differences of a cubic change linearly
        let h = 0.5;
        let curvature =
            |x: f64| (t.value_at(x + h) - 2.0 * t.value_at(x) + t.value_at(x - h)) / (h * h);
        let k1 = curvature(5.0);
        let k2 = curvature(15.0);
        let k3 = curvature(25.0);
        assert!(((k2 - k1) - (k3 - k2)).abs() < 1e-9);
    }

    #[test]
    fn test_insert_trims_overlapping_segments() {
        let mut plan = flat(201); // 0 .. 100 m
        plan.insert_segment(PlanLineSegment::Straight {
            start: 0.0,
            end: 100.0,
            start_value: 0.0,
            end_value: 10.0,
        });
        plan.insert_segment(PlanLineSegment::Straight {
            start: 40.0,
            end: 60.0,
            start_value: 0.0,
            end_value: 0.0,
        });

        let segments = plan.segments();
        assert_eq!(segments.len(), 3);
        assert_eq!((segments[0].start(), segments[0].end()), (0.0, 40.0));
        assert_eq!((segments[1].start(), segments[1].end()), (40.0, 60.0));
        assert_eq!((segments[2].start(), segments[2].end()), (60.0, 100.0));
        assert!((segments[2].value_at(100.0) - 10.0).abs() < 1e-12);
        assert!(plan.series().value(100).abs() < 1e-12); // 50 m
        assert!((plan.series().value(200) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_check_range() {
        let plan = flat(21); // 0 .. 10 m
        assert!(plan.check_range(0.0, 10.0).is_ok());
        assert!(matches!(plan.check_range(5.0, 5.0), Err(RestorationError::InvalidRange { .. })));
        assert!(matches!(plan.check_range(6.0, 2.0), Err(RestorationError::InvalidRange { .. })));
        assert!(matches!(plan.check_range(-1.0, 2.0), Err(RestorationError::InvalidRange { .. })));
        assert!(matches!(plan.check_range(1.0, 10.5), Err(RestorationError::InvalidRange { .. })));
    }

    #[test]
    fn test_value_interpolation() {
        let series = MeasurementSeries::uniform(0.0, 1.0, vec![0.0, 10.0, 20.0]).unwrap();
        let plan = PlanLine::from_series(series).unwrap();
        assert!((plan.value_at(0.25) - 2.5).abs() < 1e-12);
        assert!((plan.value_at(2.0) - 20.0).abs() < 1e-12);
        assert!((plan.value_at(1.5) - 15.0).abs() < 1e-12);
    }
}
