//! Plan-line construction: initial plan, straight, circular and transition segments
//!
//! Every operation leaves its input untouched and returns the edited plan.

use super::segment::{PlanLine, PlanLineSegment, TransitionKind};
use crate::error::{RestorationError, Result};
use crate::processing::ChunkOptions;
use crate::series::{moving_average, MeasurementSeries};

/// Slopes closer than this are treated as parallel tangents
const PARALLEL_SLOPE: f64 = 1e-12;

/// Initial plan line: centred moving average of the restoration waveform
pub fn generate_initial(restored: &MeasurementSeries, window_size: usize) -> Result<PlanLine> {
    if restored.is_empty() {
        return Err(RestorationError::invalid_input(
            "cannot build a plan line from an empty series",
        ));
    }
    let smoothed =
        moving_average(&restored.values(), window_size, &ChunkOptions::whole_series())?;
    PlanLine::from_series(restored.with_values(smoothed))
}

/// Straight line from `start_value` at `start` to `end_value` at `end`
///
/// # Arguments
/// * `plan` - Plan line to edit
/// * `start`, `end` - Segment span in metres, inside the plan's range
/// * `start_value`, `end_value` - Plan values at the two ends in millimetres
///
/// # Returns
/// The edited plan; segments overlapping the span are trimmed or dropped
pub fn set_straight(
    plan: &PlanLine,
    start: f64,
    end: f64,
    start_value: f64,
    end_value: f64,
) -> Result<PlanLine> {
    plan.check_range(start, end)?;
    if !start_value.is_finite() || !end_value.is_finite() {
        return Err(RestorationError::invalid_input(
            "straight segment values must be finite",
        ));
    }

    let mut next = plan.clone();
    next.insert_segment(PlanLineSegment::Straight {
        start,
        end,
        start_value,
        end_value,
    });
    Ok(next)
}

/// Circular curve of `radius` metres over `[start, end]`
///
/// The chord joins the current plan values at both ends; `sign` picks the
/// side the arc bulges towards.
///
/// # Arguments
/// * `plan` - Plan line to edit
/// * `start`, `end` - Curve span in metres, inside the plan's range
/// * `radius` - Curve radius in metres, positive
/// * `sign` - Bulge direction; only its sign is kept
///
/// # Returns
/// The edited plan, or `InvalidCurvature` for a radius that is not positive
pub fn set_circular(
    plan: &PlanLine,
    start: f64,
    end: f64,
    radius: f64,
    sign: f64,
) -> Result<PlanLine> {
    if !(radius > 0.0) || !radius.is_finite() {
        return Err(RestorationError::InvalidCurvature(radius));
    }
    if !sign.is_finite() {
        return Err(RestorationError::invalid_input(format!(
            "curve sign must be finite (got {sign})"
        )));
    }
    plan.check_range(start, end)?;

    let mut next = plan.clone();
    next.insert_segment(PlanLineSegment::Circular {
        start,
        end,
        radius,
        sign: sign.signum(),
        start_value: plan.value_at(start),
        end_value: plan.value_at(end),
    });
    Ok(next)
}

/// Transition over `[start, end]` matching the plan on both sides
pub fn set_transition(
    plan: &PlanLine,
    start: f64,
    end: f64,
    kind: TransitionKind,
) -> Result<PlanLine> {
    plan.check_range(start, end)?;
    let (start_value, start_slope) = plan.left_boundary(start);
    let (end_value, end_slope) = plan.right_boundary(end);

    let mut next = plan.clone();
    next.insert_segment(PlanLineSegment::Transition {
        start,
        end,
        kind,
        start_value,
        end_value,
        start_slope,
        end_slope,
    });
    Ok(next)
}

/// Crossing method: replace the corner at `boundary` by a transition
///
/// The tangents of the two segments meeting at `boundary` are intersected
/// and the transition is centred on the crossing point. The neighbouring
/// segments are trimmed (or extended along their own geometry) so that
/// they end exactly where the transition begins and ends.
///
/// # Arguments
/// * `plan` - Plan line with two designed segments meeting at `boundary`
/// * `boundary` - Distance in metres where the segments meet
/// * `length` - Transition length in metres
/// * `kind` - Transition shape
///
/// # Returns
/// The edited plan with the trimmed neighbours and the new transition
///
/// # Errors
/// `InvalidInput` if no straight or circular segments meet at `boundary`,
/// `InvalidRange` if the transition would swallow either neighbour.
pub fn cross_transition(
    plan: &PlanLine,
    boundary: f64,
    length: f64,
    kind: TransitionKind,
) -> Result<PlanLine> {
    if !(length > 0.0) || !length.is_finite() {
        return Err(RestorationError::invalid_input(format!(
            "transition length must be positive (got {length})"
        )));
    }
    let (left, right) = plan.segments_meeting_at(boundary).ok_or_else(|| {
        RestorationError::invalid_input(format!("no two segments meet at {boundary} m"))
    })?;

    let (left_value, left_slope) = (left.value_at(boundary), left.slope_at(boundary));
    let (right_value, right_slope) = (right.value_at(boundary), right.slope_at(boundary));
    let crossing = if (right_slope - left_slope).abs() < PARALLEL_SLOPE {
        boundary
    } else {
        boundary + (left_value - right_value) / (right_slope - left_slope)
    };

    let start = crossing - length / 2.0;
    let end = crossing + length / 2.0;
    if !(left.start() < start && end < right.end()) {
        return Err(RestorationError::InvalidRange {
            start,
            end,
            min: left.start(),
            max: right.end(),
        });
    }
    plan.check_range(start, end)?;

    let corner_error = || {
        RestorationError::invalid_input("crossing method needs straight or circular neighbours")
    };
    let new_left = left.rewindowed(left.start(), start).ok_or_else(corner_error)?;
    let new_right = right.rewindowed(end, right.end()).ok_or_else(corner_error)?;
    let transition = PlanLineSegment::Transition {
        start,
        end,
        kind,
        start_value: new_left.value_at(start),
        end_value: new_right.value_at(end),
        start_slope: new_left.slope_at(start),
        end_slope: new_right.slope_at(end),
    };

    let mut next = plan.clone();
    next.carve(left.start(), right.end());
    next.insert_segment(new_left);
    next.insert_segment(new_right);
    next.insert_segment(transition);
    Ok(next)
}
