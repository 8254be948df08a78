//! Linear resampling of irregularly noted series onto a uniform grid

use super::{MeasurementPoint, MeasurementSeries};
use crate::error::{RestorationError, Result};

/// Resample a series to a uniform spacing
///
/// The output starts at the first input distance and steps by
/// `target_interval` up to (and including, within rounding) the last
/// input distance. Values are linearly interpolated between the two
/// bracketing input points; nothing is extrapolated.
///
/// # Arguments
/// * `series` - Input series, possibly irregularly spaced
/// * `target_interval` - Output spacing in metres
///
/// # Returns
/// A uniform series covering the input's distance range
///
/// # Errors
/// `InvalidInput` with fewer than two points, a non-positive interval or
/// distances that do not strictly increase.
pub fn resample(
    series: &MeasurementSeries,
    target_interval: f64,
) -> Result<MeasurementSeries> {
    if series.len() < 2 {
        return Err(RestorationError::invalid_input(format!(
            "resampling needs at least 2 points (got {})",
            series.len()
        )));
    }
    if !(target_interval > 0.0) || !target_interval.is_finite() {
        return Err(RestorationError::invalid_input(format!(
            "target interval must be positive (got {target_interval})"
        )));
    }

    let points = series.points();
    if let Some(i) = points
        .windows(2)
        .position(|pair| !(pair[1].distance > pair[0].distance))
    {
        return Err(RestorationError::invalid_input(format!(
            "distances must strictly increase (index {}: {} -> {})",
            i + 1,
            points[i].distance,
            points[i + 1].distance
        )));
    }

    let first = points[0].distance;
    let last = points[points.len() - 1].distance;

    // Small slack so a grid point landing on `last` through rounding survives
    let count = ((last - first) / target_interval + 1e-9).floor() as usize + 1;
    let mut output = Vec::with_capacity(count);

    let mut seg = 0;
    for i in 0..count {
        let d = (first + i as f64 * target_interval).min(last);

        while seg + 2 < points.len() && points[seg + 1].distance < d {
            seg += 1;
        }

        let p0 = points[seg];
        let p1 = points[seg + 1];
        let span = p1.distance - p0.distance;
        let t = ((d - p0.distance) / span).clamp(0.0, 1.0);
        output.push(MeasurementPoint::new(
            first + i as f64 * target_interval,
            p0.value + t * (p1.value - p0.value),
        ));
    }

    MeasurementSeries::new(output)
}
