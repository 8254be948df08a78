//! Plan-line refinement: control-point interpolation, Gaussian smoothing, outlier removal
//!
//! The value-level helpers work on plain slices so they can be reused on
//! any series; the plan-level wrappers validate ranges and return a new plan.

use super::segment::PlanLine;
use crate::error::{RestorationError, Result};
use crate::processing::{process_chunked, ChunkOptions};
use crate::series::MeasurementPoint;
use serde::{Deserialize, Serialize};

/// How values between control points are filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterpolationMethod {
    Linear,
    /// Natural cubic spline (zero second derivative at both ends)
    #[default]
    CubicSpline,
}

/// Value written in place of a detected outlier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierReplacement {
    #[default]
    Mean,
    Median,
}

/// Natural cubic spline through strictly increasing knots
#[derive(Debug, Clone)]
pub struct NaturalSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    second: Vec<f64>,
}

impl NaturalSpline {
    pub fn new(points: &[MeasurementPoint]) -> Result<Self> {
        validate_control_points(points)?;
        let xs: Vec<f64> = points.iter().map(|p| p.distance).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.value).collect();
        let n = xs.len();

        // Tridiagonal system for interior second derivatives (Thomas algorithm)
        let mut second = vec![0.0; n];
        if n > 2 {
            let mut diag = vec![0.0; n];
            let mut rhs = vec![0.0; n];
            let mut upper = vec![0.0; n];
            for i in 1..n - 1 {
                let h0 = xs[i] - xs[i - 1];
                let h1 = xs[i + 1] - xs[i];
                diag[i] = 2.0 * (h0 + h1);
                upper[i] = h1;
                rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
                if i > 1 {
                    let factor = h0 / diag[i - 1];
                    diag[i] -= factor * upper[i - 1];
                    rhs[i] -= factor * rhs[i - 1];
                }
            }
            for i in (1..n - 1).rev() {
                second[i] = (rhs[i] - upper[i] * second[i + 1]) / diag[i];
            }
        }

        Ok(Self { xs, ys, second })
    }

    /// Spline value at `x`, clamped to the knot range
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let x = x.clamp(self.xs[0], self.xs[n - 1]);
        let i = bracket(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        let curve = (a * a * a - a) * self.second[i] + (b * b * b - b) * self.second[i + 1];
        a * self.ys[i] + b * self.ys[i + 1] + curve * h * h / 6.0
    }
}

/// Index `i` with `xs[i] <= x <= xs[i + 1]`
fn bracket(xs: &[f64], x: f64) -> usize {
    let upper = xs.partition_point(|&k| k <= x);
    upper.saturating_sub(1).min(xs.len() - 2)
}

/// Linear interpolation between control points, clamped to their range
pub fn linear_interpolate(points: &[MeasurementPoint], x: f64) -> f64 {
    match points {
        [] => 0.0,
        [only] => only.value,
        _ => {
            let xs: Vec<f64> = points.iter().map(|p| p.distance).collect();
            let x = x.clamp(xs[0], xs[xs.len() - 1]);
            let i = bracket(&xs, x);
            let (p0, p1) = (points[i], points[i + 1]);
            p0.value + (p1.value - p0.value) * (x - p0.distance) / (p1.distance - p0.distance)
        }
    }
}

fn validate_control_points(points: &[MeasurementPoint]) -> Result<()> {
    if points.len() < 2 {
        return Err(RestorationError::invalid_input("at least 2 control points are required"));
    }
    if points.iter().any(|p| !p.distance.is_finite() || !p.value.is_finite()) {
        return Err(RestorationError::invalid_input("control points must be finite"));
    }
    if points.windows(2).any(|w| w[1].distance <= w[0].distance) {
        return Err(RestorationError::invalid_input(
            "control point distances must strictly increase",
        ));
    }
    Ok(())
}

/// Overwrite the plan between the first and last control point
pub fn interpolate_control_points(
    plan: &PlanLine,
    points: &[MeasurementPoint],
    method: InterpolationMethod,
) -> Result<PlanLine> {
    validate_control_points(points)?;
    let (start, end) = (points[0].distance, points[points.len() - 1].distance);
    plan.check_range(start, end)?;

    let mut next = plan.clone();
    next.carve(start, end);
    match method {
        InterpolationMethod::Linear => {
            next.write_range(start, end, |d| linear_interpolate(points, d))
        }
        InterpolationMethod::CubicSpline => {
            let spline = NaturalSpline::new(points)?;
            next.write_range(start, end, |d| spline.evaluate(d));
        }
    }
    Ok(next)
}

/// Gaussian smoothing with σ in samples
///
/// The kernel extends `ceil(3σ)` samples each side; near the ends it is
/// truncated and renormalised.
pub fn gaussian_smooth_values(
    values: &[f64],
    sigma: f64,
    options: &ChunkOptions<'_>,
) -> Result<Vec<f64>> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(RestorationError::invalid_input(format!(
            "Gaussian sigma must be positive (got {sigma})"
        )));
    }
    let radius = (3.0 * sigma).ceil() as usize;
    let weights: Vec<f64> = (0..=radius)
        .map(|k| (-((k * k) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();

    process_chunked(values, radius, options, |view, range| {
        range
            .map(|i| {
                let i = i as isize;
                let (mut sum, mut norm) = (0.0, 0.0);
                for (k, &w) in weights.iter().enumerate() {
                    let k = k as isize;
                    if let Some(v) = view.try_get(i - k) {
                        sum += w * v;
                        norm += w;
                    }
                    if k > 0 {
                        if let Some(v) = view.try_get(i + k) {
                            sum += w * v;
                            norm += w;
                        }
                    }
                }
                sum / norm
            })
            .collect()
    })
}

/// Gaussian smoothing of the plan, optionally restricted to `[start, end]`
pub fn gaussian_smooth(
    plan: &PlanLine,
    sigma_samples: f64,
    range: Option<(f64, f64)>,
) -> Result<PlanLine> {
    let (start, end) = match range {
        Some((start, end)) => {
            plan.check_range(start, end)?;
            (start, end)
        }
        None => plan.series().range().unwrap_or((0.0, 0.0)),
    };

    let smoothed =
        gaussian_smooth_values(&plan.values(), sigma_samples, &ChunkOptions::whole_series())?;
    let original = plan.values();
    let tol = plan.interval() * 1e-6;
    let values = plan
        .series()
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if p.distance >= start - tol && p.distance <= end + tol {
                smoothed[i]
            } else {
                original[i]
            }
        })
        .collect();

    let mut next = plan.clone();
    next.overwrite_values(values, start, end);
    Ok(next)
}

/// Local statistics of the `window` samples around `i`, excluding `i` itself
fn neighbourhood(values: &[f64], i: usize, half: usize) -> Vec<f64> {
    let lo = i.saturating_sub(half);
    let hi = (i + half + 1).min(values.len());
    (lo..hi).filter(|&j| j != i).map(|j| values[j]).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn check_outlier_params(window: usize, k: f64) -> Result<()> {
    if window < 3 {
        return Err(RestorationError::invalid_input(format!(
            "outlier window must cover at least 3 samples (got {window})"
        )));
    }
    if !(k > 0.0) || !k.is_finite() {
        return Err(RestorationError::invalid_input(format!(
            "outlier threshold must be positive (got {k})"
        )));
    }
    Ok(())
}

/// Indices deviating from their neighbours' mean by more than `k` neighbour σ
pub fn detect_outliers(values: &[f64], window: usize, k: f64) -> Result<Vec<usize>> {
    check_outlier_params(window, k)?;
    let half = window / 2;

    Ok((0..values.len())
        .filter(|&i| {
            let around = neighbourhood(values, i, half);
            if around.len() < 2 {
                return false;
            }
            let m = mean(&around);
            let variance =
                around.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / around.len() as f64;
            let sigma = variance.sqrt();
            (values[i] - m).abs() > k * sigma + f64::EPSILON * m.abs().max(1.0)
        })
        .collect())
}

/// Replace detected outliers by the mean or median of their neighbours
///
/// Detection runs on the input values only, so one replacement never
/// influences the next.
pub fn remove_outliers_values(
    values: &[f64],
    window: usize,
    k: f64,
    replacement: OutlierReplacement,
) -> Result<(Vec<f64>, Vec<usize>)> {
    let outliers = detect_outliers(values, window, k)?;
    let half = window / 2;
    let mut cleaned = values.to_vec();
    for &i in &outliers {
        let around = neighbourhood(values, i, half);
        cleaned[i] = match replacement {
            OutlierReplacement::Mean => mean(&around),
            OutlierReplacement::Median => median(&around),
        };
    }
    Ok((cleaned, outliers))
}

/// Outlier removal over the whole plan line
pub fn remove_outliers(
    plan: &PlanLine,
    window: usize,
    k: f64,
    replacement: OutlierReplacement,
) -> Result<PlanLine> {
    let (cleaned, outliers) = remove_outliers_values(&plan.values(), window, k, replacement)?;
    let mut next = plan.clone();
    if let (Some(&first), Some(&last)) = (outliers.first(), outliers.last()) {
        let (start, end) = (plan.series().distance(first), plan.series().distance(last));
        next.overwrite_values(cleaned, start, end);
    }
    Ok(next)
}
