//! Versine and eccentric versine of uniform series
//!
//! y[n] = x[n] - (p·x[n - q/Δ] + q·x[n + p/Δ]) / (p + q)
//!
//! Chord offsets are rounded to whole samples. Output samples whose chord
//! ends fall outside the series are 0.

use super::characteristic::ChordConfig;
use crate::error::{RestorationError, Result};
use crate::processing::{process_chunked, ChunkOptions};
use crate::series::MeasurementSeries;

/// Sample offsets (backward, forward) of a chord at spacing `interval`
pub fn chord_offsets(chord: &ChordConfig, interval: f64) -> (usize, usize) {
    let back = (chord.q / interval).round() as usize;
    let forward = (chord.p / interval).round() as usize;
    (back, forward)
}

/// Eccentric versine of raw values at spacing `interval`
pub fn eccentric_versine_values(
    values: &[f64],
    interval: f64,
    chord: &ChordConfig,
    options: &ChunkOptions<'_>,
) -> Result<Vec<f64>> {
    chord.validate()?;
    if !(interval > 0.0) {
        return Err(RestorationError::invalid_input(format!(
            "sampling interval must be positive (got {interval})"
        )));
    }

    let (back, forward) = chord_offsets(chord, interval);
    let (p, q) = (chord.p, chord.q);
    let total = p + q;

    process_chunked(values, back.max(forward), options, |view, range| {
        range
            .map(|n| {
                let n = n as isize;
                let behind = view.try_get(n - back as isize);
                let ahead = view.try_get(n + forward as isize);
                match (behind, ahead) {
                    (Some(behind), Some(ahead)) => view.get(n) - (p * behind + q * ahead) / total,
                    _ => 0.0,
                }
            })
            .collect()
    })
}

/// Eccentric versine of a uniform series
///
/// # Arguments
/// * `series` - Uniformly sampled track irregularity
/// * `chord` - Chord lengths `p` (forward) and `q` (backward) in metres
/// * `options` - Chunking, progress and cancellation
///
/// # Returns
/// The versine at every sample, 0 where the chord overhangs either end
///
/// # Errors
/// `InvalidInput` for non-positive chord lengths or a series without a
/// uniform spacing.
pub fn eccentric_versine(
    series: &MeasurementSeries,
    chord: &ChordConfig,
    options: &ChunkOptions<'_>,
) -> Result<MeasurementSeries> {
    let Some(interval) = series.sampling_interval() else {
        return Ok(series.with_values(vec![0.0; series.len()]));
    };
    series.check_uniform(interval)?;

    let values = eccentric_versine_values(&series.values(), interval, chord, options)?;
    Ok(series.with_values(values))
}

/// Classic symmetric versine with half-chord `half_chord`
pub fn versine(
    series: &MeasurementSeries,
    half_chord: f64,
    options: &ChunkOptions<'_>,
) -> Result<MeasurementSeries> {
    eccentric_versine(series, &ChordConfig::symmetric(half_chord), options)
}
