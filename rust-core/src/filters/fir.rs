//! Zero-padded FIR convolution of measurement series
//!
//! Output length equals input length. Samples closer than half a kernel
//! to either end are computed from the available data (zero fill) and
//! flagged as lower confidence instead of being trimmed.

use super::design::{design, design_inverse, FilterParameters, DEFAULT_SYNTHESIS_STEPS};
use super::fast_fir::fft_convolve;
use crate::error::{RestorationError, Result};
use crate::processing::{process_chunked, ChunkOptions, ChunkView};
use crate::series::MeasurementSeries;
use crate::versine::characteristic::ChordConfig;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Convolution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMethod {
    /// Direct time-domain sum, chunkable
    #[default]
    Direct,

    /// Whole-series FFT convolution
    Fft,
}

/// Filter output with its edge-confidence margin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredSeries {
    pub series: MeasurementSeries,

    /// Samples within this many indices of either end saw zero fill
    pub edge_margin: usize,
}

impl FilteredSeries {
    /// True when the sample's full kernel support lay inside the input
    pub fn is_reliable(&self, index: usize) -> bool {
        index >= self.edge_margin && index + self.edge_margin < self.series.len()
    }

    /// Index range of reliable samples (empty when the kernel is longer than the series)
    pub fn reliable_range(&self) -> Range<usize> {
        let len = self.series.len();
        if 2 * self.edge_margin >= len {
            return 0..0;
        }
        self.edge_margin..len - self.edge_margin
    }
}

/// Centred convolution of one chunk: y[i] = Σ_k h[k] x[i + c - k]
fn convolve_chunk(kernel: &[f64], view: &ChunkView<'_>, range: Range<usize>) -> Vec<f64> {
    let center = (kernel.len().saturating_sub(1) / 2) as isize;
    range
        .map(|i| {
            let base = i as isize + center;
            kernel
                .iter()
                .enumerate()
                .map(|(k, &h)| h * view.get(base - k as isize))
                .sum()
        })
        .collect()
}

/// Same-length zero-padded convolution of raw values
pub fn convolve_same(
    values: &[f64],
    kernel: &[f64],
    options: &ChunkOptions<'_>,
) -> Result<Vec<f64>> {
    if kernel.is_empty() {
        return Err(RestorationError::invalid_input("kernel is empty"));
    }
    // Reads reach c samples ahead and len-1-c behind
    let halo = kernel.len();
    process_chunked(values, halo, options, |view, range| convolve_chunk(kernel, view, range))
}

/// Convolve a series with a kernel
pub fn apply(series: &MeasurementSeries, kernel: &[f64]) -> Result<FilteredSeries> {
    apply_with(series, kernel, FilterMethod::Direct, &ChunkOptions::whole_series())
}

/// Convolve a series with a kernel using the chosen method
///
/// The FFT path ignores chunking; it always runs over the whole series.
///
/// # Arguments
/// * `series` - Uniformly sampled input
/// * `kernel` - Filter coefficients, centred on `kernel.len() / 2`
/// * `method` - Direct convolution or FFT
/// * `options` - Chunking, progress and cancellation for the direct path
///
/// # Returns
/// The filtered series, same length as the input, with its edge margin
pub fn apply_with(
    series: &MeasurementSeries,
    kernel: &[f64],
    method: FilterMethod,
    options: &ChunkOptions<'_>,
) -> Result<FilteredSeries> {
    if kernel.is_empty() {
        return Err(RestorationError::invalid_input("kernel is empty"));
    }
    let values = series.values();
    let filtered = match method {
        FilterMethod::Direct => convolve_same(&values, kernel, options)?,
        FilterMethod::Fft => fft_convolve(&values, kernel),
    };

    Ok(FilteredSeries {
        series: series.with_values(filtered),
        edge_margin: kernel.len() / 2,
    })
}

/// Reconstruct the restoration waveform from a uniform measurement series
///
/// With `chord` set, the series is taken to be a versine measured with
/// that chord and the inverse kernel is used; otherwise the plain
/// bandpass kernel is applied.
///
/// # Arguments
/// * `series` - Uniform series at `params.sampling_interval`
/// * `params` - Restoration band and kernel parameters
/// * `chord` - Chord the series was measured with, if it is a versine
/// * `method` - Direct convolution or FFT
/// * `options` - Chunking, progress and cancellation for the direct path
///
/// # Returns
/// The restoration waveform with the kernel's edge margin
///
/// # Errors
/// `InvalidInput` for invalid parameters or a series that is not uniform
/// at `params.sampling_interval`.
pub fn restore(
    series: &MeasurementSeries,
    params: &FilterParameters,
    chord: Option<&ChordConfig>,
    method: FilterMethod,
    options: &ChunkOptions<'_>,
) -> Result<FilteredSeries> {
    params.validate()?;
    series.check_uniform(params.sampling_interval)?;

    let kernel = match chord {
        Some(chord) => design_inverse(params, chord, DEFAULT_SYNTHESIS_STEPS)?,
        None => design(params)?,
    };
    apply_with(series, &kernel, method, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::windows::WindowType;
    use crate::stats::Statistics;
    use crate::versine::eccentric::eccentric_versine;
    use std::f64::consts::PI;

    fn sine_series(wavelength: f64, amplitude: f64, n: usize, interval: f64) -> MeasurementSeries {
        let values = (0..n)
            .map(|i| amplitude * (2.0 * PI * i as f64 * interval / wavelength).sin())
            .collect();
        MeasurementSeries::uniform(0.0, interval, values).unwrap()
    }

    fn interior_peak(filtered: &FilteredSeries) -> f64 {
        let values = filtered.series.values();
        values[filtered.reliable_range()]
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    #[test]
    fn test_convolution_impulse() {
        let kernel = vec![0.1, 0.2, 0.4, 0.2, 0.1];
        let mut input = vec![0.0; 11];
        input[5] = 1.0;

        let out = convolve_same(&input, &kernel, &ChunkOptions::whole_series()).unwrap();
        assert_eq!(out.len(), 11);
        for (k, &h) in kernel.iter().enumerate() {
            assert!((out[3 + k] - h).abs() < 1e-12);
        }
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_zero_fill_at_edges() {
        let kernel = vec![1.0 / 3.0; 3];
        let input = vec![3.0; 6];
        let out = convolve_same(&input, &kernel, &ChunkOptions::whole_series()).unwrap();
        // First sample only sees two real neighbours
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!((out[2] - 3.0).abs() < 1e-12);
        assert!((out[5] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_chunked_convolution_matches_whole() {
        let params = FilterParameters::default();
        let kernel = design(&params).unwrap();
        let series = sine_series(17.0, 4.0, 5000, 0.25);
        let values = series.values();

        let whole = convolve_same(&values, &kernel, &ChunkOptions::whole_series()).unwrap();
        let chunked = convolve_same(&values, &kernel, &ChunkOptions::chunked(700)).unwrap();
        let options = ChunkOptions::chunked(1000).with_parallel(true);
        let parallel = convolve_same(&values, &kernel, &options).unwrap();

        for i in 0..whole.len() {
            assert!((whole[i] - chunked[i]).abs() < 1e-9);
            assert!((whole[i] - parallel[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_passband_sine_survives() {
        let params = FilterParameters {
            min_wavelength: 6.0,
            max_wavelength: 100.0,
            sampling_interval: 0.25,
            filter_order: 2401,
            window: WindowType::Hamming,
        };
        let kernel = design(&params).unwrap();
        let filtered = apply(&sine_series(20.0, 5.0, 6000, 0.25), &kernel).unwrap();

        assert_eq!(filtered.series.len(), 6000);
        assert_eq!(filtered.edge_margin, 1200);
        let peak = interior_peak(&filtered);
        assert!((peak - 5.0).abs() < 0.5, "passband peak {peak}");
    }

    #[test]
    fn test_stopband_sines_removed() {
        let params = FilterParameters {
            min_wavelength: 6.0,
            max_wavelength: 100.0,
            sampling_interval: 0.25,
            filter_order: 2401,
            window: WindowType::Hamming,
        };
        let kernel = design(&params).unwrap();

        for wavelength in [2.0, 2.9, 250.0] {
            let filtered = apply(&sine_series(wavelength, 5.0, 8000, 0.25), &kernel).unwrap();
            let peak = interior_peak(&filtered);
            assert!(peak < 0.5, "{wavelength} m leaked with peak {peak}");
        }
    }

    #[test]
    fn test_reliable_range() {
        let series = MeasurementSeries::uniform(0.0, 1.0, vec![1.0; 10]).unwrap();
        let filtered = apply(&series, &[0.25, 0.5, 0.25]).unwrap();
        assert_eq!(filtered.reliable_range(), 1..9);
        assert!(!filtered.is_reliable(0));
        assert!(filtered.is_reliable(1));
        assert!(!filtered.is_reliable(9));

        let short = apply(&series, &[0.1; 31]).unwrap();
        assert_eq!(short.reliable_range(), 0..0);
        assert_eq!(short.series.len(), 10);
    }

    #[test]
    fn test_restore_rejects_non_uniform_series() {
        let series = MeasurementSeries::uniform(0.0, 0.5, vec![0.0; 100]).unwrap();
        let params = FilterParameters::default();
        let options = ChunkOptions::whole_series();
        let result = restore(&series, &params, None, FilterMethod::Direct, &options);
        assert!(matches!(result, Err(RestorationError::InvalidInput(_))));
    }

    #[test]
    fn test_restore_track_shape_from_versine() {
        let interval = 0.25;
        let track = sine_series(20.0, 5.0, 4000, interval);
        let chord = ChordConfig::new(7.5, 2.5);
        let versine = eccentric_versine(&track, &chord, &ChunkOptions::whole_series()).unwrap();

        let params =
            FilterParameters::with_recommended_order(6.0, 40.0, interval, WindowType::Hamming);
        let options = ChunkOptions::whole_series();
        let restored =
            restore(&versine, &params, Some(&chord), FilterMethod::Fft, &options).unwrap();

        // Skip the kernel margin plus the versine's own zeroed edge
        let skip = restored.edge_margin + 40;
        let original = track.values();
        let recovered = restored.series.values();
        let error: Vec<f64> = (skip..original.len() - skip)
            .map(|i| recovered[i] - original[i])
            .collect();
        let stats = Statistics::from_values(&error);
        assert!(stats.rms < 0.25, "restoration error rms {}", stats.rms);
    }
}
