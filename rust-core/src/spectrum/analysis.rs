//! Wavelength spectrum of measurement series
//!
//! Diagnostics for the restoration step: how much of a series' energy
//! sits in a wavelength band before and after filtering.

use super::fft::{wavelength_to_bin, FftEngine};
use super::windowing::{apply_window, window_correction_factor};
use crate::error::{RestorationError, Result};
use crate::filters::windows::WindowType;
use crate::series::MeasurementSeries;
use serde::{Deserialize, Serialize};

/// Spectrum analyzer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Window applied before the FFT
    pub window_type: WindowType,

    /// Undo the window's coherent gain
    pub apply_correction: bool,

    /// Subtract the mean before transforming
    pub remove_mean: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_type: WindowType::Hann,
            apply_correction: true,
            remove_mean: true,
        }
    }
}

/// One-sided amplitude spectrum indexed by wavelength
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavelengthSpectrum {
    /// Wavelength of each bin in metres (bin 0 is +∞)
    pub wavelengths: Vec<f64>,

    /// Amplitude per bin in the series' units
    pub amplitudes: Vec<f64>,

    /// Number of samples transformed
    pub sample_count: usize,

    /// Sample spacing in metres
    pub interval: f64,
}

impl WavelengthSpectrum {
    /// Analyze a uniform series
    ///
    /// # Errors
    /// `InvalidInput` for series shorter than 2 samples.
    pub fn analyze(series: &MeasurementSeries, config: &AnalyzerConfig) -> Result<Self> {
        let interval = series.sampling_interval().ok_or_else(|| {
            RestorationError::invalid_input("spectrum needs at least 2 samples")
        })?;

        let mut values = series.values();
        if config.remove_mean {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            values.iter_mut().for_each(|v| *v -= mean);
        }
        let windowed = apply_window(&values, config.window_type);

        let mut engine = FftEngine::new(windowed.len());
        let mut amplitudes = engine.compute_amplitude(&windowed)?;
        if config.apply_correction {
            let correction = window_correction_factor(config.window_type, windowed.len());
            amplitudes.iter_mut().for_each(|a| *a *= correction);
        }

        Ok(Self {
            wavelengths: engine.wavelength_axis(interval),
            amplitudes,
            sample_count: windowed.len(),
            interval,
        })
    }

    /// Sum of squared amplitudes of bins whose wavelength lies in `[min, max]`
    pub fn band_energy(&self, min_wavelength: f64, max_wavelength: f64) -> f64 {
        let n = self.sample_count;
        let lo = wavelength_to_bin(max_wavelength, n, self.interval);
        let last_bin = self.amplitudes.len().saturating_sub(1);
        let hi = wavelength_to_bin(min_wavelength, n, self.interval).min(last_bin);
        if lo > hi {
            return 0.0;
        }
        self.amplitudes[lo.max(1)..=hi].iter().map(|a| a * a).sum()
    }

    /// Fraction of the total (non-DC) energy in the band
    pub fn band_fraction(&self, min_wavelength: f64, max_wavelength: f64) -> f64 {
        let total: f64 = self.amplitudes.iter().skip(1).map(|a| a * a).sum();
        if total == 0.0 {
            return 0.0;
        }
        self.band_energy(min_wavelength, max_wavelength) / total
    }

    /// Wavelength of the strongest non-DC bin
    pub fn dominant_wavelength(&self) -> Option<f64> {
        self.amplitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(bin, _)| self.wavelengths[bin])
    }
}
