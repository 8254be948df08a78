//! Inverse bandpass kernel design using the windowing method
//!
//! The band is given as wavelengths in metres and converted to cycles
//! per sample through the sampling interval: `f = Δ / λ`. The kernel
//! cutoffs sit half a main lobe outside the band edges, so the whole
//! window transition falls in the stopband and wavelengths inside the
//! band keep their full gain.

use super::windows::{generate_window, WindowType};
use crate::error::{RestorationError, Result};
use crate::versine::characteristic::{characteristic, ChordConfig};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default number of frequency steps for sine-sum synthesis
pub const DEFAULT_SYNTHESIS_STEPS: usize = 1024;

/// Chord responses weaker than this are treated as nulls and skipped
const MIN_RESPONSE_POWER: f64 = 1e-9;

/// Restoration band and kernel parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParameters {
    /// Shortest wavelength kept (m)
    pub min_wavelength: f64,

    /// Longest wavelength kept (m)
    pub max_wavelength: f64,

    /// Sample spacing Δ (m)
    pub sampling_interval: f64,

    /// Kernel length, odd
    pub filter_order: usize,

    /// Window applied to the ideal response
    #[serde(default)]
    pub window: WindowType,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self::with_recommended_order(6.0, 40.0, 0.25, WindowType::Hamming)
    }
}

impl FilterParameters {
    /// Parameters with the kernel length chosen by
    /// [`FilterParameters::recommended_order`]
    pub fn with_recommended_order(
        min_wavelength: f64,
        max_wavelength: f64,
        sampling_interval: f64,
        window: WindowType,
    ) -> Self {
        let mut params = Self {
            min_wavelength,
            max_wavelength,
            sampling_interval,
            filter_order: 1,
            window,
        };
        params.filter_order = params.recommended_order();
        params
    }

    /// Odd kernel length whose main lobe spans half the low band-edge frequency
    ///
    /// The long-wave transition then fits between `max_wavelength` and
    /// `2 * max_wavelength`. Falls back to 1 when the band is not valid.
    pub fn recommended_order(&self) -> usize {
        let (f_low, _) = self.band_edges();
        if !(f_low > 0.0) || !f_low.is_finite() {
            return 1;
        }
        self.window.calculate_filter_length(PI * f_low)
    }

    /// Band edges (f_low, f_high) in cycles per sample
    pub fn band_edges(&self) -> (f64, f64) {
        (
            self.sampling_interval / self.max_wavelength,
            self.sampling_interval / self.min_wavelength,
        )
    }

    /// Kernel cutoffs (f_low, f_high) in cycles per sample
    ///
    /// Each cutoff moves half a main lobe, `a / (4M)`, outside its band edge.
    /// The move is capped at the octave midpoint (`f_low / 2` below,
    /// `f_high / 2` above) and the upper cutoff at Nyquist, so short kernels
    /// trade in-band gain near the edges for stopband rejection.
    pub fn cutoff_frequencies(&self) -> (f64, f64) {
        let (f_low, f_high) = self.band_edges();
        let half_lobe =
            self.window.mainlobe_width_factor() / (4.0 * self.filter_order.max(1) as f64);
        (
            (f_low - half_lobe).max(0.5 * f_low),
            (f_high + half_lobe).min(1.5 * f_high).min(0.5),
        )
    }

    /// Centre index of the kernel
    pub fn center(&self) -> usize {
        self.filter_order.saturating_sub(1) / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.filter_order == 0 || self.filter_order % 2 == 0 {
            return Err(RestorationError::invalid_input(format!(
                "filter order must be odd and positive (got {})",
                self.filter_order
            )));
        }
        if !(self.sampling_interval > 0.0) || !self.sampling_interval.is_finite() {
            return Err(RestorationError::invalid_input(format!(
                "sampling interval must be positive (got {})",
                self.sampling_interval
            )));
        }
        if !(self.min_wavelength > 0.0) || !self.max_wavelength.is_finite() {
            return Err(RestorationError::invalid_input(format!(
                "wavelengths must be positive and finite (got {} .. {})",
                self.min_wavelength, self.max_wavelength
            )));
        }
        if self.min_wavelength >= self.max_wavelength {
            return Err(RestorationError::invalid_input(format!(
                "min wavelength {} must be below max wavelength {}",
                self.min_wavelength, self.max_wavelength
            )));
        }
        if self.min_wavelength < 2.0 * self.sampling_interval {
            return Err(RestorationError::invalid_input(format!(
                "min wavelength {} is below the Nyquist wavelength {}",
                self.min_wavelength,
                2.0 * self.sampling_interval
            )));
        }
        Ok(())
    }
}

/// Design the windowed bandpass kernel
///
/// # Algorithm
/// The ideal response is the sine sum over the passband, whose closed form
/// is the difference of two lowpass sinc kernels:
/// h[m] = (sin(2π f_h m) - sin(2π f_l m)) / (π m), h[0] = 2 (f_h - f_l),
/// with m measured from the centre. The result is multiplied by the window.
///
/// # Arguments
/// * `params` - Band, sampling interval, kernel length and window
///
/// # Returns
/// `filter_order` coefficients, symmetric about the centre tap
pub fn design(params: &FilterParameters) -> Result<Vec<f64>> {
    params.validate()?;

    let (f_low, f_high) = params.cutoff_frequencies();
    let m_len = params.filter_order;
    let center = params.center() as f64;
    let window = generate_window(params.window, m_len);

    let kernel = (0..m_len)
        .map(|n| {
            let m = n as f64 - center;
            let ideal = if m.abs() < 1e-10 {
                2.0 * (f_high - f_low)
            } else {
                ((2.0 * PI * f_high * m).sin() - (2.0 * PI * f_low * m).sin()) / (PI * m)
            };
            ideal * window[n]
        })
        .collect();

    Ok(kernel)
}

/// Design a kernel that restores the track shape from a chord measurement
///
/// Synthesised as a sum of sinusoids across the passband, each weighted by
/// the inverse of the chord's measurement characteristic at that
/// wavelength, so both the attenuation and the phase shift of an
/// eccentric chord are undone:
/// h[m] = 2 Σ_j df (A_j cos(2π f_j m) - B_j sin(2π f_j m)) / (A_j² + B_j²)
///
/// Frequencies where the chord has a null contribute nothing.
///
/// # Arguments
/// * `params` - Band and kernel parameters, as for [`design`]
/// * `chord` - Chord the input versine was measured with
/// * `steps` - Number of frequencies in the synthesis grid
///
/// # Returns
/// `filter_order` coefficients; not symmetric for an eccentric chord
pub fn design_inverse(
    params: &FilterParameters,
    chord: &ChordConfig,
    steps: usize,
) -> Result<Vec<f64>> {
    params.validate()?;
    chord.validate()?;
    if steps == 0 {
        return Err(RestorationError::invalid_input(
            "synthesis steps must be positive",
        ));
    }

    let (f_low, f_high) = params.cutoff_frequencies();
    let df = (f_high - f_low) / steps as f64;

    // Inverse response (A/|H|², B/|H|²) on the midpoint grid
    let grid: Vec<(f64, f64, f64)> = (0..steps)
        .filter_map(|j| {
            let f = f_low + (j as f64 + 0.5) * df;
            let c = characteristic(chord, params.sampling_interval / f);
            let power = c.a * c.a + c.b * c.b;
            (power >= MIN_RESPONSE_POWER)
                .then(|| (2.0 * PI * f, c.a / power, c.b / power))
        })
        .collect();

    let m_len = params.filter_order;
    let center = params.center() as f64;
    let window = generate_window(params.window, m_len);

    let kernel = (0..m_len)
        .map(|n| {
            let m = n as f64 - center;
            let sum: f64 = grid
                .iter()
                .map(|&(omega, a, b)| a * (omega * m).cos() - b * (omega * m).sin())
                .sum();
            2.0 * df * sum * window[n]
        })
        .collect();

    Ok(kernel)
}

/// Gain of a kernel at a wavelength, `|Σ h[k] e^{-iθ(k-c)}|`
pub fn gain_at_wavelength(kernel: &[f64], wavelength: f64, sampling_interval: f64) -> f64 {
    if kernel.is_empty() || !(wavelength > 0.0) {
        return 0.0;
    }
    let theta = 2.0 * PI * sampling_interval / wavelength;
    let center = (kernel.len() - 1) as f64 / 2.0;
    let (re, im) = kernel.iter().enumerate().fold((0.0, 0.0), |(re, im), (k, &h)| {
        let phase = -theta * (k as f64 - center);
        (re + h * phase.cos(), im + h * phase.sin())
    });
    (re * re + im * im).sqrt()
}
