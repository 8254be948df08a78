//! Discrete Fourier transforms and wavelength/bin conversion
//!
//! `transform` handles complex input of any length through rustfft's
//! mixed-radix planner. `FftEngine` keeps a realfft plan for repeated
//! one-sided spectra of real series.

use crate::error::{RestorationError, Result};
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::FftPlanner;
use serde::Serialize;
use std::sync::Arc;

/// Separate real and imaginary parts of a spectrum (or of a time signal after inversion)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComplexSpectrum {
    pub real: Vec<f64>,
    pub imag: Vec<f64>,
}

impl ComplexSpectrum {
    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn power(&self) -> Vec<f64> {
        power_spectrum(&self.real, &self.imag)
    }
}

/// Forward or inverse DFT of any length
///
/// `imag = None` treats the input as real. The inverse is scaled by 1/N so
/// a forward transform followed by an inverse one returns the input.
///
/// # Errors
/// `InvalidInput` when `imag` and `real` lengths differ.
pub fn transform(real: &[f64], imag: Option<&[f64]>, inverse: bool) -> Result<ComplexSpectrum> {
    let n = real.len();
    if let Some(imag) = imag {
        if imag.len() != n {
            return Err(RestorationError::invalid_input(format!(
                "real and imaginary parts differ in length ({} vs {})",
                n,
                imag.len()
            )));
        }
    }
    if n == 0 {
        return Ok(ComplexSpectrum::default());
    }

    let mut buffer: Vec<Complex<f64>> = match imag {
        Some(imag) => real.iter().zip(imag).map(|(&re, &im)| Complex::new(re, im)).collect(),
        None => real.iter().map(|&re| Complex::new(re, 0.0)).collect(),
    };

    let mut planner = FftPlanner::<f64>::new();
    let fft = if inverse {
        planner.plan_fft_inverse(n)
    } else {
        planner.plan_fft_forward(n)
    };
    fft.process(&mut buffer);

    let scale = if inverse { 1.0 / n as f64 } else { 1.0 };
    Ok(ComplexSpectrum {
        real: buffer.iter().map(|c| c.re * scale).collect(),
        imag: buffer.iter().map(|c| c.im * scale).collect(),
    })
}

/// Power per bin: re² + im²
pub fn power_spectrum(real: &[f64], imag: &[f64]) -> Vec<f64> {
    real.iter().zip(imag).map(|(&re, &im)| re * re + im * im).collect()
}

/// Bin index for a wavelength: round(N·Δ/λ)
///
/// An infinite (or non-positive) wavelength maps to the DC bin 0.
pub fn wavelength_to_bin(wavelength: f64, n: usize, interval: f64) -> usize {
    if !wavelength.is_finite() || wavelength <= 0.0 {
        return 0;
    }
    (n as f64 * interval / wavelength).round() as usize
}

/// Wavelength of a bin: N·Δ/bin, with bin 0 at +∞
pub fn bin_to_wavelength(bin: usize, n: usize, interval: f64) -> f64 {
    if bin == 0 {
        return f64::INFINITY;
    }
    n as f64 * interval / bin as f64
}

/// Real-input FFT engine with a cached plan
pub struct FftEngine {
    fft_size: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    input_buffer: Vec<f64>,
    output_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine for `fft_size` samples (any length)
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(1);
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        Self {
            fft_size,
            input_buffer: r2c.make_input_vec(),
            output_buffer: r2c.make_output_vec(),
            r2c,
        }
    }

    /// One-sided complex spectrum, input zero-padded or truncated to `fft_size`
    pub fn compute(&mut self, signal: &[f64]) -> Result<&[Complex<f64>]> {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .map_err(|e| RestorationError::invalid_input(format!("FFT processing failed: {e}")))?;

        Ok(&self.output_buffer)
    }

    /// Magnitude spectrum |X[k]| for k = 0..=fft_size/2
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.compute(signal)?.iter().map(|c| c.norm()).collect())
    }

    /// Single-sided amplitude spectrum: a sine of amplitude `a` on an exact bin reads `a`
    pub fn compute_amplitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        let n = self.fft_size as f64;
        let last = self.fft_size / 2;
        let even = self.fft_size % 2 == 0;
        let mut amplitude = self.compute_magnitude(signal)?;
        for (k, a) in amplitude.iter_mut().enumerate() {
            let single = k == 0 || (even && k == last);
            *a *= if single { 1.0 / n } else { 2.0 / n };
        }
        Ok(amplitude)
    }

    /// Power spectrum (magnitude squared)
    pub fn compute_power(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.compute(signal)?.iter().map(|c| c.norm_sqr()).collect())
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Wavelength axis in metres for a given sample spacing (bin 0 is +∞)
    pub fn wavelength_axis(&self, interval: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| bin_to_wavelength(bin, self.fft_size, interval))
            .collect()
    }
}
