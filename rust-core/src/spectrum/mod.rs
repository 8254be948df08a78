//! Spectral analysis with FFT

pub mod fft;
pub mod windowing;
pub mod analysis;

pub use fft::{
    ComplexSpectrum, FftEngine, bin_to_wavelength, power_spectrum, transform, wavelength_to_bin,
};
pub use windowing::apply_window;
pub use analysis::{AnalyzerConfig, WavelengthSpectrum};
