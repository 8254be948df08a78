//! Inverse bandpass filtering: kernel design and convolution

pub mod windows;
pub mod design;
pub mod fir;
pub mod fast_fir;

pub use windows::{WindowType, generate_window};
pub use design::{FilterParameters, design, design_inverse, gain_at_wavelength};
pub use fir::{FilterMethod, FilteredSeries, apply, apply_with, convolve_same, restore};
pub use fast_fir::fft_convolve;
