//! Windowing of series before spectral analysis

use crate::filters::windows::{generate_window, WindowType};

/// Multiply a signal by a window of the same length, returning the windowed copy
pub fn apply_window(signal: &[f64], window_type: WindowType) -> Vec<f64> {
    let window = generate_window(window_type, signal.len());

    signal
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| s * w)
        .collect()
}

/// Amplitude correction for a window: multiply spectra by this to undo the window's coherent gain
pub fn window_correction_factor(window_type: WindowType, length: usize) -> f64 {
    let window = generate_window(window_type, length);
    let sum: f64 = window.iter().sum();
    if sum == 0.0 {
        return 1.0;
    }
    length as f64 / sum
}
