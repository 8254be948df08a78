//! Window functions for kernel design and spectral diagnostics

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    /// Mainlobe width: 8π/M, Sidelobe attenuation: ~44 dB
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    /// Mainlobe width: 8π/M, Sidelobe attenuation: ~53 dB
    #[default]
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(M-1)) + 0.08*cos(4πn/(M-1))
    /// Mainlobe width: 12π/M, Sidelobe attenuation: ~74 dB
    Blackman,

    /// Rectangular window (plain truncation)
    Rectangular,
}

impl WindowType {
    /// Mainlobe width factor `a` in `Δω = aπ/M`
    pub fn mainlobe_width_factor(&self) -> f64 {
        match self {
            WindowType::Hann => 8.0,
            WindowType::Hamming => 8.0,
            WindowType::Blackman => 12.0,
            WindowType::Rectangular => 4.0,
        }
    }

    /// Required odd kernel length M for a transition width in rad/sample
    pub fn calculate_filter_length(&self, delta_omega: f64) -> usize {
        let m = (self.mainlobe_width_factor() * PI / delta_omega).ceil() as usize;
        if m % 2 == 0 {
            m + 1
        } else {
            m.max(1)
        }
    }

    /// Window value at sample `n` of a length-`length` window
    #[inline]
    pub fn coefficient(&self, n: usize, length: usize) -> f64 {
        if length <= 1 {
            return 1.0;
        }
        let angle = 2.0 * PI * n as f64 / (length - 1) as f64;
        match self {
            WindowType::Hann => 0.5 - 0.5 * angle.cos(),
            WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
            WindowType::Rectangular => 1.0,
        }
    }
}

/// Window coefficients w[n] for n = 0..length-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    (0..length)
        .map(|n| window_type.coefficient(n, length))
        .collect()
}
