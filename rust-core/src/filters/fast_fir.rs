//! FFT-based fast convolution for long kernels
//!
//! Whole-series linear convolution by frequency-domain multiplication.
//! Complexity: O(N log N) vs O(N*M) for the direct sum.

use rustfft::{num_complex::Complex, FftPlanner};

/// Same-length zero-padded convolution through the FFT
///
/// Matches [`super::fir::convolve_same`] within floating-point tolerance:
/// output `i` is the full linear convolution at `i + (M-1)/2`.
pub fn fft_convolve(values: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = values.len();
    let m = kernel.len();
    if n == 0 || m == 0 {
        return vec![0.0; n];
    }

    // FFT size must hold the full linear convolution without wraparound
    let fft_size = (n + m - 1).next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    let mut x = vec![Complex::new(0.0, 0.0); fft_size];
    for (slot, &v) in x.iter_mut().zip(values) {
        *slot = Complex::new(v, 0.0);
    }
    let mut h = vec![Complex::new(0.0, 0.0); fft_size];
    for (slot, &c) in h.iter_mut().zip(kernel) {
        *slot = Complex::new(c, 0.0);
    }

    fft.process(&mut x);
    fft.process(&mut h);

    for (xi, hi) in x.iter_mut().zip(h.iter()) {
        *xi *= *hi;
    }

    ifft.process(&mut x);

    let scale = 1.0 / fft_size as f64;
    let center = (m - 1) / 2;
    x[center..center + n].iter().map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::design::{design, FilterParameters};
    use crate::filters::fir::convolve_same;
    use crate::processing::ChunkOptions;

    #[test]
    fn test_fast_convolution_impulse() {
        let h = vec![0.1, 0.2, 0.4, 0.2, 0.1];
        let mut input = vec![0.0; 32];
        input[10] = 1.0;

        let output = fft_convolve(&input, &h);
        assert_eq!(output.len(), 32);
        for (k, &expected) in h.iter().enumerate() {
            assert!((output[8 + k] - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_fast_vs_direct() {
        let coeffs = design(&FilterParameters::default()).unwrap();
        let input: Vec<f64> = (0..3000)
            .map(|i| (i as f64 * 0.01).sin() + (i as f64 * 0.3).cos())
            .collect();

        let fast = fft_convolve(&input, &coeffs);
        let direct = convolve_same(&input, &coeffs, &ChunkOptions::whole_series()).unwrap();

        assert_eq!(fast.len(), direct.len());
        for i in 0..input.len() {
            let diff = (fast[i] - direct[i]).abs();
            assert!(diff < 1e-9, "Mismatch at {}: diff = {}", i, diff);
        }
    }

    #[test]
    fn test_kernel_longer_than_series() {
        let input = vec![1.0, 2.0, 3.0];
        let kernel = vec![0.2; 9];
        let fast = fft_convolve(&input, &kernel);
        let direct = convolve_same(&input, &kernel, &ChunkOptions::whole_series()).unwrap();
        for (a, b) in fast.iter().zip(direct.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
