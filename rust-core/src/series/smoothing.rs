//! Centred moving average with truncated edge windows

use crate::error::{RestorationError, Result};
use crate::processing::{process_chunked, ChunkOptions};

/// Centred moving average of width `window`
///
/// Each output averages the samples in `[i - (w-1)/2, i + w/2]` that exist;
/// near the ends the window shrinks to the available samples.
pub fn moving_average(
    values: &[f64],
    window: usize,
    options: &ChunkOptions<'_>,
) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(RestorationError::invalid_input(
            "moving average window must be positive",
        ));
    }
    let left = (window - 1) / 2;
    let right = window - 1 - left;
    let total = values.len();

    process_chunked(values, window, options, |view, range| {
        let data = view.data();
        let offset = view.covered().start;

        let mut prefix = Vec::with_capacity(data.len() + 1);
        prefix.push(0.0);
        let mut running = 0.0;
        for &v in data {
            running += v;
            prefix.push(running);
        }

        range
            .map(|i| {
                let lo = i.saturating_sub(left);
                let hi = (i + right + 1).min(total);
                (prefix[hi - offset] - prefix[lo - offset]) / (hi - lo) as f64
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_average() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = moving_average(&values, 3, &ChunkOptions::whole_series()).unwrap();
        let expected = [1.5, 2.0, 3.0, 4.0, 4.5];
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let values = [3.0, -1.0, 7.5];
        let out = moving_average(&values, 1, &ChunkOptions::whole_series()).unwrap();
        assert_eq!(out, values.to_vec());
    }

    #[test]
    fn test_window_longer_than_series() {
        let values = [1.0, 2.0, 3.0];
        let out = moving_average(&values, 11, &ChunkOptions::whole_series()).unwrap();
        assert!(out.iter().all(|&v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_chunked_matches_whole() {
        let values: Vec<f64> = (0..3000).map(|i| (i as f64 * 0.05).sin() * 10.0).collect();
        let whole = moving_average(&values, 41, &ChunkOptions::whole_series()).unwrap();
        let chunked = moving_average(&values, 41, &ChunkOptions::chunked(256)).unwrap();
        for (a, b) in whole.iter().zip(chunked.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_window() {
        assert!(moving_average(&[1.0], 0, &ChunkOptions::whole_series()).is_err());
    }
}
