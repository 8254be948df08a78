//! Conversion of versine values between chord configurations
//!
//! The ratio of two chord responses depends on wavelength for eccentric
//! chords, so conversions are evaluated at one representative wavelength.

use super::characteristic::{characteristic, ChordConfig};
use crate::error::{RestorationError, Result};
use crate::series::MeasurementSeries;
use serde::{Deserialize, Serialize};

/// Denominators below this are treated as a degenerate chord
const DEGENERATE_POWER: f64 = 1e-12;

/// In-phase (α) and quadrature (β) conversion coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversionCoefficients {
    pub alpha: f64,
    pub beta: f64,
}

/// Conversion coefficients from chord `from` to chord `to` at `wavelength`
///
/// α = (A1A2 + B1B2) / (A1² + B1²), β = (A1B2 - A2B1) / (A1² + B1²)
///
/// # Errors
/// `DivisionByZero` when the source chord does not respond at this wavelength.
pub fn try_conversion_coefficients(
    from: &ChordConfig,
    to: &ChordConfig,
    wavelength: f64,
) -> Result<ConversionCoefficients> {
    let c1 = characteristic(from, wavelength);
    let c2 = characteristic(to, wavelength);
    let (a1, b1, a2, b2) = (c1.a, c1.b, c2.a, c2.b);

    let denominator = a1 * a1 + b1 * b1;
    if denominator < DEGENERATE_POWER {
        return Err(RestorationError::DivisionByZero(
            "source chord response is zero at this wavelength",
        ));
    }

    // Symmetric source and target reduce to simpler forms
    let coefficients = if from.is_symmetric() {
        ConversionCoefficients {
            alpha: a2 / a1,
            beta: b2 / a1,
        }
    } else if to.is_symmetric() {
        ConversionCoefficients {
            alpha: a1 * a2 / denominator,
            beta: -a2 * b1 / denominator,
        }
    } else {
        ConversionCoefficients {
            alpha: (a1 * a2 + b1 * b2) / denominator,
            beta: (a1 * b2 - a2 * b1) / denominator,
        }
    };

    Ok(coefficients)
}

/// Same as [`try_conversion_coefficients`], returning (0, 0) for a degenerate chord
pub fn conversion_coefficients(
    from: &ChordConfig,
    to: &ChordConfig,
    wavelength: f64,
) -> ConversionCoefficients {
    try_conversion_coefficients(from, to, wavelength).unwrap_or_default()
}

/// Convert versine values measured with `from` into the `to` chord: y2 = α·y1
pub fn convert(
    series: &MeasurementSeries,
    from: &ChordConfig,
    to: &ChordConfig,
    wavelength: f64,
) -> Result<MeasurementSeries> {
    from.validate()?;
    to.validate()?;
    let ConversionCoefficients { alpha, .. } = conversion_coefficients(from, to, wavelength);
    Ok(series.with_values(series.values().iter().map(|&y| alpha * y).collect()))
}
