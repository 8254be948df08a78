//! Chord geometry and its measurement characteristic
//!
//! For a chord with forward length `p` and backward length `q`, and a
//! wavelength `L` with `ω = 2π/L`:
//!
//! A(L) = 1 - (p·cos(ωq) + q·cos(ωp)) / (p+q)
//! B(L) = (-p·sin(ωq) + q·sin(ωp)) / (p+q)

use crate::error::{RestorationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

/// Forward/backward chord lengths in metres; `p == q` is the symmetric versine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordConfig {
    pub p: f64,
    pub q: f64,
}

impl ChordConfig {
    pub fn new(p: f64, q: f64) -> Self {
        Self { p, q }
    }

    /// Symmetric chord with half-length `half` (a 10 m chord is `symmetric(5.0)`)
    pub fn symmetric(half: f64) -> Self {
        Self { p: half, q: half }
    }

    pub fn is_symmetric(&self) -> bool {
        (self.p - self.q).abs() <= 1e-12 * self.p.abs().max(self.q.abs())
    }

    /// Total chord length p + q
    pub fn length(&self) -> f64 {
        self.p + self.q
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.p > 0.0) || !(self.q > 0.0) || !self.p.is_finite() || !self.q.is_finite() {
            return Err(RestorationError::invalid_input(format!(
                "chord lengths must be positive (p = {}, q = {})",
                self.p, self.q
            )));
        }
        Ok(())
    }

    /// Label such as "10m" or "p7.5-q2.5"
    pub fn label(&self) -> String {
        if self.is_symmetric() {
            format!("{}m", self.length())
        } else {
            format!("p{}-q{}", self.p, self.q)
        }
    }
}

/// Response of a chord to one wavelength
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementCharacteristic {
    pub wavelength: f64,
    pub a: f64,
    pub b: f64,
    pub amplitude: f64,
    pub phase: f64,
}

impl MeasurementCharacteristic {
    /// |H|² = A² + B²
    pub fn power(&self) -> f64 {
        self.a * self.a + self.b * self.b
    }
}

/// Characteristic of a chord at a single wavelength
///
/// Non-positive or non-finite wavelengths give an all-zero entry.
pub fn characteristic(chord: &ChordConfig, wavelength: f64) -> MeasurementCharacteristic {
    let total = chord.p + chord.q;
    if !(wavelength > 0.0) || !wavelength.is_finite() || total == 0.0 {
        return MeasurementCharacteristic {
            wavelength,
            a: 0.0,
            b: 0.0,
            amplitude: 0.0,
            phase: 0.0,
        };
    }

    let omega = 2.0 * PI / wavelength;
    let (p, q) = (chord.p, chord.q);
    let a = 1.0 - (p * (omega * q).cos() + q * (omega * p).cos()) / total;
    let b = (-p * (omega * q).sin() + q * (omega * p).sin()) / total;

    MeasurementCharacteristic {
        wavelength,
        a,
        b,
        amplitude: a.hypot(b),
        phase: b.atan2(a),
    }
}

/// Characteristics of a chord over a list of wavelengths
pub fn characteristics(chord: &ChordConfig, wavelengths: &[f64]) -> Vec<MeasurementCharacteristic> {
    wavelengths.iter().map(|&l| characteristic(chord, l)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    p: u64,
    q: u64,
    wavelengths: Vec<u64>,
}

impl CacheKey {
    fn new(chord: &ChordConfig, wavelengths: &[f64]) -> Self {
        Self {
            p: chord.p.to_bits(),
            q: chord.q.to_bits(),
            wavelengths: wavelengths.iter().map(|w| w.to_bits()).collect(),
        }
    }
}

/// Memoised characteristics keyed by (chord, wavelength list)
#[derive(Debug, Default)]
pub struct CharacteristicCache {
    entries: HashMap<CacheKey, Arc<[MeasurementCharacteristic]>>,
}

impl CharacteristicCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        chord: &ChordConfig,
        wavelengths: &[f64],
    ) -> Arc<[MeasurementCharacteristic]> {
        self.entries
            .entry(CacheKey::new(chord, wavelengths))
            .or_insert_with(|| characteristics(chord, wavelengths).into())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
