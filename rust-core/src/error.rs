//! Error types for the restoration engine
//!
//! Validation errors are raised at the boundary of each component.
//! Per-sample numeric degeneracies never surface here; they fall back
//! to a defined value inside the loop that hit them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestorationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid range [{start}, {end}] (series covers [{min}, {max}])")]
    InvalidRange {
        start: f64,
        end: f64,
        min: f64,
        max: f64,
    },

    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),

    #[error("Invalid curvature: radius must be positive (got {0})")]
    InvalidCurvature(f64),

    #[error("Processing cancelled between chunks")]
    Cancelled,

    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl RestorationError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RestorationError>;
