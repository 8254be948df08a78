//! Movement calculation: tamping/lining amounts, restriction checks and peaks

pub mod calculator;
pub mod peaks;

pub use calculator::{
    calculate_movement, check_restrictions, improvement_rate, smooth, Movement, MovementLimits,
    MovementRecord, RestrictionReport, TrackAxis,
};
pub use peaks::{extract_peaks, Peak, PeakKind};
