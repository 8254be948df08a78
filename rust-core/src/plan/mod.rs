//! Plan-line design: segments, generation, refinement and edit history

pub mod segment;
pub mod generator;
pub mod refine;
pub mod history;
pub mod editor;

pub use segment::{ContinuityError, PlanLine, PlanLineSegment, TransitionKind, MM_PER_M};
pub use generator::{
    cross_transition, generate_initial, set_circular, set_straight, set_transition,
};
pub use refine::{
    detect_outliers, gaussian_smooth, gaussian_smooth_values, interpolate_control_points,
    linear_interpolate, remove_outliers, remove_outliers_values, InterpolationMethod,
    NaturalSpline, OutlierReplacement,
};
pub use history::{EditHistory, MAX_HISTORY};
pub use editor::PlanEditor;
