//! Track Restoration Core - Rail Track Geometry Restoration Engine
//!
//! Restoration waveform reconstruction, versine chord algebra, plan-line
//! design and tamping/lining movement calculation for track irregularity
//! measurements.

pub mod error;
pub mod series;
pub mod stats;
pub mod processing;
pub mod filters;
pub mod spectrum;
pub mod versine;
pub mod plan;
pub mod movement;
pub mod pipeline;

pub use error::{RestorationError, Result};
pub use series::{MeasurementPoint, MeasurementSeries};
pub use stats::Statistics;
pub use processing::{ChunkOptions, ChunkProgress};
pub use filters::{FilterMethod, FilterParameters, FilteredSeries, WindowType};
pub use spectrum::WavelengthSpectrum;
pub use versine::{ChordConfig, MeasurementCharacteristic};
pub use plan::{PlanEditor, PlanLine, PlanLineSegment, TransitionKind};
pub use movement::{Movement, MovementLimits, MovementRecord, TrackAxis};
pub use pipeline::{RestorationConfig, RestorationPipeline, RestorationReport};
