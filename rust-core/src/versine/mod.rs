//! Versine chord transforms: eccentric versine, chord characteristic, chord conversion

pub mod characteristic;
pub mod eccentric;
pub mod conversion;

pub use characteristic::{
    CharacteristicCache, ChordConfig, MeasurementCharacteristic, characteristic, characteristics,
};
pub use eccentric::{eccentric_versine, eccentric_versine_values, versine};
pub use conversion::{
    ConversionCoefficients, conversion_coefficients, convert, try_conversion_coefficients,
};
