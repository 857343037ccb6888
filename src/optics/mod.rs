//! Optical variables module
//!
//! Turns remote sensing reflectance spectra into the three optical variables
//! (AVW, Area, NDI) used by the water type classification.

pub mod constants;
pub mod field;
pub mod regression;
pub mod variables;

pub use field::{ReflectanceField, WavelengthGrid};
pub use regression::{AvwCoefficients, RegressionTable, convert_avw_multi_to_hyper};
pub use variables::{
    BandSelection, FeatureExtractor, OpticalFeatures, SpectralMode, extract_features,
    selects_hyperspectral,
};
