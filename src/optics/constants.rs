//! Reference constants for the optical variables
//!
//! Band positions and ranges used when no sensor is given, i.e. when the input
//! spectrum is treated as hyperspectral.

/// Nominal blue, green and red reference bands (nm) for Area and NDI
pub const DEFAULT_RGB_BANDS: [f64; 3] = [443.0, 560.0, 665.0];

/// Lower bound (nm) of the AVW integration range in hyperspectral mode
pub const DEFAULT_AVW_MIN: f64 = 400.0;

/// Upper bound (nm) of the AVW integration range in hyperspectral mode
pub const DEFAULT_AVW_MAX: f64 = 800.0;

/// Number of coefficients of the multi-band to hyperspectral AVW polynomial
/// (degree 5)
pub const AVW_POLY_TERMS: usize = 6;

/// Sensor keyword meaning "no sensor, treat input as hyperspectral"
pub const HYPER_KEYWORD: &str = "HYPER";

/// File name of the AVW regression coefficient table inside the data bundle
pub const AVW_REGRESSION_FILE: &str = "AVW_all_regression_800.txt";
