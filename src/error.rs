use crate::config::ConfigError;
use crate::readers::ReadError;
use thiserror::Error;

/// Errors raised by feature extraction, classification and the batch pipeline.
///
/// Shape and configuration errors abort the whole call. Per-pixel numeric
/// problems never show up here; they end up as NaN memberships and an
/// unclassifiable label for that pixel only.
#[derive(Debug, Error)]
pub enum OwtError {
    #[error("reflectance input should only have 1, 2, or 3 dims, got {ndim}")]
    InvalidShape { ndim: usize },

    #[error("AVW, Area, and NDI with more than two dims are not supported (got {rank})")]
    UnsupportedRank { rank: usize },

    #[error("the shapes of AVW, Area, and NDI must be the same: {avw:?}, {area:?}, {ndi:?}")]
    ShapeMismatch {
        avw: Vec<usize>,
        area: Vec<usize>,
        ndi: Vec<usize>,
    },

    #[error("wavelength grid has {grid} bands but the reflectance last axis has {field}")]
    WavelengthMismatch { grid: usize, field: usize },

    #[error("invalid wavelength grid: {0}")]
    InvalidWavelengthGrid(String),

    #[error("sensor `{name}` couldn't be found in the library: {available}")]
    UnknownSensor { name: String, available: String },

    #[error("no AVW regression coefficients for sensor `{sensor}`")]
    MissingRegressionCoefficients { sensor: String },

    #[error("invalid AVW regression table: {0}")]
    InvalidRegressionTable(String),

    #[error("invalid sensor band library: {0}")]
    InvalidSensorLibrary(String),

    #[error("invalid centroid model: {0}")]
    InvalidCentroidModel(String),

    #[error("thresholdU must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("cannot write results: {0}")]
    Write(String),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, OwtError>;
