use crate::config::options::OutputOptionParseError;

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    OutputOption(OutputOptionParseError),
    Io(std::io::Error),
    Json(serde_json::Error),
    ThresholdU(f64),
    ChunkRows,
    EmptyPath(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutputOption(e) => write!(f, "{}", e),
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse JSON: {}", e),
            ConfigError::ThresholdU(v) => {
                write!(f, "threshold_u should be finite and >= 0, got {}", v)
            }
            ConfigError::ChunkRows => write!(f, "chunk_rows should be greater than 0"),
            ConfigError::EmptyPath(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<OutputOptionParseError> for ConfigError {
    fn from(err: OutputOptionParseError) -> ConfigError {
        ConfigError::OutputOption(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Json(err)
    }
}
