use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::optics::selects_hyperspectral;
use crate::owt::{CentroidVersion, DEFAULT_THRESHOLD_U};

pub mod error;
pub use error::ConfigError;

pub mod options;
pub use options::OutputOption;

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    input: String,
    output: PathBuf,
    sensor: Option<String>,
    centroid_version: CentroidVersion,
    threshold_u: f64,
    output_option: OutputOption,
    data_dir: PathBuf,
    sensor_library: Option<PathBuf>,
    chunk_rows: Option<usize>,
    parallel: bool,
}

// This function deserializes a Config object from a deserializer, filling the defaults and making
// sure the membership threshold and the chunk size are usable.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            input: String,
            output: PathBuf,
            sensor: Option<String>,
            #[serde(default)]
            centroid_version: CentroidVersion,
            threshold_u: Option<f64>,
            #[serde(default)]
            output_option: OutputOption,
            data_dir: Option<PathBuf>,
            sensor_library: Option<PathBuf>,
            chunk_rows: Option<usize>,
            #[serde(default)]
            parallel: bool,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        if helper.input.trim().is_empty() {
            return Err(D::Error::custom(ConfigError::EmptyPath("input")));
        }

        if helper.output.as_os_str().is_empty() {
            return Err(D::Error::custom(ConfigError::EmptyPath("output")));
        }

        let threshold_u = helper.threshold_u.unwrap_or(DEFAULT_THRESHOLD_U);
        if !threshold_u.is_finite() || threshold_u < 0.0 {
            return Err(D::Error::custom(ConfigError::ThresholdU(threshold_u)));
        }

        if helper.chunk_rows == Some(0) {
            return Err(D::Error::custom(ConfigError::ChunkRows));
        }

        // "HYPER" and an empty name both select hyperspectral mode
        let sensor = helper
            .sensor
            .filter(|s| !selects_hyperspectral(s));

        Ok(Config {
            input: helper.input,
            output: helper.output,
            sensor,
            centroid_version: helper.centroid_version,
            threshold_u,
            output_option: helper.output_option,
            data_dir: helper
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            sensor_library: helper.sensor_library,
            chunk_rows: helper.chunk_rows,
            parallel: helper.parallel,
        })
    }
}

impl Config {
    pub fn new<P: AsRef<Path>>(input: &str, output: P) -> Self {
        Self {
            input: input.to_string(),
            output: output.as_ref().to_path_buf(),
            sensor: None,
            centroid_version: CentroidVersion::default(),
            threshold_u: DEFAULT_THRESHOLD_U,
            output_option: OutputOption::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sensor_library: None,
            chunk_rows: None,
            parallel: false,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn with_sensor(mut self, sensor: &str) -> Self {
        self.sensor = Some(sensor.to_string()).filter(|s| !selects_hyperspectral(s));
        self
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_output_option(mut self, output_option: OutputOption) -> Self {
        self.output_option = output_option;
        self
    }

    pub fn with_chunk_rows(mut self, chunk_rows: usize) -> Result<Self, ConfigError> {
        if chunk_rows == 0 {
            return Err(ConfigError::ChunkRows);
        }
        self.chunk_rows = Some(chunk_rows);
        Ok(self)
    }

    /// File path or glob pattern of the reflectance input.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Sensor name, `None` for hyperspectral input.
    pub fn sensor(&self) -> Option<&str> {
        self.sensor.as_deref()
    }

    pub fn centroid_version(&self) -> CentroidVersion {
        self.centroid_version
    }

    pub fn threshold_u(&self) -> f64 {
        self.threshold_u
    }

    pub fn output_option(&self) -> OutputOption {
        self.output_option
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sensor_library(&self) -> Option<&Path> {
        self.sensor_library.as_deref()
    }

    pub fn chunk_rows(&self) -> Option<usize> {
        self.chunk_rows
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}
