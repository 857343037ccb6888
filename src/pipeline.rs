use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::optics::{FeatureExtractor, OpticalFeatures, RegressionTable};
use crate::owt::{ClassificationResult, Classifier, OwtCentroidModel};
use crate::readers::create_reader;
use crate::sat_bands::SensorLibrary;
use crate::writers::CsvWriter;

/// Counts reported once a run has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub pixels: usize,
    pub type_counts: Vec<(String, usize)>,
    pub unclassifiable: usize,
    pub output: PathBuf,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pixels classified: {}", self.pixels)?;
        for (name, count) in &self.type_counts {
            writeln!(f, "  OWT {:<3} {}", name, count)?;
        }
        writeln!(f, "  NaN {}", self.unclassifiable)?;
        write!(f, "Results written to {}", self.output.display())
    }
}

/// Reader -> feature extraction -> classification -> CSV writer for one run
/// configuration.
#[derive(Debug)]
pub struct BatchProcessor {
    config: Config,
    classifier: Classifier,
    extractor: FeatureExtractor,
}

impl BatchProcessor {
    /// Load the calibration data the configuration points at.
    pub fn new(config: Config) -> Result<Self> {
        let custom_library;
        let library = match config.sensor_library() {
            Some(path) => {
                custom_library = SensorLibrary::from_file(path)?;
                &custom_library
            }
            None => SensorLibrary::builtin(),
        };

        let regression = match config.sensor() {
            Some(_) => RegressionTable::from_file(config.data_dir().join(library.regression_file()))?,
            None => RegressionTable::default(),
        };
        let extractor = FeatureExtractor::from_sensor_name(config.sensor(), library, &regression)?;

        let model = OwtCentroidModel::load(config.data_dir(), config.centroid_version())?;
        let classifier = Classifier::new(Arc::new(model))
            .with_threshold_u(config.threshold_u())?
            .with_parallel(config.parallel());

        Ok(BatchProcessor {
            config,
            classifier,
            extractor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Read the input and compute features and types without writing anything.
    pub fn run(&self) -> Result<(OpticalFeatures, ClassificationResult, Option<Vec<String>>)> {
        let reader = create_reader(self.config.input().to_string())?;
        let data = reader.read_data()?;
        log::debug!("Input summary:\n{}", data);

        let features = self.extractor.extract(&data.field);
        let result = match self.config.chunk_rows() {
            Some(rows) => self.classifier.classify_chunked(
                features.avw(),
                features.area(),
                features.ndi(),
                rows,
            )?,
            None => self.classifier.classify_features(&features)?,
        };

        Ok((features, result, data.sample_ids))
    }

    pub fn process(&self) -> Result<BatchSummary> {
        log::info!(
            "Classifying {} ({}, centroids {}, thresholdU {})",
            self.config.input(),
            self.extractor.mode(),
            self.config.centroid_version(),
            self.classifier.threshold_u()
        );

        let (features, result, sample_ids) = self.run()?;

        CsvWriter::new(self.config.output_option()).write(
            self.config.output(),
            &features,
            &result,
            sample_ids.as_deref(),
        )?;

        let (rows, cols) = result.shape();
        Ok(BatchSummary {
            pixels: rows * cols,
            type_counts: result
                .type_names_table()
                .iter()
                .cloned()
                .zip(result.type_counts())
                .collect(),
            unclassifiable: result.unclassifiable_count(),
            output: self.config.output().to_path_buf(),
        })
    }
}
