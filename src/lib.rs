//! Optical water type classification of remote-sensing reflectance spectra.
//!
//! Spectra are reduced to three optical variables (AVW, Area, NDI) and each
//! pixel is assigned the best fitting of ten pre-trained water types.
//!
//! ```no_run
//! use ndarray::array;
//! use owt::owt::{CentroidVersion, Classifier};
//!
//! let classifier = Classifier::from_data_dir("./data", CentroidVersion::V02)?;
//! let result = classifier.classify(&array![560.0], &array![1.0], &array![0.2])?;
//! println!("{}", result.type_names()[[0, 0]]);
//! # Ok::<(), owt::OwtError>(())
//! ```

pub mod config;
pub mod error;
pub mod optics;
pub mod owt;
pub mod pipeline;
pub mod readers;
pub mod sat_bands;
pub mod writers;

pub use error::{OwtError, Result};
pub use self::optics::{FeatureExtractor, OpticalFeatures, ReflectanceField, WavelengthGrid};
pub use self::owt::{CentroidVersion, ClassificationResult, Classifier, OwtCentroidModel, TypeLabel};
