pub mod centroids;
pub mod classifier;
pub mod result;
pub mod stats;

pub use centroids::{CentroidVersion, OwtCentroidModel, OwtType};
pub use classifier::{Classifier, DEFAULT_THRESHOLD_U};
pub use result::{ClassificationResult, TypeLabel};
