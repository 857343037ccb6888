//! Pre-trained optical water type centroids
//!
//! Each type is a Gaussian in (AVW, Box-Cox(Area), NDI) space. The model is
//! read from a versioned bundle under the data directory:
//!
//! ```text
//! <data_dir>/centroids/v01/OWT_centroids.json
//! <data_dir>/centroids/v02/OWT_centroids.json
//! ```
//!
//! v01 holds the original covariances, v02 the shrunk ones.

use crate::error::{OwtError, Result};
use crate::owt::stats::{inverse_box_cox, matrix_from_rows};
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use statrs::distribution::ChiSquared;
use std::collections::HashSet;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CENTROID_FILE: &str = "OWT_centroids.json";
pub const UNCLASSIFIABLE_COLOR: &str = "#808080";

/// Number of types in a reference bundle.
pub const REFERENCE_TYPE_COUNT: usize = TYPE_COLORS.len();

// AVW, Box-Cox(Area), NDI
const FEATURE_DIMS: f64 = 3.0;

// name, color name, hex
const TYPE_COLORS: [(&str, &str, &str); 10] = [
    ("1", "blue", "#0000FF"),
    ("2", "yellow", "#FFFF00"),
    ("3a", "orange", "#FFA500"),
    ("3b", "cyan", "#00FFFF"),
    ("4a", "green", "#00FF00"),
    ("4b", "purple", "#A020F0"),
    ("5a", "darkblue", "#00008B"),
    ("5b", "red", "#FF0000"),
    ("6", "chocolate", "#D2691E"),
    ("7", "darkcyan", "#008B8B"),
];

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum CentroidVersion {
    #[serde(rename = "v01")]
    V01,
    #[serde(rename = "v02")]
    #[default]
    V02,
}

impl CentroidVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CentroidVersion::V01 => "v01",
            CentroidVersion::V02 => "v02",
        }
    }

    /// Location of this version's bundle inside `data_dir`.
    pub fn bundle_path<P: AsRef<Path>>(&self, data_dir: P) -> PathBuf {
        data_dir
            .as_ref()
            .join("centroids")
            .join(self.as_str())
            .join(CENTROID_FILE)
    }
}

impl Display for CentroidVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CentroidVersion {
    type Err = OwtError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "v01" => Ok(CentroidVersion::V01),
            "v02" => Ok(CentroidVersion::V02),
            other => Err(OwtError::InvalidCentroidModel(format!(
                "unknown centroid version `{}` (expected v01 or v02)",
                other
            ))),
        }
    }
}

/// One water type: display metadata plus its Gaussian parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OwtType {
    pub name: String,
    pub color_name: String,
    pub color_hex: String,
    pub mean: Vector3<f64>,
    pub covariance: Matrix3<f64>,
}

impl OwtType {
    /// Build a type, taking its display colors from the reference palette.
    /// Names outside the palette are shown in gray. `covariance` is row major.
    pub fn new(name: &str, mean: [f64; 3], covariance: [[f64; 3]; 3]) -> Self {
        let (color_name, color_hex) = TYPE_COLORS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, c, h)| (c.to_string(), h.to_string()))
            .unwrap_or_else(|| ("gray".to_string(), UNCLASSIFIABLE_COLOR.to_string()));

        Self {
            name: name.to_string(),
            color_name,
            color_hex,
            mean: Vector3::from(mean),
            covariance: matrix_from_rows(&covariance),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OwtCentroidModel {
    version: CentroidVersion,
    lambda: f64,
    types: Vec<OwtType>,
    inverse_covariances: Vec<Matrix3<f64>>,
    distance_distribution: ChiSquared,
}

#[derive(Deserialize)]
struct BundleHelper {
    version: CentroidVersion,
    lambda_bc: f64,
    types: Vec<TypeHelper>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct TypeHelper {
    name: String,
    mean: [f64; 3],
    covariance: [[f64; 3]; 3],
    color_name: Option<String>,
    color_hex: Option<String>,
}

impl OwtCentroidModel {
    /// Validate the parameters and invert every covariance once.
    pub fn new(version: CentroidVersion, lambda: f64, types: Vec<OwtType>) -> Result<Self> {
        if !lambda.is_finite() || lambda == 0.0 {
            return Err(OwtError::InvalidCentroidModel(format!(
                "Box-Cox lambda must be finite and non-zero, got {}",
                lambda
            )));
        }
        if types.is_empty() {
            return Err(OwtError::InvalidCentroidModel(
                "the model holds no types".to_string(),
            ));
        }

        let mut inverse_covariances = Vec::with_capacity(types.len());
        for t in &types {
            if t.mean.iter().any(|v| !v.is_finite()) {
                return Err(OwtError::InvalidCentroidModel(format!(
                    "type {} has a non-finite mean {:?}",
                    t.name, t.mean
                )));
            }
            let inverse = t
                .covariance
                .try_inverse()
                .filter(|inv| inv.iter().all(|v| v.is_finite()))
                .ok_or_else(|| {
                    OwtError::InvalidCentroidModel(format!(
                        "covariance of type {} is not invertible",
                        t.name
                    ))
                })?;
            inverse_covariances.push(inverse);
        }

        let distance_distribution = ChiSquared::new(FEATURE_DIMS)
            .map_err(|e| OwtError::InvalidCentroidModel(e.to_string()))?;

        Ok(Self {
            version,
            lambda,
            types,
            inverse_covariances,
            distance_distribution,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let bundle: BundleHelper = serde_json::from_reader(reader)?;

        if bundle.types.len() != REFERENCE_TYPE_COUNT {
            return Err(OwtError::InvalidCentroidModel(format!(
                "{} holds {} types, expected {}",
                path.as_ref().display(),
                bundle.types.len(),
                REFERENCE_TYPE_COUNT
            )));
        }
        if let Some(name) = repeated_name(&bundle.types) {
            return Err(OwtError::InvalidCentroidModel(format!(
                "type {} appears more than once in {}",
                name,
                path.as_ref().display()
            )));
        }

        let types = bundle
            .types
            .into_iter()
            .map(|t| {
                let mut owt = OwtType::new(&t.name, t.mean, t.covariance);
                if let Some(color_name) = t.color_name {
                    owt.color_name = color_name;
                }
                if let Some(color_hex) = t.color_hex {
                    owt.color_hex = color_hex;
                }
                owt
            })
            .collect();

        let model = Self::new(bundle.version, bundle.lambda_bc, types)?;
        log::info!(
            "Loaded {} OWT centroids ({}) from {}{}",
            model.len(),
            model.version,
            path.as_ref().display(),
            bundle
                .description
                .map(|d| format!(": {}", d))
                .unwrap_or_default()
        );
        Ok(model)
    }

    /// Load the bundle for `version` from `data_dir`.
    pub fn load<P: AsRef<Path>>(data_dir: P, version: CentroidVersion) -> Result<Self> {
        let path = version.bundle_path(data_dir);
        let model = Self::from_file(&path)?;
        if model.version != version {
            return Err(OwtError::InvalidCentroidModel(format!(
                "{} declares version {} but {} was requested",
                path.display(),
                model.version,
                version
            )));
        }
        Ok(model)
    }

    pub fn version(&self) -> CentroidVersion {
        self.version
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn types(&self) -> &[OwtType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.name.clone()).collect()
    }

    pub fn inverse_covariance(&self, index: usize) -> Option<&Matrix3<f64>> {
        self.inverse_covariances.get(index)
    }

    pub(crate) fn inverse_covariances(&self) -> &[Matrix3<f64>] {
        &self.inverse_covariances
    }

    /// Distribution of the squared distance of a pixel drawn from one type.
    pub fn distance_distribution(&self) -> &ChiSquared {
        &self.distance_distribution
    }

    /// Centroid Area of a type, back in reflectance units.
    pub fn centroid_area(&self, index: usize) -> Option<f64> {
        self.types
            .get(index)
            .map(|t| inverse_box_cox(t.mean[1], self.lambda))
    }
}

fn repeated_name(types: &[TypeHelper]) -> Option<&str> {
    let mut seen = HashSet::new();
    types
        .iter()
        .map(|t| t.name.as_str())
        .find(|name| !seen.insert(*name))
}
