//! Apparent Visible Wavelength, spectral Area and NDI
//!
//! The three optical variables summarising a remote sensing reflectance
//! spectrum for the water type classification:
//!
//! - **AVW**: reflectance weighted harmonic mean wavelength,
//!   `sum(Rrs) / sum(Rrs / lambda)`, over the probe bands.
//! - **Area**: trapezoidal integral of Rrs over the blue, green and red
//!   reference bands.
//! - **NDI**: `(Rrs_G - Rrs_R) / (Rrs_G + Rrs_R)`.
//!
//! Hyperspectral input uses every band inside the AVW range. For a named sensor
//! the AVW is computed at the grid bands nearest to the sensor's probe bands and
//! then corrected to its hyperspectral equivalent with a degree-5 polynomial.
//! Band selection is always nearest match on the grid, never interpolation.
//! Repeated nearest matches are kept, so a grid band picked by two nominal bands
//! counts twice.
//!
//! ## Usage Example
//!
//! ```rust
//! use ndarray::Array1;
//! use owt::optics::{FeatureExtractor, ReflectanceField, WavelengthGrid};
//!
//! let grid = WavelengthGrid::new((400..=800).step_by(5).map(f64::from).collect()).unwrap();
//! let rrs = Array1::from_elem(grid.len(), 0.002);
//! let field = ReflectanceField::new(rrs, grid).unwrap();
//!
//! let features = FeatureExtractor::hyperspectral().extract(&field);
//! println!("AVW: {:.3} nm", features.avw()[[0, 0]]);
//! ```

use crate::error::{OwtError, Result};
use crate::optics::constants::{
    DEFAULT_AVW_MAX, DEFAULT_AVW_MIN, DEFAULT_RGB_BANDS, HYPER_KEYWORD,
};
use crate::optics::field::{ReflectanceField, WavelengthGrid};
use crate::optics::regression::{AvwCoefficients, RegressionTable, convert_avw_multi_to_hyper};
use crate::sat_bands::{BandRange, SensorLibrary, SensorProfile};
use ndarray::{Array, Array2, ArrayView1, Axis, Dimension, Zip};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum SpectralMode {
    Hyperspectral,
    Multispectral { sensor: String },
}

impl Display for SpectralMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectralMode::Hyperspectral => write!(f, "hyperspectral"),
            SpectralMode::Multispectral { sensor } => write!(f, "multispectral ({})", sensor),
        }
    }
}

/// Grid bands actually used for a computation.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSelection {
    pub indices: Vec<usize>,
    pub wavelengths: Vec<f64>,
}

impl BandSelection {
    fn from_indices(grid: &WavelengthGrid, indices: Vec<usize>) -> Self {
        let wavelengths = indices.iter().map(|&i| grid.as_slice()[i]).collect();
        Self {
            indices,
            wavelengths,
        }
    }
}

/// AVW, Area and NDI per pixel, with the bands they were computed from.
#[derive(Debug, Clone)]
pub struct OpticalFeatures {
    avw: Array2<f64>,
    area: Array2<f64>,
    ndi: Array2<f64>,
    // uncorrected AVW, only for sensor input
    avw_multi: Option<Array2<f64>>,
    mode: SpectralMode,
    avw_bands: BandSelection,
    rgb_bands: BandSelection,
    avw_range: BandRange,
    coefficients: Option<AvwCoefficients>,
}

impl OpticalFeatures {
    pub fn avw(&self) -> &Array2<f64> {
        &self.avw
    }

    pub fn area(&self) -> &Array2<f64> {
        &self.area
    }

    pub fn ndi(&self) -> &Array2<f64> {
        &self.ndi
    }

    pub fn avw_multi(&self) -> Option<&Array2<f64>> {
        self.avw_multi.as_ref()
    }

    pub fn mode(&self) -> &SpectralMode {
        &self.mode
    }

    pub fn avw_bands(&self) -> &BandSelection {
        &self.avw_bands
    }

    pub fn rgb_bands(&self) -> &BandSelection {
        &self.rgb_bands
    }

    pub fn avw_range(&self) -> BandRange {
        self.avw_range
    }

    pub fn coefficients(&self) -> Option<&AvwCoefficients> {
        self.coefficients.as_ref()
    }

    /// `(rows, cols)` of the pixel layout.
    pub fn shape(&self) -> (usize, usize) {
        self.avw.dim()
    }
}

/// Band setup for one extraction mode. Build once, apply to any number of fields.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    mode: SpectralMode,
    // None means "every grid band inside the AVW range"
    probe_bands: Option<Vec<f64>>,
    rgb_bands: [f64; 3],
    avw_range: BandRange,
    coefficients: Option<AvwCoefficients>,
}

impl FeatureExtractor {
    pub fn hyperspectral() -> Self {
        Self {
            mode: SpectralMode::Hyperspectral,
            probe_bands: None,
            rgb_bands: DEFAULT_RGB_BANDS,
            avw_range: BandRange {
                min: DEFAULT_AVW_MIN,
                max: DEFAULT_AVW_MAX,
            },
            coefficients: None,
        }
    }

    /// Change the AVW integration range used in hyperspectral mode.
    pub fn with_avw_range(mut self, min: f64, max: f64) -> Self {
        self.avw_range = BandRange { min, max };
        self
    }

    pub fn for_sensor(profile: &SensorProfile, regression: &RegressionTable) -> Result<Self> {
        let coefficients = regression.coefficients(profile.name())?;
        Ok(Self {
            mode: SpectralMode::Multispectral {
                sensor: profile.name().to_string(),
            },
            probe_bands: Some(profile.avw_bands().to_vec()),
            rgb_bands: profile.rgb_bands(),
            avw_range: profile.avw_range(),
            coefficients: Some(coefficients),
        })
    }

    /// Extractor for an optional sensor name. `None`, an empty name and
    /// `"HYPER"` in any case select hyperspectral mode; any other name must be
    /// in `library` and in `regression`.
    pub fn from_sensor_name(
        sensor: Option<&str>,
        library: &SensorLibrary,
        regression: &RegressionTable,
    ) -> Result<Self> {
        match sensor {
            None => Ok(Self::hyperspectral()),
            Some(name) if selects_hyperspectral(name) => Ok(Self::hyperspectral()),
            Some(name) => {
                let profile = library.get(name)?;
                Self::for_sensor(profile, regression)
            }
        }
    }

    pub fn mode(&self) -> &SpectralMode {
        &self.mode
    }

    pub fn extract(&self, field: &ReflectanceField) -> OpticalFeatures {
        let grid = field.grid();

        let avw_indices = match &self.probe_bands {
            None => grid.indices_within(self.avw_range.min, self.avw_range.max),
            Some(bands) => bands.iter().map(|&b| grid.nearest_index(b)).collect(),
        };
        let avw_bands = BandSelection::from_indices(grid, avw_indices);

        let rgb_indices = self.rgb_bands.map(|b| grid.nearest_index(b));
        let rgb_bands = BandSelection::from_indices(grid, rgb_indices.to_vec());

        log::debug!(
            "Extracting optical variables ({}) over {}: AVW bands {:?}, RGB bands {:?}",
            self.mode,
            grid,
            avw_bands.wavelengths,
            rgb_bands.wavelengths
        );
        if avw_bands.indices.is_empty() {
            log::warn!(
                "No band of the grid lies in the AVW range [{}, {}] nm, AVW will be NaN",
                self.avw_range.min,
                self.avw_range.max
            );
        }

        let (rows, cols) = field.pixel_shape();
        let mut avw_init = Array2::<f64>::zeros((rows, cols));
        let mut area = Array2::<f64>::zeros((rows, cols));
        let mut ndi = Array2::<f64>::zeros((rows, cols));

        let rgb_wavelengths = [
            rgb_bands.wavelengths[0],
            rgb_bands.wavelengths[1],
            rgb_bands.wavelengths[2],
        ];

        Zip::from(&mut avw_init)
            .and(&mut area)
            .and(&mut ndi)
            .and(field.values().lanes(Axis(2)))
            .for_each(|avw, area, ndi, spectrum| {
                *avw = apparent_visible_wavelength(spectrum, &avw_bands);
                let rgb = rgb_indices.map(|i| spectrum[i]);
                *area = trapezoid_area(&rgb_wavelengths, &rgb);
                *ndi = normalized_difference(rgb[1], rgb[2]);
            });

        let (avw, avw_multi) = match &self.coefficients {
            Some(coefs) => (
                avw_init.mapv(|v| convert_avw_multi_to_hyper(v, coefs)),
                Some(avw_init),
            ),
            None => (avw_init, None),
        };

        OpticalFeatures {
            avw,
            area,
            ndi,
            avw_multi,
            mode: self.mode.clone(),
            avw_bands,
            rgb_bands,
            avw_range: self.avw_range,
            coefficients: self.coefficients,
        }
    }
}

/// Extract AVW, Area and NDI from a 1, 2 or 3 dimensional reflectance array
/// whose last axis follows `wavelengths`.
/// Whether a sensor name stands for the full hyperspectral grid.
pub fn selects_hyperspectral(sensor: &str) -> bool {
    let name = sensor.trim();
    name.is_empty() || name.eq_ignore_ascii_case(HYPER_KEYWORD)
}

pub fn extract_features<D: Dimension>(
    rrs: Array<f64, D>,
    wavelengths: &[f64],
    sensor: Option<&str>,
    library: &SensorLibrary,
    regression: &RegressionTable,
) -> Result<OpticalFeatures> {
    let ndim = rrs.ndim();
    if !(1..=3).contains(&ndim) {
        return Err(OwtError::InvalidShape { ndim });
    }
    let extractor = FeatureExtractor::from_sensor_name(sensor, library, regression)?;
    let grid = WavelengthGrid::new(wavelengths.to_vec())?;
    let field = ReflectanceField::new(rrs, grid)?;
    Ok(extractor.extract(&field))
}

fn apparent_visible_wavelength(spectrum: ArrayView1<'_, f64>, bands: &BandSelection) -> f64 {
    let mut sum_rrs = 0.0;
    let mut sum_weighted = 0.0;
    for (&i, &wavelength) in bands.indices.iter().zip(bands.wavelengths.iter()) {
        let r = spectrum[i];
        sum_rrs += r;
        sum_weighted += r / wavelength;
    }
    sum_rrs / sum_weighted
}

fn trapezoid_area(x: &[f64; 3], y: &[f64; 3]) -> f64 {
    (x[1] - x[0]) * (y[0] + y[1]) / 2.0 + (x[2] - x[1]) * (y[1] + y[2]) / 2.0
}

fn normalized_difference(green: f64, red: f64) -> f64 {
    -(red - green) / (green + red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array3};

    fn hyper_grid() -> WavelengthGrid {
        WavelengthGrid::new((400..=800).step_by(2).map(f64::from).collect()).unwrap()
    }

    fn sloped_spectrum(grid: &WavelengthGrid) -> Array1<f64> {
        grid.as_slice()
            .iter()
            .map(|w| 0.004 - (w - 400.0) * 0.00001)
            .collect()
    }

    #[test]
    fn test_flat_spectrum_avw_is_harmonic_mean() {
        let grid = hyper_grid();
        let n = grid.len() as f64;
        let expected = n / grid.as_slice().iter().map(|w| 1.0 / w).sum::<f64>();
        let field = ReflectanceField::new(Array1::from_elem(grid.len(), 1.0), grid).unwrap();

        let features = FeatureExtractor::hyperspectral().extract(&field);
        assert_relative_eq!(features.avw()[[0, 0]], expected, epsilon = 1e-9);
        assert!(features.avw_multi().is_none());
    }

    #[test]
    fn test_flat_spectrum_area_and_ndi() {
        let grid = hyper_grid();
        let field = ReflectanceField::new(Array1::from_elem(grid.len(), 1.0), grid).unwrap();

        let features = FeatureExtractor::hyperspectral().extract(&field);
        // nearest to 443, 560, 665 on a 2 nm grid starting at 400
        assert_eq!(features.rgb_bands().wavelengths, vec![442.0, 560.0, 664.0]);
        assert_relative_eq!(features.area()[[0, 0]], 664.0 - 442.0, epsilon = 1e-12);
        assert_eq!(features.ndi()[[0, 0]], 0.0);
    }

    #[test]
    fn test_hyper_avw_ignores_bands_outside_range() {
        let mut bands: Vec<f64> = vec![350.0, 380.0];
        bands.extend((400..=800).step_by(10).map(f64::from));
        bands.extend([850.0, 900.0]);
        let grid = WavelengthGrid::new(bands).unwrap();
        let mut rrs = Array1::from_elem(grid.len(), 0.002);
        rrs[0] = 10.0;
        let last = rrs.len() - 1;
        rrs[last] = 10.0;

        let features =
            FeatureExtractor::hyperspectral().extract(&ReflectanceField::new(rrs, grid).unwrap());
        assert_eq!(features.avw_bands().wavelengths.first(), Some(&400.0));
        assert_eq!(features.avw_bands().wavelengths.last(), Some(&800.0));
        let avw = features.avw()[[0, 0]];
        assert!((400.0..=800.0).contains(&avw));
    }

    #[test]
    fn test_custom_avw_range() {
        let grid = hyper_grid();
        let field = ReflectanceField::new(sloped_spectrum(&grid), grid).unwrap();
        let features = FeatureExtractor::hyperspectral()
            .with_avw_range(400.0, 700.0)
            .extract(&field);
        assert_eq!(features.avw_bands().wavelengths.last(), Some(&700.0));
        assert!(features.avw()[[0, 0]] < 700.0);
    }

    #[test]
    fn test_ndi_sign_follows_green_minus_red() {
        let grid = WavelengthGrid::new(vec![443.0, 560.0, 665.0]).unwrap();
        let field =
            ReflectanceField::new(Array1::from(vec![0.004, 0.003, 0.001]), grid).unwrap();
        let features = FeatureExtractor::hyperspectral().extract(&field);
        assert_relative_eq!(features.ndi()[[0, 0]], 0.5, epsilon = 1e-12);
        // 117 * 0.0035 + 105 * 0.002
        assert_relative_eq!(features.area()[[0, 0]], 0.6195, epsilon = 1e-12);
    }

    #[test]
    fn test_sensor_mode_keeps_duplicate_matches() {
        let grid = WavelengthGrid::new(vec![440.0, 490.0, 560.0, 665.0]).unwrap();
        let profile = SensorProfile::new(
            "TOY",
            vec![443.0, 445.0, 560.0],
            [443.0, 560.0, 665.0],
            BandRange {
                min: 443.0,
                max: 665.0,
            },
        )
        .unwrap();
        let mut regression = RegressionTable::default();
        regression.insert("TOY", [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

        let rrs = Array1::from(vec![0.002, 0.003, 0.004, 0.001]);
        let field = ReflectanceField::new(rrs, grid).unwrap();
        let features = FeatureExtractor::for_sensor(&profile, &regression)
            .unwrap()
            .extract(&field);

        assert_eq!(features.avw_bands().wavelengths, vec![440.0, 440.0, 560.0]);
        let expected = (0.002 + 0.002 + 0.004) / (0.002 / 440.0 * 2.0 + 0.004 / 560.0);
        assert_relative_eq!(features.avw()[[0, 0]], expected, epsilon = 1e-9);
        assert_relative_eq!(
            features.avw_multi().unwrap()[[0, 0]],
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_sensor_mode_applies_polynomial() {
        let grid = WavelengthGrid::new(vec![443.0, 490.0, 560.0, 665.0]).unwrap();
        let profile = SensorProfile::new(
            "TOY",
            vec![443.0, 490.0, 560.0, 665.0],
            [443.0, 560.0, 665.0],
            BandRange {
                min: 443.0,
                max: 665.0,
            },
        )
        .unwrap();
        let mut regression = RegressionTable::default();
        regression.insert("TOY", [12.0, 0.5, 0.0, 0.0, 0.0, 0.0]);

        let rrs = Array1::from(vec![0.002, 0.003, 0.004, 0.001]);
        let features = FeatureExtractor::for_sensor(&profile, &regression)
            .unwrap()
            .extract(&ReflectanceField::new(rrs, grid).unwrap());
        let multi = features.avw_multi().unwrap()[[0, 0]];
        assert_relative_eq!(features.avw()[[0, 0]], 12.0 + 0.5 * multi, epsilon = 1e-9);
        assert_eq!(
            features.mode(),
            &SpectralMode::Multispectral {
                sensor: "TOY".to_string()
            }
        );
    }

    #[test]
    fn test_hyper_keyword_is_hyperspectral() {
        let regression = RegressionTable::default();
        for name in ["HYPER", "hyper", "Hyper", " "] {
            let extractor = FeatureExtractor::from_sensor_name(
                Some(name),
                SensorLibrary::builtin(),
                &regression,
            )
            .unwrap();
            assert_eq!(extractor.mode(), &SpectralMode::Hyperspectral);
        }
    }

    #[test]
    fn test_unknown_sensor() {
        let regression = RegressionTable::default();
        let err = FeatureExtractor::from_sensor_name(
            Some("Landsat_9"),
            SensorLibrary::builtin(),
            &regression,
        )
        .unwrap_err();
        assert!(matches!(err, OwtError::UnknownSensor { .. }));
    }

    #[test]
    fn test_known_sensor_without_coefficients() {
        let regression = RegressionTable::default();
        let err = FeatureExtractor::from_sensor_name(
            Some("MSI_S2A"),
            SensorLibrary::builtin(),
            &regression,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OwtError::MissingRegressionCoefficients { .. }
        ));
    }

    #[test]
    fn test_layout_does_not_change_values() {
        let grid = hyper_grid();
        let spectrum = sloped_spectrum(&grid);
        let w = grid.len();

        let single = extract_features(
            spectrum.clone(),
            grid.as_slice(),
            None,
            SensorLibrary::builtin(),
            &RegressionTable::default(),
        )
        .unwrap();

        let mut cube = Array3::<f64>::zeros((2, 3, w));
        for mut lane in cube.lanes_mut(Axis(2)) {
            lane.assign(&spectrum);
        }
        let stacked = extract_features(
            cube,
            grid.as_slice(),
            None,
            SensorLibrary::builtin(),
            &RegressionTable::default(),
        )
        .unwrap();

        assert_eq!(stacked.shape(), (2, 3));
        for v in stacked.avw().iter() {
            assert_eq!(*v, single.avw()[[0, 0]]);
        }
        for v in stacked.area().iter() {
            assert_eq!(*v, single.area()[[0, 0]]);
        }
    }

    #[test]
    fn test_nan_spectrum_gives_nan_features() {
        let grid = hyper_grid();
        let field =
            ReflectanceField::new(Array1::from_elem(grid.len(), f64::NAN), grid).unwrap();
        let features = FeatureExtractor::hyperspectral().extract(&field);
        assert!(features.avw()[[0, 0]].is_nan());
        assert!(features.area()[[0, 0]].is_nan());
        assert!(features.ndi()[[0, 0]].is_nan());
    }
}
