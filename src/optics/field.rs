use crate::error::{OwtError, Result};
use ndarray::{Array, Array3, ArrayView1, ArrayView3, Dimension, Ix3};
use std::fmt::Display;

/// Wavelengths (nm) at which a spectrum is sampled, strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthGrid {
    wavelengths: Vec<f64>,
}

impl WavelengthGrid {
    pub fn new(wavelengths: Vec<f64>) -> Result<Self> {
        if wavelengths.is_empty() {
            return Err(OwtError::InvalidWavelengthGrid(
                "at least one wavelength is required".to_string(),
            ));
        }

        if let Some(bad) = wavelengths.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(OwtError::InvalidWavelengthGrid(format!(
                "wavelengths must be finite and positive, found {}",
                bad
            )));
        }

        if let Some(pair) = wavelengths.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(OwtError::InvalidWavelengthGrid(format!(
                "wavelengths must be strictly increasing ({} followed by {})",
                pair[0], pair[1]
            )));
        }

        Ok(Self { wavelengths })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.wavelengths.get(index).copied()
    }

    /// Index of the grid wavelength closest to `target`. On equal distance the
    /// lower index wins.
    pub fn nearest_index(&self, target: f64) -> usize {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (i, w) in self.wavelengths.iter().enumerate() {
            let distance = (w - target).abs();
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        best
    }

    /// Indices of all grid wavelengths inside `[min, max]`.
    pub fn indices_within(&self, min: f64, max: f64) -> Vec<usize> {
        self.wavelengths
            .iter()
            .enumerate()
            .filter(|(_, w)| (min..=max).contains(*w))
            .map(|(i, _)| i)
            .collect()
    }
}

impl Display for WavelengthGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.wavelengths.first(), self.wavelengths.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "{} bands from {} to {} nm",
                self.wavelengths.len(),
                first,
                last
            ),
            _ => write!(f, "empty wavelength grid"),
        }
    }
}

/// Reflectance values (sr^-1) laid out as `[row, column, wavelength]`.
///
/// Lower dimensional inputs are normalised on construction: a single spectrum
/// becomes `1 x 1 x W` and a `samples x W` table becomes `samples x 1 x W`.
/// Only the layout changes, never the values.
#[derive(Debug, Clone)]
pub struct ReflectanceField {
    rrs: Array3<f64>,
    grid: WavelengthGrid,
}

impl ReflectanceField {
    pub fn new<D: Dimension>(rrs: Array<f64, D>, grid: WavelengthGrid) -> Result<Self> {
        let shape = rrs.shape().to_vec();
        let target = match shape.as_slice() {
            [w] => (1, 1, *w),
            [samples, w] => (*samples, 1, *w),
            [rows, cols, w] => (*rows, *cols, *w),
            _ => return Err(OwtError::InvalidShape { ndim: shape.len() }),
        };

        if target.2 != grid.len() {
            return Err(OwtError::WavelengthMismatch {
                grid: grid.len(),
                field: target.2,
            });
        }

        let rrs = if shape.len() == 3 {
            rrs.into_dimensionality::<Ix3>()?
        } else {
            Array3::from_shape_vec(target, rrs.iter().copied().collect())?
        };

        Ok(Self { rrs, grid })
    }

    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.rrs.view()
    }

    pub fn grid(&self) -> &WavelengthGrid {
        &self.grid
    }

    /// `(rows, cols)` of the pixel layout.
    pub fn pixel_shape(&self) -> (usize, usize) {
        let (rows, cols, _) = self.rrs.dim();
        (rows, cols)
    }

    pub fn spectrum(&self, row: usize, col: usize) -> ArrayView1<'_, f64> {
        self.rrs.slice(ndarray::s![row, col, ..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    fn grid(values: &[f64]) -> WavelengthGrid {
        WavelengthGrid::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_grid_rejects_unsorted() {
        let err = WavelengthGrid::new(vec![443.0, 412.0]).unwrap_err();
        assert!(matches!(err, OwtError::InvalidWavelengthGrid(_)));
    }

    #[test]
    fn test_grid_rejects_empty() {
        assert!(WavelengthGrid::new(vec![]).is_err());
    }

    #[test]
    fn test_nearest_index_prefers_lower_on_tie() {
        let g = grid(&[440.0, 450.0, 460.0]);
        assert_eq!(g.nearest_index(445.0), 0);
        assert_eq!(g.nearest_index(458.0), 2);
        assert_eq!(g.nearest_index(10_000.0), 2);
    }

    #[test]
    fn test_indices_within_is_inclusive() {
        let g = grid(&[390.0, 400.0, 600.0, 800.0, 810.0]);
        assert_eq!(g.indices_within(400.0, 800.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_single_spectrum_is_one_pixel() {
        let rrs = Array1::from(vec![0.1, 0.2, 0.3]);
        let field = ReflectanceField::new(rrs, grid(&[443.0, 560.0, 665.0])).unwrap();
        assert_eq!(field.pixel_shape(), (1, 1));
        assert_eq!(field.spectrum(0, 0).to_vec(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_sample_table_becomes_column() {
        let rrs: Array2<f64> = array![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]];
        let field = ReflectanceField::new(rrs, grid(&[443.0, 560.0, 665.0])).unwrap();
        assert_eq!(field.pixel_shape(), (2, 1));
        assert_eq!(field.spectrum(1, 0).to_vec(), vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_four_dims_is_invalid_shape() {
        let rrs = ndarray::Array4::<f64>::zeros((1, 1, 1, 3));
        let err = ReflectanceField::new(rrs, grid(&[443.0, 560.0, 665.0])).unwrap_err();
        assert!(matches!(err, OwtError::InvalidShape { ndim: 4 }));
    }

    #[test]
    fn test_last_axis_must_match_grid() {
        let rrs = Array1::from(vec![0.1, 0.2]);
        let err = ReflectanceField::new(rrs, grid(&[443.0, 560.0, 665.0])).unwrap_err();
        assert!(matches!(
            err,
            OwtError::WavelengthMismatch { grid: 3, field: 2 }
        ));
    }
}
