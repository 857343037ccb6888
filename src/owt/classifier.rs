//! Assignment of optical water types from (AVW, Area, NDI)
//!
//! For every pixel the Area is Box-Cox transformed, the squared Mahalanobis
//! distance to each type centroid is turned into a membership
//! `u = 1 - chi2_cdf(d, 3)` (rounded to 6 decimals), and the type with the
//! highest membership wins. A pixel is unclassifiable when no membership is
//! positive, when every membership is NaN, or when their sum does not exceed
//! the threshold.

use crate::error::{OwtError, Result};
use crate::optics::OpticalFeatures;
use crate::owt::centroids::{CentroidVersion, OwtCentroidModel};
use crate::owt::result::{ClassificationResult, TypeLabel};
use crate::owt::stats::{box_cox, chi_squared_survival, mahalanobis_squared, round_to};
use nalgebra::Vector3;
use ndarray::{Array2, Array3, ArrayBase, Data, Dimension, s};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_THRESHOLD_U: f64 = 1e-4;
pub const MEMBERSHIP_DECIMALS: i32 = 6;

#[derive(Debug, Clone)]
pub struct Classifier {
    model: Arc<OwtCentroidModel>,
    threshold_u: f64,
    parallel: bool,
}

struct RowOutput {
    memberships: Vec<f64>,
    total: Vec<f64>,
    labels: Vec<TypeLabel>,
    area_bc: Vec<f64>,
}

impl Classifier {
    pub fn new(model: Arc<OwtCentroidModel>) -> Self {
        Self {
            model,
            threshold_u: DEFAULT_THRESHOLD_U,
            parallel: false,
        }
    }

    /// Load the centroid bundle of `version` from `data_dir`.
    pub fn from_data_dir<P: AsRef<Path>>(data_dir: P, version: CentroidVersion) -> Result<Self> {
        let model = OwtCentroidModel::load(data_dir, version)?;
        Ok(Self::new(Arc::new(model)))
    }

    pub fn with_threshold_u(mut self, threshold_u: f64) -> Result<Self> {
        if !threshold_u.is_finite() || threshold_u < 0.0 {
            return Err(OwtError::InvalidThreshold(threshold_u));
        }
        self.threshold_u = threshold_u;
        Ok(self)
    }

    /// Spread rows over the rayon thread pool. Results do not depend on it.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn model(&self) -> &OwtCentroidModel {
        &self.model
    }

    pub fn threshold_u(&self) -> f64 {
        self.threshold_u
    }

    /// Classify feature arrays of identical shape and rank 0, 1 or 2.
    ///
    /// Rank 0 and 1 inputs are treated as a single row. The three arrays may
    /// be owned arrays or views independently of each other.
    pub fn classify<S1, S2, S3, D1, D2, D3>(
        &self,
        avw: &ArrayBase<S1, D1>,
        area: &ArrayBase<S2, D2>,
        ndi: &ArrayBase<S3, D3>,
    ) -> Result<ClassificationResult>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        S3: Data<Elem = f64>,
        D1: Dimension,
        D2: Dimension,
        D3: Dimension,
    {
        let (avw, area, ndi) = to_rows(avw, area, ndi)?;
        self.classify_rows(&avw, &area, &ndi)
    }

    pub fn classify_features(&self, features: &OpticalFeatures) -> Result<ClassificationResult> {
        self.classify(features.avw(), features.area(), features.ndi())
    }

    /// Same as [`Classifier::classify`], processing `rows_per_chunk` rows at a
    /// time. The result does not depend on the chunk size.
    pub fn classify_chunked<S1, S2, S3, D1, D2, D3>(
        &self,
        avw: &ArrayBase<S1, D1>,
        area: &ArrayBase<S2, D2>,
        ndi: &ArrayBase<S3, D3>,
        rows_per_chunk: usize,
    ) -> Result<ClassificationResult>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        S3: Data<Elem = f64>,
        D1: Dimension,
        D2: Dimension,
        D3: Dimension,
    {
        let (avw, area, ndi) = to_rows(avw, area, ndi)?;
        let rows = avw.nrows();
        let step = rows_per_chunk.max(1);
        if rows <= step {
            return self.classify_rows(&avw, &area, &ndi);
        }

        let mut parts = Vec::with_capacity(rows.div_ceil(step));
        for start in (0..rows).step_by(step) {
            let end = (start + step).min(rows);
            log::debug!("Classifying rows {}..{} of {}", start, end, rows);
            parts.push(self.classify_rows(
                &avw.slice(s![start..end, ..]).to_owned(),
                &area.slice(s![start..end, ..]).to_owned(),
                &ndi.slice(s![start..end, ..]).to_owned(),
            )?);
        }
        ClassificationResult::stack_rows(parts)
    }

    fn classify_rows(
        &self,
        avw: &Array2<f64>,
        area: &Array2<f64>,
        ndi: &Array2<f64>,
    ) -> Result<ClassificationResult> {
        let (rows, cols) = avw.dim();
        let n_types = self.model.len();

        let row_output = |r: usize| self.classify_row(avw, area, ndi, r);
        let outputs: Vec<RowOutput> = if self.parallel {
            (0..rows).into_par_iter().map(row_output).collect()
        } else {
            (0..rows).map(row_output).collect()
        };

        let mut memberships = Vec::with_capacity(rows * cols * n_types);
        let mut total = Vec::with_capacity(rows * cols);
        let mut labels = Vec::with_capacity(rows * cols);
        let mut area_bc = Vec::with_capacity(rows * cols);
        for out in outputs {
            memberships.extend(out.memberships);
            total.extend(out.total);
            labels.extend(out.labels);
            area_bc.extend(out.area_bc);
        }

        let result = ClassificationResult::new(
            Array3::from_shape_vec((rows, cols, n_types), memberships)?,
            Array2::from_shape_vec((rows, cols), total)?,
            Array2::from_shape_vec((rows, cols), labels)?,
            Array2::from_shape_vec((rows, cols), area_bc)?,
            self.model.names(),
            self.model.types().iter().map(|t| t.color_hex.clone()).collect(),
        );

        let unclassifiable = result.unclassifiable_count();
        if unclassifiable > 0 {
            log::warn!(
                "{} of {} pixels are not classifiable",
                unclassifiable,
                rows * cols
            );
        }
        Ok(result)
    }

    fn classify_row(
        &self,
        avw: &Array2<f64>,
        area: &Array2<f64>,
        ndi: &Array2<f64>,
        row: usize,
    ) -> RowOutput {
        let cols = avw.ncols();
        let n_types = self.model.len();
        let mut out = RowOutput {
            memberships: vec![0.0; cols * n_types],
            total: Vec::with_capacity(cols),
            labels: Vec::with_capacity(cols),
            area_bc: Vec::with_capacity(cols),
        };

        for (col, u) in out.memberships.chunks_mut(n_types).enumerate() {
            let abc = box_cox(area[[row, col]], self.model.lambda());
            let x = Vector3::new(avw[[row, col]], abc, ndi[[row, col]]);
            let (total, label) = self.classify_pixel(&x, u);
            out.total.push(total);
            out.labels.push(label);
            out.area_bc.push(abc);
        }
        out
    }

    /// Fill `u` with the memberships of the transformed feature vector `x`.
    fn classify_pixel(&self, x: &Vector3<f64>, u: &mut [f64]) -> (f64, TypeLabel) {
        let inverses = self.model.inverse_covariances();
        let chi2 = self.model.distance_distribution();
        for ((value, t), inverse) in u.iter_mut().zip(self.model.types()).zip(inverses) {
            let distance = mahalanobis_squared(x, &t.mean, inverse);
            *value = round_to(chi_squared_survival(chi2, distance), MEMBERSHIP_DECIMALS);
        }

        let total: f64 = u.iter().sum();
        (total, self.select_type(u, total))
    }

    fn select_type(&self, u: &[f64], total: f64) -> TypeLabel {
        // NaN never wins; on equal values the lower index is kept
        let mut best: Option<(usize, f64)> = None;
        for (i, &value) in u.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((i, value)),
            }
        }

        let below_threshold = total <= self.threshold_u;
        match best {
            Some((i, value)) if value > 0.0 && !below_threshold => TypeLabel::Type(i),
            _ => TypeLabel::Unclassifiable,
        }
    }
}

/// Check ranks and shapes, then lay the three inputs out as 2-D arrays.
fn to_rows<S1, S2, S3, D1, D2, D3>(
    avw: &ArrayBase<S1, D1>,
    area: &ArrayBase<S2, D2>,
    ndi: &ArrayBase<S3, D3>,
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
    D3: Dimension,
{
    let rank = avw.ndim().max(area.ndim()).max(ndi.ndim());
    if rank > 2 {
        return Err(OwtError::UnsupportedRank { rank });
    }

    if avw.shape() != area.shape() || avw.shape() != ndi.shape() {
        return Err(OwtError::ShapeMismatch {
            avw: avw.shape().to_vec(),
            area: area.shape().to_vec(),
            ndi: ndi.shape().to_vec(),
        });
    }

    let dim = match *avw.shape() {
        [] => (1, 1),
        [n] => (1, n),
        [rows, cols] => (rows, cols),
        _ => return Err(OwtError::UnsupportedRank { rank }),
    };

    Ok((as_rows(avw, dim)?, as_rows(area, dim)?, as_rows(ndi, dim)?))
}

fn as_rows<S, D>(a: &ArrayBase<S, D>, dim: (usize, usize)) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Ok(Array2::from_shape_vec(dim, a.iter().copied().collect())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owt::centroids::OwtType;
    use ndarray::{Array0, Array1, array};

    const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    fn model(means: &[[f64; 3]]) -> Arc<OwtCentroidModel> {
        let names = ["1", "2", "3a", "3b"];
        let types = means
            .iter()
            .zip(names)
            .map(|(m, n)| OwtType::new(n, *m, IDENTITY))
            .collect();
        Arc::new(OwtCentroidModel::new(CentroidVersion::V02, 1.0, types).unwrap())
    }

    #[test]
    fn test_membership_is_chi_squared_survival() {
        // lambda = 1 makes the Box-Cox value Area - 1
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        let r = classifier
            .classify(&array![1.0], &array![3.0], &array![2.0])
            .unwrap();
        // d = 1 + 4 + 4 = 9
        let chi2 = classifier.model().distance_distribution();
        let expected = round_to(chi_squared_survival(chi2, 9.0), 6);
        assert_eq!(r.memberships()[[0, 0, 0]], expected);
        assert_eq!(expected, 0.029291);
        assert_eq!(r.type_index()[[0, 0]], 0);
    }

    #[test]
    fn test_tie_goes_to_lower_index() {
        let classifier = Classifier::new(model(&[[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]));
        let r = classifier
            .classify(&array![0.0], &array![1.0], &array![0.0])
            .unwrap();
        let u = r.pixel_memberships(0, 0);
        assert_eq!(u[0], u[1]);
        assert_eq!(r.labels()[[0, 0]], TypeLabel::Type(0));
    }

    #[test]
    fn test_non_positive_area_is_unclassifiable() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]));
        let r = classifier
            .classify(&array![0.0, 0.0], &array![0.0, -2.0], &array![0.0, 0.0])
            .unwrap();
        assert!(r.memberships().iter().all(|u| u.is_nan()));
        assert_eq!(r.type_index(), array![[-1, -1]]);
        assert_eq!(r.type_names()[[0, 1]], "NaN");
        assert_eq!(r.classifiability(), array![[0u8, 0]]);
    }

    #[test]
    fn test_total_below_threshold_is_unclassifiable() {
        // d = 400 gives a membership far below 1e-6, which rounds to zero
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        let far = classifier
            .classify(&array![20.0], &array![1.0], &array![0.0])
            .unwrap();
        assert_eq!(far.total()[[0, 0]], 0.0);
        assert_eq!(far.type_index()[[0, 0]], -1);

        // d = 25: u = 1.5e-5 > 0 but the total stays under 1e-4
        let near = classifier
            .classify(&array![5.0], &array![1.0], &array![0.0])
            .unwrap();
        assert!(near.memberships()[[0, 0, 0]] > 0.0);
        assert_eq!(near.type_index()[[0, 0]], -1);

        let lenient = Classifier::new(model(&[[0.0, 0.0, 0.0]]))
            .with_threshold_u(0.0)
            .unwrap();
        let r = lenient
            .classify(&array![5.0], &array![1.0], &array![0.0])
            .unwrap();
        assert_eq!(r.type_index()[[0, 0]], 0);
    }

    #[test]
    fn test_invalid_threshold() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        assert!(classifier.clone().with_threshold_u(-1.0).is_err());
        assert!(classifier.with_threshold_u(f64::NAN).is_err());
    }

    #[test]
    fn test_rank_is_checked_before_shape() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        let cube = Array3::<f64>::zeros((1, 1, 2));
        let err = classifier.classify(&cube, &cube, &cube).unwrap_err();
        assert!(matches!(err, OwtError::UnsupportedRank { rank: 3 }));
    }

    #[test]
    fn test_shape_mismatch() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        let err = classifier
            .classify(&array![1.0, 2.0], &array![1.0], &array![1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, OwtError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_views_and_owned_arrays_mix() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0], [1.0, 0.5, 0.2]]));
        let avw = array![[0.2, 0.9], [1.1, -0.3]];
        let area = array![[1.0, 1.4], [1.6, 0.8]];
        let ndi = array![[0.0, 0.1], [0.3, -0.1]];

        let owned = classifier.classify(&avw, &area, &ndi).unwrap();
        let mixed = classifier.classify(&avw.view(), &area, &ndi.view()).unwrap();
        let chunked = classifier
            .classify_chunked(&avw, &area.view(), &ndi, 1)
            .unwrap();

        assert_eq!(owned, mixed);
        assert_eq!(owned, chunked);
    }

    #[test]
    fn test_rank_mismatch_between_inputs() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        let err = classifier
            .classify(&array![[1.0, 2.0]], &array![1.0, 2.0], &array![[1.0, 2.0]])
            .unwrap_err();
        assert!(matches!(err, OwtError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_scalar_and_vector_inputs_become_one_row() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0]]));
        let r = classifier
            .classify(
                &Array0::from_elem((), 0.5),
                &Array0::from_elem((), 1.2),
                &Array0::from_elem((), 0.1),
            )
            .unwrap();
        assert_eq!(r.shape(), (1, 1));

        let v = Array1::from(vec![0.5, 0.6, 0.7]);
        let r = classifier.classify(&v, &v, &v).unwrap();
        assert_eq!(r.shape(), (1, 3));
    }

    #[test]
    fn test_parallel_and_chunked_match_serial() {
        let classifier = Classifier::new(model(&[[0.0, 0.0, 0.0], [1.0, 0.5, 0.2]]));
        let avw = Array2::from_shape_fn((7, 3), |(r, c)| r as f64 * 0.3 - c as f64 * 0.2);
        let area = Array2::from_shape_fn((7, 3), |(r, c)| 0.5 + (r + c) as f64 * 0.1);
        let ndi = Array2::from_shape_fn((7, 3), |(r, c)| (r as f64 - c as f64) * 0.05);

        let serial = classifier.classify(&avw, &area, &ndi).unwrap();
        let parallel = classifier
            .clone()
            .with_parallel(true)
            .classify(&avw, &area, &ndi)
            .unwrap();
        let chunked = classifier.classify_chunked(&avw, &area, &ndi, 2).unwrap();

        assert_eq!(serial, parallel);
        assert_eq!(serial, chunked);
    }
}
