//! Numerical helpers for the water type classification
//!
//! Box-Cox transform of the Area variable, the squared Mahalanobis distance
//! and the chi-squared survival used to turn distances into membership values.

use nalgebra::{Matrix3, Vector3};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Box-Cox transform `(x^lambda - 1) / lambda`. Non-positive or non-finite
/// input has no transform and gives NaN.
pub fn box_cox(x: f64, lambda: f64) -> f64 {
    if x > 0.0 && x.is_finite() {
        (x.powf(lambda) - 1.0) / lambda
    } else {
        f64::NAN
    }
}

/// Inverse of [`box_cox`]: `(y * lambda + 1)^(1 / lambda)`.
pub fn inverse_box_cox(y: f64, lambda: f64) -> f64 {
    (y * lambda + 1.0).powf(1.0 / lambda)
}

/// Build a matrix from row-major nested arrays.
pub fn matrix_from_rows(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| rows[r][c])
}

/// Squared Mahalanobis distance `(x - mean)' inv (x - mean)`.
pub fn mahalanobis_squared(
    x: &Vector3<f64>,
    mean: &Vector3<f64>,
    inverse_covariance: &Matrix3<f64>,
) -> f64 {
    let diff = x - mean;
    (diff.transpose() * inverse_covariance * diff)[0]
}

/// `1 - cdf(distance)`; NaN distances stay NaN.
pub fn chi_squared_survival(distribution: &ChiSquared, distance: f64) -> f64 {
    if distance.is_nan() {
        return f64::NAN;
    }
    1.0 - distribution.cdf(distance)
}

/// Round half to even at `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
