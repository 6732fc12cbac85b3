//! Sigma point generation and unscented-transform recombination.
//!
//! Points are laid out as `[mean, mean + √(λ+L)·Sᵢ (i = 1..L), mean − √(λ+L)·Sᵢ]`
//! where `S` is the lower Cholesky factor of the covariance.

use nalgebra::{SMatrix, SVector};
use std::f64::consts::{PI, TAU};

use crate::error::{UkfError, UkfResult};

/// Spread parameter λ = 3 − L
pub fn spread(dim: usize) -> f64 {
    3.0 - dim as f64
}

/// Mean/covariance weights for `N = 2L + 1` sigma points.
///
/// `w[0] = λ / (λ + L)`, every other weight is `1 / (2(λ + L))`.
/// Any other `N` is rejected at compile time.
///
/// ```
/// use ctrv_fusion_rs::filters::sigma;
///
/// let w = sigma::sigma_weights::<7, 15>(sigma::spread(7));
/// assert!((w.sum() - 1.0).abs() < 1e-12);
/// ```
pub fn sigma_weights<const L: usize, const N: usize>(lambda: f64) -> SVector<f64, N> {
    const { assert!(N == 2 * L + 1, "sigma count must be 2L+1") };
    let denom = lambda + L as f64;
    let mut weights = SVector::<f64, N>::from_element(0.5 / denom);
    weights[0] = lambda / denom;
    weights
}

/// Generate `N = 2L + 1` sigma points around `mean`.
///
/// Fails with [`UkfError::CovarianceNotPositiveDefinite`] when the Cholesky
/// factor of `cov` does not exist. A point count other than `2L + 1` does
/// not compile:
///
/// ```compile_fail
/// use ctrv_fusion_rs::filters::sigma;
/// use nalgebra::{Matrix2, Vector2};
///
/// let points = sigma::generate::<2, 4>(&Vector2::zeros(), &Matrix2::identity(), sigma::spread(2));
/// ```
pub fn generate<const L: usize, const N: usize>(
    mean: &SVector<f64, L>,
    cov: &SMatrix<f64, L, L>,
    lambda: f64,
) -> UkfResult<[SVector<f64, L>; N]> {
    const { assert!(N == 2 * L + 1, "sigma count must be 2L+1") };

    let not_pd = UkfError::CovarianceNotPositiveDefinite { dim: L };
    let chol = (*cov).cholesky().ok_or_else(|| not_pd.clone())?;
    let l_mat = chol.l();
    if l_mat.diagonal().iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return Err(not_pd);
    }

    let offsets = l_mat * (lambda + L as f64).sqrt();

    Ok(std::array::from_fn(|i| {
        if i == 0 {
            *mean
        } else if i <= L {
            mean + offsets.column(i - 1)
        } else {
            mean - offsets.column(i - 1 - L)
        }
    }))
}

/// Weighted mean of a set of sigma points.
pub fn weighted_mean<const D: usize, const N: usize>(
    points: &[SVector<f64, D>; N],
    weights: &SVector<f64, N>,
) -> SVector<f64, D> {
    points
        .iter()
        .zip(weights.iter())
        .fold(SVector::<f64, D>::zeros(), |acc, (p, w)| acc + p * *w)
}

/// Weighted covariance `Σ wᵢ (pᵢ − mean)(pᵢ − mean)ᵀ`.
///
/// `angle_index` marks a circular component whose difference is wrapped
/// into (−π, π] before use.
pub fn weighted_covariance<const D: usize, const N: usize>(
    points: &[SVector<f64, D>; N],
    mean: &SVector<f64, D>,
    weights: &SVector<f64, N>,
    angle_index: Option<usize>,
) -> SMatrix<f64, D, D> {
    let mut cov = SMatrix::<f64, D, D>::zeros();
    for (point, w) in points.iter().zip(weights.iter()) {
        let diff = residual(point, mean, angle_index);
        cov += diff * diff.transpose() * *w;
    }
    cov
}

/// Weighted cross-covariance `Σ wᵢ (xᵢ − x̄)(zᵢ − z̄)ᵀ`.
pub fn weighted_cross_covariance<const DX: usize, const DZ: usize, const N: usize>(
    x_points: &[SVector<f64, DX>; N],
    x_mean: &SVector<f64, DX>,
    x_angle_index: Option<usize>,
    z_points: &[SVector<f64, DZ>; N],
    z_mean: &SVector<f64, DZ>,
    z_angle_index: Option<usize>,
    weights: &SVector<f64, N>,
) -> SMatrix<f64, DX, DZ> {
    let mut cross = SMatrix::<f64, DX, DZ>::zeros();
    for ((x, z), w) in x_points.iter().zip(z_points.iter()).zip(weights.iter()) {
        let dx = residual(x, x_mean, x_angle_index);
        let dz = residual(z, z_mean, z_angle_index);
        cross += dx * dz.transpose() * *w;
    }
    cross
}

/// `point − mean` with an optional angle-wrapped component.
pub fn residual<const D: usize>(
    point: &SVector<f64, D>,
    mean: &SVector<f64, D>,
    angle_index: Option<usize>,
) -> SVector<f64, D> {
    let mut diff = point - mean;
    if let Some(k) = angle_index {
        diff[k] = normalize_angle(diff[k]);
    }
    diff
}

/// Wrap an angle into (−π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}
