//! CTRV (constant turn rate and velocity magnitude) process model.
//!
//! State: `[px, py, v, yaw, yaw_rate]`. The state is augmented with the
//! longitudinal acceleration and yaw acceleration noise terms so the noise
//! passes through the nonlinear motion law as sigma points.

use crate::config::UkfConfig;
use crate::error::UkfResult;
use crate::types::{
    AugSigmaPoints, AugStateMat, AugStateVec, SigmaPoints, SigmaWeights, StateMat, StateVec,
    AUG_DIM, SIGMA_COUNT, STATE_DIM,
};

use super::sigma;

/// Below this yaw rate [rad/s] the straight-line branch is used.
pub const YAW_RATE_EPSILON: f64 = 1e-3;

/// Index of the heading component in the state vector
pub const YAW_INDEX: usize = 3;

/// Predicted belief plus the propagated sigma points it was recovered from.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub mean: StateVec,
    pub covariance: StateMat,
    pub sigma_points: SigmaPoints,
}

#[derive(Clone, Debug)]
pub struct CtrvProcessModel {
    /// Longitudinal acceleration noise variance [m²/s⁴]
    var_accel: f64,
    /// Yaw acceleration noise variance [rad²/s⁴]
    var_yaw_accel: f64,
    lambda: f64,
    weights: SigmaWeights,
}

impl CtrvProcessModel {
    pub fn new(config: &UkfConfig) -> Self {
        let lambda = sigma::spread(AUG_DIM);
        Self {
            var_accel: config.std_accel * config.std_accel,
            var_yaw_accel: config.std_yaw_accel * config.std_yaw_accel,
            lambda,
            weights: sigma::sigma_weights::<AUG_DIM, SIGMA_COUNT>(lambda),
        }
    }

    pub fn weights(&self) -> &SigmaWeights {
        &self.weights
    }

    /// Augmented mean and covariance: state plus two zero-mean noise terms.
    pub fn augment(&self, mean: &StateVec, cov: &StateMat) -> (AugStateVec, AugStateMat) {
        let mut x_aug = AugStateVec::zeros();
        x_aug.fixed_rows_mut::<STATE_DIM>(0).copy_from(mean);

        let mut p_aug = AugStateMat::zeros();
        p_aug
            .fixed_view_mut::<STATE_DIM, STATE_DIM>(0, 0)
            .copy_from(cov);
        p_aug[(5, 5)] = self.var_accel;
        p_aug[(6, 6)] = self.var_yaw_accel;

        (x_aug, p_aug)
    }

    /// Propagate the belief forward by `dt` seconds.
    ///
    /// `dt` may be zero or negative; the motion law is evaluated as-is.
    pub fn predict(&self, mean: &StateVec, cov: &StateMat, dt: f64) -> UkfResult<Prediction> {
        let (x_aug, p_aug) = self.augment(mean, cov);
        let aug_points: AugSigmaPoints = sigma::generate(&x_aug, &p_aug, self.lambda)?;

        let sigma_points: SigmaPoints =
            std::array::from_fn(|i| motion_model(&aug_points[i], dt));

        let mean = sigma::weighted_mean(&sigma_points, &self.weights);
        let covariance =
            sigma::weighted_covariance(&sigma_points, &mean, &self.weights, Some(YAW_INDEX));

        Ok(Prediction {
            mean,
            covariance,
            sigma_points,
        })
    }
}

/// Apply the CTRV motion law to one augmented sigma point.
///
/// The two trailing noise components are consumed; the result is a plain
/// 5-dimensional state.
pub fn motion_model(point: &AugStateVec, dt: f64) -> StateVec {
    let px = point[0];
    let py = point[1];
    let v = point[2];
    let yaw = point[3];
    let yaw_rate = point[4];
    let nu_accel = point[5];
    let nu_yaw_accel = point[6];

    let (mut px_p, mut py_p) = if yaw_rate.abs() > YAW_RATE_EPSILON {
        (
            px + v / yaw_rate * ((yaw + yaw_rate * dt).sin() - yaw.sin()),
            py + v / yaw_rate * (yaw.cos() - (yaw + yaw_rate * dt).cos()),
        )
    } else {
        (px + v * dt * yaw.cos(), py + v * dt * yaw.sin())
    };

    let mut v_p = v;
    let mut yaw_p = yaw + yaw_rate * dt;
    let mut yaw_rate_p = yaw_rate;

    let dt2 = dt * dt;
    px_p += 0.5 * nu_accel * dt2 * yaw.cos();
    py_p += 0.5 * nu_accel * dt2 * yaw.sin();
    v_p += nu_accel * dt;

    yaw_p += 0.5 * nu_yaw_accel * dt2;
    yaw_rate_p += nu_yaw_accel * dt;

    StateVec::new(px_p, py_p, v_p, yaw_p, yaw_rate_p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn aug(px: f64, py: f64, v: f64, yaw: f64, yaw_rate: f64) -> AugStateVec {
        AugStateVec::from_column_slice(&[px, py, v, yaw, yaw_rate, 0.0, 0.0])
    }

    fn test_covariance() -> StateMat {
        let mut p = StateMat::from_diagonal(&StateVec::new(0.5, 0.4, 0.3, 0.2, 0.1));
        p[(0, 1)] = 0.1;
        p[(1, 0)] = 0.1;
        p[(2, 3)] = 0.05;
        p[(3, 2)] = 0.05;
        p
    }

    #[test]
    fn test_straight_line_motion() {
        let next = motion_model(&aug(0.0, 0.0, 2.0, 0.0, 0.0), 1.5);
        assert_abs_diff_eq!(next, StateVec::new(3.0, 0.0, 2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_curved_motion_quarter_turn() {
        let next = motion_model(&aug(0.0, 0.0, 1.0, 0.0, FRAC_PI_2), 1.0);
        let radius = 2.0 / PI;
        assert_abs_diff_eq!(next[0], radius, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], radius, epsilon = 1e-12);
        assert_abs_diff_eq!(next[3], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(next[4], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_near_zero_yaw_rate_uses_straight_branch() {
        let next = motion_model(&aug(1.0, 1.0, 1.0, 0.0, 1e-4), 1.0);
        assert_abs_diff_eq!(next[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 1.0, epsilon = 1e-12);

        // Both branches agree near the threshold
        let below = motion_model(&aug(0.0, 0.0, 1.0, 0.3, 0.0009), 0.5);
        let above = motion_model(&aug(0.0, 0.0, 1.0, 0.3, 0.0011), 0.5);
        assert_abs_diff_eq!(below[0], above[0], epsilon = 1e-3);
        assert_abs_diff_eq!(below[1], above[1], epsilon = 1e-3);
    }

    #[test]
    fn test_noise_terms_enter_motion() {
        let mut point = aug(0.0, 0.0, 0.0, 0.0, 0.0);
        point[5] = 1.0;
        point[6] = 2.0;
        let next = motion_model(&point, 1.0);
        assert_abs_diff_eq!(next[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[3], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[4], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_dt_runs_backwards() {
        let next = motion_model(&aug(0.0, 0.0, 1.0, 0.0, 0.0), -1.0);
        assert_abs_diff_eq!(next[0], -1.0, epsilon = 1e-12);
        assert!(next.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_augment_layout() {
        let model = CtrvProcessModel::new(&UkfConfig::default());
        let mean = StateVec::new(1.0, 2.0, 3.0, 4.0, 5.0);
        let (x_aug, p_aug) = model.augment(&mean, &test_covariance());

        assert_eq!(x_aug[5], 0.0);
        assert_eq!(x_aug[6], 0.0);
        assert_eq!(x_aug[2], 3.0);
        assert_eq!(p_aug[(0, 1)], 0.1);
        assert_eq!(p_aug[(5, 5)], 1.0);
        assert_abs_diff_eq!(p_aug[(6, 6)], (PI / 8.0).powi(2), epsilon = 1e-12);
        assert_eq!(p_aug[(4, 5)], 0.0);
    }

    #[test]
    fn test_zero_dt_prediction_is_identity() {
        let model = CtrvProcessModel::new(&UkfConfig::default());
        let mean = StateVec::new(1.0, 2.0, 3.0, 0.5, 0.1);
        let cov = test_covariance();

        let prediction = model.predict(&mean, &cov, 0.0).unwrap();
        assert_abs_diff_eq!(prediction.mean, mean, epsilon = 1e-9);
        assert_abs_diff_eq!(prediction.covariance, cov, epsilon = 1e-9);
    }

    #[test]
    fn test_prediction_wraps_heading_spread() {
        let model = CtrvProcessModel::new(&UkfConfig::default());
        let mean = StateVec::new(0.0, 0.0, 1.0, 3.0, 0.0);
        let cov = StateMat::from_diagonal(&StateVec::new(1.0, 1.0, 1.0, 4.0, 1.0));

        let prediction = model.predict(&mean, &cov, 0.0).unwrap();

        // Heading offsets of ±√12 exceed π and wrap to ∓(2π − √12)
        let wrapped = TAU - 12.0_f64.sqrt();
        assert_abs_diff_eq!(prediction.mean[3], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            prediction.covariance[(3, 3)],
            wrapped * wrapped / 3.0,
            epsilon = 1e-9
        );
        assert!(prediction.covariance[(3, 3)] < cov[(3, 3)]);
        assert_abs_diff_eq!(prediction.covariance[(0, 0)], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_prediction_moves_along_heading() {
        let model = CtrvProcessModel::new(&UkfConfig::default());
        let mean = StateVec::new(0.0, 0.0, 5.0, FRAC_PI_2, 0.0);
        let cov = StateMat::identity() * 0.01;

        let prediction = model.predict(&mean, &cov, 0.1).unwrap();
        assert_abs_diff_eq!(prediction.mean[1], 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(prediction.mean[0], 0.0, epsilon = 0.01);
        // Process noise inflates uncertainty
        assert!(prediction.covariance.trace() > cov.trace());
        assert_abs_diff_eq!(
            prediction.covariance,
            prediction.covariance.transpose(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_prediction_rejects_degenerate_noise() {
        let config = UkfConfig {
            std_yaw_accel: 0.0,
            ..UkfConfig::default()
        };
        let model = CtrvProcessModel::new(&config);
        let result = model.predict(&StateVec::zeros(), &StateMat::identity(), 0.1);
        assert!(matches!(
            result,
            Err(crate::error::UkfError::CovarianceNotPositiveDefinite { dim: 7 })
        ));
    }
}
