//! Measurement updates for the two modeled sensors.
//!
//! - [`LinearPositionModel`]: closed-form Kalman update, `P' = (I − K·H)·P`.
//! - [`RangeBearingModel`]: unscented update over the predicted sigma points,
//!   `P' = P − K·S·Kᵀ`.
//!
//! Both forms are kept as-is; only the symmetric part of the result is stored.

use nalgebra::SMatrix;

use crate::config::UkfConfig;
use crate::error::{UkfError, UkfResult};
use crate::types::{
    KalmanGainLinear, KalmanGainNonlinear, LinearMeasVec, LinearNoise, LinearObservation,
    NonlinearMeasVec, NonlinearNoise, SensorKind, SigmaWeights, StateMat, StateVec, SIGMA_COUNT,
};

use super::ctrv::{Prediction, YAW_INDEX};
use super::sigma;

/// Position components closer to zero than this are clamped before projection.
pub const POSITION_EPSILON: f64 = 1e-8;

/// Index of the bearing component in the nonlinear measurement vector
pub const BEARING_INDEX: usize = 1;

/// Posterior belief and the consistency statistic of the update.
#[derive(Clone, Debug)]
pub struct UpdateOutcome {
    pub mean: StateVec,
    pub covariance: StateMat,
    /// Normalized innovation squared
    pub nis: f64,
}

/// Fuses one observation into a predicted belief.
pub trait MeasurementModel {
    type Observation;

    const KIND: SensorKind;

    fn update(&self, prior: &Prediction, z: &Self::Observation) -> UkfResult<UpdateOutcome>;
}

// ---------------------------------------------------------------------------
// Linear positional sensor
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct LinearPositionModel {
    /// Observation matrix H selecting (px, py)
    h: LinearObservation,
    noise: LinearNoise,
}

impl LinearPositionModel {
    pub fn new(config: &UkfConfig) -> Self {
        #[rustfmt::skip]
        let h = LinearObservation::from_row_slice(&[
            1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0,
        ]);
        Self {
            h,
            noise: config.linear_noise(),
        }
    }
}

impl MeasurementModel for LinearPositionModel {
    type Observation = LinearMeasVec;

    const KIND: SensorKind = SensorKind::Linear;

    fn update(&self, prior: &Prediction, z: &LinearMeasVec) -> UkfResult<UpdateOutcome> {
        let p = &prior.covariance;
        let ht = self.h.transpose();

        // Innovation: y = z − H·x
        let y = z - self.h * prior.mean;

        // Innovation covariance: S = H·P·Hᵀ + R
        let s = self.h * p * ht + self.noise;
        let s_inv = invert_innovation(s, Self::KIND)?;

        // Kalman gain: K = P·Hᵀ·S⁻¹
        let k: KalmanGainLinear = p * ht * s_inv;

        let mean = prior.mean + k * y;
        let covariance = (StateMat::identity() - k * self.h) * p;
        let nis = (y.transpose() * s_inv * y)[(0, 0)];

        Ok(UpdateOutcome {
            mean,
            covariance: symmetrize(&covariance),
            nis,
        })
    }
}

// ---------------------------------------------------------------------------
// Range / bearing / range-rate sensor
// ---------------------------------------------------------------------------

/// Predicted measurement statistics over the propagated sigma points.
#[derive(Clone, Debug)]
pub struct InnovationMoments {
    pub z_pred: NonlinearMeasVec,
    /// Innovation covariance S (noise included)
    pub s: NonlinearNoise,
    /// State/measurement cross-covariance Tc
    pub tc: KalmanGainNonlinear,
}

#[derive(Clone, Debug)]
pub struct RangeBearingModel {
    noise: NonlinearNoise,
    weights: SigmaWeights,
}

impl RangeBearingModel {
    /// `weights` must be the ones the prior's sigma points were propagated with.
    pub fn new(config: &UkfConfig, weights: &SigmaWeights) -> Self {
        Self {
            noise: config.nonlinear_noise(),
            weights: *weights,
        }
    }

    pub fn weights(&self) -> &SigmaWeights {
        &self.weights
    }

    /// Map one state into (range, bearing, range_rate).
    ///
    /// Position components are pushed away from exact zero so `atan2` and
    /// the range-rate division stay defined.
    pub fn project(state: &StateVec) -> NonlinearMeasVec {
        let px = clamp_away_from_zero(state[0]);
        let py = clamp_away_from_zero(state[1]);
        let v = state[2];
        let yaw = state[3];

        let vx = yaw.cos() * v;
        let vy = yaw.sin() * v;

        let range = (px * px + py * py).sqrt();
        NonlinearMeasVec::new(range, py.atan2(px), (px * vx + py * vy) / range)
    }

    /// Project the prior's sigma points and recover z̄, S and Tc.
    ///
    /// Bearing and heading differences are wrapped into (−π, π].
    pub fn moments(&self, prior: &Prediction) -> InnovationMoments {
        let z_sigmas: [NonlinearMeasVec; SIGMA_COUNT] =
            std::array::from_fn(|i| Self::project(&prior.sigma_points[i]));

        let z_pred = sigma::weighted_mean(&z_sigmas, &self.weights);

        let s = sigma::weighted_covariance(&z_sigmas, &z_pred, &self.weights, Some(BEARING_INDEX))
            + self.noise;

        let tc = sigma::weighted_cross_covariance(
            &prior.sigma_points,
            &prior.mean,
            Some(YAW_INDEX),
            &z_sigmas,
            &z_pred,
            Some(BEARING_INDEX),
            &self.weights,
        );

        InnovationMoments { z_pred, s, tc }
    }
}

impl MeasurementModel for RangeBearingModel {
    type Observation = NonlinearMeasVec;

    const KIND: SensorKind = SensorKind::Nonlinear;

    fn update(&self, prior: &Prediction, z: &NonlinearMeasVec) -> UkfResult<UpdateOutcome> {
        let InnovationMoments { z_pred, s, tc } = self.moments(prior);

        let s_inv = invert_innovation(s, Self::KIND)?;
        let k: KalmanGainNonlinear = tc * s_inv;

        let innovation = sigma::residual(z, &z_pred, Some(BEARING_INDEX));
        let nis = (innovation.transpose() * s_inv * innovation)[(0, 0)];

        let mean = prior.mean + k * innovation;
        let covariance = prior.covariance - k * s * k.transpose();

        Ok(UpdateOutcome {
            mean,
            covariance: symmetrize(&covariance),
            nis,
        })
    }
}

fn clamp_away_from_zero(value: f64) -> f64 {
    if value.abs() < POSITION_EPSILON {
        POSITION_EPSILON
    } else {
        value
    }
}

fn invert_innovation<const D: usize>(
    s: SMatrix<f64, D, D>,
    sensor: SensorKind,
) -> UkfResult<SMatrix<f64, D, D>> {
    match s.try_inverse() {
        Some(s_inv) if s_inv.iter().all(|v| v.is_finite()) => Ok(s_inv),
        _ => Err(UkfError::SingularInnovation { sensor }),
    }
}

/// Force symmetry of a covariance matrix
fn symmetrize(cov: &StateMat) -> StateMat {
    (cov + cov.transpose()) * 0.5
}
