//! Unscented Kalman filter for CTRV motion
//!
//! Sigma point machinery, the CTRV process model, the two measurement
//! updates and the estimator that drives them.

pub mod ctrv;
pub mod estimator;
pub mod measurement;
pub mod sigma;

pub use ctrv::{CtrvProcessModel, Prediction};
pub use estimator::{CycleOutcome, EstimatorSnapshot, StateEstimator};
pub use measurement::{
    InnovationMoments, LinearPositionModel, MeasurementModel, RangeBearingModel, UpdateOutcome,
};
pub use sigma::normalize_angle;
