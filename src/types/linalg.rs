//! Linear algebra type system for the CTRV unscented filter
//!
//! Provides compile-time dimension checking and clean type aliases
//! for the prediction and both measurement updates.

use nalgebra::{SMatrix, SVector};

// ===== State Dimensions =====
pub const STATE_DIM: usize = 5; // [px, py, v, yaw, yaw_rate]
pub const AUG_DIM: usize = 7; // state + [nu_accel, nu_yaw_accel]

// ===== Measurement Dimensions =====
pub const MEASURE_DIM_LINEAR: usize = 2; // (x, y)
pub const MEASURE_DIM_NONLINEAR: usize = 3; // (range, bearing, range_rate)

// ===== State Types =====
pub type StateVec = SVector<f64, STATE_DIM>;
pub type StateMat = SMatrix<f64, STATE_DIM, STATE_DIM>;

pub type AugStateVec = SVector<f64, AUG_DIM>;
pub type AugStateMat = SMatrix<f64, AUG_DIM, AUG_DIM>;

// ===== Measurement Types =====
pub type LinearMeasVec = SVector<f64, MEASURE_DIM_LINEAR>;
pub type LinearNoise = SMatrix<f64, MEASURE_DIM_LINEAR, MEASURE_DIM_LINEAR>;
pub type LinearObservation = SMatrix<f64, MEASURE_DIM_LINEAR, STATE_DIM>; // 2×5

pub type NonlinearMeasVec = SVector<f64, MEASURE_DIM_NONLINEAR>;
pub type NonlinearNoise = SMatrix<f64, MEASURE_DIM_NONLINEAR, MEASURE_DIM_NONLINEAR>;

// Kalman gain types
pub type KalmanGainLinear = SMatrix<f64, STATE_DIM, MEASURE_DIM_LINEAR>; // 5×2
pub type KalmanGainNonlinear = SMatrix<f64, STATE_DIM, MEASURE_DIM_NONLINEAR>; // 5×3

// ===== Sigma Point Types =====
pub const SIGMA_COUNT: usize = 2 * AUG_DIM + 1; // 15
pub type AugSigmaPoints = [AugStateVec; SIGMA_COUNT];
pub type SigmaPoints = [StateVec; SIGMA_COUNT];
pub type SigmaWeights = SVector<f64, SIGMA_COUNT>;
