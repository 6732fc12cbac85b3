//! Measurement-driven CTRV unscented Kalman filter.
//!
//! The first measurement seeds the state; every later one runs
//! predict → update. A failing cycle leaves the last good estimate untouched.

use serde::{Deserialize, Serialize};

use crate::config::UkfConfig;
use crate::error::{UkfError, UkfResult};
use crate::types::{
    Measurement, MeasurementRecord, MeasurementValue, SensorKind, StateMat, StateVec,
    TICKS_PER_SECOND,
};

use super::ctrv::CtrvProcessModel;
use super::measurement::{LinearPositionModel, MeasurementModel, RangeBearingModel, UpdateOutcome};

/// What a call to [`StateEstimator::process_measurement`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleOutcome {
    /// First measurement: state seeded, no predict or update
    Initialized { kind: SensorKind },
    /// Predict and update ran
    Updated { kind: SensorKind, nis: f64 },
    /// Sensor kind disabled: predict ran, update skipped
    PredictedOnly { kind: SensorKind },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EstimatorSnapshot {
    pub initialized: bool,

    /// Last accepted sensor timestamp [µs]
    pub last_timestamp: Option<u64>,

    /// Position [m]
    pub position: (f64, f64),

    /// Speed magnitude [m/s]
    pub speed: f64,

    /// Heading [rad]
    pub heading: f64,

    /// Heading rate [rad/s]
    pub yaw_rate: f64,

    /// Covariance trace for uncertainty
    pub covariance_trace: f64,

    /// Most recent NIS per sensor
    pub nis_linear: Option<f64>,
    pub nis_nonlinear: Option<f64>,

    /// Update counters
    pub predictions: u64,
    pub linear_updates: u64,
    pub nonlinear_updates: u64,
    pub skipped_updates: u64,
}

pub struct StateEstimator {
    config: UkfConfig,

    process: CtrvProcessModel,
    linear: LinearPositionModel,
    nonlinear: RangeBearingModel,

    /// State vector [px, py, v, yaw, yaw_rate]
    state: StateVec,

    /// Covariance matrix [5x5]
    covariance: StateMat,

    /// `None` until the first measurement has been accepted
    previous_timestamp: Option<u64>,

    nis_linear: Option<f64>,
    nis_nonlinear: Option<f64>,

    /// Update counters
    predictions: u64,
    linear_updates: u64,
    nonlinear_updates: u64,
    skipped_updates: u64,
}

impl StateEstimator {
    pub fn new(config: UkfConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("[UKF] {e}; numeric failures are likely");
        }

        let process = CtrvProcessModel::new(&config);
        let nonlinear = RangeBearingModel::new(&config, process.weights());

        Self {
            linear: LinearPositionModel::new(&config),
            process,
            nonlinear,
            config,
            state: StateVec::zeros(),
            covariance: StateMat::identity(),
            previous_timestamp: None,
            nis_linear: None,
            nis_nonlinear: None,
            predictions: 0,
            linear_updates: 0,
            nonlinear_updates: 0,
            skipped_updates: 0,
        }
    }

    pub fn config(&self) -> &UkfConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.previous_timestamp.is_some()
    }

    /// Current mean `[px, py, v, yaw, yaw_rate]`
    pub fn state(&self) -> &StateVec {
        &self.state
    }

    pub fn covariance(&self) -> &StateMat {
        &self.covariance
    }

    /// NIS of the most recent update from `kind`, if any
    pub fn last_nis(&self, kind: SensorKind) -> Option<f64> {
        match kind {
            SensorKind::Linear => self.nis_linear,
            SensorKind::Nonlinear => self.nis_nonlinear,
        }
    }

    pub fn snapshot(&self) -> EstimatorSnapshot {
        EstimatorSnapshot {
            initialized: self.is_initialized(),
            last_timestamp: self.previous_timestamp,
            position: (self.state[0], self.state[1]),
            speed: self.state[2],
            heading: self.state[3],
            yaw_rate: self.state[4],
            covariance_trace: self.covariance.trace(),
            nis_linear: self.nis_linear,
            nis_nonlinear: self.nis_nonlinear,
            predictions: self.predictions,
            linear_updates: self.linear_updates,
            nonlinear_updates: self.nonlinear_updates,
            skipped_updates: self.skipped_updates,
        }
    }

    /// Drop the current estimate; the next measurement seeds a new one.
    pub fn reset(&mut self) {
        log::debug!("[UKF] reset");
        *self = Self::new(self.config.clone());
    }

    /// Convert a raw record and process it.
    pub fn process_record(&mut self, record: &MeasurementRecord) -> UkfResult<CycleOutcome> {
        let measurement = Measurement::try_from(record)?;
        self.process_measurement(&measurement)
    }

    /// Run one full cycle for `measurement`.
    pub fn process_measurement(&mut self, measurement: &Measurement) -> UkfResult<CycleOutcome> {
        measurement.ensure_finite()?;
        let kind = measurement.kind();

        let Some(previous) = self.previous_timestamp else {
            self.initialize(measurement);
            return Ok(CycleOutcome::Initialized { kind });
        };

        let dt = (measurement.timestamp as i128 - previous as i128) as f64 / TICKS_PER_SECOND;
        log::trace!("[UKF] {kind} measurement, dt = {dt:.6} s");

        let prediction = self
            .process
            .predict(&self.state, &self.covariance, dt)
            .map_err(|e| abort_cycle(kind, e))?;

        if !self.config.is_enabled(kind) {
            self.state = prediction.mean;
            self.covariance = prediction.covariance;
            self.previous_timestamp = Some(measurement.timestamp);
            self.predictions += 1;
            self.skipped_updates += 1;
            return Ok(CycleOutcome::PredictedOnly { kind });
        }

        let outcome = match &measurement.value {
            MeasurementValue::Position(z) => self.linear.update(&prediction, z),
            MeasurementValue::RangeBearing(z) => self.nonlinear.update(&prediction, z),
        }
        .map_err(|e| abort_cycle(kind, e))?;

        let nis = outcome.nis;
        self.commit(kind, measurement.timestamp, outcome);
        log::trace!("[UKF] {kind} NIS = {nis:.4}");

        Ok(CycleOutcome::Updated { kind, nis })
    }

    fn initialize(&mut self, measurement: &Measurement) {
        let (px, py) = measurement.cartesian_position();
        self.state = StateVec::new(px, py, 0.0, 0.0, 0.0);
        self.covariance = StateMat::identity();
        self.previous_timestamp = Some(measurement.timestamp);

        log::debug!(
            "[UKF] initialized from {} measurement at ({px:.3}, {py:.3}), t = {}",
            measurement.kind(),
            measurement.timestamp
        );
    }

    fn commit(&mut self, kind: SensorKind, timestamp: u64, outcome: UpdateOutcome) {
        self.state = outcome.mean;
        self.covariance = outcome.covariance;
        self.previous_timestamp = Some(timestamp);
        self.predictions += 1;

        match kind {
            SensorKind::Linear => {
                self.nis_linear = Some(outcome.nis);
                self.linear_updates += 1;
            }
            SensorKind::Nonlinear => {
                self.nis_nonlinear = Some(outcome.nis);
                self.nonlinear_updates += 1;
            }
        }
    }
}

fn abort_cycle(kind: SensorKind, error: UkfError) -> UkfError {
    log::warn!("[UKF] {kind} cycle aborted, keeping previous estimate: {error}");
    error
}
