//! `ctrv_fusion_rs` - CTRV state estimation from positional and
//! range/bearing sensors with an unscented Kalman filter.
//!
//! # Module layout
//! - [`types`]   - dimensions, linear-algebra aliases, measurements
//! - [`config`]  - noise parameters and per-sensor enable flags
//! - [`error`]   - error type shared by every operation
//! - [`filters`] - sigma points, process model, measurement updates, estimator
//!
//! ```no_run
//! use ctrv_fusion_rs::{Measurement, StateEstimator, UkfConfig};
//!
//! let mut ukf = StateEstimator::new(UkfConfig::default());
//! ukf.process_measurement(&Measurement::position(0, 1.0, 1.0))?;
//! ukf.process_measurement(&Measurement::range_bearing(100_000, 1.5, 0.8, 0.1))?;
//! println!("{:?}", ukf.snapshot());
//! # Ok::<(), ctrv_fusion_rs::UkfError>(())
//! ```

pub mod config;
pub mod error;
pub mod filters;
pub mod types;

pub use config::UkfConfig;
pub use error::{UkfError, UkfResult};
pub use filters::{CycleOutcome, EstimatorSnapshot, StateEstimator};
pub use types::{Measurement, MeasurementRecord, MeasurementValue, SensorKind};
