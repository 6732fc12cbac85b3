use thiserror::Error;

use crate::types::SensorKind;

/// Filter error types
///
/// Every variant aborts only the measurement being processed; the
/// estimator keeps its last good mean and covariance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UkfError {
    #[error("Covariance ({dim}x{dim}) is not positive definite, cannot take its square root")]
    CovarianceNotPositiveDefinite { dim: usize },

    #[error("Innovation covariance for {sensor} sensor is singular")]
    SingularInnovation { sensor: SensorKind },

    #[error("{sensor} measurement needs {expected} values, got {actual}")]
    MeasurementLength {
        sensor: SensorKind,
        expected: usize,
        actual: usize,
    },

    #[error("{sensor} measurement contains non-finite values")]
    NonFiniteMeasurement { sensor: SensorKind },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for filter operations
pub type UkfResult<T> = Result<T, UkfError>;
