pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{UkfError, UkfResult};

/// Sensor clock ticks per second (timestamps are microseconds).
pub const TICKS_PER_SECOND: f64 = 1_000_000.0;

/// Which of the two modeled sensors produced a reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Positional sensor reporting (x, y) directly
    #[serde(alias = "lidar", alias = "L")]
    Linear,
    /// Range / bearing / range-rate sensor
    #[serde(alias = "radar", alias = "R")]
    Nonlinear,
}

impl SensorKind {
    /// Number of raw values a reading of this kind carries
    pub fn measurement_dim(self) -> usize {
        match self {
            SensorKind::Linear => MEASURE_DIM_LINEAR,
            SensorKind::Nonlinear => MEASURE_DIM_NONLINEAR,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Linear => write!(f, "linear"),
            SensorKind::Nonlinear => write!(f, "nonlinear"),
        }
    }
}

/// Raw input record as delivered by the ingestion side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub sensor_kind: SensorKind,
    /// Sensor clock [µs]
    pub timestamp: u64,
    /// 2 values for linear (x, y), 3 for nonlinear (range, bearing, range_rate)
    pub values: Vec<f64>,
}

/// Observation value carried by a [`Measurement`].
#[derive(Clone, Debug, PartialEq)]
pub enum MeasurementValue {
    /// Cartesian position [m]
    Position(LinearMeasVec),
    /// Range [m], bearing [rad], range rate [m/s]
    RangeBearing(NonlinearMeasVec),
}

/// A typed, dimension-checked measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    /// Sensor clock [µs]
    pub timestamp: u64,
    pub value: MeasurementValue,
}

impl Measurement {
    pub fn position(timestamp: u64, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            value: MeasurementValue::Position(LinearMeasVec::new(x, y)),
        }
    }

    pub fn range_bearing(timestamp: u64, range: f64, bearing: f64, range_rate: f64) -> Self {
        Self {
            timestamp,
            value: MeasurementValue::RangeBearing(NonlinearMeasVec::new(range, bearing, range_rate)),
        }
    }

    pub fn kind(&self) -> SensorKind {
        match self.value {
            MeasurementValue::Position(_) => SensorKind::Linear,
            MeasurementValue::RangeBearing(_) => SensorKind::Nonlinear,
        }
    }

    /// Reject NaN / infinite readings before they reach the filter.
    pub fn ensure_finite(&self) -> UkfResult<()> {
        let finite = match &self.value {
            MeasurementValue::Position(z) => z.iter().all(|v| v.is_finite()),
            MeasurementValue::RangeBearing(z) => z.iter().all(|v| v.is_finite()),
        };
        if finite {
            Ok(())
        } else {
            Err(UkfError::NonFiniteMeasurement {
                sensor: self.kind(),
            })
        }
    }

    /// Position implied by the reading, used to seed the filter.
    pub fn cartesian_position(&self) -> (f64, f64) {
        match &self.value {
            MeasurementValue::Position(z) => (z[0], z[1]),
            MeasurementValue::RangeBearing(z) => {
                let (range, bearing) = (z[0], z[1]);
                (range * bearing.cos(), range * bearing.sin())
            }
        }
    }
}

impl TryFrom<&MeasurementRecord> for Measurement {
    type Error = UkfError;

    fn try_from(record: &MeasurementRecord) -> Result<Self, Self::Error> {
        let expected = record.sensor_kind.measurement_dim();
        if record.values.len() != expected {
            return Err(UkfError::MeasurementLength {
                sensor: record.sensor_kind,
                expected,
                actual: record.values.len(),
            });
        }

        let v = &record.values;
        let measurement = match record.sensor_kind {
            SensorKind::Linear => Measurement::position(record.timestamp, v[0], v[1]),
            SensorKind::Nonlinear => {
                Measurement::range_bearing(record.timestamp, v[0], v[1], v[2])
            }
        };
        Ok(measurement)
    }
}

impl TryFrom<MeasurementRecord> for Measurement {
    type Error = UkfError;

    fn try_from(record: MeasurementRecord) -> Result<Self, Self::Error> {
        Measurement::try_from(&record)
    }
}
