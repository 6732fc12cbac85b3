use serde::{Deserialize, Serialize};

use crate::error::{UkfError, UkfResult};
use crate::types::{LinearNoise, NonlinearNoise, SensorKind};

/// Filter configuration, fixed for the lifetime of an estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UkfConfig {
    /// If false, linear readings only seed the filter, never update it
    pub enable_linear: bool,
    /// If false, nonlinear readings only seed the filter, never update it
    pub enable_nonlinear: bool,

    /// Process noise: longitudinal acceleration [m/s²]
    pub std_accel: f64,
    /// Process noise: yaw acceleration [rad/s²]
    pub std_yaw_accel: f64,

    /// Positional sensor noise [m]
    pub std_linear_x: f64,
    pub std_linear_y: f64,

    /// Range [m], bearing [rad] and range-rate [m/s] sensor noise
    pub std_range: f64,
    pub std_bearing: f64,
    pub std_range_rate: f64,
}

impl Default for UkfConfig {
    fn default() -> Self {
        Self {
            enable_linear: true,
            enable_nonlinear: true,
            std_accel: 1.0,
            std_yaw_accel: std::f64::consts::FRAC_PI_8,
            std_linear_x: 0.15,
            std_linear_y: 0.15,
            std_range: 0.3,
            std_bearing: 0.03,
            std_range_rate: 0.3,
        }
    }
}

impl UkfConfig {
    pub fn is_enabled(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Linear => self.enable_linear,
            SensorKind::Nonlinear => self.enable_nonlinear,
        }
    }

    /// Check that every standard deviation is finite and strictly positive.
    pub fn validate(&self) -> UkfResult<()> {
        let fields = [
            ("std_accel", self.std_accel),
            ("std_yaw_accel", self.std_yaw_accel),
            ("std_linear_x", self.std_linear_x),
            ("std_linear_y", self.std_linear_y),
            ("std_range", self.std_range),
            ("std_bearing", self.std_bearing),
            ("std_range_rate", self.std_range_rate),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(UkfError::InvalidConfig(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Diagonal R for the positional sensor
    pub fn linear_noise(&self) -> LinearNoise {
        LinearNoise::from_diagonal(&nalgebra::Vector2::new(
            self.std_linear_x * self.std_linear_x,
            self.std_linear_y * self.std_linear_y,
        ))
    }

    /// Diagonal R for the range / bearing / range-rate sensor
    pub fn nonlinear_noise(&self) -> NonlinearNoise {
        NonlinearNoise::from_diagonal(&nalgebra::Vector3::new(
            self.std_range * self.std_range,
            self.std_bearing * self.std_bearing,
            self.std_range_rate * self.std_range_rate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(UkfConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_noise() {
        let config = UkfConfig {
            std_bearing: 0.0,
            ..UkfConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("std_bearing"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let config = UkfConfig {
            std_accel: f64::NAN,
            ..UkfConfig::default()
        };
        assert!(matches!(config.validate(), Err(UkfError::InvalidConfig(_))));
    }

    #[test]
    fn test_noise_matrices_are_diagonal_variances() {
        let config = UkfConfig::default();
        let r_lin = config.linear_noise();
        assert_abs_diff_eq!(r_lin[(0, 0)], 0.0225, epsilon = 1e-12);
        assert_abs_diff_eq!(r_lin[(1, 1)], 0.0225, epsilon = 1e-12);
        assert_eq!(r_lin[(0, 1)], 0.0);

        let r_nl = config.nonlinear_noise();
        assert_abs_diff_eq!(r_nl[(0, 0)], 0.09, epsilon = 1e-12);
        assert_abs_diff_eq!(r_nl[(1, 1)], 0.0009, epsilon = 1e-12);
        assert_abs_diff_eq!(r_nl[(2, 2)], 0.09, epsilon = 1e-12);
        assert_eq!(r_nl[(0, 2)], 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: UkfConfig =
            serde_json::from_str(r#"{"enable_nonlinear": false, "std_accel": 2.0}"#).unwrap();
        assert!(config.enable_linear);
        assert!(!config.enable_nonlinear);
        assert_eq!(config.std_accel, 2.0);
        assert_eq!(config.std_range, 0.3);
        assert!(!config.is_enabled(SensorKind::Nonlinear));
    }
}
