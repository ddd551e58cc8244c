//! Analog temperature probe

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::utils::{check_finite, check_nonzero, map_linear};
use crate::channel::Channel;
use crate::constants::calibration::{
    TEMPERATURE_HIGH_POINT, TEMPERATURE_LOW_POINT, TEMPERATURE_OFFSET_C, TEMPERATURE_SCALE,
};
use crate::errors::ConfigResult;

/// Calibration model of the temperature probe
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TemperatureModel {
    /// 10 mV/°C sensor: `v * 100 + offset`
    SingleOffset { offset: f32 },
    /// Line through two bath measurements, extrapolated beyond them
    TwoPoint {
        low_voltage: f32,
        low_celsius: f32,
        high_voltage: f32,
        high_celsius: f32,
    },
}

impl Default for TemperatureModel {
    fn default() -> Self {
        Self::SingleOffset { offset: TEMPERATURE_OFFSET_C }
    }
}

impl TemperatureModel {
    /// Two-point model with the reference bath measurements
    pub const fn two_point() -> Self {
        Self::TwoPoint {
            low_voltage: TEMPERATURE_LOW_POINT.0,
            low_celsius: TEMPERATURE_LOW_POINT.1,
            high_voltage: TEMPERATURE_HIGH_POINT.0,
            high_celsius: TEMPERATURE_HIGH_POINT.1,
        }
    }

    /// Convert probe voltage to °C
    #[inline]
    pub fn celsius_from_voltage(&self, voltage: f32) -> f32 {
        match *self {
            Self::SingleOffset { offset } => voltage * TEMPERATURE_SCALE + offset,
            Self::TwoPoint { low_voltage, low_celsius, high_voltage, high_celsius } => {
                map_linear(voltage, low_voltage, high_voltage, low_celsius, high_celsius)
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match *self {
            Self::SingleOffset { offset } => check_finite(Channel::Temperature, "offset", offset),
            Self::TwoPoint { low_voltage, low_celsius, high_voltage, high_celsius } => {
                check_finite(Channel::Temperature, "low voltage", low_voltage)?;
                check_finite(Channel::Temperature, "low celsius", low_celsius)?;
                check_finite(Channel::Temperature, "high voltage", high_voltage)?;
                check_finite(Channel::Temperature, "high celsius", high_celsius)?;
                check_nonzero(Channel::Temperature, "high - low voltage", high_voltage - low_voltage)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_offset() {
        let model = TemperatureModel::default();
        assert_relative_eq!(model.celsius_from_voltage(0.25), 25.5, epsilon = 1e-4);
        assert_eq!(model.celsius_from_voltage(0.0), 0.5);
    }

    #[test]
    fn two_point_anchors() {
        let model = TemperatureModel::two_point();
        assert_eq!(model.celsius_from_voltage(0.60), 30.0);
        assert_eq!(model.celsius_from_voltage(0.84), 45.0);
    }

    #[test]
    fn two_point_extrapolates() {
        let model = TemperatureModel::two_point();
        // 62.5 °C per volt
        assert_relative_eq!(model.celsius_from_voltage(0.44), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_two_point_rejected() {
        let model = TemperatureModel::TwoPoint {
            low_voltage: 0.7,
            low_celsius: 20.0,
            high_voltage: 0.7,
            high_celsius: 40.0,
        };
        assert!(model.validate().is_err());
    }
}
