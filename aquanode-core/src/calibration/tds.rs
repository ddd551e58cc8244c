//! Total dissolved solids probe
//!
//! Conductivity rises about 2 % per °C, so the probe voltage is first
//! normalised to 25 °C and then run through the sensor family's published
//! cubic fit.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::utils::{check_finite, check_nonzero};
use crate::channel::Channel;
use crate::constants::calibration::{
    TDS_CALIBRATION_FACTOR, TDS_CUBIC, TDS_LINEAR, TDS_QUADRATIC, TDS_REFERENCE_TEMPERATURE_C,
    TDS_TEMPERATURE_COEFFICIENT,
};
use crate::errors::ConfigResult;

/// Which temperature feeds the compensation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TdsCompensation {
    /// Use the raw probe voltage
    Disabled,
    /// Use the temperature channel of the same frame
    #[default]
    MeasuredTemperature,
    /// Use a fixed water temperature (°C), for nodes without a probe
    FixedTemperature(f32),
}

/// TDS calibration constants
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TdsCalibration {
    /// Fractional conductivity change per °C
    pub temperature_coefficient: f32,
    /// Polynomial output to ppm
    pub calibration_factor: f32,
    pub compensation: TdsCompensation,
}

impl Default for TdsCalibration {
    fn default() -> Self {
        Self {
            temperature_coefficient: TDS_TEMPERATURE_COEFFICIENT,
            calibration_factor: TDS_CALIBRATION_FACTOR,
            compensation: TdsCompensation::MeasuredTemperature,
        }
    }
}

impl TdsCalibration {
    /// Voltage normalised to the 25 °C reference
    ///
    /// A compensation coefficient of zero (water at -25 °C with the default
    /// coefficient) produces a non-finite value; the payload encoder reports
    /// it as `null`.
    pub fn compensated_voltage(&self, voltage: f32, measured_celsius: f32) -> f32 {
        let celsius = match self.compensation {
            TdsCompensation::Disabled => return voltage,
            TdsCompensation::MeasuredTemperature => measured_celsius,
            TdsCompensation::FixedTemperature(celsius) => celsius,
        };
        voltage / (1.0 + self.temperature_coefficient * (celsius - TDS_REFERENCE_TEMPERATURE_C))
    }

    /// Convert probe voltage to ppm
    ///
    /// Not clamped: voltages below the polynomial's valid region give
    /// negative ppm, which is how the probe behaves and not an error.
    pub fn tds_from_voltage(&self, voltage: f32, temperature_celsius: f32) -> f32 {
        let c = self.compensated_voltage(voltage, temperature_celsius);
        // Horner form of a*c^3 + b*c^2 + d*c
        (((TDS_CUBIC * c + TDS_QUADRATIC) * c + TDS_LINEAR) * c) * self.calibration_factor
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_finite(Channel::Tds, "temperature coefficient", self.temperature_coefficient)?;
        check_finite(Channel::Tds, "calibration factor", self.calibration_factor)?;
        if let TdsCompensation::FixedTemperature(celsius) = self.compensation {
            check_finite(Channel::Tds, "fixed temperature", celsius)?;
            check_nonzero(
                Channel::Tds,
                "compensation coefficient",
                1.0 + self.temperature_coefficient * (celsius - TDS_REFERENCE_TEMPERATURE_C),
            )?;
        }
        Ok(())
    }
}
