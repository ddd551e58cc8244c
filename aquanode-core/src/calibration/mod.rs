//! Calibration Engine
//!
//! ## Overview
//!
//! Every channel has its own transducer with its own transfer curve. This
//! module turns ADC codes into volts and volts into physical units:
//!
//! | Channel     | Model                                         | Unit |
//! |-------------|-----------------------------------------------|------|
//! | pH          | linear, anchored at pH 7 or at mid-rail       | pH   |
//! | TDS         | temperature-compensated cubic polynomial      | ppm  |
//! | Turbidity   | clamped input, linear between two references  | NTU  |
//! | Temperature | `v * 100 + offset` or two-point linear        | °C   |
//!
//! ## Purity
//!
//! All conversions are plain functions of their inputs and the immutable
//! constants in [`Calibration`]. Nothing here holds state, so a `Calibration`
//! can be shared freely and each curve can be tested against literal
//! voltage tables without hardware.
//!
//! Apart from the turbidity input clamp there are no domain clamps.
//! Out-of-range codes give out-of-range values, never errors.
//!
//! ## Example
//!
//! ```rust
//! use aquanode_core::calibration::Calibration;
//!
//! let cal = Calibration::default();
//! cal.validate().unwrap();
//!
//! let v = cal.voltage(2048);
//! assert!((v - 1.6505).abs() < 1e-3);
//! assert_eq!(cal.ph_from_voltage(cal.ph.anchor_voltage()), 7.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::adc::{ADC_FULL_SCALE, ADC_REFERENCE_VOLTAGE};
use crate::errors::{ConfigError, ConfigResult};

pub mod ph;
pub mod tds;
pub mod temperature;
pub mod turbidity;
pub mod utils;

pub use ph::PhModel;
pub use tds::{TdsCalibration, TdsCompensation};
pub use temperature::TemperatureModel;
pub use turbidity::TurbidityCalibration;
pub use utils::{map_linear, voltage_from_raw};

/// ADC reference voltage and resolution
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdcReference {
    /// Volts at full scale
    pub vref: f32,
    /// Highest code
    pub full_scale: u16,
}

impl Default for AdcReference {
    fn default() -> Self {
        Self {
            vref: ADC_REFERENCE_VOLTAGE,
            full_scale: ADC_FULL_SCALE,
        }
    }
}

impl AdcReference {
    #[inline]
    pub fn voltage(&self, code: u16) -> f32 {
        voltage_from_raw(code, self.vref, self.full_scale)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.full_scale == 0 {
            return Err(ConfigError::ZeroFullScale);
        }
        if !(self.vref.is_finite() && self.vref > 0.0) {
            return Err(ConfigError::InvalidReferenceVoltage { vref: self.vref });
        }
        Ok(())
    }
}

/// Calibration constants for all four channels
///
/// Loaded once at startup and never changed. Call [`Calibration::validate`]
/// before the first conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    pub adc: AdcReference,
    pub ph: PhModel,
    pub tds: TdsCalibration,
    pub turbidity: TurbidityCalibration,
    pub temperature: TemperatureModel,
}

impl Calibration {
    /// Check every divisor and coefficient, reporting the first problem
    pub fn validate(&self) -> ConfigResult<()> {
        self.adc.validate()?;
        self.ph.validate()?;
        self.tds.validate()?;
        self.turbidity.validate()?;
        self.temperature.validate()
    }

    /// Raw code to volts
    #[inline]
    pub fn voltage(&self, code: u16) -> f32 {
        self.adc.voltage(code)
    }

    #[inline]
    pub fn ph_from_voltage(&self, voltage: f32) -> f32 {
        self.ph.ph_from_voltage(voltage)
    }

    /// TDS in ppm; `temperature_celsius` is used only when compensation
    /// reads the measured temperature
    #[inline]
    pub fn tds_from_voltage(&self, voltage: f32, temperature_celsius: f32) -> f32 {
        self.tds.tds_from_voltage(voltage, temperature_celsius)
    }

    #[inline]
    pub fn turbidity_from_voltage(&self, voltage: f32) -> f32 {
        self.turbidity.ntu_from_voltage(voltage, self.adc.vref)
    }

    #[inline]
    pub fn temperature_from_voltage(&self, voltage: f32) -> f32 {
        self.temperature.celsius_from_voltage(voltage)
    }
}
