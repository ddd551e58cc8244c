//! Turbidity probe
//!
//! Linear between two reference samples. The input is clamped to the ADC
//! range first, so a reading above the reference voltage never extrapolates
//! upward.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::utils::{check_finite, check_nonzero, map_linear};
use crate::channel::Channel;
use crate::constants::calibration::{
    TURBIDITY_CLEAR_NTU, TURBIDITY_CLEAR_VOLTAGE, TURBIDITY_MUDDY_NTU, TURBIDITY_MUDDY_VOLTAGE,
};
use crate::errors::ConfigResult;

/// Clear and muddy reference points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TurbidityCalibration {
    pub clear_voltage: f32,
    pub clear_ntu: f32,
    pub muddy_voltage: f32,
    pub muddy_ntu: f32,
}

impl Default for TurbidityCalibration {
    fn default() -> Self {
        Self {
            clear_voltage: TURBIDITY_CLEAR_VOLTAGE,
            clear_ntu: TURBIDITY_CLEAR_NTU,
            muddy_voltage: TURBIDITY_MUDDY_VOLTAGE,
            muddy_ntu: TURBIDITY_MUDDY_NTU,
        }
    }
}

impl TurbidityCalibration {
    /// Convert probe voltage to NTU, clamping the voltage into `[0, vref]`
    ///
    /// The output itself is not clamped to the NTU endpoints.
    pub fn ntu_from_voltage(&self, voltage: f32, vref: f32) -> f32 {
        let v = voltage.clamp(0.0, vref);
        map_linear(v, self.clear_voltage, self.muddy_voltage, self.clear_ntu, self.muddy_ntu)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_finite(Channel::Turbidity, "clear voltage", self.clear_voltage)?;
        check_finite(Channel::Turbidity, "clear NTU", self.clear_ntu)?;
        check_finite(Channel::Turbidity, "muddy voltage", self.muddy_voltage)?;
        check_finite(Channel::Turbidity, "muddy NTU", self.muddy_ntu)?;
        check_nonzero(
            Channel::Turbidity,
            "muddy - clear voltage",
            self.muddy_voltage - self.clear_voltage,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;
    use approx::assert_relative_eq;

    const VREF: f32 = 3.3;

    #[test]
    fn reference_points_exact() {
        let cal = TurbidityCalibration {
            clear_voltage: 2.5,
            clear_ntu: 1.0,
            muddy_voltage: 0.8,
            muddy_ntu: 3000.0,
        };
        assert_eq!(cal.ntu_from_voltage(2.5, VREF), 1.0);
        assert_eq!(cal.ntu_from_voltage(0.8, VREF), 3000.0);
    }

    #[test]
    fn default_midpoint() {
        let cal = TurbidityCalibration::default();
        assert_relative_eq!(cal.ntu_from_voltage(1.65, VREF), 25.0, epsilon = 1e-4);
    }

    #[test]
    fn over_range_clamped_to_vref() {
        let cal = TurbidityCalibration::default();
        assert_eq!(cal.ntu_from_voltage(4.0, VREF), cal.ntu_from_voltage(VREF, VREF));
        assert_eq!(cal.ntu_from_voltage(-0.5, VREF), cal.ntu_from_voltage(0.0, VREF));
    }

    #[test]
    fn below_clear_extrapolates() {
        let cal = TurbidityCalibration {
            clear_voltage: 0.5,
            ..TurbidityCalibration::default()
        };
        assert!(cal.ntu_from_voltage(0.2, VREF) < cal.clear_ntu);
    }

    #[test]
    fn equal_references_rejected() {
        let cal = TurbidityCalibration {
            clear_voltage: 1.0,
            muddy_voltage: 1.0,
            ..TurbidityCalibration::default()
        };
        assert_eq!(
            cal.validate(),
            Err(ConfigError::ZeroDenominator {
                channel: Channel::Turbidity,
                term: "muddy - clear voltage",
            })
        );
    }
}
