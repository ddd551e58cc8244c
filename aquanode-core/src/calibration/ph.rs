//! pH probe transfer curve
//!
//! Both models share the shape `pH = 7 - (v - anchor) / slope + offset`.
//! They differ in which bench measurement supplies the anchor.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::utils::{check_finite, check_nonzero};
use crate::channel::Channel;
use crate::constants::calibration::{
    PH7_VOLTAGE, PH_NEUTRAL, PH_NEUTRAL_VOLTAGE, PH_OFFSET, PH_SLOPE,
};
use crate::errors::ConfigResult;

/// Calibration model of the pH probe
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PhModel {
    /// Anchored at the amplifier's neutral (mid-rail) point, with a trim
    /// offset applied after the linear map
    NeutralAnchor {
        neutral_voltage: f32,
        slope: f32,
        offset: f32,
    },
    /// Anchored at the voltage measured in pH 7 buffer solution
    Ph7Anchor { ph7_voltage: f32, slope: f32 },
}

impl Default for PhModel {
    fn default() -> Self {
        Self::Ph7Anchor {
            ph7_voltage: PH7_VOLTAGE,
            slope: PH_SLOPE,
        }
    }
}

impl PhModel {
    /// Neutral-anchor model with the reference board's constants
    pub const fn neutral_anchor() -> Self {
        Self::NeutralAnchor {
            neutral_voltage: PH_NEUTRAL_VOLTAGE,
            slope: PH_SLOPE,
            offset: PH_OFFSET,
        }
    }

    /// `(anchor voltage, slope, offset)`
    const fn terms(&self) -> (f32, f32, f32) {
        match *self {
            Self::NeutralAnchor { neutral_voltage, slope, offset } => (neutral_voltage, slope, offset),
            Self::Ph7Anchor { ph7_voltage, slope } => (ph7_voltage, slope, 0.0),
        }
    }

    /// Voltage that reads as pH 7 (before any offset)
    pub const fn anchor_voltage(&self) -> f32 {
        self.terms().0
    }

    /// Convert probe voltage to pH
    #[inline]
    pub fn ph_from_voltage(&self, voltage: f32) -> f32 {
        let (anchor, slope, offset) = self.terms();
        PH_NEUTRAL - (voltage - anchor) / slope + offset
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let (anchor, slope, offset) = self.terms();
        check_finite(Channel::Ph, "anchor voltage", anchor)?;
        check_finite(Channel::Ph, "slope", slope)?;
        check_finite(Channel::Ph, "offset", offset)?;
        check_nonzero(Channel::Ph, "slope", slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;
    use approx::assert_relative_eq;

    #[test]
    fn anchor_reads_exactly_seven() {
        assert_eq!(PhModel::default().ph_from_voltage(PH7_VOLTAGE), 7.0);
        assert_eq!(PhModel::neutral_anchor().ph_from_voltage(PH_NEUTRAL_VOLTAGE), 7.0);
    }

    #[test]
    fn one_slope_per_ph_unit() {
        let model = PhModel::default();
        assert_relative_eq!(model.ph_from_voltage(1.80), 8.0, epsilon = 1e-4);
        assert_relative_eq!(model.ph_from_voltage(1.36), 6.0, epsilon = 1e-4);
    }

    #[test]
    fn offset_applies_after_map() {
        let model = PhModel::NeutralAnchor {
            neutral_voltage: 1.5,
            slope: -0.18,
            offset: 0.25,
        };
        assert_relative_eq!(model.ph_from_voltage(1.5), 7.25);
    }

    #[test]
    fn zero_slope_rejected() {
        let model = PhModel::Ph7Anchor { ph7_voltage: 1.58, slope: 0.0 };
        assert_eq!(
            model.validate(),
            Err(ConfigError::ZeroDenominator { channel: Channel::Ph, term: "slope" })
        );
    }
}
