//! Shared conversion and validation helpers
//!
//! Pure functions with no state. Safe to call from interrupt context.

use crate::channel::Channel;
use crate::errors::{ConfigError, ConfigResult};

/// Convert a raw ADC code to volts
///
/// Computed as `vref * (code / full_scale)`, which keeps the result in
/// `[0, vref]` and non-decreasing in `code` for every `code <= full_scale`
/// despite f32 rounding. `full_scale` must be non-zero; configuration
/// validation guarantees that before any conversion runs.
#[inline]
pub fn voltage_from_raw(code: u16, vref: f32, full_scale: u16) -> f32 {
    vref * (f32::from(code) / f32::from(full_scale))
}

/// Straight line through `(in_a, out_a)` and `(in_b, out_b)`
///
/// Extrapolates beyond the anchors. Written in lerp form so both anchors map
/// to their outputs exactly. `in_a != in_b` is a configuration invariant.
#[inline]
pub fn map_linear(x: f32, in_a: f32, in_b: f32, out_a: f32, out_b: f32) -> f32 {
    let t = (x - in_a) / (in_b - in_a);
    out_a * (1.0 - t) + out_b * t
}

/// Reject NaN and infinite coefficients
pub(crate) fn check_finite(channel: Channel, term: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteCoefficient { channel, term })
    }
}

/// Reject a value used as a divisor when it is zero
pub(crate) fn check_nonzero(channel: Channel, term: &'static str, value: f32) -> ConfigResult<()> {
    if value == 0.0 {
        Err(ConfigError::ZeroDenominator { channel, term })
    } else {
        Ok(())
    }
}
