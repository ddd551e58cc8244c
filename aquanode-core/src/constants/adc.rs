//! ADC Reference and Wiring
//!
//! The node reads all four probes through a 12-bit SAR ADC referenced to the
//! 3.3 V rail.

/// ADC reference voltage (volts).
///
/// Full-scale input maps to this voltage. Measured against the regulator
/// output on the reference board.
pub const ADC_REFERENCE_VOLTAGE: f32 = 3.3;

/// Highest code the ADC returns (12-bit).
pub const ADC_FULL_SCALE: u16 = 4095;

/// ADC input wired to the pH probe amplifier.
pub const PH_PIN: u8 = 34;

/// ADC input wired to the TDS probe.
pub const TDS_PIN: u8 = 33;

/// ADC input wired to the turbidity probe.
pub const TURBIDITY_PIN: u8 = 35;

/// ADC input wired to the analog temperature probe.
pub const TEMPERATURE_PIN: u8 = 32;
