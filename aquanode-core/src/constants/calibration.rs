//! Calibration Coefficients
//!
//! Defaults for the reference probe set. pH and temperature each have two
//! deployed models; both sets of constants are kept so a deployment can pick
//! one in configuration.

// ===== pH =====

/// pH assigned to the anchor voltage.
pub const PH_NEUTRAL: f32 = 7.0;

/// Probe output at pH 7 for the "pH 7 anchor" model (volts).
pub const PH7_VOLTAGE: f32 = 1.58;

/// Probe slope (volts per pH unit), sign as fitted on the bench.
pub const PH_SLOPE: f32 = -0.22;

/// Mid-rail anchor for the "neutral anchor" model (volts).
pub const PH_NEUTRAL_VOLTAGE: f32 = 1.65;

/// Trim added after the linear map in the neutral anchor model.
pub const PH_OFFSET: f32 = 0.0;

// ===== TDS =====

/// Cubic term of the TDS transfer polynomial.
pub const TDS_CUBIC: f32 = 133.42;

/// Quadratic term of the TDS transfer polynomial.
pub const TDS_QUADRATIC: f32 = -255.86;

/// Linear term of the TDS transfer polynomial.
pub const TDS_LINEAR: f32 = 857.39;

/// Fractional conductivity change per °C.
pub const TDS_TEMPERATURE_COEFFICIENT: f32 = 0.02;

/// Scale from the polynomial output to ppm.
pub const TDS_CALIBRATION_FACTOR: f32 = 0.5;

/// Temperature the polynomial was fitted at (°C).
pub const TDS_REFERENCE_TEMPERATURE_C: f32 = 25.0;

// ===== TURBIDITY =====

/// Probe output in clear water (volts).
pub const TURBIDITY_CLEAR_VOLTAGE: f32 = 0.0;

/// Turbidity of the clear-water reference (NTU).
pub const TURBIDITY_CLEAR_NTU: f32 = 0.0;

/// Probe output in the muddy reference sample (volts).
pub const TURBIDITY_MUDDY_VOLTAGE: f32 = 3.3;

/// Turbidity of the muddy reference sample (NTU).
pub const TURBIDITY_MUDDY_NTU: f32 = 50.0;

// ===== TEMPERATURE =====

/// Degrees per volt of the 10 mV/°C analog sensor.
pub const TEMPERATURE_SCALE: f32 = 100.0;

/// Offset of the single-offset model (°C).
pub const TEMPERATURE_OFFSET_C: f32 = 0.5;

/// Low anchor of the two-point model (volts, °C).
pub const TEMPERATURE_LOW_POINT: (f32, f32) = (0.60, 30.0);

/// High anchor of the two-point model (volts, °C).
pub const TEMPERATURE_HIGH_POINT: (f32, f32) = (0.84, 45.0);
