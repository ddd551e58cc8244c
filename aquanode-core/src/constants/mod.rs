//! Constants for the AquaNode core
//!
//! Every default of the deployed unit lives here, grouped by concern:
//! - **ADC**: reference voltage, full-scale code and pin wiring
//! - **Calibration**: per-channel transfer-curve coefficients
//! - **Time**: scheduler and connectivity intervals
//! - **Buffers**: ring capacities and payload sizes
//! - **Telemetry**: topics, field precision and device id format
//!
//! Values come from bench calibration of the reference probe set. A
//! deployment that swaps probes overrides them through
//! [`NodeConfig`](crate::config::NodeConfig), never by editing this module.

/// ADC reference, resolution and pin assignment.
pub mod adc;

/// Per-channel calibration coefficients.
pub mod calibration;

/// Scheduler and connectivity intervals.
pub mod time;

/// Fixed capacities for rings and strings.
pub mod buffers;

/// Topic names, rounding precision and identifiers.
pub mod telemetry;

pub use adc::{ADC_FULL_SCALE, ADC_REFERENCE_VOLTAGE};

pub use time::{
    DEFAULT_HEALTH_CHECK_INTERVAL_MS, DEFAULT_PUBLISH_INTERVAL_MS,
    DEFAULT_RECONNECT_BACKOFF_MS, DEFAULT_SAMPLE_INTERVAL_MS,
};

pub use buffers::{DEFAULT_PH_WINDOW, FRAME_AVERAGING_CAPACITY, PH_HISTORY_CAPACITY};
