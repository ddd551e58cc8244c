//! Error Types for Configuration and Connectivity Faults
//!
//! ## Design Philosophy
//!
//! The node runs unattended, so the error system separates what can stop it
//! from what it must ride out:
//!
//! 1. **Startup-only**: [`ConfigError`] is the only error a caller ever has to
//!    handle. Calibration constants are immutable once loaded, so every check
//!    (zero denominators, window sizes, intervals) runs once in
//!    [`NodeConfig::validate`](crate::config::NodeConfig::validate).
//!
//! 2. **Transient**: [`ConnectivityFault`] records a failed link connect,
//!    broker connect or publish. Faults are logged, counted and reflected in
//!    the gate state; they never leave [`Scheduler::tick`](crate::scheduler::Scheduler::tick).
//!
//! 3. **No Heap Allocation**: variants carry only `Copy` data and
//!    `&'static str` labels, so errors can be stored in stats and moved around
//!    freely on targets without an allocator.
//!
//! ## Out-of-range sensor data
//!
//! Raw codes outside the nominal ADC range are not errors. The calibration
//! functions are plain math and return out-of-physical-range values for them
//! (negative ppm, NTU past the muddy endpoint). Only the turbidity input clamp
//! limits anything.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use aquanode_core::{ConfigError, NodeConfig};
//!
//! let mut config = NodeConfig::default();
//! config.scheduler.ph_window = 0;
//!
//! match config.validate() {
//!     Ok(()) => {}
//!     Err(ConfigError::WindowOutOfRange { requested, capacity }) => {
//!         assert_eq!((requested, capacity), (0, 10));
//!     }
//!     Err(other) => panic!("unexpected: {other}"),
//! }
//! ```

use thiserror_no_std::Error;

use crate::channel::Channel;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid deployment configuration, detected at startup
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// ADC full-scale code of zero would divide by zero in every conversion
    #[error("ADC full-scale code must be non-zero")]
    ZeroFullScale,

    /// Reference voltage is zero, negative or not a number
    #[error("Reference voltage {vref} V must be positive and finite")]
    InvalidReferenceVoltage {
        /// Configured reference voltage
        vref: f32,
    },

    /// A linear model would divide by zero
    #[error("{channel} calibration has a zero denominator ({term})")]
    ZeroDenominator {
        /// Channel the constants belong to
        channel: Channel,
        /// Which term collapsed to zero
        term: &'static str,
    },

    /// A calibration coefficient is NaN or infinite
    #[error("{channel} calibration term {term} is not finite")]
    NonFiniteCoefficient {
        /// Channel the constants belong to
        channel: Channel,
        /// Offending term
        term: &'static str,
    },

    /// Smoothing window outside `[1, capacity]`
    #[error("Window size {requested} outside [1, {capacity}]")]
    WindowOutOfRange {
        /// Requested window
        requested: usize,
        /// Ring capacity
        capacity: usize,
    },

    /// Frame averaging sample count outside `[1, capacity]`
    #[error("Averaging over {requested} frames outside [1, {capacity}]")]
    AveragingOutOfRange {
        /// Requested sample count
        requested: usize,
        /// Accumulator capacity
        capacity: usize,
    },

    /// A scheduler or connectivity interval is zero
    #[error("{timer} interval must be non-zero")]
    ZeroInterval {
        /// Timer name
        timer: &'static str,
    },

    /// Two channels share one ADC pin
    #[error("ADC pin {pin} assigned to more than one channel")]
    DuplicatePin {
        /// Shared pin
        pin: u8,
    },

    /// Device identifier does not fit the payload buffer
    #[error("Device identifier longer than {max} bytes")]
    DeviceIdTooLong {
        /// Maximum length
        max: usize,
    },

    /// Device identifier is empty or contains characters that would need
    /// escaping inside the JSON payload
    #[error("Device identifier must be non-empty [A-Za-z0-9_:-]")]
    InvalidDeviceId,

    /// Topic is empty or too long
    #[error("{topic} topic must be non-empty and at most {max} bytes")]
    InvalidTopic {
        /// Which topic
        topic: &'static str,
        /// Maximum length
        max: usize,
    },

    /// Wall-clock offset is not whole minutes or is beyond ±18 h
    #[error("UTC offset {offset} s must be whole minutes within ±18 h")]
    InvalidUtcOffset {
        /// Configured offset in seconds
        offset: i32,
    },
}

/// Recoverable connectivity fault, kept for observability
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityFault {
    /// Link-layer (WiFi) connect attempt failed
    #[error("Link connect attempt failed")]
    Link,

    /// Broker connect or handshake failed
    #[error("Broker connect attempt failed")]
    Broker,

    /// Transport refused a publish
    #[error("Publish rejected by transport")]
    Publish,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ZeroFullScale =>
                defmt::write!(fmt, "ADC full scale is zero"),
            Self::InvalidReferenceVoltage { vref } =>
                defmt::write!(fmt, "Invalid vref {}", vref),
            Self::ZeroDenominator { channel, term } =>
                defmt::write!(fmt, "{} zero denominator: {}", channel, term),
            Self::NonFiniteCoefficient { channel, term } =>
                defmt::write!(fmt, "{} non-finite: {}", channel, term),
            Self::WindowOutOfRange { requested, capacity } =>
                defmt::write!(fmt, "Window {} outside [1, {}]", requested, capacity),
            Self::AveragingOutOfRange { requested, capacity } =>
                defmt::write!(fmt, "Averaging {} outside [1, {}]", requested, capacity),
            Self::ZeroInterval { timer } =>
                defmt::write!(fmt, "{} interval is zero", timer),
            Self::DuplicatePin { pin } =>
                defmt::write!(fmt, "Pin {} assigned twice", pin),
            Self::DeviceIdTooLong { max } =>
                defmt::write!(fmt, "Device id over {} bytes", max),
            Self::InvalidDeviceId =>
                defmt::write!(fmt, "Invalid device id"),
            Self::InvalidTopic { topic, max } =>
                defmt::write!(fmt, "Invalid {} topic (max {})", topic, max),
            Self::InvalidUtcOffset { offset } =>
                defmt::write!(fmt, "Invalid UTC offset {} s", offset),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectivityFault {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Link => defmt::write!(fmt, "Link connect failed"),
            Self::Broker => defmt::write!(fmt, "Broker connect failed"),
            Self::Publish => defmt::write!(fmt, "Publish rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_channel() {
        let err = ConfigError::ZeroDenominator {
            channel: Channel::Turbidity,
            term: "muddy - clear voltage",
        };
        assert_eq!(
            err.to_string(),
            "turbidity calibration has a zero denominator (muddy - clear voltage)"
        );
    }

    #[test]
    fn window_error_reports_bounds() {
        let err = ConfigError::WindowOutOfRange { requested: 11, capacity: 10 };
        assert_eq!(err.to_string(), "Window size 11 outside [1, 10]");
    }

    #[test]
    fn utc_offset_error_shows_seconds() {
        let err = ConfigError::InvalidUtcOffset { offset: -1 };
        assert_eq!(err.to_string(), "UTC offset -1 s must be whole minutes within ±18 h");
    }
}
