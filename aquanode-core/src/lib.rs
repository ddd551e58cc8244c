//! Signal-conditioning and scheduling core for a water-quality telemetry node
//!
//! Samples four analog probes (pH, TDS, turbidity, temperature), converts
//! raw ADC codes into calibrated units, smooths the pH channel and publishes
//! readings on a fixed cadence, all from a single cooperative loop.
//!
//! Key constraints:
//! - Runs on a microcontroller without an allocator
//! - No operation blocks; transports are polled
//! - Calibration is fixed per deployment and checked once at startup
//!
//! ```rust
//! use aquanode_core::sim::{LoopbackConnectivity, ScriptedSensors};
//! use aquanode_core::{NodeConfig, PublishOutcome, Scheduler};
//!
//! let config = NodeConfig::default();
//! let mut node = Scheduler::new(&config, ScriptedSensors::constant(1960), LoopbackConnectivity::new())?;
//!
//! let mut sent = 0;
//! for now in (0..=10_000).step_by(250) {
//!     if node.tick(now).publish == Some(PublishOutcome::Sent) {
//!         sent += 1;
//!     }
//! }
//! assert_eq!(sent, 2);
//! # Ok::<(), aquanode_core::ConfigError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod averaging;
pub mod buffer;
pub mod calibration;
pub mod channel;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod frame;
pub mod payload;
pub mod scheduler;
pub mod time;
pub mod traits;

#[cfg(feature = "sim")]
pub mod sim;

// Public API
pub use calibration::Calibration;
pub use channel::{Channel, ChannelMap};
pub use config::{NodeConfig, PublishMode};
pub use connectivity::{ConnectivityGate, GateState, Transition};
pub use errors::{ConfigError, ConfigResult, ConnectivityFault};
pub use filter::PhSmoothingFilter;
pub use frame::{SensorFrame, SignalChain};
pub use payload::{TelemetryPayload, Timestamp};
pub use scheduler::{PublishOutcome, Scheduler, SchedulerStats, TickReport};
pub use traits::{Connectivity, SensorSource, TimeSource, WallClock};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
