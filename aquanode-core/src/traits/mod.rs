//! Collaborator traits
//!
//! The core owns no hardware and no network stack. Everything it talks to is
//! injected through one of these traits, so the scheduler runs the same way
//! on a microcontroller, on a host simulation and under test doubles.
//!
//! - [`sensor`] - raw ADC access
//! - [`connectivity`] - link, broker and publish
//! - [`time`] - monotonic ticks and wall clock
//!
//! All entry points are non-blocking. A collaborator whose underlying API
//! blocks must be adapted to return immediately (`nb::Error::WouldBlock` for
//! operations still in progress).

pub mod connectivity;
pub mod sensor;
pub mod time;

pub use connectivity::Connectivity;
pub use sensor::SensorSource;
pub use time::{NoWallClock, TimeSource, WallClock};
