//! Scheduler and Connectivity Intervals
//!
//! All intervals are milliseconds on the node's monotonic `u32` tick clock,
//! which wraps after roughly 49.7 days.

/// Milliseconds per second.
pub const MS_PER_SECOND: u32 = 1000;

/// Sensor sampling interval (milliseconds).
pub const DEFAULT_SAMPLE_INTERVAL_MS: u32 = 1000;

/// Telemetry publish interval (milliseconds).
pub const DEFAULT_PUBLISH_INTERVAL_MS: u32 = 5000;

/// Link and broker health check interval (milliseconds).
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u32 = 30_000;

/// Minimum spacing between reconnect attempts (milliseconds).
pub const DEFAULT_RECONNECT_BACKOFF_MS: u32 = 5000;

/// Largest accepted wall-clock UTC offset (seconds), UTC-18:00 to UTC+18:00.
pub const MAX_UTC_OFFSET_SECS: i32 = 18 * 3600;
