//! Buffer Sizes
//!
//! Every buffer in the core is fixed at compile time. Sizes are picked so
//! the whole scheduler state fits in a few hundred bytes of RAM.

/// Slots in the pH smoothing ring.
pub const PH_HISTORY_CAPACITY: usize = 10;

/// pH moving-average window used until configured otherwise.
pub const DEFAULT_PH_WINDOW: usize = 5;

/// Frames the averaging publish mode can accumulate.
pub const FRAME_AVERAGING_CAPACITY: usize = 16;

/// Encoded JSON payload.
///
/// Longest payload is about 150 bytes: a 20-byte device id, a 29-byte
/// timestamp and four numbers.
pub const PAYLOAD_CAPACITY: usize = 256;

/// ISO-8601 timestamp string.
pub const TIMESTAMP_CAPACITY: usize = 32;

/// Device identifier.
pub const DEVICE_ID_CAPACITY: usize = 20;

/// MQTT topic name.
pub const TOPIC_CAPACITY: usize = 64;
