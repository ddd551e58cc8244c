//! Time Source Abstraction
//!
//! Two clocks with different guarantees:
//!
//! - [`TimeSource`]: monotonic millisecond ticks from a hardware timer. Always
//!   available, wraps at `u32::MAX`, drives every timer in the scheduler.
//! - [`WallClock`]: calendar time after network sync. Optional; only used to
//!   stamp payloads.

use crate::time::Ticks;

/// Monotonic millisecond counter
///
/// ## Implementation Requirements
///
/// - Never goes backwards, except by wrapping past `u32::MAX`
/// - One tick is one millisecond
/// - Cheap enough to read every loop iteration
pub trait TimeSource {
    /// Current tick count
    fn now(&self) -> Ticks;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Ticks {
        (**self).now()
    }
}

/// Calendar clock, typically set over SNTP
pub trait WallClock {
    /// Seconds since the Unix epoch, `None` until synced
    fn unix_seconds(&self) -> Option<i64>;
}

/// Wall clock for nodes without time sync; payloads carry tick counts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWallClock;

impl WallClock for NoWallClock {
    fn unix_seconds(&self) -> Option<i64> {
        None
    }
}
