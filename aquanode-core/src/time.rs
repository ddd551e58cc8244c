//! Time keeping for the cooperative loop
//!
//! The node has two notions of time:
//! - Monotonic ticks: a `u32` millisecond counter started at boot. It wraps
//!   after ~49.7 days, so every comparison goes through [`elapsed`].
//! - Wall clock: Unix seconds, only available once the network has synced
//!   time. Used for payload timestamps and nothing else.

use core::fmt::Write;

use chrono::{DateTime, Datelike, Timelike};
use fugit::MillisDurationU32;

use crate::constants::buffers::TIMESTAMP_CAPACITY;
use crate::traits::{TimeSource, WallClock};

/// Monotonic milliseconds since boot
pub type Ticks = u32;

/// ISO-8601 timestamp text
pub type IsoTimestamp = heapless::String<TIMESTAMP_CAPACITY>;

/// Milliseconds from `since` to `now`, correct across counter rollover
#[inline]
pub const fn elapsed(now: Ticks, since: Ticks) -> u32 {
    now.wrapping_sub(since)
}

/// One periodic timer sharing the loop's clock read
///
/// Fires when at least `interval` has passed since it last fired. A fresh
/// timer counts from tick 0, so the first fire happens one full interval
/// after boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval: MillisDurationU32,
    last: Ticks,
}

impl IntervalTimer {
    pub const fn new(interval: MillisDurationU32) -> Self {
        Self::starting_at(interval, 0)
    }

    pub const fn starting_at(interval: MillisDurationU32, last: Ticks) -> Self {
        Self { interval, last }
    }

    pub const fn interval(&self) -> MillisDurationU32 {
        self.interval
    }

    /// Tick of the last fire (or the start tick)
    pub const fn last(&self) -> Ticks {
        self.last
    }

    pub fn is_due(&self, now: Ticks) -> bool {
        elapsed(now, self.last) >= self.interval.ticks()
    }

    /// Check and re-arm in one step. Returns `true` if the timer fired.
    pub fn poll(&mut self, now: Ticks) -> bool {
        if self.is_due(now) {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Restart the interval from `now` without firing
    pub fn reset(&mut self, now: Ticks) {
        self.last = now;
    }
}

/// Hand-driven clock for tests and simulation
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Ticks,
}

impl ManualClock {
    pub const fn new(now: Ticks) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: Ticks) {
        self.now = now;
    }

    /// Advance, wrapping like a hardware counter
    pub fn advance(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Ticks {
        self.now
    }
}

/// Host monotonic clock
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock {
    boot: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    pub fn new() -> Self {
        Self { boot: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Ticks {
        // Truncation is the rollover a 32-bit hardware counter would have
        self.boot.elapsed().as_millis() as Ticks
    }
}

/// Host wall clock, always synced
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

#[cfg(feature = "std")]
impl WallClock for SystemWallClock {
    fn unix_seconds(&self) -> Option<i64> {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
    }
}

/// Format Unix seconds as `YYYY-MM-DDTHH:MM:SS.000+HH:MM`
///
/// `utc_offset_secs` shifts the local time and is reflected in the suffix.
/// Returns `None` for instants chrono cannot represent.
///
/// ```rust
/// use aquanode_core::time::format_iso8601;
///
/// let ts = format_iso8601(1_700_000_000, 0).unwrap();
/// assert_eq!(ts.as_str(), "2023-11-14T22:13:20.000+00:00");
/// ```
pub fn format_iso8601(unix_secs: i64, utc_offset_secs: i32) -> Option<IsoTimestamp> {
    let local = DateTime::from_timestamp(unix_secs.checked_add(i64::from(utc_offset_secs))?, 0)?;

    let sign = if utc_offset_secs < 0 { '-' } else { '+' };
    let offset_minutes = utc_offset_secs.unsigned_abs() / 60;

    let mut out = IsoTimestamp::new();
    write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.000{}{:02}:{:02}",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second(),
        sign,
        offset_minutes / 60,
        offset_minutes % 60,
    )
    .ok()?;
    Some(out)
}

/// Current wall-clock timestamp, `None` until the clock has synced
pub fn wall_clock_timestamp<W: WallClock>(clock: &W, utc_offset_secs: i32) -> Option<IsoTimestamp> {
    clock
        .unix_seconds()
        .and_then(|secs| format_iso8601(secs, utc_offset_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::ExtU32;

    #[test]
    fn manual_clock_advances() {
        let mut clock = ManualClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);
    }

    #[test]
    fn manual_clock_wraps() {
        let mut clock = ManualClock::new(u32::MAX - 10);
        clock.advance(20);
        assert_eq!(clock.now(), 9);
    }

    #[test]
    fn elapsed_survives_rollover() {
        assert_eq!(elapsed(5, u32::MAX - 4), 10);
        assert_eq!(elapsed(1500, 1000), 500);
    }

    #[test]
    fn timer_fires_after_full_interval() {
        let mut timer = IntervalTimer::new(1000.millis());
        assert!(!timer.poll(999));
        assert!(timer.poll(1000));
        assert!(!timer.poll(1999));
        assert!(timer.poll(2000));
    }

    #[test]
    fn timer_across_rollover() {
        let mut timer = IntervalTimer::starting_at(1000.millis(), u32::MAX - 499);
        assert!(!timer.poll(499));
        assert!(timer.poll(500));
        assert_eq!(timer.last(), 500);
    }

    #[test]
    fn late_poll_rearms_from_now() {
        let mut timer = IntervalTimer::new(1000.millis());
        assert!(timer.poll(3500));
        assert!(!timer.poll(4000));
        assert!(timer.poll(4500));
    }

    #[test]
    fn reset_postpones() {
        let mut timer = IntervalTimer::new(1000.millis());
        timer.reset(800);
        assert!(!timer.is_due(1000));
        assert!(timer.is_due(1800));
    }

    #[test]
    fn iso_format_utc() {
        let ts = format_iso8601(0, 0).unwrap();
        assert_eq!(ts.as_str(), "1970-01-01T00:00:00.000+00:00");
    }

    #[test]
    fn iso_format_with_offset() {
        let ts = format_iso8601(1_700_000_000, -5 * 3600 - 1800).unwrap();
        assert_eq!(ts.as_str(), "2023-11-14T16:43:20.000-05:30");
    }

    #[test]
    fn unsynced_wall_clock_gives_none() {
        struct Unsynced;
        impl WallClock for Unsynced {
            fn unix_seconds(&self) -> Option<i64> {
                None
            }
        }
        assert!(wall_clock_timestamp(&Unsynced, 0).is_none());
    }
}
