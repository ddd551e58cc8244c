//! Fixed-Size Ring with a Logical Window
//!
//! ## Overview
//!
//! Storage for the pH history and the frame averager. Capacity `N` is fixed
//! at compile time; a smaller logical window `w` can be chosen at runtime.
//! Writes wrap modulo `w`, not `N`, so with `w < N` only the first `w` slots
//! are ever touched.
//!
//! ```text
//! WindowedRing<_, 10> with window 4, after 6 pushes (a..f):
//! ┌───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐
//! │ e │ f │ c │ d │ - │ - │ - │ - │ - │ - │
//! └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
//!           ↑
//!           └── write_pos = 2 (oldest entry)
//! ```
//!
//! ## Why Not `heapless::HistoryBuffer`?
//!
//! `HistoryBuffer` always wraps at its full capacity. The smoothing window is
//! a deployment setting, and changing it must restart accumulation, so the
//! window lives next to the cursor here.
//!
//! Unwritten slots are `None` rather than zero: averages are taken over what
//! has actually been pushed since the last reset.

use crate::errors::{ConfigError, ConfigResult};

/// Ring buffer of `Copy` values with a runtime window `1 <= w <= N`
///
/// ## Internal Invariants
///
/// - `1 <= window <= N` (for `N > 0`)
/// - `write_pos < window`
/// - `len <= window`, and slots `>= window` are always `None`
#[derive(Debug, Clone)]
pub struct WindowedRing<T: Copy, const N: usize> {
    data: [Option<T>; N],
    window: usize,
    write_pos: usize,
    len: usize,
}

impl<T: Copy, const N: usize> WindowedRing<T, N> {
    /// Empty ring using its full capacity as the window
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            window: N,
            write_pos: 0,
            len: 0,
        }
    }

    /// Empty ring with a window of `window` slots
    pub fn with_window(window: usize) -> ConfigResult<Self> {
        let mut ring = Self::new();
        ring.configure(window)?;
        Ok(ring)
    }

    /// Change the window and clear all history
    ///
    /// A window outside `[1, N]` is rejected and leaves the ring untouched.
    pub fn configure(&mut self, window: usize) -> ConfigResult<()> {
        if window == 0 || window > N {
            return Err(ConfigError::WindowOutOfRange {
                requested: window,
                capacity: N,
            });
        }
        self.window = window;
        self.clear();
        Ok(())
    }

    /// Store `value`, overwriting the oldest entry once the window is full
    pub fn push(&mut self, value: T) {
        if self.window == 0 {
            return;
        }
        self.data[self.write_pos] = Some(value);
        self.write_pos = (self.write_pos + 1) % self.window;

        if self.len < self.window {
            self.len += 1;
        }
    }

    /// Forget every entry; the window is kept
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Window full: every further push evicts the oldest entry
    pub fn is_full(&self) -> bool {
        self.len == self.window
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recent entry
    pub fn last(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 { self.window - 1 } else { self.write_pos - 1 };
        self.data[idx]
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        // Before the window fills, data starts at slot 0; after, the oldest
        // entry sits at the write cursor.
        let start = if self.len < self.window { 0 } else { self.write_pos };
        (0..self.len).filter_map(move |i| self.data[(start + i) % self.window])
    }
}

impl<T: Copy, const N: usize> Default for WindowedRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring() {
        let ring: WindowedRing<f32, 5> = WindowedRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.window(), 5);
        assert!(ring.last().is_none());
    }

    #[test]
    fn push_and_retrieve() {
        let mut ring = WindowedRing::<f32, 5>::new();
        ring.push(25.0);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.last(), Some(25.0));
    }

    #[test]
    fn circular_overwrite() {
        let mut ring = WindowedRing::<u32, 3>::new();
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        assert!(ring.is_full());

        let values: Vec<u32> = ring.iter().collect();
        assert_eq!(values, vec![2, 3, 4]);
        assert_eq!(ring.last(), Some(4));
    }

    #[test]
    fn window_smaller_than_capacity() {
        let mut ring = WindowedRing::<u32, 10>::with_window(4).unwrap();
        for i in 0..6 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        // Slots past the window are never written
        assert!(ring.data[4..].iter().all(Option::is_none));
    }

    #[test]
    fn configure_clears_history() {
        let mut ring = WindowedRing::<u32, 10>::new();
        ring.push(1);
        ring.push(2);
        ring.configure(3).unwrap();
        assert!(ring.is_empty());
        ring.push(7);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn rejected_window_keeps_state() {
        let mut ring = WindowedRing::<u32, 10>::with_window(5).unwrap();
        ring.push(1);
        assert_eq!(
            ring.configure(11),
            Err(ConfigError::WindowOutOfRange { requested: 11, capacity: 10 })
        );
        assert_eq!(
            ring.configure(0),
            Err(ConfigError::WindowOutOfRange { requested: 0, capacity: 10 })
        );
        assert_eq!(ring.window(), 5);
        assert_eq!(ring.last(), Some(1));
    }
}
