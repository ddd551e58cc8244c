//! pH moving-average filter
//!
//! The pH channel is the noisiest of the four, so its converted values pass
//! through a trailing moving average before publishing. The unsmoothed value
//! of the latest sample stays available for calibration checks.

use crate::buffer::WindowedRing;
use crate::constants::buffers::{DEFAULT_PH_WINDOW, PH_HISTORY_CAPACITY};
use crate::errors::ConfigResult;

/// Trailing moving average over the last `window` pH values
///
/// Until `window` values have been pushed the average covers only the ones
/// pushed so far; empty slots never count as zero.
///
/// ```rust
/// use aquanode_core::PhSmoothingFilter;
///
/// let mut filter: PhSmoothingFilter = PhSmoothingFilter::new();
/// filter.push(7.0);
/// filter.push(7.2);
/// assert!((filter.average() - 7.1).abs() < 1e-6);
/// assert_eq!(filter.raw_latest(), Some(7.2));
/// ```
#[derive(Debug, Clone)]
pub struct PhSmoothingFilter<const N: usize = PH_HISTORY_CAPACITY> {
    history: WindowedRing<f32, N>,
}

impl<const N: usize> PhSmoothingFilter<N> {
    /// Filter using the default window, capped at the capacity
    pub fn new() -> Self {
        let mut history = WindowedRing::new();
        // Only fails for a zero-capacity ring, where new() already uses N
        let _ = history.configure(DEFAULT_PH_WINDOW.min(N));
        Self { history }
    }

    pub fn with_window(window: usize) -> ConfigResult<Self> {
        Ok(Self {
            history: WindowedRing::with_window(window)?,
        })
    }

    /// Change the window. Clears history on success; leaves the filter
    /// untouched when `window` is outside `[1, capacity]`.
    pub fn configure(&mut self, window: usize) -> ConfigResult<()> {
        self.history.configure(window)?;
        log_debug!("pH window set to {}", window);
        Ok(())
    }

    /// Fold in one converted pH value
    pub fn push(&mut self, ph: f32) {
        self.history.push(ph);
    }

    /// Mean of the populated slots, `0.0` before the first push
    pub fn average(&self) -> f32 {
        let count = self.history.len();
        if count == 0 {
            return 0.0;
        }
        self.history.iter().sum::<f32>() / count as f32
    }

    /// Most recent unsmoothed value
    pub fn raw_latest(&self) -> Option<f32> {
        self.history.last()
    }

    /// Samples currently in the average
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn window(&self) -> usize {
        self.history.window()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop history, keep the window
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl<const N: usize> Default for PhSmoothingFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;
    use approx::assert_relative_eq;

    #[test]
    fn defaults() {
        let filter: PhSmoothingFilter = PhSmoothingFilter::new();
        assert_eq!(filter.window(), 5);
        assert_eq!(filter.capacity(), 10);
        assert_eq!(filter.average(), 0.0);
        assert_eq!(filter.raw_latest(), None);
    }

    #[test]
    fn partial_window_averages_pushed_only() {
        let mut filter: PhSmoothingFilter = PhSmoothingFilter::new();
        filter.push(6.0);
        filter.push(8.0);
        assert_eq!(filter.average(), 7.0);
    }

    #[test]
    fn identical_values_average_to_value() {
        let mut filter: PhSmoothingFilter = PhSmoothingFilter::with_window(5).unwrap();
        for _ in 0..5 {
            filter.push(6.8);
        }
        assert_relative_eq!(filter.average(), 6.8, epsilon = 1e-5);
    }

    #[test]
    fn oldest_evicted_after_window() {
        let mut filter: PhSmoothingFilter = PhSmoothingFilter::with_window(3).unwrap();
        for ph in [1.0, 2.0, 3.0, 4.0] {
            filter.push(ph);
        }
        assert_relative_eq!(filter.average(), 3.0);
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn window_one_tracks_latest() {
        let mut filter: PhSmoothingFilter = PhSmoothingFilter::with_window(1).unwrap();
        filter.push(7.4);
        filter.push(6.1);
        assert_eq!(filter.average(), 6.1);
        assert_eq!(filter.raw_latest(), Some(6.1));
    }

    #[test]
    fn reconfigure_restarts_accumulation() {
        let mut filter: PhSmoothingFilter = PhSmoothingFilter::new();
        for ph in [4.0, 4.0, 4.0] {
            filter.push(ph);
        }
        filter.configure(8).unwrap();
        assert_eq!(filter.average(), 0.0);
        filter.push(9.0);
        assert_eq!(filter.average(), 9.0);
    }

    #[test]
    fn out_of_range_window_rejected() {
        let mut filter: PhSmoothingFilter = PhSmoothingFilter::new();
        filter.push(7.0);
        assert_eq!(
            filter.configure(11),
            Err(ConfigError::WindowOutOfRange { requested: 11, capacity: 10 })
        );
        assert_eq!(filter.window(), 5);
        assert_eq!(filter.average(), 7.0);
    }

    #[test]
    fn small_capacity_caps_default_window() {
        let filter = PhSmoothingFilter::<3>::new();
        assert_eq!(filter.window(), 3);
    }
}
