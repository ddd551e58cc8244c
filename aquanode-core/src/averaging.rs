//! Frame averaging for the averaged publish mode
//!
//! Keeps the calibrated values of the last `samples` frames in its own ring,
//! separate from the pH filter, and publishes their per-channel mean.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::WindowedRing;
use crate::constants::buffers::FRAME_AVERAGING_CAPACITY;
use crate::errors::{ConfigError, ConfigResult};

/// Calibrated value of each channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelValues {
    pub ph: f32,
    pub tds: f32,
    pub turbidity: f32,
    pub temperature: f32,
}

/// Running per-channel mean over the last `samples` frames
#[derive(Debug, Clone)]
pub struct FrameAverager<const N: usize = FRAME_AVERAGING_CAPACITY> {
    ring: WindowedRing<ChannelValues, N>,
}

impl<const N: usize> FrameAverager<N> {
    /// Average over `samples` frames, `1 <= samples <= N`
    pub fn with_samples(samples: usize) -> ConfigResult<Self> {
        let ring = WindowedRing::with_window(samples).map_err(|_| {
            ConfigError::AveragingOutOfRange {
                requested: samples,
                capacity: N,
            }
        })?;
        Ok(Self { ring })
    }

    /// Add a frame, evicting the oldest once `samples` are held
    pub fn push(&mut self, values: ChannelValues) {
        self.ring.push(values);
    }

    /// Per-channel arithmetic mean, `None` before the first frame
    pub fn mean(&self) -> Option<ChannelValues> {
        let count = self.ring.len();
        if count == 0 {
            return None;
        }
        let sum = self.ring.iter().fold(ChannelValues::default(), |acc, v| ChannelValues {
            ph: acc.ph + v.ph,
            tds: acc.tds + v.tds,
            turbidity: acc.turbidity + v.turbidity,
            temperature: acc.temperature + v.temperature,
        });
        let n = count as f32;
        Some(ChannelValues {
            ph: sum.ph / n,
            tds: sum.tds / n,
            turbidity: sum.turbidity / n,
            temperature: sum.temperature / n,
        })
    }

    /// Frames currently held
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Configured sample count
    pub fn samples(&self) -> usize {
        self.ring.window()
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }
}
