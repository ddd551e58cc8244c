//! Raw sensor access

use crate::channel::Channel;

/// Source of raw ADC codes
///
/// Called once per channel per sampling tick, in [`Channel::ALL`] order.
/// Implementations return the latest conversion and must not wait for a new
/// one. Codes above the configured full scale are passed through; the
/// calibration math handles them.
///
/// ```rust
/// use aquanode_core::{Channel, SensorSource};
///
/// struct MidScale;
///
/// impl SensorSource for MidScale {
///     fn read_raw(&mut self, _channel: Channel) -> u16 {
///         2048
///     }
/// }
/// ```
pub trait SensorSource {
    /// Latest raw code for `channel`
    fn read_raw(&mut self, channel: Channel) -> u16;
}

impl<T: SensorSource + ?Sized> SensorSource for &mut T {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        (**self).read_raw(channel)
    }
}
