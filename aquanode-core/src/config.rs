//! Node configuration
//!
//! Everything a deployment can change lives in [`NodeConfig`]: pin wiring,
//! calibration constants, intervals, smoothing window, publish mode and
//! telemetry identity. It is fixed at startup; the core never mutates it.
//!
//! Under the `serde` feature every type here (de)serializes, so a host can
//! load a deployment from JSON. Intervals are written as plain milliseconds.
//!
//! ```rust
//! use aquanode_core::config::{NodeConfig, PublishMode};
//!
//! let mut config = NodeConfig::default();
//! config.scheduler.publish_mode = PublishMode::Averaged { samples: 5 };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.telemetry.data_topic.as_str(), "reservoir/water_quality/data");
//! ```

use core::fmt::Write;

use fugit::{ExtU32, MillisDurationU32};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::channel::ChannelMap;
use crate::constants::buffers::{
    DEFAULT_PH_WINDOW, DEVICE_ID_CAPACITY, FRAME_AVERAGING_CAPACITY, PH_HISTORY_CAPACITY,
    TOPIC_CAPACITY,
};
use crate::constants::telemetry::{COMMAND_TOPIC, DATA_TOPIC, DEFAULT_DEVICE_ID, DEVICE_ID_PREFIX};
use crate::constants::time::{
    DEFAULT_HEALTH_CHECK_INTERVAL_MS, DEFAULT_PUBLISH_INTERVAL_MS, DEFAULT_RECONNECT_BACKOFF_MS,
    DEFAULT_SAMPLE_INTERVAL_MS, MAX_UTC_OFFSET_SECS,
};
use crate::errors::{ConfigError, ConfigResult};

/// Device identifier text
pub type DeviceId = heapless::String<DEVICE_ID_CAPACITY>;

/// MQTT topic text
pub type Topic = heapless::String<TOPIC_CAPACITY>;

/// What each publish tick sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PublishMode {
    /// The most recent frame
    #[default]
    Latest,
    /// Per-channel mean of the last `samples` frames
    Averaged { samples: usize },
}

/// Loop cadence and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SchedulerConfig {
    #[cfg_attr(feature = "serde", serde(with = "millis"))]
    pub sample_interval: MillisDurationU32,
    #[cfg_attr(feature = "serde", serde(with = "millis"))]
    pub publish_interval: MillisDurationU32,
    /// pH moving-average window
    pub ph_window: usize,
    pub publish_mode: PublishMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL_MS.millis(),
            publish_interval: DEFAULT_PUBLISH_INTERVAL_MS.millis(),
            ph_window: DEFAULT_PH_WINDOW,
            publish_mode: PublishMode::Latest,
        }
    }
}

/// Connectivity maintenance cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectivityConfig {
    #[cfg_attr(feature = "serde", serde(with = "millis"))]
    pub health_check_interval: MillisDurationU32,
    #[cfg_attr(feature = "serde", serde(with = "millis"))]
    pub reconnect_backoff: MillisDurationU32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL_MS.millis(),
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF_MS.millis(),
        }
    }
}

/// Identity and addressing of published telemetry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TelemetryConfig {
    pub device_id: DeviceId,
    /// Readings, published retained
    pub data_topic: Topic,
    /// Operator commands, subscribed by the transport
    pub command_topic: Topic,
    /// Offset applied to wall-clock timestamps (seconds east of UTC),
    /// whole minutes only
    pub utc_offset_secs: i32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            device_id: truncated(DEFAULT_DEVICE_ID),
            data_topic: truncated(DATA_TOPIC),
            command_topic: truncated(COMMAND_TOPIC),
            utc_offset_secs: 0,
        }
    }
}

impl TelemetryConfig {
    /// Defaults with the identifier derived from a MAC address
    pub fn for_mac(mac: [u8; 6]) -> Self {
        Self {
            device_id: device_id_from_mac(mac),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let id = self.device_id.as_str();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b"_:-".contains(&b)) {
            return Err(ConfigError::InvalidDeviceId);
        }
        for (name, topic) in [("data", &self.data_topic), ("command", &self.command_topic)] {
            if topic.is_empty() {
                return Err(ConfigError::InvalidTopic { topic: name, max: TOPIC_CAPACITY });
            }
        }
        let offset = self.utc_offset_secs;
        if offset % 60 != 0 || offset.unsigned_abs() > MAX_UTC_OFFSET_SECS.unsigned_abs() {
            return Err(ConfigError::InvalidUtcOffset { offset });
        }
        Ok(())
    }
}

/// Full deployment configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeConfig {
    pub channels: ChannelMap,
    pub calibration: Calibration,
    pub scheduler: SchedulerConfig,
    pub connectivity: ConnectivityConfig,
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    /// Check every startup invariant, returning the first violation
    pub fn validate(&self) -> ConfigResult<()> {
        self.channels.validate()?;
        self.calibration.validate()?;

        let s = &self.scheduler;
        nonzero(s.sample_interval, "sample")?;
        nonzero(s.publish_interval, "publish")?;
        if s.ph_window == 0 || s.ph_window > PH_HISTORY_CAPACITY {
            return Err(ConfigError::WindowOutOfRange {
                requested: s.ph_window,
                capacity: PH_HISTORY_CAPACITY,
            });
        }
        if let PublishMode::Averaged { samples } = s.publish_mode {
            if samples == 0 || samples > FRAME_AVERAGING_CAPACITY {
                return Err(ConfigError::AveragingOutOfRange {
                    requested: samples,
                    capacity: FRAME_AVERAGING_CAPACITY,
                });
            }
        }

        nonzero(self.connectivity.health_check_interval, "health check")?;
        nonzero(self.connectivity.reconnect_backoff, "reconnect backoff")?;

        self.telemetry.validate()
    }
}

fn nonzero(interval: MillisDurationU32, timer: &'static str) -> ConfigResult<()> {
    if interval.ticks() == 0 {
        Err(ConfigError::ZeroInterval { timer })
    } else {
        Ok(())
    }
}

/// `ESP32_` followed by the last three MAC octets in upper-case hex
///
/// ```rust
/// use aquanode_core::config::device_id_from_mac;
///
/// let id = device_id_from_mac([0x24, 0x6f, 0x28, 0xa1, 0xb2, 0x0c]);
/// assert_eq!(id.as_str(), "ESP32_A1B20C");
/// ```
pub fn device_id_from_mac(mac: [u8; 6]) -> DeviceId {
    let mut id = truncated(DEVICE_ID_PREFIX);
    // 6 + 6 bytes always fits
    let _ = write!(id, "{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

/// Copy `s` into a fixed string, dropping what does not fit
fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Check a device id against the payload limits before storing it
pub fn device_id(s: &str) -> ConfigResult<DeviceId> {
    if s.len() > DEVICE_ID_CAPACITY {
        return Err(ConfigError::DeviceIdTooLong { max: DEVICE_ID_CAPACITY });
    }
    Ok(truncated(s))
}

/// Check a topic name against the buffer limit before storing it
pub fn topic(name: &'static str, s: &str) -> ConfigResult<Topic> {
    if s.is_empty() || s.len() > TOPIC_CAPACITY {
        return Err(ConfigError::InvalidTopic { topic: name, max: TOPIC_CAPACITY });
    }
    Ok(truncated(s))
}

/// `MillisDurationU32` as a plain integer of milliseconds
#[cfg(feature = "serde")]
mod millis {
    use fugit::MillisDurationU32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &MillisDurationU32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(d.ticks())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<MillisDurationU32, D::Error> {
        u32::deserialize(d).map(MillisDurationU32::from_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{PhModel, TemperatureModel};

    #[test]
    fn defaults_match_deployed_unit() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.sample_interval.ticks(), 1000);
        assert_eq!(config.scheduler.publish_interval.ticks(), 5000);
        assert_eq!(config.connectivity.health_check_interval.ticks(), 30_000);
        assert_eq!(config.connectivity.reconnect_backoff.ticks(), 5000);
        assert_eq!(config.scheduler.ph_window, 5);
        assert_eq!(config.telemetry.command_topic.as_str(), "reservoir/water_quality/commands");
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = NodeConfig::default();
        config.scheduler.sample_interval = 0.millis();
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval { timer: "sample" }));

        let mut config = NodeConfig::default();
        config.connectivity.reconnect_backoff = 0.millis();
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroInterval { timer: "reconnect backoff" })
        );
    }

    #[test]
    fn averaging_bounds() {
        let mut config = NodeConfig::default();
        config.scheduler.publish_mode = PublishMode::Averaged { samples: 17 };
        assert_eq!(
            config.validate(),
            Err(ConfigError::AveragingOutOfRange { requested: 17, capacity: 16 })
        );
    }

    #[test]
    fn device_id_rules() {
        assert_eq!(
            device_id("ESP32_ABCDEF_0123456789"),
            Err(ConfigError::DeviceIdTooLong { max: 20 })
        );

        let mut config = NodeConfig::default();
        config.telemetry.device_id = device_id("bad id").unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidDeviceId));

        config.telemetry.device_id = DeviceId::new();
        assert_eq!(config.validate(), Err(ConfigError::InvalidDeviceId));
    }

    #[test]
    fn utc_offset_in_whole_minutes() {
        let mut config = NodeConfig::default();
        for offset in [-1, 30, 3601, -19_799] {
            config.telemetry.utc_offset_secs = offset;
            assert_eq!(config.validate(), Err(ConfigError::InvalidUtcOffset { offset }));
        }
        config.telemetry.utc_offset_secs = 18 * 3600 + 60;
        assert!(config.validate().is_err());

        for offset in [0, 3600, 19_800, -12_600, -18 * 3600] {
            config.telemetry.utc_offset_secs = offset;
            assert!(config.validate().is_ok(), "{offset}");
        }
    }

    #[test]
    fn mac_derived_identity() {
        let telemetry = TelemetryConfig::for_mac([0, 0, 0, 0x01, 0x02, 0xff]);
        assert_eq!(telemetry.device_id.as_str(), "ESP32_0102FF");
        assert!(telemetry.validate().is_ok());
    }

    #[test]
    fn topic_limits() {
        assert!(topic("data", "").is_err());
        assert!(topic("data", &"t".repeat(65)).is_err());
        assert_eq!(topic("data", "a/b").unwrap().as_str(), "a/b");
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{
            "calibration": {
                "adc": { "vref": 3.3, "full_scale": 4095 },
                "ph": { "neutral_anchor": { "neutral_voltage": 1.65, "slope": -0.18, "offset": 0.1 } },
                "tds": { "temperature_coefficient": 0.02, "calibration_factor": 0.5,
                         "compensation": { "fixed_temperature": 18.0 } },
                "turbidity": { "clear_voltage": 2.8, "clear_ntu": 0.0,
                               "muddy_voltage": 1.0, "muddy_ntu": 1000.0 },
                "temperature": { "two_point": { "low_voltage": 0.6, "low_celsius": 30.0,
                                                "high_voltage": 0.84, "high_celsius": 45.0 } }
            },
            "scheduler": { "sample_interval": 2000, "publish_interval": 10000,
                           "ph_window": 8, "publish_mode": { "averaged": { "samples": 5 } } }
        }"#;
        let config: NodeConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.sample_interval.ticks(), 2000);
        assert_eq!(config.scheduler.publish_mode, PublishMode::Averaged { samples: 5 });
        assert!(matches!(config.calibration.ph, PhModel::NeutralAnchor { .. }));
        assert_eq!(config.calibration.temperature, TemperatureModel::two_point());
        assert_eq!(config.channels, ChannelMap::default());
    }

    #[test]
    fn json_round_trip_keeps_millis() {
        let config = NodeConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"publish_interval\":5000"));
        let back: NodeConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
