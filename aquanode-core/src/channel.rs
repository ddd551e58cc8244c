//! Sensor channels and their ADC pin assignments

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::adc::{PH_PIN, TDS_PIN, TEMPERATURE_PIN, TURBIDITY_PIN};
use crate::errors::{ConfigError, ConfigResult};

/// One analog input of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// pH probe
    Ph,
    /// Total dissolved solids probe
    Tds,
    /// Turbidity probe
    Turbidity,
    /// Water temperature probe
    Temperature,
}

impl Channel {
    /// All channels, in the order they are read each sampling tick
    pub const ALL: [Channel; 4] = [
        Channel::Ph,
        Channel::Tds,
        Channel::Turbidity,
        Channel::Temperature,
    ];

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ph => "pH",
            Self::Tds => "TDS",
            Self::Turbidity => "turbidity",
            Self::Temperature => "temperature",
        }
    }

    /// Unit of the calibrated value
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Ph => "pH",
            Self::Tds => "ppm",
            Self::Turbidity => "NTU",
            Self::Temperature => "°C",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ADC pin assigned to each channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelMap {
    /// pH input pin
    pub ph: u8,
    /// TDS input pin
    pub tds: u8,
    /// Turbidity input pin
    pub turbidity: u8,
    /// Temperature input pin
    pub temperature: u8,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            ph: PH_PIN,
            tds: TDS_PIN,
            turbidity: TURBIDITY_PIN,
            temperature: TEMPERATURE_PIN,
        }
    }
}

impl ChannelMap {
    /// Pin wired to `channel`
    pub const fn pin(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Ph => self.ph,
            Channel::Tds => self.tds,
            Channel::Turbidity => self.turbidity,
            Channel::Temperature => self.temperature,
        }
    }

    /// Reverse lookup, for ADC drivers that are keyed by pin
    pub fn channel_for_pin(&self, pin: u8) -> Option<Channel> {
        Channel::ALL.into_iter().find(|&ch| self.pin(ch) == pin)
    }

    /// Every channel needs its own pin
    pub fn validate(&self) -> ConfigResult<()> {
        for (i, &a) in Channel::ALL.iter().enumerate() {
            for &b in &Channel::ALL[i + 1..] {
                if self.pin(a) == self.pin(b) {
                    return Err(ConfigError::DuplicatePin { pin: self.pin(a) });
                }
            }
        }
        Ok(())
    }
}
