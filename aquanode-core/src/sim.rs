//! In-memory collaborators for tests and host simulation
//!
//! - [`ScriptedSensors`]: fixed or scripted raw codes per channel
//! - [`LoopbackConnectivity`]: a transport whose link and broker can be
//!   taken down, delayed or made to refuse publishes; records every payload
//! - [`SimulatedWallClock`]: a wall clock that can be unsynced
//!
//! ```rust
//! use aquanode_core::sim::{LoopbackConnectivity, ScriptedSensors};
//! use aquanode_core::{Channel, Connectivity, SensorSource};
//!
//! let mut sensors = ScriptedSensors::constant(100).with_sequence(Channel::Ph, &[1, 2]);
//! assert_eq!(sensors.read_raw(Channel::Ph), 1);
//! assert_eq!(sensors.read_raw(Channel::Ph), 2);
//! assert_eq!(sensors.read_raw(Channel::Ph), 2);
//! assert_eq!(sensors.read_raw(Channel::Tds), 100);
//!
//! let mut link = LoopbackConnectivity::new();
//! assert!(link.try_connect_link().is_ok());
//! ```

use thiserror_no_std::Error;

use crate::channel::Channel;
use crate::traits::{Connectivity, SensorSource, WallClock};

/// Failure reported by [`LoopbackConnectivity`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("link unavailable")]
    LinkUnavailable,

    #[error("broker unavailable")]
    BrokerUnavailable,

    #[error("not connected to broker")]
    NotConnected,

    #[error("publish rejected")]
    PublishRejected,
}

#[derive(Debug, Clone, Default)]
struct Script {
    value: u16,
    sequence: Vec<u16>,
    cursor: usize,
    reads: usize,
}

impl Script {
    fn next(&mut self) -> u16 {
        self.reads += 1;
        match self.sequence.get(self.cursor) {
            Some(&code) => {
                self.cursor += 1;
                self.value = code;
                code
            }
            None => self.value,
        }
    }
}

/// Sensor source with per-channel scripted codes
///
/// A channel plays its sequence once, then holds the last code.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensors {
    scripts: [Script; 4],
    record_reads: bool,
    read_log: Vec<Channel>,
}

fn slot(channel: Channel) -> usize {
    match channel {
        Channel::Ph => 0,
        Channel::Tds => 1,
        Channel::Turbidity => 2,
        Channel::Temperature => 3,
    }
}

impl ScriptedSensors {
    /// Every channel returns `code`
    pub fn constant(code: u16) -> Self {
        let mut sensors = Self::default();
        for script in &mut sensors.scripts {
            script.value = code;
        }
        sensors
    }

    pub fn with_value(mut self, channel: Channel, code: u16) -> Self {
        self.set(channel, code);
        self
    }

    /// Keep every read in [`read_log`](Self::read_log); off by default
    pub fn record_reads(mut self) -> Self {
        self.record_reads = true;
        self
    }

    pub fn with_sequence(mut self, channel: Channel, codes: &[u16]) -> Self {
        let script = &mut self.scripts[slot(channel)];
        script.sequence = codes.to_vec();
        script.cursor = 0;
        self
    }

    /// Replace the held code and drop any remaining sequence
    pub fn set(&mut self, channel: Channel, code: u16) {
        let script = &mut self.scripts[slot(channel)];
        script.value = code;
        script.sequence.clear();
        script.cursor = 0;
    }

    /// Reads served for `channel`
    pub fn reads(&self, channel: Channel) -> usize {
        self.scripts[slot(channel)].reads
    }

    /// Every read since [`record_reads`](Self::record_reads), in order
    pub fn read_log(&self) -> &[Channel] {
        &self.read_log
    }
}

impl SensorSource for ScriptedSensors {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        if self.record_reads {
            self.read_log.push(channel);
        }
        self.scripts[slot(channel)].next()
    }
}

/// A payload handed to [`LoopbackConnectivity::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Published {
    pub fn payload_str(&self) -> &str {
        core::str::from_utf8(&self.payload).unwrap_or("")
    }
}

/// In-memory transport
#[derive(Debug, Clone)]
pub struct LoopbackConnectivity {
    link_available: bool,
    broker_available: bool,
    link_up: bool,
    broker_up: bool,
    connect_delay: u32,
    delay_remaining: u32,
    reject_publishes: bool,
    published: Vec<Published>,
    publish_calls: usize,
    link_connect_calls: usize,
    broker_connect_calls: usize,
    polls: usize,
}

impl Default for LoopbackConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackConnectivity {
    /// Link and broker reachable; connects succeed on the first call
    pub fn new() -> Self {
        Self {
            link_available: true,
            broker_available: true,
            link_up: false,
            broker_up: false,
            connect_delay: 0,
            delay_remaining: 0,
            reject_publishes: false,
            published: Vec::new(),
            publish_calls: 0,
            link_connect_calls: 0,
            broker_connect_calls: 0,
            polls: 0,
        }
    }

    /// Nothing reachable until made available
    pub fn offline() -> Self {
        Self {
            link_available: false,
            broker_available: false,
            ..Self::new()
        }
    }

    /// Each connect reports `WouldBlock` `calls` times before resolving
    pub fn with_connect_delay(mut self, calls: u32) -> Self {
        self.connect_delay = calls;
        self.delay_remaining = calls;
        self
    }

    /// Taking the link away also drops an established session
    pub fn set_link_available(&mut self, available: bool) {
        self.link_available = available;
        if !available {
            self.drop_link();
        }
    }

    pub fn set_broker_available(&mut self, available: bool) {
        self.broker_available = available;
        if !available {
            self.broker_up = false;
        }
    }

    /// Lose the link (and with it the broker session) once
    pub fn drop_link(&mut self) {
        self.link_up = false;
        self.broker_up = false;
    }

    pub fn drop_broker(&mut self) {
        self.broker_up = false;
    }

    /// Refuse every publish while set
    pub fn fail_publishes(&mut self, fail: bool) {
        self.reject_publishes = fail;
    }

    pub fn published(&self) -> &[Published] {
        &self.published
    }

    /// Calls to `publish`, accepted or not
    pub fn publish_calls(&self) -> usize {
        self.publish_calls
    }

    pub fn link_connect_calls(&self) -> usize {
        self.link_connect_calls
    }

    pub fn broker_connect_calls(&self) -> usize {
        self.broker_connect_calls
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    fn resolve(&mut self, available: bool, unavailable: SimError) -> nb::Result<(), SimError> {
        if !available {
            self.delay_remaining = self.connect_delay;
            return Err(nb::Error::Other(unavailable));
        }
        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.delay_remaining = self.connect_delay;
        Ok(())
    }
}

impl Connectivity for LoopbackConnectivity {
    type Error = SimError;

    fn link_ready(&self) -> bool {
        self.link_up
    }

    fn broker_ready(&self) -> bool {
        self.link_up && self.broker_up
    }

    fn try_connect_link(&mut self) -> nb::Result<(), SimError> {
        self.link_connect_calls += 1;
        if self.link_up {
            return Ok(());
        }
        self.resolve(self.link_available, SimError::LinkUnavailable)?;
        self.link_up = true;
        Ok(())
    }

    fn try_connect_broker(&mut self) -> nb::Result<(), SimError> {
        self.broker_connect_calls += 1;
        if self.broker_ready() {
            return Ok(());
        }
        if !self.link_up {
            return Err(nb::Error::Other(SimError::LinkUnavailable));
        }
        self.resolve(self.broker_available, SimError::BrokerUnavailable)?;
        self.broker_up = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SimError> {
        self.publish_calls += 1;
        if !self.broker_ready() {
            return Err(SimError::NotConnected);
        }
        if self.reject_publishes {
            return Err(SimError::PublishRejected);
        }
        self.published.push(Published {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn poll(&mut self) {
        self.polls += 1;
    }
}

/// Wall clock under test control
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedWallClock {
    unix_seconds: Option<i64>,
}

impl SimulatedWallClock {
    pub const fn unsynced() -> Self {
        Self { unix_seconds: None }
    }

    pub const fn synced_at(unix_seconds: i64) -> Self {
        Self { unix_seconds: Some(unix_seconds) }
    }

    pub fn sync(&mut self, unix_seconds: i64) {
        self.unix_seconds = Some(unix_seconds);
    }

    /// No effect while unsynced
    pub fn advance(&mut self, seconds: i64) {
        if let Some(now) = self.unix_seconds.as_mut() {
            *now += seconds;
        }
    }
}

impl WallClock for SimulatedWallClock {
    fn unix_seconds(&self) -> Option<i64> {
        self.unix_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delayed_connect_resolves() {
        let mut link = LoopbackConnectivity::new().with_connect_delay(2);
        assert_eq!(link.try_connect_link(), Err(nb::Error::WouldBlock));
        assert_eq!(link.try_connect_link(), Err(nb::Error::WouldBlock));
        assert_eq!(link.try_connect_link(), Ok(()));
        assert!(link.link_ready());
        assert!(!link.broker_ready());
    }

    #[test]
    fn offline_refuses() {
        let mut link = LoopbackConnectivity::offline();
        assert_eq!(
            link.try_connect_link(),
            Err(nb::Error::Other(SimError::LinkUnavailable))
        );
        assert_eq!(link.publish("t", b"x"), Err(SimError::NotConnected));
        assert_eq!(link.publish_calls(), 1);
    }

    #[test]
    fn dropping_link_drops_broker() {
        let mut link = LoopbackConnectivity::new();
        link.try_connect_link().unwrap();
        link.try_connect_broker().unwrap();
        assert!(link.broker_ready());
        link.drop_link();
        assert!(!link.broker_ready());
    }

    #[test]
    fn records_payloads() {
        let mut link = LoopbackConnectivity::new();
        link.try_connect_link().unwrap();
        link.try_connect_broker().unwrap();
        link.publish("a/b", b"{}").unwrap();
        assert_eq!(link.published()[0].topic, "a/b");
        assert_eq!(link.published()[0].payload_str(), "{}");
    }

    #[test]
    fn read_log_keeps_order() {
        let mut sensors = ScriptedSensors::constant(7).record_reads();
        for channel in Channel::ALL {
            sensors.read_raw(channel);
        }
        assert_eq!(sensors.read_log(), &Channel::ALL);
        assert_eq!(sensors.reads(Channel::Turbidity), 1);
    }

    #[test]
    fn reads_not_logged_unless_asked() {
        let mut sensors = ScriptedSensors::constant(7);
        for _ in 0..10_000 {
            for channel in Channel::ALL {
                sensors.read_raw(channel);
            }
        }
        assert!(sensors.read_log().is_empty());
        assert_eq!(sensors.reads(Channel::Ph), 10_000);
    }

    #[test]
    fn wall_clock_sync() {
        let mut clock = SimulatedWallClock::unsynced();
        clock.advance(10);
        assert_eq!(clock.unix_seconds(), None);
        clock.sync(100);
        clock.advance(5);
        assert_eq!(clock.unix_seconds(), Some(105));
    }
}
