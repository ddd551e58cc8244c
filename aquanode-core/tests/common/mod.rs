//! Common test utilities for integration tests
//!
//! This module provides:
//! - A transport wrapper that checks the publish gate on every call
//! - A clock-driven runner collecting per-tick reports
//! - Raw-code scenarios for typical water conditions

#![allow(dead_code)]

use aquanode_core::sim::{LoopbackConnectivity, ScriptedSensors, SimError};
use aquanode_core::time::{ManualClock, Ticks};
use aquanode_core::{Channel, Connectivity, NodeConfig, Scheduler, TickReport, TimeSource};

pub mod scenarios;

/// Loopback transport that counts publishes made while it was actually down
///
/// The gate only learns about a dropped link at its next health check, so a
/// publish can reach a dead transport once. Anything more means the
/// scheduler ignored the gate.
#[derive(Debug, Default)]
pub struct GuardedLink {
    pub inner: LoopbackConnectivity,
    pub stale_publishes: usize,
    calls: usize,
}

impl GuardedLink {
    pub fn new(inner: LoopbackConnectivity) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }
}

impl Connectivity for GuardedLink {
    type Error = SimError;

    fn link_ready(&self) -> bool {
        self.inner.link_ready()
    }

    fn broker_ready(&self) -> bool {
        self.inner.broker_ready()
    }

    fn try_connect_link(&mut self) -> nb::Result<(), SimError> {
        self.inner.try_connect_link()
    }

    fn try_connect_broker(&mut self) -> nb::Result<(), SimError> {
        self.inner.try_connect_broker()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SimError> {
        self.calls += 1;
        if !self.inner.broker_ready() {
            self.stale_publishes += 1;
        }
        self.inner.publish(topic, payload)
    }

    fn poll(&mut self) {
        self.inner.poll();
    }
}

/// Tick reports with the time they were taken at
pub struct Run {
    pub reports: Vec<(Ticks, TickReport)>,
}

impl Run {
    pub fn sample_times(&self) -> Vec<Ticks> {
        self.reports.iter().filter(|(_, r)| r.sampled).map(|(t, _)| *t).collect()
    }

    /// Times at which the publish timer fired, whatever the outcome
    pub fn publish_times(&self) -> Vec<Ticks> {
        self.reports
            .iter()
            .filter(|(_, r)| r.publish.is_some())
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Advance `clock` by `step` until `end` (inclusive), ticking once per step
pub fn run_until<S, C>(
    node: &mut Scheduler<S, C>,
    clock: &mut ManualClock,
    step: u32,
    end: Ticks,
) -> Run
where
    S: aquanode_core::SensorSource,
    C: Connectivity,
{
    let mut reports = Vec::new();
    while clock.now() < end {
        clock.advance(step);
        let now = clock.now();
        reports.push((now, node.tick(now)));
    }
    Run { reports }
}

/// Node with default configuration over scripted sensors and a guarded link
pub fn default_node(sensors: ScriptedSensors) -> Scheduler<ScriptedSensors, GuardedLink> {
    node_with(&NodeConfig::default(), sensors, LoopbackConnectivity::new())
}

pub fn node_with(
    config: &NodeConfig,
    sensors: ScriptedSensors,
    link: LoopbackConnectivity,
) -> Scheduler<ScriptedSensors, GuardedLink> {
    Scheduler::new(config, sensors, GuardedLink::new(link)).expect("valid test config")
}

/// Parse the `n`th recorded payload
pub fn payload_json(link: &GuardedLink, n: usize) -> serde_json::Value {
    serde_json::from_slice(&link.inner.published()[n].payload).expect("payload is JSON")
}

/// Raw code that reads as `volts` at the default 3.3 V / 4095 reference
pub fn code_for(volts: f32) -> u16 {
    (volts / 3.3 * 4095.0).round() as u16
}

pub fn channel_codes(ph: u16, tds: u16, turbidity: u16, temperature: u16) -> ScriptedSensors {
    ScriptedSensors::constant(0)
        .with_value(Channel::Ph, ph)
        .with_value(Channel::Tds, tds)
        .with_value(Channel::Turbidity, turbidity)
        .with_value(Channel::Temperature, temperature)
}
