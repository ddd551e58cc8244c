//! Cooperative Scheduler
//!
//! ## Overview
//!
//! One thread, no interrupts-as-tasks, no blocking. Each call to
//! [`Scheduler::tick`] runs one iteration against a single clock read:
//!
//! ```text
//! now ──▶ 1. gate.step(now)             always, own health/backoff timers
//!     ──▶ 2. sample timer due?          read, convert, filter, keep frame
//!     ──▶ 3. publish timer due?         if Ready: encode, hand to transport
//! ```
//!
//! All four timers (sample, publish, health check, reconnect backoff)
//! compare `now - last >= interval` with wrapping subtraction, so counter
//! rollover needs no special handling.
//!
//! A failed or skipped publish is never retried within the iteration; the
//! next publish tick is the retry.
//!
//! ## Example
//!
//! ```rust
//! use aquanode_core::sim::{LoopbackConnectivity, ScriptedSensors};
//! use aquanode_core::{NodeConfig, Scheduler};
//!
//! let config = NodeConfig::default();
//! let mut node = Scheduler::new(&config, ScriptedSensors::constant(2048), LoopbackConnectivity::new())
//!     .unwrap();
//!
//! for now in (1000..=12_000).step_by(1000) {
//!     node.tick(now);
//! }
//! assert_eq!(node.stats().samples, 12);
//! assert_eq!(node.link().published().len(), 2);
//! ```

use crate::averaging::FrameAverager;
use crate::config::{NodeConfig, PublishMode, TelemetryConfig};
use crate::connectivity::{ConnectivityGate, GateState, Transition};
use crate::errors::ConfigResult;
use crate::filter::PhSmoothingFilter;
use crate::frame::{SensorFrame, SignalChain};
use crate::payload::{TelemetryPayload, Timestamp};
use crate::time::{wall_clock_timestamp, IntervalTimer, Ticks};
use crate::traits::{Connectivity, NoWallClock, SensorSource, TimeSource, WallClock};

/// Result of a publish tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishOutcome {
    /// Transport accepted the payload
    Sent,
    /// Transport refused the payload
    Failed,
    /// Gate not `Ready`; publish not attempted
    NotReady(GateState),
    /// Nothing sampled yet
    NoFrame,
    /// Payload did not fit its buffer
    EncodeFailed,
}

/// What one iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub sampled: bool,
    /// `Some` when the publish timer fired
    pub publish: Option<PublishOutcome>,
    pub transition: Option<Transition>,
}

/// Counters for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerStats {
    pub ticks: u32,
    pub samples: u32,
    pub publish_attempts: u32,
    pub publish_successes: u32,
    pub publish_failures: u32,
    pub skipped_not_ready: u32,
    pub skipped_no_frame: u32,
    pub encode_failures: u32,
}

/// The node's main loop state
///
/// Owns the sensor source, the transport and every piece of mutable state
/// (current frame, pH history, gate timers). Nothing is shared, so nothing
/// is locked.
pub struct Scheduler<S, C, W = NoWallClock> {
    source: S,
    link: C,
    wall_clock: W,
    chain: SignalChain,
    gate: ConnectivityGate,
    sample_timer: IntervalTimer,
    publish_timer: IntervalTimer,
    averager: Option<FrameAverager>,
    current: Option<SensorFrame>,
    telemetry: TelemetryConfig,
    stats: SchedulerStats,
}

impl<S: SensorSource, C: Connectivity> Scheduler<S, C, NoWallClock> {
    /// Validate `config` and build a scheduler with all timers starting at tick 0
    pub fn new(config: &NodeConfig, source: S, link: C) -> ConfigResult<Self> {
        config.validate()?;

        let sched = &config.scheduler;
        let averager = match sched.publish_mode {
            PublishMode::Latest => None,
            PublishMode::Averaged { samples } => Some(FrameAverager::with_samples(samples)?),
        };
        let filter = PhSmoothingFilter::with_window(sched.ph_window)?;

        log_info!(
            "scheduler: sample every {} ms, publish every {} ms as {}",
            sched.sample_interval.ticks(),
            sched.publish_interval.ticks(),
            config.telemetry.device_id
        );

        Ok(Self {
            source,
            link,
            wall_clock: NoWallClock,
            chain: SignalChain::new(config.calibration, filter),
            gate: ConnectivityGate::new(
                config.connectivity.health_check_interval,
                config.connectivity.reconnect_backoff,
            ),
            sample_timer: IntervalTimer::new(sched.sample_interval),
            publish_timer: IntervalTimer::new(sched.publish_interval),
            averager,
            current: None,
            telemetry: config.telemetry.clone(),
            stats: SchedulerStats::default(),
        })
    }
}

impl<S, C, W> Scheduler<S, C, W> {
    /// Stamp payloads with wall-clock time once `clock` has synced
    pub fn with_wall_clock<W2: WallClock>(self, clock: W2) -> Scheduler<S, C, W2> {
        Scheduler {
            source: self.source,
            link: self.link,
            wall_clock: clock,
            chain: self.chain,
            gate: self.gate,
            sample_timer: self.sample_timer,
            publish_timer: self.publish_timer,
            averager: self.averager,
            current: self.current,
            telemetry: self.telemetry,
            stats: self.stats,
        }
    }

    /// Most recent frame
    pub fn current_frame(&self) -> Option<&SensorFrame> {
        self.current.as_ref()
    }

    pub fn gate(&self) -> &ConnectivityGate {
        &self.gate
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn ph_filter(&self) -> &PhSmoothingFilter {
        self.chain.ph_filter()
    }

    /// Change the pH window; clears pH history on success
    pub fn set_ph_window(&mut self, window: usize) -> ConfigResult<()> {
        self.chain.ph_filter_mut().configure(window)
    }

    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn link(&self) -> &C {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut C {
        &mut self.link
    }

    pub fn wall_clock(&self) -> &W {
        &self.wall_clock
    }

    pub fn wall_clock_mut(&mut self) -> &mut W {
        &mut self.wall_clock
    }

    /// Take the collaborators back
    pub fn into_parts(self) -> (S, C, W) {
        (self.source, self.link, self.wall_clock)
    }
}

impl<S, C, W> Scheduler<S, C, W>
where
    S: SensorSource,
    C: Connectivity,
    W: WallClock,
{
    /// Run one iteration at `now`
    pub fn tick(&mut self, now: Ticks) -> TickReport {
        self.stats.ticks = self.stats.ticks.wrapping_add(1);

        let transition = self.gate.step(now, &mut self.link);

        let sampled = self.sample_timer.poll(now);
        if sampled {
            let frame = self.chain.sample(&mut self.source, now);
            if let Some(averager) = self.averager.as_mut() {
                averager.push(frame.values());
            }
            self.current = Some(frame);
            self.stats.samples = self.stats.samples.wrapping_add(1);
        }

        let publish = self.publish_timer.poll(now).then(|| self.publish(now));

        TickReport {
            sampled,
            publish,
            transition,
        }
    }

    /// Firmware entry point: tick forever, one clock read per iteration
    pub fn run<T: TimeSource>(&mut self, clock: &T) -> ! {
        loop {
            self.tick(clock.now());
        }
    }

    fn publish(&mut self, now: Ticks) -> PublishOutcome {
        let state = self.gate.state();
        if !state.is_ready() {
            self.stats.skipped_not_ready = self.stats.skipped_not_ready.wrapping_add(1);
            log_warn!("publish skipped at {}: {}", now, state);
            return PublishOutcome::NotReady(state);
        }

        let values = match (&self.averager, &self.current) {
            (Some(averager), _) => averager.mean(),
            (None, Some(frame)) => Some(frame.values()),
            (None, None) => None,
        };
        let Some(values) = values else {
            self.stats.skipped_no_frame = self.stats.skipped_no_frame.wrapping_add(1);
            log_debug!("publish skipped at {}: no frame yet", now);
            return PublishOutcome::NoFrame;
        };

        let timestamp = match wall_clock_timestamp(&self.wall_clock, self.telemetry.utc_offset_secs) {
            Some(iso) => Timestamp::WallClock(iso),
            None => Timestamp::Ticks(now),
        };
        let payload = TelemetryPayload::new(&self.telemetry.device_id, timestamp, values);
        let Ok(json) = payload.encode() else {
            self.stats.encode_failures = self.stats.encode_failures.wrapping_add(1);
            log_warn!("payload for {} exceeds buffer", self.telemetry.device_id);
            return PublishOutcome::EncodeFailed;
        };

        self.stats.publish_attempts = self.stats.publish_attempts.wrapping_add(1);
        match self.link.publish(&self.telemetry.data_topic, json.as_bytes()) {
            Ok(()) => {
                self.stats.publish_successes = self.stats.publish_successes.wrapping_add(1);
                self.gate.record_publish(true);
                log_info!("published {}", json);
                PublishOutcome::Sent
            }
            Err(_e) => {
                self.stats.publish_failures = self.stats.publish_failures.wrapping_add(1);
                self.gate.record_publish(false);
                log_warn!("publish failed: {:?}", _e);
                PublishOutcome::Failed
            }
        }
    }
}
