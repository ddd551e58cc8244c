//! Connectivity Gate
//!
//! ## State Machine
//!
//! ```text
//!            link connect ok            broker connect ok
//! LinkDown ─────────────────▶ LinkUpBrokerDown ─────────────────▶ Ready
//!    ▲                              ▲   │                           │
//!    │                              │   └── broker fails, link gone ┤
//!    └──────────────── health check: link down ◀────────────────────┤
//!                                   └─── health check: broker down ◀┘
//! ```
//!
//! The gate owns no business data. It answers one question for the
//! scheduler, "may I publish now?", and keeps the transport moving toward
//! `Ready` in between:
//!
//! - **Health checks** observe the transport every `health_check_interval`,
//!   or on the next step after a publish failed.
//! - **Reconnects** run while not `Ready`, at most once per
//!   `reconnect_backoff`. A connect that reports `WouldBlock` is polled
//!   every step until it resolves; that is not a new attempt.
//! - **Failures** are transient: logged, counted, remembered as
//!   `last_fault`, and retried on the next eligible step.

use fugit::MillisDurationU32;

use crate::errors::ConnectivityFault;
use crate::time::{elapsed, IntervalTimer, Ticks};
use crate::traits::Connectivity;

/// Transport health as seen by the gate
///
/// "Broker up, link down" has no representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    LinkDown,
    LinkUpBrokerDown,
    Ready,
}

impl GateState {
    /// Classify a pair of transport flags; a broker on a down link counts as down
    pub const fn observe(link_up: bool, broker_up: bool) -> Self {
        match (link_up, broker_up) {
            (false, _) => Self::LinkDown,
            (true, false) => Self::LinkUpBrokerDown,
            (true, true) => Self::Ready,
        }
    }

    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn link_up(self) -> bool {
        !matches!(self, Self::LinkDown)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::LinkDown => "link down",
            Self::LinkUpBrokerDown => "broker down",
            Self::Ready => "ready",
        }
    }
}

impl core::fmt::Display for GateState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A change of [`GateState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: GateState,
    pub to: GateState,
}

/// Counters for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateStats {
    pub health_checks: u32,
    pub link_attempts: u32,
    pub link_failures: u32,
    pub broker_attempts: u32,
    pub broker_failures: u32,
    pub publish_failures: u32,
    pub transitions: u32,
}

/// Drives a [`Connectivity`] toward `Ready` without blocking
#[derive(Debug, Clone)]
pub struct ConnectivityGate {
    state: GateState,
    health_check: IntervalTimer,
    backoff: MillisDurationU32,
    last_attempt: Option<Ticks>,
    in_progress: bool,
    recheck_pending: bool,
    last_fault: Option<ConnectivityFault>,
    stats: GateStats,
}

impl ConnectivityGate {
    /// Starts in `LinkDown`; the first step attempts a link connect
    pub fn new(health_check_interval: MillisDurationU32, reconnect_backoff: MillisDurationU32) -> Self {
        Self {
            state: GateState::LinkDown,
            health_check: IntervalTimer::new(health_check_interval),
            backoff: reconnect_backoff,
            last_attempt: None,
            in_progress: false,
            recheck_pending: false,
            last_fault: None,
            stats: GateStats::default(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Publishing allowed
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn last_fault(&self) -> Option<ConnectivityFault> {
        self.last_fault
    }

    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    /// Tick of the most recent connect attempt still inside its backoff
    pub fn last_attempt(&self) -> Option<Ticks> {
        self.last_attempt
    }

    /// One non-blocking iteration: health check, reconnect, service transport
    pub fn step<C: Connectivity>(&mut self, now: Ticks, link: &mut C) -> Option<Transition> {
        let before = self.state;

        if self.recheck_pending || self.health_check.is_due(now) {
            self.run_health_check(now, link);
        }

        if !self.state.is_ready() && self.attempt_due(now) {
            self.reconnect(now, link);
        }

        if self.state.link_up() {
            link.poll();
        }

        (self.state != before).then(|| Transition {
            from: before,
            to: self.state,
        })
    }

    /// Tell the gate how the last publish went
    ///
    /// A failure does not change state directly; it schedules a health check
    /// for the next step.
    pub fn record_publish(&mut self, ok: bool) {
        if !ok {
            self.stats.publish_failures = self.stats.publish_failures.wrapping_add(1);
            self.last_fault = Some(ConnectivityFault::Publish);
            self.recheck_pending = true;
        }
    }

    fn run_health_check<C: Connectivity>(&mut self, now: Ticks, link: &C) {
        self.recheck_pending = false;
        self.health_check.reset(now);
        self.stats.health_checks = self.stats.health_checks.wrapping_add(1);

        let observed = GateState::observe(link.link_ready(), link.broker_ready());
        log_trace!("health check at {}: {}", now, observed);
        self.set_state(observed);
    }

    fn attempt_due(&self, now: Ticks) -> bool {
        self.in_progress
            || self
                .last_attempt
                .map_or(true, |last| elapsed(now, last) >= self.backoff.ticks())
    }

    /// Work through the phases until one is pending, fails or `Ready` is reached
    fn reconnect<C: Connectivity>(&mut self, now: Ticks, link: &mut C) {
        loop {
            let phase = self.state;
            let result = match phase {
                GateState::Ready => return,
                GateState::LinkDown => {
                    if !self.in_progress {
                        self.stats.link_attempts = self.stats.link_attempts.wrapping_add(1);
                        log_info!("connecting link");
                    }
                    link.try_connect_link()
                }
                GateState::LinkUpBrokerDown => {
                    if !self.in_progress {
                        self.stats.broker_attempts = self.stats.broker_attempts.wrapping_add(1);
                        log_info!("connecting broker");
                    }
                    link.try_connect_broker()
                }
            };
            if !self.in_progress {
                self.last_attempt = Some(now);
            }

            match result {
                Ok(()) => {
                    self.in_progress = false;
                    // Next phase may start right away
                    self.last_attempt = None;
                    let next = match phase {
                        GateState::LinkDown => GateState::LinkUpBrokerDown,
                        _ => GateState::Ready,
                    };
                    self.set_state(next);
                }
                Err(nb::Error::WouldBlock) => {
                    self.in_progress = true;
                    return;
                }
                Err(nb::Error::Other(_e)) => {
                    self.in_progress = false;
                    if phase == GateState::LinkDown {
                        self.stats.link_failures = self.stats.link_failures.wrapping_add(1);
                        self.last_fault = Some(ConnectivityFault::Link);
                        log_warn!("link connect failed: {:?}", _e);
                    } else {
                        self.stats.broker_failures = self.stats.broker_failures.wrapping_add(1);
                        self.last_fault = Some(ConnectivityFault::Broker);
                        log_warn!("broker connect failed: {:?}", _e);
                        if !link.link_ready() {
                            self.set_state(GateState::LinkDown);
                        }
                    }
                    return;
                }
            }
        }
    }

    fn set_state(&mut self, next: GateState) {
        if next == self.state {
            return;
        }
        log_info!("connectivity: {} -> {}", self.state, next);
        // A pending connect belongs to the phase it was started in
        self.in_progress = false;
        self.state = next;
        self.stats.transitions = self.stats.transitions.wrapping_add(1);
    }
}
