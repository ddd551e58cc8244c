//! Network transport abstraction
//!
//! The transport is modelled as two layers, a link (WiFi association) and a
//! broker session on top of it. The
//! [`ConnectivityGate`](crate::connectivity::ConnectivityGate) drives both
//! through this trait and owns the retry policy; implementations only report
//! status and start attempts.

use core::fmt::Debug;

/// Link and broker transport used by the scheduler
///
/// ## Contract
///
/// - `try_connect_*` start or continue an attempt and return immediately.
///   `Ok(())` means connected (also when it already was),
///   `Err(nb::Error::WouldBlock)` means still in progress, and
///   `Err(nb::Error::Other(e))` means the attempt failed.
/// - `publish` hands the payload to the transport without waiting for an
///   acknowledgement.
/// - `broker_ready()` implies `link_ready()`. The gate treats a broker
///   reported up on a down link as down.
pub trait Connectivity {
    /// Transport failure detail, only ever logged
    type Error: Debug;

    /// Link layer is associated
    fn link_ready(&self) -> bool;

    /// Broker session is established
    fn broker_ready(&self) -> bool;

    /// Start or continue a link-layer connect
    fn try_connect_link(&mut self) -> nb::Result<(), Self::Error>;

    /// Start or continue the broker connect and handshake
    fn try_connect_broker(&mut self) -> nb::Result<(), Self::Error>;

    /// Queue `payload` on `topic`
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Service the transport (keep-alives, incoming messages)
    ///
    /// Called every loop iteration while the link is up. Default does nothing.
    fn poll(&mut self) {}
}
