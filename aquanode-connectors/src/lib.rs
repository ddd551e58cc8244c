//! Host Transports for AquaNode
//!
//! ## Overview
//!
//! The core drives its network through the
//! [`Connectivity`](aquanode_core::Connectivity) trait and never blocks.
//! This crate supplies implementations for hosts with an operating system,
//! where the blocking protocol client runs on its own thread and reports
//! back through atomics and a channel.
//!
//! ### MQTT
//!
//! The node's native protocol. Readings go to a single data topic as
//! retained messages so a dashboard that subscribes late still sees the
//! last value; operator commands arrive on a command topic and are logged.
//!
//! | Layer  | Meaning on a host                          |
//! |--------|--------------------------------------------|
//! | link   | TCP (or TLS) connection to broker is open |
//! | broker | MQTT session acknowledged (`CONNACK` ok)   |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use aquanode_connectors::mqtt::{MqttConfig, MqttConnectivity};
//! use aquanode_core::config::TelemetryConfig;
//!
//! let config = MqttConfig::for_node("broker.local", 1883, &TelemetryConfig::default())
//!     .credentials("node", "secret");
//! let link = MqttConnectivity::new(config)?;
//! # Ok::<(), aquanode_connectors::ConnectorError>(())
//! ```

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnectivity, QoS};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Request buffer full")]
    BufferFull,

    #[error("Link lost: {0}")]
    LinkLost(String),

    #[error("Broker refused session: {0}")]
    BrokerRefused(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport worker stopped")]
    WorkerStopped,
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct ConnectionStats {
    /// Total messages handed to the client
    pub messages_sent: u64,
    /// Total messages the client refused
    pub messages_failed: u64,
    /// Total payload bytes handed to the client
    pub bytes_sent: u64,
    /// Sessions established after the first one
    pub reconnections: u32,
    /// Command messages received
    pub commands_received: u64,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    /// Compact JSON line for status reporting
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize() {
        let stats = ConnectionStats {
            messages_sent: 3,
            bytes_sent: 240,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(json["messages_sent"], 3);
        assert_eq!(json["last_error"], serde_json::Value::Null);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ConnectorError::BrokerRefused("NotAuthorized".into()).to_string(),
            "Broker refused session: NotAuthorized"
        );
        assert_eq!(ConnectorError::NotConnected.to_string(), "Not connected");
    }
}
