//! MQTT Node Example
//!
//! Runs the node loop on the host against a real broker, with scripted
//! probe readings standing in for the ADC.
//!
//! ## Running the Example
//!
//! ```bash
//! mosquitto -v &
//! MQTT_HOST=127.0.0.1 RUST_LOG=info cargo run -p aquanode-connectors --example mqtt_node
//! mosquitto_sub -t 'reservoir/water_quality/#' -v
//! ```
//!
//! `MQTT_TLS=1` connects over TLS (port 8883 unless `MQTT_PORT` is set).

use std::env;
use std::thread;
use std::time::Duration;

use aquanode_connectors::mqtt::{MqttConfig, MqttConnectivity, DEFAULT_PORT, DEFAULT_TLS_PORT};
use aquanode_core::sim::ScriptedSensors;
use aquanode_core::time::{SystemClock, SystemWallClock};
use aquanode_core::{Channel, NodeConfig, PublishOutcome, Scheduler, TimeSource};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let host = env::var("MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let tls = env::var("MQTT_TLS").map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"));
    let port: u16 = env::var("MQTT_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(if tls { DEFAULT_TLS_PORT } else { DEFAULT_PORT });
    let runtime_secs: u32 = env::var("RUN_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);

    let config = NodeConfig::default();
    let mut mqtt = MqttConfig::for_node(host, port, &config.telemetry);
    if let (Ok(user), Ok(pass)) = (env::var("MQTT_USER"), env::var("MQTT_PASS")) {
        mqtt = mqtt.credentials(user, pass);
    }
    if tls {
        mqtt = mqtt.tls();
    }

    let link = match MqttConnectivity::new(mqtt) {
        Ok(link) => link,
        Err(e) => {
            eprintln!("bad MQTT settings: {e}");
            return;
        }
    };
    let sensors = ScriptedSensors::constant(0)
        .with_value(Channel::Ph, 1960)
        .with_value(Channel::Tds, 560)
        .with_value(Channel::Turbidity, 120)
        .with_value(Channel::Temperature, 267);

    let mut node = match Scheduler::new(&config, sensors, link) {
        Ok(node) => node.with_wall_clock(SystemWallClock),
        Err(e) => {
            eprintln!("invalid node configuration: {e}");
            return;
        }
    };

    let clock = SystemClock::new();
    let deadline = runtime_secs.saturating_mul(1000);
    loop {
        let now = clock.now();
        if now >= deadline {
            break;
        }
        let report = node.tick(now);
        if let Some(t) = report.transition {
            println!("gate {} -> {}", t.from, t.to);
        }
        if let Some(outcome) = report.publish.filter(|o| *o != PublishOutcome::Sent) {
            println!("publish: {outcome:?}");
        }
        for command in node.link_mut().take_commands() {
            println!("command: {}", command.payload_lossy());
        }
        thread::sleep(Duration::from_millis(10));
    }

    println!("scheduler: {:?}", node.stats());
    println!("transport: {}", node.link().stats().to_json());
}
