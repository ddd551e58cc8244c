//! Simulated Node Example
//!
//! Runs the full cooperative loop on the host: scripted probe codes, an
//! in-memory transport and a hand-advanced millisecond clock.
//!
//! ## What You'll Learn
//!
//! - Building a [`Scheduler`] from a [`NodeConfig`]
//! - Watching the connectivity gate react to a lost link
//! - Reading the JSON payloads handed to the transport
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=debug cargo run --example simulated_node
//! ```

use aquanode_core::config::TelemetryConfig;
use aquanode_core::sim::{LoopbackConnectivity, ScriptedSensors, SimulatedWallClock};
use aquanode_core::time::ManualClock;
use aquanode_core::{Channel, GateState, NodeConfig, PublishOutcome, Scheduler, TimeSource};

/// Codes for near-neutral, fresh, clear water at about 22 °C
fn reservoir_probes() -> ScriptedSensors {
    let ph: Vec<u16> = [1950, 1962, 1941, 1958, 1947, 1969, 1953, 1944]
        .into_iter()
        .cycle()
        .take(60)
        .collect();
    ScriptedSensors::constant(0)
        .with_sequence(Channel::Ph, &ph)
        .with_value(Channel::Tds, 560)
        .with_value(Channel::Turbidity, 120)
        .with_value(Channel::Temperature, 267)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("AquaNode Simulated Node");
    println!("=======================\n");

    let mut config = NodeConfig::default();
    config.telemetry = TelemetryConfig::for_mac([0x24, 0x6F, 0x28, 0xA1, 0xB2, 0xC3]);
    config.telemetry.utc_offset_secs = 3600;

    let mut node = match Scheduler::new(&config, reservoir_probes(), LoopbackConnectivity::new()) {
        Ok(node) => node.with_wall_clock(SimulatedWallClock::unsynced()),
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return;
        }
    };
    println!("Device: {}", node.telemetry().device_id);
    println!("Topic:  {}\n", node.telemetry().data_topic);

    let mut clock = ManualClock::new(0);
    for second in 1..=60u32 {
        clock.advance(1000);
        let now = clock.now();

        match second {
            12 => node.wall_clock_mut().sync(1_714_552_200),
            22 => {
                println!("-- link lost at t={now} ms");
                node.link_mut().set_link_available(false);
            }
            38 => {
                println!("-- link restored at t={now} ms");
                node.link_mut().set_link_available(true);
            }
            _ => {}
        }
        node.wall_clock_mut().advance(1);

        let report = node.tick(now);
        if let Some(t) = report.transition {
            println!("t={now:>6} ms  gate {} -> {}", t.from, t.to);
        }
        match report.publish {
            Some(PublishOutcome::Sent) => {
                if let Some(last) = node.link().published().last() {
                    println!("t={now:>6} ms  sent {}", last.payload_str());
                }
            }
            Some(outcome) => println!("t={now:>6} ms  publish: {outcome:?}"),
            None => {}
        }
    }

    let stats = node.stats();
    println!("\nSummary");
    println!("  samples:            {}", stats.samples);
    println!("  published:          {}", stats.publish_successes);
    println!("  failed:             {}", stats.publish_failures);
    println!("  skipped (not ready): {}", stats.skipped_not_ready);
    println!("  gate state:         {}", node.gate_state());
    if node.gate_state() != GateState::Ready {
        println!("  last fault:         {:?}", node.gate().last_fault());
    }
}
