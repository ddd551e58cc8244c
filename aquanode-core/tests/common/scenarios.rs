//! Sensor scenarios expressed as probe voltages

use aquanode_core::sim::ScriptedSensors;
use aquanode_core::Channel;

use super::{channel_codes, code_for};

/// Named water condition
pub struct Scenario {
    pub name: &'static str,
    pub ph_volts: f32,
    pub tds_volts: f32,
    pub turbidity_volts: f32,
    pub temperature_volts: f32,
}

impl Scenario {
    pub fn sensors(&self) -> ScriptedSensors {
        channel_codes(
            code_for(self.ph_volts),
            code_for(self.tds_volts),
            code_for(self.turbidity_volts),
            code_for(self.temperature_volts),
        )
    }
}

/// Neutral, fresh, clear water at about 21 °C
pub const CLEAR_RESERVOIR: Scenario = Scenario {
    name: "clear reservoir",
    ph_volts: 1.58,
    tds_volts: 0.45,
    turbidity_volts: 0.1,
    temperature_volts: 0.21,
};

/// Slightly acidic runoff after a storm
pub const STORM_RUNOFF: Scenario = Scenario {
    name: "storm runoff",
    ph_volts: 1.36,
    tds_volts: 1.4,
    turbidity_volts: 2.6,
    temperature_volts: 0.16,
};

/// pH probe flickering between two readings around neutral
pub fn noisy_ph(count: usize) -> ScriptedSensors {
    let codes: Vec<u16> = (0..count)
        .map(|i| if i % 2 == 0 { code_for(1.50) } else { code_for(1.66) })
        .collect();
    CLEAR_RESERVOIR.sensors().with_sequence(Channel::Ph, &codes)
}
