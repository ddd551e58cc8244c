//! Telemetry Constants

/// Topic carrying readings (published retained).
pub const DATA_TOPIC: &str = "reservoir/water_quality/data";

/// Topic the node listens on for operator commands.
pub const COMMAND_TOPIC: &str = "reservoir/water_quality/commands";

/// Device identifier prefix; the last three MAC octets follow in hex.
pub const DEVICE_ID_PREFIX: &str = "ESP32_";

/// Device identifier used when no MAC address is available.
pub const DEFAULT_DEVICE_ID: &str = "ESP32_000000";

/// Decimal places of the published pH value.
pub const PH_DECIMALS: u32 = 2;

/// Decimal places of the published TDS value.
pub const TDS_DECIMALS: u32 = 1;

/// Decimal places of the published turbidity value.
pub const TURBIDITY_DECIMALS: u32 = 2;

/// Decimal places of the published temperature value.
pub const TEMPERATURE_DECIMALS: u32 = 1;
