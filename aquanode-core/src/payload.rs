//! Telemetry payload
//!
//! A flat JSON object with exactly six fields, in this order:
//!
//! ```text
//! {"deviceId":"ESP32_A1B2C3","timestamp":"2024-05-01T08:30:00.000+00:00",
//!  "ph":7.02,"tds":312.4,"turbidity":4.87,"temperature":21.6}
//! ```
//!
//! `timestamp` is a JSON number (monotonic ticks) when no synced wall clock
//! is available, otherwise an ISO-8601 string. Values are rounded to the
//! published precision (pH 2, TDS 1, turbidity 2, temperature 1 decimals);
//! a non-finite value is written as `null`.
//!
//! [`TelemetryPayload::encode`] writes into a fixed-size buffer without
//! allocating. Under the `serde` feature the payload also implements
//! `Serialize` with the same field names.

use core::fmt::{self, Write};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::averaging::ChannelValues;
use crate::constants::buffers::PAYLOAD_CAPACITY;
use crate::constants::telemetry::{PH_DECIMALS, TDS_DECIMALS, TEMPERATURE_DECIMALS, TURBIDITY_DECIMALS};
use crate::time::{IsoTimestamp, Ticks};

/// Encoded JSON text
pub type JsonPayload = heapless::String<PAYLOAD_CAPACITY>;

/// Payload timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum Timestamp {
    /// Monotonic milliseconds since boot
    Ticks(Ticks),
    /// `YYYY-MM-DDTHH:MM:SS.000+HH:MM`
    WallClock(IsoTimestamp),
}

/// Round to `decimals` places, half away from zero
///
/// Values too large to scale have no fractional digits left in an `f32`
/// and come back unchanged.
pub fn round_to(value: f32, decimals: u32) -> f32 {
    let scale = (0..decimals).fold(1.0_f32, |s, _| s * 10.0);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    libm::roundf(scaled) / scale
}

/// One telemetry record, values already rounded
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct TelemetryPayload<'a> {
    pub device_id: &'a str,
    pub timestamp: Timestamp,
    pub ph: f32,
    pub tds: f32,
    pub turbidity: f32,
    pub temperature: f32,
}

impl<'a> TelemetryPayload<'a> {
    pub fn new(device_id: &'a str, timestamp: Timestamp, values: ChannelValues) -> Self {
        Self {
            device_id,
            timestamp,
            ph: round_to(values.ph, PH_DECIMALS),
            tds: round_to(values.tds, TDS_DECIMALS),
            turbidity: round_to(values.turbidity, TURBIDITY_DECIMALS),
            temperature: round_to(values.temperature, TEMPERATURE_DECIMALS),
        }
    }

    /// Write the JSON object to any `fmt::Write` sink
    pub fn write_json<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str("{\"deviceId\":")?;
        write_json_str(out, self.device_id)?;
        out.write_str(",\"timestamp\":")?;
        match &self.timestamp {
            Timestamp::Ticks(ticks) => write!(out, "{}", ticks)?,
            Timestamp::WallClock(iso) => write_json_str(out, iso)?,
        }
        write_number(out, "ph", self.ph, PH_DECIMALS)?;
        write_number(out, "tds", self.tds, TDS_DECIMALS)?;
        write_number(out, "turbidity", self.turbidity, TURBIDITY_DECIMALS)?;
        write_number(out, "temperature", self.temperature, TEMPERATURE_DECIMALS)?;
        out.write_char('}')
    }

    /// Encode into a fixed buffer; fails only if the text does not fit
    pub fn encode(&self) -> Result<JsonPayload, fmt::Error> {
        let mut out = JsonPayload::new();
        self.write_json(&mut out)?;
        Ok(out)
    }
}

fn write_number<W: Write>(out: &mut W, key: &str, value: f32, decimals: u32) -> fmt::Result {
    write!(out, ",\"{}\":", key)?;
    if value.is_finite() {
        write!(out, "{:.*}", decimals as usize, value)
    } else {
        out.write_str("null")
    }
}

fn write_json_str<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn values() -> ChannelValues {
        ChannelValues {
            ph: 7.0249,
            tds: 312.44,
            turbidity: 4.866,
            temperature: 21.56,
        }
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(7.0249, 2), 7.02);
        assert_eq!(round_to(7.025_1, 2), 7.03);
        assert_eq!(round_to(-1.25, 0), -1.0);
        assert_eq!(round_to(312.44, 1), 312.4);
    }

    #[test]
    fn huge_values_pass_through_rounding() {
        assert_eq!(round_to(4e37, 1), 4e37);
        assert_eq!(round_to(-3e38, 2), -3e38);
        assert_eq!(round_to(f32::MAX, 1), f32::MAX);
    }

    #[test]
    fn huge_finite_reading_published_as_number() {
        let payload = TelemetryPayload::new(
            "n",
            Timestamp::Ticks(0),
            ChannelValues { tds: 4e37, ..values() },
        );
        let json: Value = serde_json::from_str(&payload.encode().unwrap()).unwrap();
        let tds = json["tds"].as_f64().unwrap();
        assert!((tds / 4e37 - 1.0).abs() < 1e-6, "tds = {tds}");
    }

    #[test]
    fn tick_timestamp_is_a_number() {
        let payload = TelemetryPayload::new("ESP32_A1B2C3", Timestamp::Ticks(5000), values());
        let text = payload.encode().unwrap();
        assert_eq!(
            text.as_str(),
            "{\"deviceId\":\"ESP32_A1B2C3\",\"timestamp\":5000,\"ph\":7.02,\
             \"tds\":312.4,\"turbidity\":4.87,\"temperature\":21.6}"
        );
    }

    #[test]
    fn exact_field_set() {
        let iso = crate::time::format_iso8601(1_714_552_200, 0).unwrap();
        let payload = TelemetryPayload::new("node-7", Timestamp::WallClock(iso), values());
        let text = payload.encode().unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["deviceId", "ph", "tds", "temperature", "timestamp", "turbidity"]);
        assert_eq!(obj["timestamp"], "2024-05-01T08:30:00.000+00:00");
        assert_eq!(obj["deviceId"], "node-7");
    }

    #[test]
    fn non_finite_written_as_null() {
        let payload = TelemetryPayload::new(
            "n",
            Timestamp::Ticks(0),
            ChannelValues { tds: f32::INFINITY, ..values() },
        );
        let json: Value = serde_json::from_str(&payload.encode().unwrap()).unwrap();
        assert!(json["tds"].is_null());
        assert_eq!(json["ph"], 7.02);
    }

    #[test]
    fn device_id_escaped() {
        let payload = TelemetryPayload::new("a\"b\\c", Timestamp::Ticks(1), values());
        let json: Value = serde_json::from_str(&payload.encode().unwrap()).unwrap();
        assert_eq!(json["deviceId"], "a\"b\\c");
    }

    #[test]
    fn serde_matches_hand_encoding() {
        let payload = TelemetryPayload::new("ESP32_000001", Timestamp::Ticks(10_000), values());
        let via_serde: Value = serde_json::to_value(&payload).unwrap();
        let by_hand: Value = serde_json::from_str(&payload.encode().unwrap()).unwrap();
        assert_eq!(via_serde["deviceId"], by_hand["deviceId"]);
        assert_eq!(via_serde["timestamp"], by_hand["timestamp"]);
        for key in ["ph", "tds", "turbidity", "temperature"] {
            let a = via_serde[key].as_f64().unwrap();
            let b = by_hand[key].as_f64().unwrap();
            assert!((a - b).abs() < 1e-4, "{key}: {a} vs {b}");
        }
    }

    #[test]
    fn overflow_reported() {
        let long = "x".repeat(300);
        let payload = TelemetryPayload::new(&long, Timestamp::Ticks(0), values());
        assert!(payload.encode().is_err());
    }
}
