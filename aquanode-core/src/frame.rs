//! Sensor frames and the per-tick signal chain

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::averaging::ChannelValues;
use crate::calibration::Calibration;
use crate::channel::Channel;
use crate::filter::PhSmoothingFilter;
use crate::time::Ticks;
use crate::traits::SensorSource;

/// One channel's reading: raw code, volts and calibrated value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    pub raw: u16,
    pub voltage: f32,
    pub value: f32,
}

/// pH reading with both the direct conversion and the smoothed value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhReading {
    pub raw: u16,
    pub voltage: f32,
    /// Conversion of this sample alone
    pub value_raw: f32,
    /// Moving average including this sample
    pub value_smoothed: f32,
}

/// Everything measured in one sampling tick
///
/// Built fresh each tick and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorFrame {
    /// Monotonic tick at which the frame was sampled
    pub timestamp: Ticks,
    pub ph: PhReading,
    pub tds: Reading,
    pub turbidity: Reading,
    pub temperature: Reading,
}

impl SensorFrame {
    /// Publishable values; pH is the smoothed one
    pub fn values(&self) -> ChannelValues {
        ChannelValues {
            ph: self.ph.value_smoothed,
            tds: self.tds.value,
            turbidity: self.turbidity.value,
            temperature: self.temperature.value,
        }
    }
}

/// Calibration plus pH filter: turns raw codes into frames
#[derive(Debug, Clone)]
pub struct SignalChain {
    calibration: Calibration,
    ph_filter: PhSmoothingFilter,
}

impl SignalChain {
    /// `calibration` must already be validated
    pub fn new(calibration: Calibration, ph_filter: PhSmoothingFilter) -> Self {
        Self { calibration, ph_filter }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn ph_filter(&self) -> &PhSmoothingFilter {
        &self.ph_filter
    }

    pub fn ph_filter_mut(&mut self) -> &mut PhSmoothingFilter {
        &mut self.ph_filter
    }

    /// Read all four channels and assemble a frame
    ///
    /// Raw codes are read in [`Channel::ALL`] order. Temperature is converted
    /// before TDS because TDS compensation uses it.
    pub fn sample<S: SensorSource>(&mut self, source: &mut S, timestamp: Ticks) -> SensorFrame {
        let [ph_raw, tds_raw, turbidity_raw, temperature_raw] =
            Channel::ALL.map(|channel| source.read_raw(channel));
        let cal = &self.calibration;

        let temperature_voltage = cal.voltage(temperature_raw);
        let temperature = Reading {
            raw: temperature_raw,
            voltage: temperature_voltage,
            value: cal.temperature_from_voltage(temperature_voltage),
        };

        let ph_voltage = cal.voltage(ph_raw);
        let ph_value = cal.ph_from_voltage(ph_voltage);
        self.ph_filter.push(ph_value);
        let ph = PhReading {
            raw: ph_raw,
            voltage: ph_voltage,
            value_raw: ph_value,
            value_smoothed: self.ph_filter.average(),
        };

        let tds_voltage = cal.voltage(tds_raw);
        let tds = Reading {
            raw: tds_raw,
            voltage: tds_voltage,
            value: cal.tds_from_voltage(tds_voltage, temperature.value),
        };

        let turbidity_voltage = cal.voltage(turbidity_raw);
        let turbidity = Reading {
            raw: turbidity_raw,
            voltage: turbidity_voltage,
            value: cal.turbidity_from_voltage(turbidity_voltage),
        };

        log_debug!(
            "t={} pH {:.2} (raw {:.2}) TDS {:.1} ppm turbidity {:.2} NTU temp {:.1} C",
            timestamp,
            ph.value_smoothed,
            ph.value_raw,
            tds.value,
            turbidity.value,
            temperature.value
        );

        SensorFrame {
            timestamp,
            ph,
            tds,
            turbidity,
            temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{TdsCompensation, TemperatureModel};
    use approx::assert_relative_eq;

    struct Fixed([u16; 4]);

    impl SensorSource for Fixed {
        fn read_raw(&mut self, channel: Channel) -> u16 {
            match channel {
                Channel::Ph => self.0[0],
                Channel::Tds => self.0[1],
                Channel::Turbidity => self.0[2],
                Channel::Temperature => self.0[3],
            }
        }
    }

    fn chain(calibration: Calibration) -> SignalChain {
        SignalChain::new(calibration, PhSmoothingFilter::new())
    }

    #[test]
    fn frame_fields_follow_calibration() {
        let cal = Calibration::default();
        let mut chain = chain(cal);
        let frame = chain.sample(&mut Fixed([1961, 1200, 2048, 310]), 1000);

        assert_eq!(frame.timestamp, 1000);
        assert_eq!(frame.ph.raw, 1961);
        assert_relative_eq!(frame.ph.voltage, cal.voltage(1961));
        assert_eq!(frame.ph.value_raw, frame.ph.value_smoothed);
        assert_relative_eq!(frame.turbidity.value, cal.turbidity_from_voltage(cal.voltage(2048)));
        assert_relative_eq!(
            frame.temperature.value,
            cal.temperature_from_voltage(cal.voltage(310))
        );
    }

    #[test]
    fn tds_uses_same_frame_temperature() {
        let cal = Calibration {
            temperature: TemperatureModel::two_point(),
            ..Calibration::default()
        };
        let mut chain = chain(cal);
        let frame = chain.sample(&mut Fixed([2000, 1500, 100, 1000]), 0);
        let expected = cal.tds_from_voltage(frame.tds.voltage, frame.temperature.value);
        assert_relative_eq!(frame.tds.value, expected);

        let uncompensated = Calibration {
            tds: crate::calibration::TdsCalibration {
                compensation: TdsCompensation::Disabled,
                ..cal.tds
            },
            ..cal
        };
        assert!(frame.tds.value != uncompensated.tds_from_voltage(frame.tds.voltage, 0.0));
    }

    #[test]
    fn ph_smoothing_across_frames() {
        let mut chain = chain(Calibration::default());
        let first = chain.sample(&mut Fixed([1800, 0, 0, 0]), 0);
        let second = chain.sample(&mut Fixed([2200, 0, 0, 0]), 1000);
        assert_relative_eq!(
            second.ph.value_smoothed,
            (first.ph.value_raw + second.ph.value_raw) / 2.0,
            epsilon = 1e-5
        );
        assert_eq!(chain.ph_filter().raw_latest(), Some(second.ph.value_raw));
    }

    #[test]
    fn values_use_smoothed_ph() {
        let mut chain = chain(Calibration::default());
        chain.sample(&mut Fixed([1800, 0, 0, 0]), 0);
        let frame = chain.sample(&mut Fixed([2200, 0, 0, 0]), 1000);
        assert_eq!(frame.values().ph, frame.ph.value_smoothed);
    }
}
