//! Board configuration: clock rates and sensor wiring.

use std::fmt;

use sense_core::MasterClock;

/// Configuration for constructing a [`crate::TempSense`] board.
pub struct TempSenseConfig {
    /// System clock driving every state machine.
    pub clock: MasterClock,
    /// Two-wire bus bit rate in Hz.
    pub bus_hz: u64,
    /// Readout trigger rate in Hz.
    pub trigger_hz: u64,
    /// 7-bit sensor address.
    pub sensor_address: u8,
    /// Whether a sensor model sits on the bus. Absent sensors exercise
    /// the acknowledgement-failure path.
    pub sensor_present: bool,
    /// Ticks of clock stretching the sensor inserts after each
    /// acknowledged frame (0 = none).
    pub sensor_stretch: u32,
}

impl Default for TempSenseConfig {
    fn default() -> Self {
        Self {
            clock: MasterClock::new(50_000_000),
            bus_hz: 100_000,
            trigger_hz: 4,
            sensor_address: adi_adt7420::DEFAULT_ADDRESS,
            sensor_present: true,
            sensor_stretch: 0,
        }
    }
}

/// Configuration rejected at board construction.
#[derive(Debug)]
pub enum ConfigError {
    /// Bus rate too fast for the system clock: each bit period needs at
    /// least four ticks.
    BusRate { clock_hz: u64, bus_hz: u64 },
    /// Trigger rate faster than the system clock.
    TriggerRate { clock_hz: u64, trigger_hz: u64 },
    /// Sensor address does not fit in seven bits.
    Address(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusRate { clock_hz, bus_hz } => write!(
                f,
                "bus rate {bus_hz} Hz needs at least 4 ticks per bit at a {clock_hz} Hz clock",
            ),
            Self::TriggerRate {
                clock_hz,
                trigger_hz,
            } => write!(
                f,
                "trigger rate {trigger_hz} Hz exceeds the {clock_hz} Hz system clock",
            ),
            Self::Address(addr) => {
                write!(f, "sensor address {addr:#04X} does not fit in 7 bits")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl TempSenseConfig {
    /// Check the rates against the system clock.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock_hz = self.clock.frequency_hz;
        if self.bus_hz == 0 || self.clock.ticks_per_bit(self.bus_hz).get() < 4 {
            return Err(ConfigError::BusRate {
                clock_hz,
                bus_hz: self.bus_hz,
            });
        }
        if self.trigger_hz == 0 || self.clock.ticks_per_trigger(self.trigger_hz).get() == 0 {
            return Err(ConfigError::TriggerRate {
                clock_hz,
                trigger_hz: self.trigger_hz,
            });
        }
        if self.sensor_address > 0x7F {
            return Err(ConfigError::Address(self.sensor_address));
        }
        Ok(())
    }
}
