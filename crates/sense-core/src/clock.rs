//! System clock configuration.

use crate::Ticks;

/// System clock configuration.
///
/// The design has a single clock input that drives all state machines.
/// Bus bit timing and the periodic trigger both derive from this
/// frequency by integer division.
#[derive(Debug, Clone, Copy)]
pub struct MasterClock {
    /// Clock frequency in Hz (e.g. `50_000_000` for a 50 MHz board clock).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Ticks per serial bus bit period at the given bus rate
    /// (integer division).
    #[must_use]
    pub const fn ticks_per_bit(&self, bus_hz: u64) -> Ticks {
        Ticks::new(self.frequency_hz / bus_hz)
    }

    /// Ticks between trigger pulses at the given trigger rate
    /// (integer division).
    #[must_use]
    pub const fn ticks_per_trigger(&self, triggers_per_second: u64) -> Ticks {
        Ticks::new(self.frequency_hz / triggers_per_second)
    }
}
