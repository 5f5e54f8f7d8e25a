//! Free-running readout trigger.

use sense_core::Ticks;

/// Divider emitting a one-tick pulse at a fixed low rate.
pub struct TriggerTimer {
    /// Ticks between pulses.
    interval: u64,
    /// Position within the current interval.
    count: u64,
}

impl TriggerTimer {
    /// Create a timer pulsing every `interval` ticks.
    ///
    /// # Panics
    ///
    /// Panics if the interval is zero.
    #[must_use]
    pub fn new(interval: Ticks) -> Self {
        assert!(interval.get() > 0, "trigger interval must be non-zero");
        Self {
            interval: interval.get(),
            count: 0,
        }
    }

    /// Advance one tick. Returns `true` on the pulse tick.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.interval {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Restart the interval from zero.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}
