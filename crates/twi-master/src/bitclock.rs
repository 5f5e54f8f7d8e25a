//! Four-phase bit-period timing for the two-wire bus.
//!
//! One bus bit period spans `divisor` system clock ticks, split into
//! quarters:
//!
//! | Quarter | SCL reference | Data clock | Used for                    |
//! |---------|---------------|------------|-----------------------------|
//! | 1st     | low           | low        |                             |
//! | 2nd     | low           | high       | master changes output data  |
//! | 3rd     | high          | high       | stretch check on entry      |
//! | 4th     | high          | low        | master samples input data   |
//!
//! While the SCL reference is released high (3rd quarter) the external
//! line is checked every tick: a slave still holding it low freezes the
//! counter until the line is released (clock stretching). There is no
//! timeout; an unresponsive slave stalls the bit clock indefinitely.

/// Four-phase bit-period generator with clock-stretch detection.
pub struct BitClock {
    /// Ticks per full bit period. Fixed at construction.
    divisor: u32,
    /// Position within the bit period, 0..divisor. Frozen while stretched.
    count: u32,
    /// Internal SCL reference (high during the 3rd and 4th quarters).
    scl_ref: bool,
    /// Data clock (high during the 2nd and 3rd quarters).
    data_clk: bool,
    /// Data clock one tick ago, for edge detection.
    data_clk_prev: bool,
    /// Counter frozen: the slave is holding SCL low.
    stretched: bool,
}

impl BitClock {
    /// Create a bit clock with the given divisor (system ticks per bus
    /// bit period).
    ///
    /// # Panics
    ///
    /// Panics if `divisor` is less than 4 — each quarter-phase needs at
    /// least one tick.
    #[must_use]
    pub fn new(divisor: u32) -> Self {
        assert!(divisor >= 4, "bit clock divisor must be at least 4");
        Self {
            divisor,
            count: 0,
            scl_ref: false,
            data_clk: false,
            data_clk_prev: false,
            stretched: false,
        }
    }

    /// Advance one system tick.
    ///
    /// `scl_line_high` is the resolved state of the external SCL line,
    /// sampled by the caller before any drive updates this tick.
    pub fn tick(&mut self, scl_line_high: bool) {
        self.data_clk_prev = self.data_clk;

        if self.count == self.divisor - 1 {
            self.count = 0;
        } else if !self.stretched {
            self.count += 1;
        }

        let quarter = self.divisor / 4;
        if self.count < quarter {
            self.scl_ref = false;
            self.data_clk = false;
        } else if self.count < 2 * quarter {
            self.scl_ref = false;
            self.data_clk = true;
        } else if self.count < 3 * quarter {
            // SCL released: if the line is still low, a slave is
            // stretching — hold this phase until it lets go.
            self.scl_ref = true;
            self.data_clk = true;
            self.stretched = !scl_line_high;
        } else {
            self.scl_ref = true;
            self.data_clk = false;
        }
    }

    /// Return the counter and references to their power-on state.
    pub fn reset(&mut self) {
        self.count = 0;
        self.scl_ref = false;
        self.data_clk = false;
        self.data_clk_prev = false;
        self.stretched = false;
    }

    /// Internal SCL reference level (high = release the line).
    #[must_use]
    pub fn scl_ref(&self) -> bool {
        self.scl_ref
    }

    /// Data clock level.
    #[must_use]
    pub fn data_clk(&self) -> bool {
        self.data_clk
    }

    /// Data clock rising edge this tick (data-change point).
    #[must_use]
    pub fn rising(&self) -> bool {
        self.data_clk && !self.data_clk_prev
    }

    /// Data clock falling edge this tick (sampling point).
    #[must_use]
    pub fn falling(&self) -> bool {
        !self.data_clk && self.data_clk_prev
    }

    /// Whether the counter is currently frozen by clock stretching.
    #[must_use]
    pub fn stretched(&self) -> bool {
        self.stretched
    }

    /// Ticks per bus bit period.
    #[must_use]
    pub fn divisor(&self) -> u32 {
        self.divisor
    }
}
