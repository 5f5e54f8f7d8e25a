//! Two-wire open-drain bus shared by the master and a peripheral.
//!
//! Two open-drain lines: SCL (clock) and SDA (data). Each participant
//! can independently pull a line low. A line reads high only when
//! nobody pulls it low. This matches real hardware where each line has
//! a pull-up resistor and any device can ground it.

/// Two-wire bus with two participants: master and slave.
pub struct TwiBus {
    /// SCL pull-down: [master, slave]. true = pulling low.
    scl_pulls: [bool; 2],
    /// SDA pull-down: [master, slave].
    sda_pulls: [bool; 2],
}

impl TwiBus {
    /// Create a new bus with both lines released (high).
    #[must_use]
    pub fn new() -> Self {
        Self {
            scl_pulls: [false; 2],
            sda_pulls: [false; 2],
        }
    }

    // --- Master side ---

    /// Set whether the master pulls SCL low.
    pub fn set_master_scl(&mut self, pull_low: bool) {
        self.scl_pulls[0] = pull_low;
    }

    /// Set whether the master pulls SDA low.
    pub fn set_master_sda(&mut self, pull_low: bool) {
        self.sda_pulls[0] = pull_low;
    }

    // --- Slave side ---

    /// Set whether the slave pulls SCL low (clock stretching).
    pub fn set_slave_scl(&mut self, pull_low: bool) {
        self.scl_pulls[1] = pull_low;
    }

    /// Set whether the slave pulls SDA low.
    pub fn set_slave_sda(&mut self, pull_low: bool) {
        self.sda_pulls[1] = pull_low;
    }

    // --- Line state (true = high, false = low) ---

    /// SCL line state. High when nobody pulls it low.
    #[must_use]
    pub fn scl(&self) -> bool {
        !self.scl_pulls[0] && !self.scl_pulls[1]
    }

    /// SDA line state. High when nobody pulls it low.
    #[must_use]
    pub fn sda(&self) -> bool {
        !self.sda_pulls[0] && !self.sda_pulls[1]
    }

    /// Release every pull from both participants.
    pub fn release_all(&mut self) {
        self.scl_pulls = [false; 2];
        self.sda_pulls = [false; 2];
    }
}

impl Default for TwiBus {
    fn default() -> Self {
        Self::new()
    }
}
