//! Transaction sequencer: the fixed three-transfer read recipe.
//!
//! On a trigger pulse the sequencer walks the bus master through a
//! register-pointer write followed by two chained byte reads, then
//! assembles the two bytes into one 16-bit reading published
//! atomically at the end of the cycle.
//!
//! The request presented during each `Await` state is already the NEXT
//! step's: the engine picks between chaining, a repeated start and a
//! stop at its acknowledgement edge, which comes before the busy flag
//! falls. Holding the previous request there would chain the wrong
//! transfer.

use twi_master::Request;

/// Register pointer written at the top of every cycle (temperature MSB).
const REG_TEMP_MSB: u8 = 0x00;

/// Sequencer state. One step per bus-master busy edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Waiting for a trigger.
    Idle,
    /// Requesting the register-pointer write.
    WriteRegisterSelect,
    /// Pointer write in flight; the read request is already presented.
    AwaitWriteDone,
    /// Requesting the first byte read.
    ReadMsb,
    /// First read in flight; the request continues the chained read.
    AwaitMsbDone,
    /// Requesting the second byte read.
    ReadLsb,
    /// Second read in flight; the request is withdrawn so the engine
    /// NACKs and stops.
    AwaitLsbDone,
}

impl SequencerState {
    /// Short name for logging and state queries.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WriteRegisterSelect => "write_register_select",
            Self::AwaitWriteDone => "await_write_done",
            Self::ReadMsb => "read_msb",
            Self::AwaitMsbDone => "await_msb_done",
            Self::ReadLsb => "read_lsb",
            Self::AwaitLsbDone => "await_lsb_done",
        }
    }
}

/// Three-transfer readout sequencer.
pub struct TempSequencer {
    /// Current state.
    state: SequencerState,
    /// 7-bit sensor address used for every transfer.
    address: u8,
    /// Request computed this tick, consumed by the engine next tick.
    request: Request,
    /// Cycle in progress, from trigger acceptance to publication.
    busy: bool,
    /// First byte of the cycle.
    msb: u8,
    /// Second byte of the cycle.
    lsb: u8,
    /// Last published reading.
    value: u16,
    /// Engine acknowledgement failure captured when the cycle ended.
    ack_failed: bool,
    /// At least one cycle has completed since reset.
    has_reading: bool,
    /// One-tick pulse on the tick a reading is published.
    cycle_done: bool,
    /// Engine busy flag one tick ago, for edge detection.
    busy_prev: bool,
    /// Trigger input one tick ago; the trigger is edge-sensitive.
    trigger_prev: bool,
}

impl TempSequencer {
    /// Create an idle sequencer targeting the given 7-bit address.
    ///
    /// # Panics
    ///
    /// Panics if the address does not fit in seven bits.
    #[must_use]
    pub fn new(address: u8) -> Self {
        assert!(address <= 0x7F, "two-wire addresses are 7-bit");
        Self {
            state: SequencerState::Idle,
            address,
            request: Request::disabled(),
            busy: false,
            msb: 0,
            lsb: 0,
            value: 0,
            ack_failed: false,
            has_reading: false,
            cycle_done: false,
            busy_prev: false,
            trigger_prev: false,
        }
    }

    /// Advance one system tick against the engine's previous-tick
    /// outputs.
    ///
    /// A trigger edge while idle starts a cycle; while busy it is
    /// ignored outright — no queuing, no preemption.
    pub fn tick(&mut self, trigger: bool, engine_busy: bool, ack_error: bool, read_byte: u8) {
        let rose = engine_busy && !self.busy_prev;
        let fell = !engine_busy && self.busy_prev;
        let triggered = trigger && !self.trigger_prev;
        self.cycle_done = false;

        match self.state {
            SequencerState::Idle => {
                self.request = Request::disabled();
                if triggered {
                    self.busy = true;
                    self.state = SequencerState::WriteRegisterSelect;
                }
            }
            SequencerState::WriteRegisterSelect => {
                self.request = Request::write(self.address, REG_TEMP_MSB);
                if rose {
                    self.state = SequencerState::AwaitWriteDone;
                }
            }
            SequencerState::AwaitWriteDone => {
                self.request = Request::read(self.address);
                if fell {
                    self.state = SequencerState::ReadMsb;
                }
            }
            SequencerState::ReadMsb => {
                self.request = Request::read(self.address);
                if rose {
                    self.state = SequencerState::AwaitMsbDone;
                }
            }
            SequencerState::AwaitMsbDone => {
                self.request = Request::read(self.address);
                if fell {
                    self.msb = read_byte;
                    self.state = SequencerState::ReadLsb;
                }
            }
            SequencerState::ReadLsb => {
                self.request = Request::read(self.address);
                if rose {
                    self.state = SequencerState::AwaitLsbDone;
                }
            }
            SequencerState::AwaitLsbDone => {
                self.request = Request::disabled();
                if fell {
                    self.lsb = read_byte;
                    self.value = (u16::from(self.msb) << 8) | u16::from(self.lsb);
                    self.ack_failed = ack_error;
                    self.has_reading = true;
                    self.busy = false;
                    self.cycle_done = true;
                    self.state = SequencerState::Idle;
                }
            }
        }

        self.busy_prev = engine_busy;
        self.trigger_prev = trigger;
    }

    /// Return to idle and clear captured data.
    pub fn reset(&mut self) {
        let address = self.address;
        *self = Self::new(address);
    }

    /// The request for the engine to sample next tick.
    #[must_use]
    pub fn request(&self) -> Request {
        self.request
    }

    /// Cycle in progress.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Last published 16-bit reading (MSB high, LSB low).
    #[must_use]
    pub fn value(&self) -> u16 {
        self.value
    }

    /// The engine reported an acknowledgement failure during the last
    /// completed cycle.
    #[must_use]
    pub fn ack_failed(&self) -> bool {
        self.ack_failed
    }

    /// At least one cycle has completed since reset.
    #[must_use]
    pub fn has_reading(&self) -> bool {
        self.has_reading
    }

    /// One-tick pulse: a reading was published this tick.
    #[must_use]
    pub fn cycle_done(&self) -> bool {
        self.cycle_done
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SequencerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twi_master::Direction;

    const ADDR: u8 = 0x4B;

    /// Walk the documented busy waveform: one edge per tick.
    #[test]
    fn full_cycle_waveform() {
        let mut seq = TempSequencer::new(ADDR);

        // Trigger while idle.
        seq.tick(true, false, false, 0);
        assert!(seq.busy());
        assert_eq!(seq.state(), SequencerState::WriteRegisterSelect);
        let req = seq.request();
        assert!(req.enable);
        assert_eq!(req.direction, Direction::Write);
        assert_eq!(req.write_byte, 0x00);

        // Engine accepts the write.
        seq.tick(false, true, false, 0);
        assert_eq!(seq.state(), SequencerState::AwaitWriteDone);
        assert_eq!(seq.request().direction, Direction::Read);

        // Busy pulses low at the repeated start.
        seq.tick(false, false, false, 0);
        assert_eq!(seq.state(), SequencerState::ReadMsb);

        // First read accepted.
        seq.tick(false, true, false, 0);
        assert_eq!(seq.state(), SequencerState::AwaitMsbDone);
        assert!(seq.request().enable, "chained read must stay requested");

        // First byte lands.
        seq.tick(false, false, false, 0x0C);
        assert_eq!(seq.state(), SequencerState::ReadLsb);

        // Second read accepted; the request is withdrawn.
        seq.tick(false, true, false, 0x0C);
        assert_eq!(seq.state(), SequencerState::AwaitLsbDone);
        assert!(!seq.request().enable);

        // Second byte lands: reading published atomically.
        assert_eq!(seq.value(), 0);
        seq.tick(false, false, false, 0x88);
        assert_eq!(seq.value(), 0x0C88);
        assert!(seq.cycle_done());
        assert!(!seq.busy());
        assert!(seq.has_reading());
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[test]
    fn level_trigger_fires_once() {
        let mut seq = TempSequencer::new(ADDR);
        seq.tick(true, false, false, 0);
        assert!(seq.busy());
        // Trigger held high across the whole cycle, then released while
        // idle: no new cycle without a fresh edge.
        for busy in [true, false, true, false, true, false] {
            seq.tick(true, busy, false, 0x42);
        }
        assert!(!seq.busy());
        seq.tick(true, false, false, 0);
        assert!(!seq.busy(), "held trigger must not re-fire");
        seq.tick(false, false, false, 0);
        seq.tick(true, false, false, 0);
        assert!(seq.busy(), "fresh edge fires");
    }

    #[test]
    fn trigger_while_busy_ignored() {
        let mut seq = TempSequencer::new(ADDR);
        seq.tick(true, false, false, 0);
        seq.tick(false, true, false, 0);
        let state_before = seq.state();
        // Spurious trigger edges mid-cycle.
        seq.tick(false, true, false, 0);
        seq.tick(true, true, false, 0);
        seq.tick(false, true, false, 0);
        seq.tick(true, true, false, 0);
        assert_eq!(seq.state(), state_before);
        assert!(seq.busy());
    }

    #[test]
    fn ack_failure_is_published_not_fatal() {
        let mut seq = TempSequencer::new(ADDR);
        seq.tick(true, false, false, 0);
        seq.tick(false, true, true, 0); // engine flags the failure
        seq.tick(false, false, true, 0);
        seq.tick(false, true, true, 0);
        seq.tick(false, false, true, 0xFF);
        seq.tick(false, true, true, 0xFF);
        seq.tick(false, false, true, 0xFF);
        assert!(seq.cycle_done());
        assert_eq!(seq.value(), 0xFFFF);
        assert!(seq.ack_failed());
    }

    #[test]
    fn reset_clears_captured_data() {
        let mut seq = TempSequencer::new(ADDR);
        seq.tick(true, false, false, 0);
        seq.tick(false, true, false, 0);
        seq.reset();
        assert_eq!(seq.state(), SequencerState::Idle);
        assert!(!seq.busy());
        assert_eq!(seq.value(), 0);
        assert!(!seq.has_reading());
        assert!(!seq.request().enable);
    }
}
