//! Two-wire bus master protocol engine.
//!
//! Executes one transaction per activation: start condition, address +
//! direction byte, acknowledgement check, one data byte (read or
//! write), a second acknowledgement step, then, depending on whether
//! the caller keeps requesting the same target, a chained transfer, a
//! repeated start, or a stop condition.
//!
//! State transitions happen only on data-clock edges from [`BitClock`]:
//! outputs change on the rising edge (SCL low), inputs are sampled on
//! the falling edge (SCL high). Byte transfers are MSB-first with an
//! explicit 7→0 bit counter.
//!
//! Acknowledgement failures are recorded in a sticky flag and never
//! abort the in-flight byte; there is no retry and no timeout.

use crate::bitclock::BitClock;
use crate::bus::TwiBus;

/// Transfer direction of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Master sends a byte to the slave.
    Write,
    /// Master receives a byte from the slave.
    Read,
}

/// One transaction request, presented to the engine every tick.
///
/// Sampled in [`MasterState::Idle`] and at the acknowledgement decision
/// edges; at those edges the request decides between chaining another
/// byte, a repeated start, or a stop.
#[derive(Debug, Clone, Copy)]
pub struct Request {
    /// Start (or continue) a transaction.
    pub enable: bool,
    /// 7-bit target address.
    pub address: u8,
    /// Transfer direction.
    pub direction: Direction,
    /// Byte to send when the direction is [`Direction::Write`].
    pub write_byte: u8,
}

impl Request {
    /// No transaction requested.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enable: false,
            address: 0,
            direction: Direction::Write,
            write_byte: 0,
        }
    }

    /// Request a single-byte write to `address`.
    #[must_use]
    pub const fn write(address: u8, byte: u8) -> Self {
        Self {
            enable: true,
            address,
            direction: Direction::Write,
            write_byte: byte,
        }
    }

    /// Request a byte read from `address`.
    #[must_use]
    pub const fn read(address: u8) -> Self {
        Self {
            enable: true,
            address,
            direction: Direction::Read,
            write_byte: 0,
        }
    }

    /// Address + direction as the 8-bit wire byte (address in the high
    /// seven bits, read flag in bit 0).
    #[must_use]
    fn wire_byte(&self) -> u8 {
        let rw = match self.direction {
            Direction::Write => 0,
            Direction::Read => 1,
        };
        ((self.address & 0x7F) << 1) | rw
    }
}

/// Protocol engine state. Exactly one active at a time; transitions
/// only at data-clock edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    /// Bus released, waiting for a request.
    Idle,
    /// Start (or repeated start) condition being shaped.
    Start,
    /// Shifting out the address + direction byte.
    Address,
    /// Slave acknowledgement window for the address byte.
    AddrAck,
    /// Shifting out the data byte.
    WriteByte,
    /// Shifting in the data byte.
    ReadByte,
    /// Slave acknowledgement window for a written byte.
    WriteAck,
    /// Master-driven acknowledgement after a read byte.
    ReadAck,
    /// Stop condition being shaped.
    Stop,
}

impl MasterState {
    /// Short name for logging and state queries.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Start => "start",
            Self::Address => "address",
            Self::AddrAck => "addr_ack",
            Self::WriteByte => "write_byte",
            Self::ReadByte => "read_byte",
            Self::WriteAck => "write_ack",
            Self::ReadAck => "read_ack",
            Self::Stop => "stop",
        }
    }
}

/// Two-wire bus master engine.
pub struct TwiMaster {
    /// Bit-period timing, including clock-stretch handling.
    clock: BitClock,
    /// Current protocol state.
    state: MasterState,
    /// Transaction in progress (pulses low for one bit period between
    /// chained transfers so the caller can exchange bytes).
    busy: bool,
    /// Sticky acknowledgement failure. Cleared only on a fresh start
    /// out of idle, never on a repeated start.
    ack_error: bool,
    /// Latched address + direction wire byte.
    addr_rw: u8,
    /// Latched byte being written.
    tx_byte: u8,
    /// Shift register assembling an incoming byte.
    rx_shift: u8,
    /// Last completed incoming byte.
    read_byte: u8,
    /// Bit index within the current byte, 7→0.
    bit: u8,
    /// Internal SDA level between start/stop shaping (true = release).
    sda_int: bool,
    /// Holding SCL for an active transaction.
    scl_active: bool,
}

impl TwiMaster {
    /// Create an idle engine. `divisor` is the number of system ticks
    /// per bus bit period (see [`BitClock::new`]).
    #[must_use]
    pub fn new(divisor: u32) -> Self {
        Self {
            clock: BitClock::new(divisor),
            state: MasterState::Idle,
            busy: false,
            ack_error: false,
            addr_rw: 0,
            tx_byte: 0,
            rx_shift: 0,
            read_byte: 0,
            bit: 7,
            sda_int: true,
            scl_active: false,
        }
    }

    /// Advance one system tick.
    ///
    /// Samples the bus lines as resolved at the end of the previous
    /// tick, advances the bit clock (which freezes under clock
    /// stretching), steps the state machine on data-clock edges, and
    /// re-drives the open-drain pulls.
    pub fn tick(&mut self, req: &Request, bus: &mut TwiBus) {
        let scl_line = bus.scl();
        let sda_line = bus.sda();

        self.clock.tick(scl_line);

        if self.clock.rising() {
            self.change_edge(req);
        } else if self.clock.falling() {
            self.sample_edge(sda_line);
        }

        self.drive(bus);
    }

    /// Synchronous reset: idle state, flags cleared, drives released.
    ///
    /// The bus pulls themselves refresh on the next tick; a board-level
    /// reset releases the shared lines directly.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.state = MasterState::Idle;
        self.busy = false;
        self.ack_error = false;
        self.addr_rw = 0;
        self.tx_byte = 0;
        self.rx_shift = 0;
        self.read_byte = 0;
        self.bit = 7;
        self.sda_int = true;
        self.scl_active = false;
    }

    /// Transaction in progress.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Sticky acknowledgement failure flag.
    #[must_use]
    pub fn ack_error(&self) -> bool {
        self.ack_error
    }

    /// Last completed incoming byte.
    #[must_use]
    pub fn read_byte(&self) -> u8 {
        self.read_byte
    }

    /// Current protocol state.
    #[must_use]
    pub fn state(&self) -> MasterState {
        self.state
    }

    /// Whether the slave is currently stretching the clock.
    #[must_use]
    pub fn stretched(&self) -> bool {
        self.clock.stretched()
    }

    /// Data-change edge: update state and outgoing data.
    fn change_edge(&mut self, req: &Request) {
        match self.state {
            MasterState::Idle => {
                if req.enable {
                    self.busy = true;
                    self.addr_rw = req.wire_byte();
                    self.tx_byte = req.write_byte;
                    self.state = MasterState::Start;
                } else {
                    self.busy = false;
                }
            }
            MasterState::Start => {
                self.busy = true;
                self.sda_int = self.addr_rw & 0x80 != 0;
                self.state = MasterState::Address;
            }
            MasterState::Address => {
                if self.bit == 0 {
                    // All eight bits out: release SDA for the slave's ack.
                    self.sda_int = true;
                    self.bit = 7;
                    self.state = MasterState::AddrAck;
                } else {
                    self.bit -= 1;
                    self.sda_int = self.addr_rw & (1 << self.bit) != 0;
                }
            }
            MasterState::AddrAck => {
                if self.addr_rw & 0x01 == 0 {
                    self.sda_int = self.tx_byte & 0x80 != 0;
                    self.state = MasterState::WriteByte;
                } else {
                    self.sda_int = true;
                    self.state = MasterState::ReadByte;
                }
            }
            MasterState::WriteByte => {
                self.busy = true;
                if self.bit == 0 {
                    self.sda_int = true;
                    self.bit = 7;
                    self.state = MasterState::WriteAck;
                } else {
                    self.bit -= 1;
                    self.sda_int = self.tx_byte & (1 << self.bit) != 0;
                }
            }
            MasterState::ReadByte => {
                self.busy = true;
                if self.bit == 0 {
                    // Master drives the acknowledgement: ACK (low) when
                    // the caller continues the identical transfer, NACK
                    // (high) to mark the final byte.
                    self.sda_int = !(req.enable && req.wire_byte() == self.addr_rw);
                    self.bit = 7;
                    self.read_byte = self.rx_shift;
                    self.state = MasterState::ReadAck;
                } else {
                    self.bit -= 1;
                }
            }
            MasterState::WriteAck => {
                if req.enable {
                    // Busy drops for one bit period so the caller can
                    // hand over the next byte.
                    self.busy = false;
                    let same = req.wire_byte() == self.addr_rw;
                    self.addr_rw = req.wire_byte();
                    self.tx_byte = req.write_byte;
                    if same {
                        self.sda_int = self.tx_byte & 0x80 != 0;
                        self.state = MasterState::WriteByte;
                    } else {
                        self.state = MasterState::Start;
                    }
                } else {
                    self.state = MasterState::Stop;
                }
            }
            MasterState::ReadAck => {
                if req.enable {
                    self.busy = false;
                    let same = req.wire_byte() == self.addr_rw;
                    self.addr_rw = req.wire_byte();
                    self.tx_byte = req.write_byte;
                    if same {
                        self.sda_int = true;
                        self.state = MasterState::ReadByte;
                    } else {
                        self.state = MasterState::Start;
                    }
                } else {
                    self.state = MasterState::Stop;
                }
            }
            MasterState::Stop => {
                self.busy = false;
                self.state = MasterState::Idle;
            }
        }
    }

    /// Sampling edge: check acknowledgements, shift in data, manage the
    /// SCL hold.
    fn sample_edge(&mut self, sda_line: bool) {
        match self.state {
            MasterState::Start => {
                if !self.scl_active {
                    // Fresh start out of idle: take the clock and clear
                    // the sticky error. A repeated start keeps both.
                    self.scl_active = true;
                    self.ack_error = false;
                }
            }
            MasterState::AddrAck | MasterState::WriteAck => {
                if sda_line {
                    self.ack_error = true;
                }
            }
            MasterState::ReadByte => {
                if sda_line {
                    self.rx_shift |= 1 << self.bit;
                } else {
                    self.rx_shift &= !(1 << self.bit);
                }
            }
            MasterState::Stop => {
                self.scl_active = false;
            }
            _ => {}
        }
    }

    /// Refresh the open-drain pulls from the current state.
    fn drive(&mut self, bus: &mut TwiBus) {
        // SCL: held low during the first half of each bit period while
        // a transaction owns the clock.
        bus.set_master_scl(self.scl_active && !self.clock.scl_ref());

        // SDA: the start condition is a fall while SCL is high, the
        // stop condition a rise while SCL is high; both are shaped from
        // the data clock. Everywhere else SDA follows the internal
        // data level.
        let release = match self.state {
            MasterState::Start => self.clock.data_clk(),
            MasterState::Stop => !self.clock.data_clk(),
            _ => self.sda_int,
        };
        bus.set_master_sda(!release);
    }
}
