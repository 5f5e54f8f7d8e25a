//! Analog Devices ADT7420 temperature sensor model.
//!
//! The ADT7420 is a 16-bit digital temperature sensor on a two-wire
//! bus. This model implements the slave side of the protocol (address
//! match, register pointer, multi-byte reads with auto-increment, ack
//! generation, optional clock stretching) plus the register file the
//! readout core touches.
//!
//! # Registers
//!
//! | Addr | Name        | Notes                                    |
//! |------|-------------|------------------------------------------|
//! | 0x00 | Temp MSB    | Read-only                                |
//! | 0x01 | Temp LSB    | Read-only                                |
//! | 0x02 | Status      | Read-only; RDY is active-low (bit 7)     |
//! | 0x03 | Configuration | Resolution select in bit 7             |
//! | 0x04 | T_HIGH MSB  | Over-temperature setpoint                |
//! | 0x05 | T_HIGH LSB  |                                          |
//! | 0x06 | T_LOW MSB   | Under-temperature setpoint               |
//! | 0x07 | T_LOW LSB   |                                          |
//! | 0x08 | T_CRIT MSB  | Critical setpoint                        |
//! | 0x09 | T_CRIT LSB  |                                          |
//! | 0x0A | T_HYST      | Hysteresis, low nibble                   |
//! | 0x0B | ID          | Reads 0xCB                               |
//! | 0x2F | Soft reset  | Any write resets the part                |
//!
//! In the default 13-bit resolution the temperature occupies the top 13
//! bits of the 16-bit value at 0.0625 °C per count; the event-flag bits
//! in the LSB read zero in this model. With the resolution bit set the
//! full 16 bits carry the value at 0.0078125 °C per count.

use bitflags::bitflags;
use twi_master::TwiBus;

/// Device identification register value.
pub const ID: u8 = 0xCB;

/// Factory default bus address (A1:A0 pins pulled high).
pub const DEFAULT_ADDRESS: u8 = 0x4B;

bitflags! {
    /// Status register (0x02). RDY is active-low: 0 = conversion ready.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Temperature below T_LOW.
        const T_LOW = 1 << 4;
        /// Temperature above T_HIGH.
        const T_HIGH = 1 << 5;
        /// Temperature above T_CRIT.
        const T_CRIT = 1 << 6;
        /// Conversion not ready (active-low ready flag).
        const NOT_READY = 1 << 7;
    }
}

bitflags! {
    /// Configuration register (0x03).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Config: u8 {
        /// Fault queue length, low two bits.
        const FAULT_QUEUE = 0b0000_0011;
        /// CT pin polarity.
        const CT_POLARITY = 1 << 2;
        /// INT pin polarity.
        const INT_POLARITY = 1 << 3;
        /// Comparator (1) vs interrupt (0) mode.
        const COMPARATOR_MODE = 1 << 4;
        /// Operation mode, two bits (00 = continuous conversion).
        const OP_MODE = 0b0110_0000;
        /// 16-bit resolution when set, 13-bit when clear.
        const RESOLUTION_16BIT = 1 << 7;
    }
}

/// Frame role within one bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// First frame after a start: address + direction.
    Address,
    /// Master writes: register pointer, then register data.
    Write,
    /// Master reads register data.
    Read,
}

/// ADT7420 temperature sensor on a two-wire bus.
pub struct Adt7420 {
    /// 7-bit bus address.
    address: u8,
    /// Current temperature in milli-degrees Celsius.
    millicelsius: i32,
    /// Configuration register.
    config: Config,
    /// Register pointer; auto-increments across multi-byte accesses.
    pointer: u8,
    /// T_HIGH setpoint (16-bit register image).
    t_high: u16,
    /// T_LOW setpoint.
    t_low: u16,
    /// T_CRIT setpoint.
    t_crit: u16,
    /// T_HYST register (low nibble).
    t_hyst: u8,

    /// Ticks of clock stretching after each completed frame (0 = none).
    stretch_ticks: u32,
    /// Remaining ticks of an active stretch.
    stretch_remaining: u32,

    // --- Bus interface state ---
    scl_prev: bool,
    sda_prev: bool,
    /// Inside a transaction (start seen, no stop yet).
    active: bool,
    /// Address matched this transaction.
    addressed: bool,
    /// Role of the current frame.
    frame: Frame,
    /// Rising edges completed in the current 9-clock frame.
    clocks: u8,
    /// Incoming bit assembly.
    shift_in: u8,
    /// Outgoing byte for the current read frame.
    shift_out: u8,
    /// Next incoming byte is the register pointer.
    pointer_pending: bool,
    /// Current SDA pull.
    pull_sda: bool,
}

impl Adt7420 {
    /// Create a sensor at the given 7-bit address, reading 25 °C.
    ///
    /// # Panics
    ///
    /// Panics if the address does not fit in seven bits.
    #[must_use]
    pub fn new(address: u8) -> Self {
        assert!(address <= 0x7F, "two-wire addresses are 7-bit");
        Self {
            address,
            millicelsius: 25_000,
            config: Config::empty(),
            pointer: 0,
            t_high: 0x2000, // +64 °C
            t_low: 0x0500,  // +10 °C
            t_crit: 0x4980, // +147 °C
            t_hyst: 0x05,
            stretch_ticks: 0,
            stretch_remaining: 0,
            scl_prev: true,
            sda_prev: true,
            active: false,
            addressed: false,
            frame: Frame::Address,
            clocks: 0,
            shift_in: 0,
            shift_out: 0,
            pointer_pending: false,
            pull_sda: false,
        }
    }

    /// Set the measured temperature in degrees Celsius.
    pub fn set_temperature(&mut self, celsius: f64) {
        self.millicelsius = (celsius * 1000.0).round() as i32;
    }

    /// Measured temperature in milli-degrees Celsius.
    #[must_use]
    pub fn millicelsius(&self) -> i32 {
        self.millicelsius
    }

    /// Enable clock stretching: hold SCL low for `ticks` system ticks
    /// after each completed frame.
    pub fn set_stretch(&mut self, ticks: u32) {
        self.stretch_ticks = ticks;
    }

    /// Current register pointer.
    #[must_use]
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    /// The 16-bit image of the temperature registers under the current
    /// resolution setting.
    #[must_use]
    pub fn temperature_raw(&self) -> u16 {
        if self.config.contains(Config::RESOLUTION_16BIT) {
            // 0.0078125 °C per count: counts = m°C * 128 / 1000.
            let counts = (i64::from(self.millicelsius) * 128 / 1000)
                .clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
            counts as u16
        } else {
            // 0.0625 °C per count in the top 13 bits; event flags zero.
            let counts = (i64::from(self.millicelsius) * 16 / 1000).clamp(-4096, 4095) as i16;
            ((counts as u16) << 3) & 0xFFF8
        }
    }

    /// Read a register by address.
    #[must_use]
    pub fn read_register(&self, reg: u8) -> u8 {
        let temp = self.temperature_raw();
        match reg {
            0x00 => (temp >> 8) as u8,
            0x01 => temp as u8,
            0x02 => Status::empty().bits(), // conversion always ready
            0x03 => self.config.bits(),
            0x04 => (self.t_high >> 8) as u8,
            0x05 => self.t_high as u8,
            0x06 => (self.t_low >> 8) as u8,
            0x07 => self.t_low as u8,
            0x08 => (self.t_crit >> 8) as u8,
            0x09 => self.t_crit as u8,
            0x0A => self.t_hyst,
            0x0B => ID,
            _ => 0x00,
        }
    }

    /// Write a register by address. Read-only registers ignore writes.
    pub fn write_register(&mut self, reg: u8, value: u8) {
        match reg {
            0x03 => self.config = Config::from_bits_truncate(value),
            0x04 => self.t_high = (self.t_high & 0x00FF) | (u16::from(value) << 8),
            0x05 => self.t_high = (self.t_high & 0xFF00) | u16::from(value),
            0x06 => self.t_low = (self.t_low & 0x00FF) | (u16::from(value) << 8),
            0x07 => self.t_low = (self.t_low & 0xFF00) | u16::from(value),
            0x08 => self.t_crit = (self.t_crit & 0x00FF) | (u16::from(value) << 8),
            0x09 => self.t_crit = (self.t_crit & 0xFF00) | u16::from(value),
            0x0A => self.t_hyst = value & 0x0F,
            0x2F => self.soft_reset(),
            _ => {}
        }
    }

    /// Power-on reset. The measured temperature is a property of the
    /// environment, not the part, and survives.
    pub fn reset(&mut self) {
        let celsius = self.millicelsius;
        let stretch = self.stretch_ticks;
        let address = self.address;
        *self = Self::new(address);
        self.millicelsius = celsius;
        self.stretch_ticks = stretch;
    }

    fn soft_reset(&mut self) {
        self.config = Config::empty();
        self.pointer = 0;
        self.t_high = 0x2000;
        self.t_low = 0x0500;
        self.t_crit = 0x4980;
        self.t_hyst = 0x05;
    }

    /// Advance one system tick: observe the bus lines, run the slave
    /// protocol, refresh the open-drain pulls.
    pub fn tick(&mut self, bus: &mut TwiBus) {
        let scl = bus.scl();
        let sda = bus.sda();

        // Start/stop conditions: SDA edges while SCL stays high.
        if scl && self.scl_prev {
            if self.sda_prev && !sda {
                self.begin_transaction();
            } else if !self.sda_prev && sda {
                self.active = false;
                self.addressed = false;
                self.pull_sda = false;
                self.stretch_remaining = 0;
            }
        }

        if self.active {
            if scl && !self.scl_prev {
                self.rising_edge(sda);
            } else if !scl && self.scl_prev {
                self.falling_edge();
            }
        }

        self.scl_prev = scl;
        self.sda_prev = sda;

        // Drive: SDA per the protocol, SCL only while stretching.
        bus.set_slave_sda(self.active && self.addressed_or_acking() && self.pull_sda);
        if self.stretch_remaining > 0 {
            self.stretch_remaining -= 1;
            bus.set_slave_scl(true);
        } else {
            bus.set_slave_scl(false);
        }
    }

    fn addressed_or_acking(&self) -> bool {
        // During the address frame the match is not yet decided; the
        // ack pull itself is only set after a successful match.
        self.addressed || self.frame == Frame::Address
    }

    fn begin_transaction(&mut self) {
        self.active = true;
        self.addressed = false;
        self.frame = Frame::Address;
        self.clocks = 0;
        self.shift_in = 0;
        self.pointer_pending = false;
        self.pull_sda = false;
    }

    /// SCL rising edge: sample SDA.
    fn rising_edge(&mut self, sda: bool) {
        if self.clocks < 8 {
            if self.frame != Frame::Read {
                self.shift_in = (self.shift_in << 1) | u8::from(sda);
            }
        } else if self.frame == Frame::Read && self.addressed && sda {
            // Master NACK: final byte — release and await the stop.
            self.addressed = false;
        }
        self.clocks += 1;
    }

    /// SCL falling edge: set up the pulse that follows.
    fn falling_edge(&mut self) {
        if self.clocks == 8 {
            // Acknowledgement window next.
            self.pull_sda = match self.frame {
                Frame::Address => (self.shift_in >> 1) == self.address,
                Frame::Write => self.addressed,
                Frame::Read => false, // master drives this one
            };
        } else if self.clocks == 9 {
            self.complete_frame();
        } else if self.frame == Frame::Read && self.addressed {
            self.pull_sda = self.shift_out & (1 << (7 - self.clocks)) == 0;
        }
    }

    /// Falling edge after the acknowledgement clock: commit the frame
    /// and prepare the next one.
    fn complete_frame(&mut self) {
        self.clocks = 0;
        match self.frame {
            Frame::Address => {
                if (self.shift_in >> 1) == self.address {
                    self.addressed = true;
                    if self.shift_in & 1 == 1 {
                        self.frame = Frame::Read;
                        self.shift_out = self.read_register(self.pointer);
                        self.pull_sda = self.shift_out & 0x80 == 0;
                    } else {
                        self.frame = Frame::Write;
                        self.pointer_pending = true;
                        self.pull_sda = false;
                    }
                } else {
                    // Not for us: go deaf until the next start or stop.
                    self.addressed = false;
                    self.frame = Frame::Write;
                    self.pull_sda = false;
                }
            }
            Frame::Write => {
                if self.addressed {
                    if self.pointer_pending {
                        self.pointer = self.shift_in;
                        self.pointer_pending = false;
                    } else {
                        self.write_register(self.pointer, self.shift_in);
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
                self.pull_sda = false;
            }
            Frame::Read => {
                if self.addressed {
                    // Byte consumed and acknowledged: advance the
                    // pointer and stage the next register.
                    self.pointer = self.pointer.wrapping_add(1);
                    self.shift_out = self.read_register(self.pointer);
                    self.pull_sda = self.shift_out & 0x80 == 0;
                } else {
                    self.pull_sda = false;
                }
            }
        }
        self.shift_in = 0;
        if self.addressed && self.stretch_ticks > 0 {
            self.stretch_remaining = self.stretch_ticks;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twi_master::{Request, TwiMaster};

    const DIVISOR: u32 = 8;

    /// Drive one or two master transfers against the sensor and return
    /// the bytes the master read.
    ///
    /// `writes` are sent first as a chained write (pointer, then data);
    /// `reads` is the number of bytes read back afterwards via a
    /// repeated start.
    fn transfer(sensor: &mut Adt7420, writes: &[u8], reads: usize) -> Vec<u8> {
        let mut master = TwiMaster::new(DIVISOR);
        let mut bus = TwiBus::new();
        let mut bytes = Vec::new();

        let mut busy_prev = false;
        let mut accepts = 0usize;
        for _ in 0..20_000 {
            let req = if accepts < writes.len() {
                Request::write(sensor.address, writes[accepts])
            } else if accepts < writes.len() + reads {
                Request::read(sensor.address)
            } else {
                Request::disabled()
            };
            master.tick(&req, &mut bus);
            sensor.tick(&mut bus);

            if !master.busy() && busy_prev && accepts > writes.len() {
                bytes.push(master.read_byte());
            }
            if master.busy() && !busy_prev {
                accepts += 1;
            }
            busy_prev = master.busy();
            if accepts >= writes.len() + reads && !master.busy() && bytes.len() == reads {
                break;
            }
        }
        assert!(!master.ack_error(), "sensor must acknowledge");
        bytes
    }

    #[test]
    fn thirteen_bit_encoding() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        sensor.set_temperature(25.0625);
        // 25.0625 / 0.0625 = 401 counts = 0x191, shifted into the top
        // 13 bits: 0x0C88.
        assert_eq!(sensor.temperature_raw(), 0x0C88);

        sensor.set_temperature(-0.25);
        // -4 counts, two's complement in 13 bits, flags zero.
        assert_eq!(sensor.temperature_raw(), 0xFFE0);

        sensor.set_temperature(0.0);
        assert_eq!(sensor.temperature_raw(), 0x0000);
    }

    #[test]
    fn sixteen_bit_encoding() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        sensor.write_register(0x03, Config::RESOLUTION_16BIT.bits());
        sensor.set_temperature(25.0);
        // 25 / 0.0078125 = 3200 = 0x0C80.
        assert_eq!(sensor.temperature_raw(), 0x0C80);
    }

    #[test]
    fn id_register_reads_cb() {
        let sensor = Adt7420::new(DEFAULT_ADDRESS);
        assert_eq!(sensor.read_register(0x0B), 0xCB);
    }

    #[test]
    fn soft_reset_restores_defaults() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        sensor.write_register(0x03, 0x80);
        sensor.write_register(0x0A, 0x02);
        sensor.write_register(0x2F, 0x00);
        assert_eq!(sensor.read_register(0x03), 0x00);
        assert_eq!(sensor.read_register(0x0A), 0x05);
    }

    #[test]
    fn pointer_then_single_read() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        let bytes = transfer(&mut sensor, &[0x0B], 1);
        assert_eq!(bytes, vec![0xCB]);
    }

    #[test]
    fn temperature_read_msb_then_lsb() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        sensor.set_temperature(25.0625);
        let bytes = transfer(&mut sensor, &[0x00], 2);
        assert_eq!(bytes, vec![0x0C, 0x88]);
    }

    #[test]
    fn register_write_through_bus() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        // Pointer 0x0A, then data 0x03 → T_HYST.
        let bytes = transfer(&mut sensor, &[0x0A, 0x03], 0);
        assert!(bytes.is_empty());
        assert_eq!(sensor.read_register(0x0A), 0x03);
    }

    #[test]
    fn wrong_address_is_ignored() {
        let mut sensor = Adt7420::new(0x48);
        sensor.set_temperature(30.0);

        let mut master = TwiMaster::new(DIVISOR);
        let mut bus = TwiBus::new();
        let mut req = Request::read(DEFAULT_ADDRESS); // 0x4B, not 0x48
        for _ in 0..5_000 {
            master.tick(&req, &mut bus);
            sensor.tick(&mut bus);
            if master.busy() {
                req = Request::disabled();
            }
        }
        assert!(master.ack_error(), "nobody home at 0x4B");
        // The released line reads as all ones.
        assert_eq!(master.read_byte(), 0xFF);
    }

    #[test]
    fn clock_stretching_still_delivers_data() {
        let mut sensor = Adt7420::new(DEFAULT_ADDRESS);
        sensor.set_temperature(25.0625);
        sensor.set_stretch(50);
        let bytes = transfer(&mut sensor, &[0x00], 2);
        assert_eq!(bytes, vec![0x0C, 0x88]);
    }
}
