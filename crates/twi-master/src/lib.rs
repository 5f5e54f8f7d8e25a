//! Cycle-accurate two-wire (I2C-style) bus master engine.
//!
//! Three pieces model the serial side of a temperature-sensor readout
//! design:
//!
//! - [`TwiBus`]: the two open-drain lines (SCL, SDA) shared by the
//!   master and a peripheral. Drivers can only pull low or release;
//!   the pull-up makes a released line read high.
//! - [`BitClock`]: divides the system clock into the four quarter-phases
//!   of one bus bit period, and freezes when the peripheral stretches
//!   the clock.
//! - [`TwiMaster`]: the protocol state machine. Given a [`Request`], it
//!   generates start/stop conditions, shifts the address and data bytes
//!   MSB-first, checks acknowledgement windows, and chains back-to-back
//!   transfers without an intervening stop.
//!
//! Everything advances one system clock tick at a time; waiting is a
//! state held across ticks, never a blocking call.

mod bitclock;
mod bus;
mod master;

pub use bitclock::BitClock;
pub use bus::TwiBus;
pub use master::{Direction, MasterState, Request, TwiMaster};
