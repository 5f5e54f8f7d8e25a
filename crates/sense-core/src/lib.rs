//! Core traits and types for cycle-accurate sensor-interface simulation.
//!
//! Everything ticks at the system clock frequency. All bus timing and
//! trigger timing derives from this. No exceptions.

mod clock;
mod observable;
mod tickable;
mod ticks;

pub use clock::MasterClock;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
