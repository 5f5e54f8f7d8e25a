//! Trait for components advanced by clock ticks.

use crate::Ticks;

/// A component advanced by system clock ticks.
///
/// This is the core abstraction for the simulation. A board implements
/// it at the top; parts that need bus access are stepped by their owner
/// with explicit arguments. Waiting is expressed by a component staying
/// in the same state across ticks; nothing blocks.
pub trait Tickable {
    /// Advance the component by one system clock tick.
    ///
    /// Components track their own phase relative to the system clock and
    /// perform work when appropriate (e.g. a bus controller dividing the
    /// system clock down to the bus bit rate only acts at phase
    /// boundaries).
    fn tick(&mut self);

    /// Synchronous reset: return all state to power-on values.
    ///
    /// Models the design's global reset line. Captured data is cleared,
    /// state machines return to idle, and any driven outputs are
    /// released. Takes effect immediately, regardless of progress.
    fn reset(&mut self);

    /// Advance the component by multiple ticks.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
