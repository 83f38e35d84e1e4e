//! The interface between interrupt handlers and the protocol state machines.
//!
//! Anything that is advanced by the periodic timer interrupt and reset by the
//! control line implements [`TickDriven`]. The transmitter, the receiver and
//! a [`Link`](crate::link::Link) of both all do, so the same ISR glue in
//! [`crate::timer`] serves a sending board, a receiving board and a loopback
//! setup.

use crate::clock::Tick;

/// An edge on the control line.
///
/// The integrator chooses which physical edge maps to which variant; by
/// convention a button press that should (re)start a transfer is `Rising`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ControlEdge {
    /// Start, or restart from scratch, discarding any progress.
    Rising,
    /// Stop and go quiet until the next `Rising` edge.
    Falling,
}

/// A session advanced once per timer interrupt.
pub trait TickDriven {
    /// Runs one tick. `now` is the value of the tick counter for this
    /// interrupt. Must not block.
    fn on_tick(&mut self, now: Tick);

    /// Applies an edge of the control line.
    fn on_control(&mut self, edge: ControlEdge);
}
