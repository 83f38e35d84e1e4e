//! Tick scheduling for the link.
//!
//! A [`Node`] owns the tick counter and one [`TickDriven`] session (a
//! transmitter, a receiver or a [`Link`](crate::link::Link)). Something has to
//! call [`Node::tick`] at a fixed rate. Two approaches are provided: an
//! interrupt service routine using `critical_section::with` (`timer-isr`
//! feature), or a busy-loop delay timer (`delay-loop` feature).
//!
//! Contains helpers for polling- and ISR-based scheduling, including:
//! - `ticks_per_bit`: runtime bit period calculator
//! - `const_ticks_per_bit`: compile-time bit period calculator
//! - `run_tick_loop`: blocking driver loop for `DelayNs` (feature `delay-loop`)
//! - `global_node_tick` and `tick_link_node!()`: interrupt-based tick callback
//!   wrappers (feature `timer-isr`)
//!
//! The receiver does not need to know the bit rate; it measures it. Only the
//! transmitter's `ticks_per_bit` has to be picked, and the receiver's tick
//! should be several times faster than the bit rate for clean sampling.

use libm::roundf;

use crate::clock::{Tick, TickClock};
use crate::session::{ControlEdge, TickDriven};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// Nanoseconds per second.
pub const NANOSECONDS_PER_SECOND: u32 = 1_000_000_000;

/// Number of ticks per bit for a timer firing every `tick_us` microseconds
/// and a target bit rate of `bits_per_second`.
///
/// Rounds to the nearest whole tick and clamps to `1..=u16::MAX`. A zero bit
/// rate or tick length gives `u16::MAX`.
///
/// # Example
/// ```rust
/// // 100 µs ticks, 1 kbps
/// assert_eq!(lightlink::timer::ticks_per_bit(100.0, 1_000), 10);
/// ```
pub fn ticks_per_bit(tick_us: f32, bits_per_second: u32) -> u16 {
    if bits_per_second == 0 || tick_us <= 0.0 {
        return u16::MAX;
    }
    let bit_us = 1_000_000.0 / bits_per_second as f32;
    let ticks = roundf(bit_us / tick_us);
    if ticks >= f32::from(u16::MAX) {
        u16::MAX
    } else if ticks >= 1.0 {
        ticks as u16
    } else {
        1
    }
}

/// Compile-time ticks per bit value.
///
/// # Arguments
/// - `tick_ns`: tick interval in nanoseconds (e.g. 62_500)
/// - `bits_per_second`: target bit rate
///
/// # Returns
/// Number of ticks per bit (for initializing the `Transmitter`), truncated
/// and clamped to `1..=u16::MAX`. Either argument being zero gives
/// `u16::MAX`.
pub const fn const_ticks_per_bit(tick_ns: u32, bits_per_second: u32) -> u16 {
    if tick_ns == 0 || bits_per_second == 0 {
        return u16::MAX;
    }
    let bit_ns = NANOSECONDS_PER_SECOND / bits_per_second;
    let ticks = bit_ns / tick_ns;
    if ticks == 0 {
        1
    } else if ticks > u16::MAX as u32 {
        u16::MAX
    } else {
        ticks as u16
    }
}

/// A tick counter plus the session it drives.
///
/// # Example
/// ```rust
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use lightlink::config::ReceiverConfig;
/// use lightlink::receive::Receiver;
/// use lightlink::timer::Node;
///
/// # let pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
/// let receiver: Receiver<Pin, 32> = Receiver::new(pin, ReceiverConfig::default()).unwrap();
/// let mut node = Node::new(receiver);
/// node.tick(); // from the timer interrupt
/// assert_eq!(node.now(), 1);
/// # node.session_mut().rx.done();
/// ```
#[derive(Debug)]
pub struct Node<S: TickDriven> {
    clock: TickClock,
    session: S,
}

impl<S: TickDriven> Node<S> {
    /// Wraps `session` with a clock at tick zero.
    pub const fn new(session: S) -> Self {
        Self {
            clock: TickClock::new(),
            session,
        }
    }

    /// Advances the clock and runs one tick of the session.
    pub fn tick(&mut self) {
        let now = self.clock.advance();
        self.session.on_tick(now);
    }

    /// Forwards a control-line edge to the session.
    pub fn control(&mut self, edge: ControlEdge) {
        self.session.on_control(edge);
    }

    /// The current tick.
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// The driven session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The driven session, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Gives back the session.
    pub fn into_session(self) -> S {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        ticks: Vec<Tick>,
        edges: Vec<ControlEdge>,
    }

    impl TickDriven for Recorder {
        fn on_tick(&mut self, now: Tick) {
            self.ticks.push(now);
        }

        fn on_control(&mut self, edge: ControlEdge) {
            self.edges.push(edge);
        }
    }

    #[test]
    fn test_node_passes_increasing_ticks() {
        let mut node = Node::new(Recorder::default());
        for _ in 0..3 {
            node.tick();
        }
        node.control(ControlEdge::Falling);
        assert_eq!(node.now(), 3);
        let recorder = node.into_session();
        assert_eq!(recorder.ticks, [1, 2, 3]);
        assert_eq!(recorder.edges, [ControlEdge::Falling]);
    }

    #[test]
    fn test_ticks_per_bit() {
        assert_eq!(ticks_per_bit(62.5, 2_000), 8);
        assert_eq!(ticks_per_bit(100.0, 1_000), 10);
        assert_eq!(ticks_per_bit(1_000.0, 10_000), 1);
    }

    #[test]
    fn test_ticks_per_bit_clamps() {
        assert_eq!(ticks_per_bit(1_000.0, 1_000_000), 1);
        assert_eq!(ticks_per_bit(0.001, 1), u16::MAX);
        assert_eq!(ticks_per_bit(100.0, 0), u16::MAX);
        assert_eq!(ticks_per_bit(0.0, 1_000), u16::MAX);
    }

    #[test]
    fn test_const_ticks_per_bit() {
        const TPB: u16 = const_ticks_per_bit(62_500, 2_000);
        assert_eq!(TPB, 8);
        assert_eq!(const_ticks_per_bit(1_000_000, 10_000), 1);
    }

    #[test]
    fn test_const_ticks_per_bit_clamps() {
        assert_eq!(const_ticks_per_bit(1, 1), u16::MAX);
        assert_eq!(const_ticks_per_bit(62_500, 0), u16::MAX);
        assert_eq!(const_ticks_per_bit(0, 2_000), u16::MAX);
    }
}
