//! Tick time base.
//!
//! A tick is one period of the timer interrupt that drives the link. The
//! counter wraps at `u32::MAX`; every comparison in this crate goes through
//! [`elapsed`] and [`reached`] so that a wrap in the middle of a reception is
//! harmless as long as individual intervals stay below `2^31` ticks.

/// One timer-interrupt period.
pub type Tick = u32;

/// Ticks elapsed from `since` to `now`.
#[inline]
pub fn elapsed(now: Tick, since: Tick) -> Tick {
    now.wrapping_sub(since)
}

/// Whether `now` is at or past `deadline`.
#[inline]
pub fn reached(now: Tick, deadline: Tick) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Monotonic tick counter, advanced once per timer interrupt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TickClock {
    now: Tick,
}

impl TickClock {
    /// Creates a clock at tick zero.
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Current tick.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advances the clock by one tick and returns the new value.
    pub fn advance(&mut self) -> Tick {
        self.now = self.now.wrapping_add(1);
        self.now
    }
}
