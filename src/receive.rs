//! Clock-recovering receiver.
//!
//! The receiver shares no clock with the transmitter. It learns the bit
//! period from the preamble's edge spacing, then samples the line once per
//! recovered period at the projected middle of each bit.
//!
//! ```text
//!  Waiting ──edge──▶ ClockSync ──quiet > 1.5·T──▶ AwaitFrame ──0x0F──▶ Receiving ──0x00 / full──▶ Complete
//!                        │                             │
//!                        └──── timeout ────▶ SyncFailed ◀── search limit
//! ```
//!
//! Sample instants are always derived from the *projected* edge
//! (`last edge + T`), never from the edges observed during data, so a run of
//! equal bits is still sampled at the right places.

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::clock::{Tick, elapsed, reached};
use crate::config::ReceiverConfig;
use crate::consts::{DEFAULT_RX_BUFFER_LEN, MIN_CLOCK_PULSES};
use crate::error::{LinkError, SyncFailure};
use crate::session::{ControlEdge, TickDriven};

/// Receiver state. Progresses strictly left to right; only
/// [`reset()`](Receiver::reset) or [`stop()`](Receiver::stop) go back.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ReceiveState {
    /// Stopped by the control line; nothing is sampled.
    Idle,
    /// Waiting for the first edge.
    #[default]
    Waiting,
    /// Timing preamble edges to estimate the bit period.
    ClockSync,
    /// Clock recovered; sampling bits until the frame-start sentinel shows up.
    AwaitFrame,
    /// Assembling payload bytes.
    Receiving,
    /// The frame ended or the buffer filled up. The buffer is final.
    Complete,
    /// The receiver gave up.
    SyncFailed(SyncFailure),
}

/// Single-pin receiver with software clock recovery.
///
/// ## Type Parameters
///
/// - `RX`: the input pin, any [`embedded_hal::digital::InputPin`]
/// - `N`: receive buffer capacity in bytes
///
/// ## Example
///
/// ```rust
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use lightlink::config::ReceiverConfig;
/// use lightlink::receive::{ReceiveState, Receiver};
///
/// # let pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
/// let mut rx: Receiver<Pin, 64> = Receiver::new(pin, ReceiverConfig::default()).unwrap();
/// let mut now = 0;
/// loop {
///     now += 1;
///     rx.step(now); // from the timer interrupt
///     # break;
/// }
/// assert_eq!(rx.state(), ReceiveState::Waiting);
/// # rx.rx.done();
/// ```
#[derive(Debug)]
pub struct Receiver<RX, const N: usize = DEFAULT_RX_BUFFER_LEN>
where
    RX: InputPin,
{
    /// RX pin
    pub rx: RX,
    config: ReceiverConfig,
    state: ReceiveState,

    /// Last accepted line level, used to spot transitions.
    last_bit: bool,
    /// A level change still being debounced: first tick it was seen and how
    /// many further steps confirmed it.
    pending_edge: Option<(Tick, u8)>,

    pulse_time_total: Tick,
    num_pulses: u16,
    avg_pulse_time: Tick,

    systime_prev_pulse: Tick,
    systime_next_pulse: Tick,
    systime_next_sample: Tick,

    /// Last eight samples, oldest in the MSB.
    frame_bits: u8,
    frame_search_count: u16,

    /// Byte being assembled, LSB first.
    byte_bits: u8,
    byte_bit_pos: u8,
    buf: Vec<u8, N>,

    /// Counter of completed receptions.
    pub rx_good: u16,
    /// Counter of receptions abandoned with [`ReceiveState::SyncFailed`].
    pub rx_bad: u16,
}

impl<RX, const N: usize> Receiver<RX, N>
where
    RX: InputPin,
{
    /// Creates a receiver waiting for the first edge.
    pub fn new(rx: RX, config: ReceiverConfig) -> Result<Self, LinkError> {
        if N == 0 {
            return Err(LinkError::ZeroCapacity);
        }
        config.validate()?;
        Ok(Self {
            rx,
            config,
            state: ReceiveState::Waiting,
            last_bit: false,
            pending_edge: None,
            pulse_time_total: 0,
            num_pulses: 0,
            avg_pulse_time: 0,
            systime_prev_pulse: 0,
            systime_next_pulse: 0,
            systime_next_sample: 0,
            frame_bits: 0,
            frame_search_count: 0,
            byte_bits: 0,
            byte_bit_pos: 0,
            buf: Vec::new(),
            rx_good: 0,
            rx_bad: 0,
        })
    }

    /// Discards all progress and waits for a new first edge.
    pub fn reset(&mut self) {
        self.clear();
        self.state = ReceiveState::Waiting;
    }

    /// Discards all progress and stops sampling until [`reset()`](Self::reset).
    pub fn stop(&mut self) {
        self.clear();
        self.state = ReceiveState::Idle;
    }

    fn clear(&mut self) {
        self.last_bit = false;
        self.pending_edge = None;
        self.pulse_time_total = 0;
        self.num_pulses = 0;
        self.avg_pulse_time = 0;
        self.systime_prev_pulse = 0;
        self.systime_next_pulse = 0;
        self.systime_next_sample = 0;
        self.frame_bits = 0;
        self.frame_search_count = 0;
        self.byte_bits = 0;
        self.byte_bit_pos = 0;
        self.buf.clear();
    }

    /// Current state.
    pub fn state(&self) -> ReceiveState {
        self.state
    }

    /// The active configuration.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Estimated bit period, once enough pulses have been measured.
    pub fn avg_pulse_time(&self) -> Option<Tick> {
        if self.num_pulses >= MIN_CLOCK_PULSES {
            Some(self.avg_pulse_time)
        } else {
            None
        }
    }

    /// Number of pulse intervals folded into the period estimate.
    pub fn num_pulses(&self) -> u16 {
        self.num_pulses
    }

    /// Sum of all measured pulse intervals.
    pub fn pulse_time_total(&self) -> Tick {
        self.pulse_time_total
    }

    /// Bytes assembled so far, whatever the state.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// The received payload, once the frame is complete.
    pub fn received(&self) -> Option<&[u8]> {
        match self.state {
            ReceiveState::Complete => Some(&self.buf),
            _ => None,
        }
    }

    /// Non-blocking poll for the received payload.
    ///
    /// # Returns
    /// - `Ok(payload)` once the frame is complete
    /// - `Err(WouldBlock)` while a reception may still finish
    /// - `Err(Other(LinkError::Sync(_)))` if the receiver gave up
    /// - `Err(Other(LinkError::NotListening))` if stopped by the control line
    pub fn read(&self) -> nb::Result<&[u8], LinkError> {
        match self.state {
            ReceiveState::Complete => Ok(&self.buf),
            ReceiveState::SyncFailed(failure) => Err(nb::Error::Other(failure.into())),
            ReceiveState::Idle => Err(nb::Error::Other(LinkError::NotListening)),
            _ => Err(nb::Error::WouldBlock),
        }
    }

    /// Advances the state machine. Call once per timer tick with the current
    /// tick count.
    pub fn step(&mut self, now: Tick) {
        match self.state {
            ReceiveState::Idle | ReceiveState::Complete | ReceiveState::SyncFailed(_) => {}
            ReceiveState::Waiting => {
                if let Some(edge_at) = self.detect_edge(now) {
                    self.systime_prev_pulse = edge_at;
                    self.pulse_time_total = 0;
                    self.num_pulses = 0;
                    self.avg_pulse_time = 0;
                    self.state = ReceiveState::ClockSync;
                    trace!("rx: first edge at {}", edge_at);
                }
            }
            ReceiveState::ClockSync => self.sync_clock(now),
            ReceiveState::AwaitFrame => {
                if let Some(bit) = self.sample_due(now) {
                    self.match_frame(bit);
                }
            }
            ReceiveState::Receiving => {
                if let Some(bit) = self.sample_due(now) {
                    self.process_bit(bit);
                }
            }
        }
    }

    fn sample(&mut self) -> bool {
        let level = match self.rx.is_high() {
            Ok(level) => level,
            Err(_) => {
                warn!("rx: pin read failed");
                false
            }
        };
        level != self.config.inverted
    }

    /// Samples the line if the next sample instant has arrived.
    fn sample_due(&mut self, now: Tick) -> Option<bool> {
        if !reached(now, self.systime_next_sample) {
            return None;
        }
        self.systime_next_sample = self.systime_next_sample.wrapping_add(self.avg_pulse_time);
        Some(self.sample())
    }

    /// Returns the tick of a confirmed transition, if one completed this step.
    fn detect_edge(&mut self, now: Tick) -> Option<Tick> {
        let level = self.sample();
        if level == self.last_bit {
            self.pending_edge = None;
            return None;
        }
        let (first_seen, confirmations) = match self.pending_edge {
            Some((first_seen, seen)) => (first_seen, seen.saturating_add(1)),
            None => (now, 0),
        };
        if confirmations < self.config.debounce_ticks {
            self.pending_edge = Some((first_seen, confirmations));
            return None;
        }
        self.pending_edge = None;
        self.last_bit = level;
        Some(first_seen)
    }

    fn sync_clock(&mut self, now: Tick) {
        if let Some(edge_at) = self.detect_edge(now) {
            let time_delta = elapsed(edge_at, self.systime_prev_pulse);
            self.pulse_time_total = self.pulse_time_total.saturating_add(time_delta);
            self.num_pulses = self.num_pulses.saturating_add(1);
            self.systime_prev_pulse = edge_at;

            if self.num_pulses >= MIN_CLOCK_PULSES {
                self.avg_pulse_time = self.pulse_time_total / Tick::from(self.num_pulses);
                self.systime_next_pulse = edge_at.wrapping_add(self.avg_pulse_time);
            }
            return;
        }
        if self.pending_edge.is_some() {
            return;
        }

        let quiet = elapsed(now, self.systime_prev_pulse);
        if self.num_pulses >= MIN_CLOCK_PULSES {
            // The preamble toggles every period; the first gap clearly longer
            // than one period is the start of the sync block.
            let threshold = self.avg_pulse_time + self.avg_pulse_time / 2;
            if quiet > threshold {
                self.systime_next_sample = self
                    .systime_next_pulse
                    .wrapping_add(self.avg_pulse_time / 2);
                self.frame_bits = 0;
                self.frame_search_count = 0;
                self.state = ReceiveState::AwaitFrame;
                debug!(
                    "rx: clock locked, {} ticks per bit over {} pulses",
                    self.avg_pulse_time,
                    self.num_pulses
                );
            }
        } else if let Some(timeout) = self.config.clock_sync_timeout {
            if quiet > timeout {
                self.fail(SyncFailure::ClockTimeout);
            }
        }
    }

    fn match_frame(&mut self, bit: bool) {
        self.frame_bits = (self.frame_bits << 1) | u8::from(bit);
        self.frame_search_count = self.frame_search_count.saturating_add(1);

        if self.frame_bits == self.config.frame_start {
            self.frame_bits = 0;
            self.byte_bits = 0;
            self.byte_bit_pos = 0;
            self.state = ReceiveState::Receiving;
            debug!("rx: frame start after {} samples", self.frame_search_count);
            return;
        }
        if let Some(limit) = self.config.frame_search_limit {
            if self.frame_search_count >= limit {
                self.fail(SyncFailure::FrameNotFound);
            }
        }
    }

    fn process_bit(&mut self, bit: bool) {
        let bitmask = 1u8 << self.byte_bit_pos;
        if bit {
            self.byte_bits |= bitmask;
        } else {
            self.byte_bits &= !bitmask;
        }
        self.last_bit = bit;
        self.byte_bit_pos += 1;
        if self.byte_bit_pos < 8 {
            return;
        }

        let byte = self.byte_bits;
        self.byte_bits = 0;
        self.byte_bit_pos = 0;

        if self.config.frame_end == Some(byte) {
            self.complete();
            return;
        }
        if self.buf.push(byte).is_err() || self.buf.is_full() {
            debug!("rx: buffer full at {} bytes", N);
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.state = ReceiveState::Complete;
        self.rx_good = self.rx_good.wrapping_add(1);
        debug!("rx: frame complete, {} bytes", self.buf.len());
    }

    fn fail(&mut self, failure: SyncFailure) {
        self.state = ReceiveState::SyncFailed(failure);
        self.rx_bad = self.rx_bad.wrapping_add(1);
        warn!("rx: {:?}", failure);
    }
}

impl<RX, const N: usize> TickDriven for Receiver<RX, N>
where
    RX: InputPin,
{
    fn on_tick(&mut self, now: Tick) {
        self.step(now);
    }

    fn on_control(&mut self, edge: ControlEdge) {
        match edge {
            ControlEdge::Rising => self.reset(),
            ControlEdge::Falling => self.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Wire;
    use embedded_hal_mock::eh1::MockError;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use std::io::ErrorKind;

    fn receiver<const N: usize>(wire: &Wire, config: ReceiverConfig) -> Receiver<Wire, N> {
        Receiver::new(wire.clone(), config).unwrap()
    }

    /// Toggles the wire every `period` ticks for `edges` edges, stepping the
    /// receiver on every tick. Returns the tick of the last edge.
    fn drive_edges<const N: usize>(
        rx: &mut Receiver<Wire, N>,
        wire: &Wire,
        now: &mut Tick,
        period: Tick,
        edges: usize,
    ) -> Tick {
        for _ in 0..edges {
            for _ in 0..period {
                *now += 1;
                rx.step(*now);
            }
            wire.toggle();
            rx.step(*now);
        }
        *now
    }

    #[test]
    fn test_receiver_initialization_defaults() {
        let wire = Wire::default();
        let rx: Receiver<Wire, 8> = receiver(&wire, ReceiverConfig::default());
        assert_eq!(rx.state(), ReceiveState::Waiting);
        assert_eq!(rx.config(), &ReceiverConfig::default());
        assert_eq!(rx.avg_pulse_time(), None);
        assert_eq!(rx.num_pulses(), 0);
        assert!(rx.buffer().is_empty());
        assert!(rx.received().is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let wire = Wire::default();
        let rx = Receiver::<Wire, 0>::new(wire, ReceiverConfig::default());
        assert!(matches!(rx, Err(LinkError::ZeroCapacity)));
    }

    #[test]
    fn test_waiting_leaves_on_first_edge() {
        let expectations = [
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ];
        let pin = PinMock::new(&expectations);
        let mut rx: Receiver<PinMock, 8> = Receiver::new(pin, ReceiverConfig::default()).unwrap();

        rx.step(1);
        assert_eq!(rx.state(), ReceiveState::Waiting);
        rx.step(2);
        assert_eq!(rx.state(), ReceiveState::ClockSync);
        assert_eq!(rx.avg_pulse_time(), None);
        rx.rx.done();
    }

    #[test]
    fn test_failed_read_counts_as_low() {
        let err = MockError::Io(ErrorKind::NotConnected);
        let expectations = [
            PinTransaction::get(PinState::High).with_error(err),
            PinTransaction::get(PinState::High),
        ];
        let pin = PinMock::new(&expectations);
        let mut rx: Receiver<PinMock, 8> = Receiver::new(pin, ReceiverConfig::default()).unwrap();

        // The failed read is taken as low, so no edge yet.
        rx.step(1);
        assert_eq!(rx.state(), ReceiveState::Waiting);
        rx.step(2);
        assert_eq!(rx.state(), ReceiveState::ClockSync);
        rx.rx.done();
    }

    #[test]
    fn test_inverted_input() {
        let expectations = [PinTransaction::get(PinState::High)];
        let pin = PinMock::new(&expectations);
        let config = ReceiverConfig {
            inverted: true,
            ..Default::default()
        };
        let mut rx: Receiver<PinMock, 8> = Receiver::new(pin, config).unwrap();
        assert!(rx.config().inverted);

        // A high pin reads as logical low: no edge yet.
        rx.step(1);
        assert_eq!(rx.state(), ReceiveState::Waiting);
        rx.rx.done();
    }

    #[test]
    fn test_period_estimate_after_four_intervals() {
        let wire = Wire::default();
        let mut rx: Receiver<Wire, 8> = receiver(&wire, ReceiverConfig::default());
        let mut now = 0;

        // The estimate counts intervals, not edges: the first edge only
        // starts the clock, so five edges are needed for four intervals.
        // First edge plus three intervals: not enough yet.
        let _ = drive_edges(&mut rx, &wire, &mut now, 25, 4);
        assert_eq!(rx.num_pulses(), 3);
        assert_eq!(rx.avg_pulse_time(), None);

        let _ = drive_edges(&mut rx, &wire, &mut now, 25, 1);
        assert_eq!(rx.num_pulses(), 4);
        assert_eq!(rx.pulse_time_total(), 100);
        assert_eq!(rx.avg_pulse_time(), Some(25));
        assert_eq!(rx.state(), ReceiveState::ClockSync);
    }

    #[test]
    fn test_quiet_threshold_is_strict() {
        let wire = Wire::default();
        let mut rx: Receiver<Wire, 8> = receiver(&wire, ReceiverConfig::default());
        let mut now = 0;
        let last_edge = drive_edges(&mut rx, &wire, &mut now, 10, 5);
        assert_eq!(rx.avg_pulse_time(), Some(10));

        // Quiet for exactly avg + avg / 2 ticks: still synchronising.
        while now < last_edge + 15 {
            now += 1;
            rx.step(now);
        }
        assert_eq!(rx.state(), ReceiveState::ClockSync);

        now += 1;
        rx.step(now);
        assert_eq!(rx.state(), ReceiveState::AwaitFrame);
    }

    #[test]
    fn test_frame_sentinel_moves_to_receiving() {
        let wire = Wire::default();
        let mut rx: Receiver<Wire, 8> = receiver(&wire, ReceiverConfig::default());
        let mut now = 0;
        // Even number of edges leaves the line low.
        let last_edge = drive_edges(&mut rx, &wire, &mut now, 10, 6);

        // Four low bits then four high bits, each 10 ticks wide.
        for t in (last_edge + 1)..(last_edge + 100) {
            if t == last_edge + 50 {
                wire.set(true);
            }
            rx.step(t);
        }
        assert_eq!(rx.state(), ReceiveState::Receiving);
    }

    #[test]
    fn test_frame_search_limit_fails_sync() {
        let wire = Wire::default();
        let config = ReceiverConfig {
            frame_search_limit: Some(16),
            ..Default::default()
        };
        let mut rx: Receiver<Wire, 8> = receiver(&wire, config);
        let mut now = 0;
        let _ = drive_edges(&mut rx, &wire, &mut now, 10, 6);

        for _ in 0..400 {
            now += 1;
            rx.step(now);
        }
        assert_eq!(
            rx.state(),
            ReceiveState::SyncFailed(SyncFailure::FrameNotFound)
        );
        assert_eq!(rx.rx_bad, 1);
        assert_eq!(
            rx.read(),
            Err(nb::Error::Other(LinkError::Sync(SyncFailure::FrameNotFound)))
        );
    }

    #[test]
    fn test_without_search_limit_the_receiver_keeps_hunting() {
        let wire = Wire::default();
        let config = ReceiverConfig {
            frame_search_limit: None,
            ..Default::default()
        };
        let mut rx: Receiver<Wire, 8> = receiver(&wire, config);
        let mut now = 0;
        let _ = drive_edges(&mut rx, &wire, &mut now, 10, 6);

        for _ in 0..10_000 {
            now += 1;
            rx.step(now);
        }
        assert_eq!(rx.state(), ReceiveState::AwaitFrame);
        assert_eq!(rx.read(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_clock_sync_timeout() {
        let wire = Wire::default();
        let config = ReceiverConfig {
            clock_sync_timeout: Some(50),
            ..Default::default()
        };
        let mut rx: Receiver<Wire, 8> = receiver(&wire, config);
        let mut now = 0;
        let first = drive_edges(&mut rx, &wire, &mut now, 10, 2);
        assert_eq!(rx.state(), ReceiveState::ClockSync);

        while now < first + 50 {
            now += 1;
            rx.step(now);
        }
        assert_eq!(rx.state(), ReceiveState::ClockSync);
        now += 1;
        rx.step(now);
        assert_eq!(
            rx.state(),
            ReceiveState::SyncFailed(SyncFailure::ClockTimeout)
        );
    }

    #[test]
    fn test_debounce_ignores_short_glitch() {
        let wire = Wire::default();
        let config = ReceiverConfig {
            debounce_ticks: 2,
            ..Default::default()
        };
        let mut rx: Receiver<Wire, 8> = receiver(&wire, config);

        wire.set(true);
        rx.step(1);
        rx.step(2);
        wire.set(false);
        rx.step(3);
        assert_eq!(rx.state(), ReceiveState::Waiting);

        wire.set(true);
        rx.step(4);
        rx.step(5);
        assert_eq!(rx.state(), ReceiveState::Waiting);
        rx.step(6);
        assert_eq!(rx.state(), ReceiveState::ClockSync);
    }

    #[test]
    fn test_without_debounce_a_glitch_starts_clock_sync() {
        let wire = Wire::default();
        let mut rx: Receiver<Wire, 8> = receiver(&wire, ReceiverConfig::default());
        wire.set(true);
        rx.step(1);
        assert_eq!(rx.state(), ReceiveState::ClockSync);
    }

    #[test]
    fn test_control_edges() {
        let wire = Wire::default();
        let mut rx: Receiver<Wire, 8> = receiver(&wire, ReceiverConfig::default());
        let mut now = 0;
        let _ = drive_edges(&mut rx, &wire, &mut now, 10, 6);
        assert!(rx.avg_pulse_time().is_some());

        rx.on_control(ControlEdge::Falling);
        assert_eq!(rx.state(), ReceiveState::Idle);
        assert_eq!(rx.read(), Err(nb::Error::Other(LinkError::NotListening)));
        wire.toggle();
        rx.step(now + 1);
        assert_eq!(rx.state(), ReceiveState::Idle);

        rx.on_control(ControlEdge::Rising);
        assert_eq!(rx.state(), ReceiveState::Waiting);
        assert_eq!(rx.num_pulses(), 0);
        assert_eq!(rx.pulse_time_total(), 0);
        assert_eq!(rx.avg_pulse_time(), None);
    }
}
