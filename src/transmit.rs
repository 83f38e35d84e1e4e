//! Self-clocking bit transmitter.
//!
//! The [`Transmitter`] clocks a payload out of a single output pin. It has no
//! notion of time beyond counting its own `on_tick()` calls, and every
//! transmission has the same shape:
//!
//! | Phase    | Bits        | Line                                        |
//! |----------|-------------|---------------------------------------------|
//! | Preamble | 8           | `1 0 1 0 1 0 1 0`, an edge every bit period   |
//! | Sync     | 8           | `0 0 0 0 1 1 1 1`                             |
//! | Data     | `8 * len`   | payload bits, LSB first                     |
//! | Done     | -           | held low                                    |
//!
//! The preamble gives the receiver evenly spaced edges to measure. The low
//! half of the sync block is the first stretch without an edge, which is how
//! the receiver knows the preamble is over, and the whole sync block is the
//! frame-start sentinel `0x0F`. Holding the line low afterwards makes the
//! next byte the receiver assembles `0x00`, the frame-end sentinel.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::clock::Tick;
use crate::config::TransmitterConfig;
use crate::consts::{DEFAULT_TX_BUFFER_LEN, PREAMBLE_BITS, SYNC_BITS};
use crate::error::LinkError;
use crate::session::{ControlEdge, TickDriven};

/// Where the transmitter is in a transmission.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TransmitPhase {
    /// Not armed, or stopped by the control line. The line is low.
    #[default]
    Idle,
    /// Sending the alternating preamble.
    Preamble,
    /// Sending the sync block / frame-start sentinel.
    Sync,
    /// Sending payload bits.
    Data,
    /// The payload is out and the line is held low until re-armed.
    Done,
}

/// Tick-driven single-pin transmitter.
///
/// ## Type Parameters
///
/// - `TX`: the output pin, any [`embedded_hal::digital::OutputPin`]
/// - `N`: payload capacity in bytes
///
/// ## Example
///
/// ```rust
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use lightlink::config::TransmitterConfig;
/// use lightlink::transmit::Transmitter;
///
/// # let pin = Pin::new(&[PinTransaction::set(PinState::Low), PinTransaction::set(PinState::Low)]);
/// let mut tx: Transmitter<Pin, 16> = Transmitter::new(pin, TransmitterConfig::default()).unwrap();
/// tx.init_send(b"Hello world!").unwrap();
/// // call `tx.on_tick()` from the timer interrupt until `tx.is_done()`
/// # tx.tx.done();
/// ```
#[derive(Debug)]
pub struct Transmitter<TX, const N: usize = DEFAULT_TX_BUFFER_LEN>
where
    TX: OutputPin,
{
    /// TX pin
    pub tx: TX,
    phase: TransmitPhase,
    payload: Vec<u8, N>,
    /// Bit index inside the current phase.
    bit_position: usize,
    ticks_per_bit: u16,
    tick_counter: u16,
    inverted: bool,

    /// Counter of completed transmissions.
    pub tx_good: u16,
}

impl<TX, const N: usize> Transmitter<TX, N>
where
    TX: OutputPin,
{
    /// Creates an idle transmitter and drives the line low.
    pub fn new(tx: TX, config: TransmitterConfig) -> Result<Self, LinkError> {
        config.validate()?;
        let mut cls = Self {
            tx,
            phase: TransmitPhase::Idle,
            payload: Vec::new(),
            bit_position: 0,
            ticks_per_bit: config.ticks_per_bit,
            tick_counter: 0,
            inverted: config.inverted,
            tx_good: 0,
        };
        cls.write_tx(false);
        Ok(cls)
    }

    /// Arms a new transmission of `payload`, aborting whatever was in flight.
    ///
    /// The first preamble bit goes out after `ticks_per_bit` further ticks.
    pub fn init_send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if payload.is_empty() {
            return Err(LinkError::EmptyPayload);
        }
        let mut buf = Vec::new();
        buf.extend_from_slice(payload)
            .map_err(|_| LinkError::PayloadTooLong {
                len: payload.len(),
                capacity: N,
            })?;
        self.payload = buf;
        self.arm();
        Ok(())
    }

    /// Restarts the current payload from the preamble.
    ///
    /// Does nothing if no payload has been armed yet.
    pub fn restart(&mut self) {
        if self.payload.is_empty() {
            return;
        }
        self.arm();
    }

    /// Aborts any transmission and holds the line low.
    pub fn stop(&mut self) {
        self.phase = TransmitPhase::Idle;
        self.bit_position = 0;
        self.tick_counter = 0;
        self.write_tx(false);
    }

    fn arm(&mut self) {
        self.phase = TransmitPhase::Preamble;
        self.bit_position = 0;
        self.tick_counter = 0;
        // The first preamble bit must be an edge.
        self.write_tx(false);
    }

    /// Whether the whole payload has been clocked out.
    pub fn is_done(&self) -> bool {
        self.phase == TransmitPhase::Done
    }

    /// Current phase.
    pub fn phase(&self) -> TransmitPhase {
        self.phase
    }

    /// Index of the next bit inside the current phase.
    pub fn bit_position(&self) -> usize {
        self.bit_position
    }

    /// The armed payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Non-blocking check for the end of the current transmission.
    ///
    /// Returns `WouldBlock` while preamble, sync or data bits are still going
    /// out. Use with `nb::block!` from a context other than the tick ISR.
    pub fn wait_sent(&self) -> nb::Result<(), Infallible> {
        match self.phase {
            TransmitPhase::Preamble | TransmitPhase::Sync | TransmitPhase::Data => {
                Err(nb::Error::WouldBlock)
            }
            TransmitPhase::Idle | TransmitPhase::Done => Ok(()),
        }
    }

    /// Advances by one timer tick, emitting a bit every `ticks_per_bit` calls.
    pub fn on_tick(&mut self) {
        match self.phase {
            TransmitPhase::Idle | TransmitPhase::Done => return,
            _ => {}
        }
        self.tick_counter += 1;
        if self.tick_counter >= self.ticks_per_bit {
            self.tick_counter = 0;
            self.transmit_bit();
        }
    }

    fn transmit_bit(&mut self) {
        match self.phase {
            TransmitPhase::Idle | TransmitPhase::Done => {}
            TransmitPhase::Preamble => {
                self.write_tx(self.bit_position % 2 == 0);
                self.bit_position += 1;
                if self.bit_position >= PREAMBLE_BITS {
                    self.phase = TransmitPhase::Sync;
                    self.bit_position = 0;
                }
            }
            TransmitPhase::Sync => {
                self.write_tx(self.bit_position % 8 >= 4);
                self.bit_position += 1;
                if self.bit_position >= SYNC_BITS {
                    self.phase = TransmitPhase::Data;
                    self.bit_position = 0;
                }
            }
            TransmitPhase::Data => {
                // One extra bit period after the last data bit, then idle low.
                if self.bit_position >= self.payload.len() * 8 {
                    self.write_tx(false);
                    self.phase = TransmitPhase::Done;
                    self.tx_good = self.tx_good.wrapping_add(1);
                    debug!("tx: {} bytes sent", self.payload.len());
                    return;
                }
                let byte = self.payload[self.bit_position / 8];
                let bit = byte & (1 << (self.bit_position % 8));
                self.write_tx(bit != 0);
                self.bit_position += 1;
            }
        }
    }

    fn write_tx(&mut self, level: bool) {
        let result = if level != self.inverted {
            self.tx.set_high()
        } else {
            self.tx.set_low()
        };
        if result.is_err() {
            warn!("tx: pin write failed");
        }
    }
}

impl<TX, const N: usize> TickDriven for Transmitter<TX, N>
where
    TX: OutputPin,
{
    fn on_tick(&mut self, _now: Tick) {
        Transmitter::on_tick(self);
    }

    fn on_control(&mut self, edge: ControlEdge) {
        match edge {
            ControlEdge::Rising => self.restart(),
            ControlEdge::Falling => self.stop(),
        }
    }
}
