//! A transmitter and a receiver driven from one timer interrupt.
//!
//! In a two-board deployment each board owns only one half of the link and
//! drives it through [`TickDriven`] directly. [`Link`] pairs both halves on a
//! single board: useful for loopback wiring (an LED facing a photodiode on the
//! same MCU) and for simulating the whole link on a host.
//!
//! Within one tick the receiver samples before the transmitter writes, so it
//! always observes the level left by the previous tick, as it would with the
//! two halves on separate boards.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::clock::Tick;
use crate::consts::{DEFAULT_RX_BUFFER_LEN, DEFAULT_TX_BUFFER_LEN};
use crate::error::LinkError;
use crate::receive::Receiver;
use crate::session::{ControlEdge, TickDriven};
use crate::transmit::Transmitter;

/// Both halves of the link, ticked together.
#[derive(Debug)]
pub struct Link<
    TX,
    RX,
    const TXN: usize = DEFAULT_TX_BUFFER_LEN,
    const RXN: usize = DEFAULT_RX_BUFFER_LEN,
> where
    TX: OutputPin,
    RX: InputPin,
{
    /// Sending half
    pub transmitter: Transmitter<TX, TXN>,
    /// Receiving half
    pub receiver: Receiver<RX, RXN>,
}

impl<TX, RX, const TXN: usize, const RXN: usize> Link<TX, RX, TXN, RXN>
where
    TX: OutputPin,
    RX: InputPin,
{
    /// Pairs a transmitter with a receiver.
    pub fn new(transmitter: Transmitter<TX, TXN>, receiver: Receiver<RX, RXN>) -> Self {
        Self {
            transmitter,
            receiver,
        }
    }

    /// Arms the transmitter with `payload` and resets the receiver so that it
    /// listens for the new transmission from its first edge.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        self.transmitter.init_send(payload)?;
        self.receiver.reset();
        Ok(())
    }

    /// Polls the receiver, see [`Receiver::read`].
    pub fn read(&self) -> nb::Result<&[u8], LinkError> {
        self.receiver.read()
    }
}

impl<TX, RX, const TXN: usize, const RXN: usize> TickDriven for Link<TX, RX, TXN, RXN>
where
    TX: OutputPin,
    RX: InputPin,
{
    fn on_tick(&mut self, now: Tick) {
        self.receiver.step(now);
        self.transmitter.on_tick();
    }

    fn on_control(&mut self, edge: ControlEdge) {
        self.transmitter.on_control(edge);
        self.receiver.on_control(edge);
    }
}
