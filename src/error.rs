//! Error types for the link.
//!
//! Nothing in the per-tick paths returns an error: the transmitter cannot fail
//! and the receiver reports trouble through its state. Errors surface at
//! construction time (bad configuration), when arming a send, and when a
//! caller polls a receiver that gave up.

use thiserror::Error;

/// Reason the receiver abandoned a reception.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SyncFailure {
    /// The line stopped toggling before enough pulses were seen to estimate
    /// the bit period.
    #[error("clock pulses stopped before the bit period was known")]
    ClockTimeout,
    /// The clock was recovered but the frame-start sentinel never appeared.
    #[error("frame start sentinel not found")]
    FrameNotFound,
}

/// Errors reported by the link.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkError {
    /// The payload does not fit into the transmitter's buffer.
    #[error("payload of {len} bytes exceeds capacity of {capacity}")]
    PayloadTooLong {
        /// Length of the rejected payload.
        len: usize,
        /// Capacity of the transmit buffer.
        capacity: usize,
    },
    /// An empty payload was handed to the transmitter.
    #[error("payload is empty")]
    EmptyPayload,
    /// `ticks_per_bit` was zero.
    #[error("ticks per bit must be non-zero")]
    ZeroTicksPerBit,
    /// The receive buffer has no capacity.
    #[error("receive buffer capacity must be non-zero")]
    ZeroCapacity,
    /// The frame-start sentinel is zero or equal to the frame-end sentinel.
    #[error("frame start sentinel must be non-zero and differ from the end sentinel")]
    InvalidSentinel,
    /// The frame search limit is too short to ever match a sentinel.
    #[error("frame search limit must cover at least 8 samples")]
    FrameSearchTooShort,
    /// The receiver gave up synchronising.
    #[error("synchronisation failed: {0}")]
    Sync(SyncFailure),
    /// The receiver has been stopped by the control line.
    #[error("receiver is not listening")]
    NotListening,
}

impl From<SyncFailure> for LinkError {
    fn from(failure: SyncFailure) -> Self {
        Self::Sync(failure)
    }
}
