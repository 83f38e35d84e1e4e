//! Constants used across the link protocol implementation.
//!
//! This module defines the fixed shape of a transmission (preamble and sync
//! lengths), the frame sentinels, the clock recovery threshold and the default
//! buffer sizes.
//!
//! ## Key Concepts
//!
//! - **Preamble**: alternating bits, one transition per bit period. This is
//!   what the receiver measures to recover the transmitter's bit period.
//! - **Sync**: a half-duty block (four low bits then four high bits). The low
//!   half is long enough for the receiver to notice that the preamble has
//!   ended, the high half completes the frame-start sentinel.
//! - **Frame sentinels**: the start sentinel is matched against the last eight
//!   sampled bits, oldest bit in the MSB. The end sentinel is compared against
//!   each assembled data byte.
//!
//! Data bits are sent least significant bit first.

/// Number of bit periods in the alternating preamble.
pub const PREAMBLE_BITS: usize = 8;

/// Number of bit periods in the sync block that follows the preamble.
pub const SYNC_BITS: usize = 8;

/// Number of measured pulse intervals required before the bit period estimate
/// is trusted.
pub const MIN_CLOCK_PULSES: u16 = 4;

/// Default frame-start sentinel: four low samples followed by four high ones.
pub const FRAME_START: u8 = 0x0f;

/// Default frame-end sentinel. The transmitter holds the line low once the
/// payload is out, so an all-zero byte terminates the frame.
pub const FRAME_END: u8 = 0x00;

/// Default receive buffer capacity, in bytes.
pub const DEFAULT_RX_BUFFER_LEN: usize = 100;

/// Default transmit payload capacity, in bytes.
pub const DEFAULT_TX_BUFFER_LEN: usize = 32;

/// Default number of samples the receiver takes while hunting for the frame
/// start sentinel before it gives up.
pub const DEFAULT_FRAME_SEARCH_LIMIT: u16 = 64;

/// Smallest accepted frame search limit. Anything shorter could never see a
/// full sentinel.
pub const MIN_FRAME_SEARCH_LIMIT: u16 = 8;
