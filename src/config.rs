//! Transmitter and receiver configuration.
//!
//! Both sides default to the protocol described in [`crate::consts`]. The
//! knobs here only change how the line is interpreted (polarity, debounce,
//! sentinels) and when the receiver gives up; the wire format of preamble and
//! sync is fixed.

use crate::clock::Tick;
use crate::consts::{DEFAULT_FRAME_SEARCH_LIMIT, FRAME_END, FRAME_START, MIN_FRAME_SEARCH_LIMIT};
use crate::error::LinkError;

/// Settings for a [`Transmitter`](crate::transmit::Transmitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TransmitterConfig {
    /// Number of `on_tick()` calls per emitted bit.
    ///
    /// With `1` every timer interrupt emits a bit. Larger values let the
    /// transmitter share a fast timer with other work.
    pub ticks_per_bit: u16,
    /// Drive the pin low for a logical `1` (e.g. an LED wired to the supply).
    pub inverted: bool,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            ticks_per_bit: 1,
            inverted: false,
        }
    }
}

impl TransmitterConfig {
    /// Checks the configuration for values the transmitter cannot work with.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.ticks_per_bit == 0 {
            return Err(LinkError::ZeroTicksPerBit);
        }
        Ok(())
    }
}

/// Settings for a [`Receiver`](crate::receive::Receiver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ReceiverConfig {
    /// Pattern of the last eight samples (oldest in the MSB) that marks the
    /// start of the payload.
    pub frame_start: u8,
    /// Data byte that terminates the frame. It is not stored.
    ///
    /// `None` disables the terminator; the frame then only completes once
    /// the receive buffer is full.
    pub frame_end: Option<u8>,
    /// Treat a low pin as a logical `1`.
    pub inverted: bool,
    /// Number of additional consecutive steps a new level must persist before
    /// it counts as a transition. `0` accepts every change immediately.
    pub debounce_ticks: u8,
    /// Give up when no transition arrives for this many ticks while the bit
    /// period is still unknown. `None` waits forever.
    pub clock_sync_timeout: Option<Tick>,
    /// Give up after this many samples without seeing the frame-start
    /// sentinel. `None` waits forever.
    pub frame_search_limit: Option<u16>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            frame_start: FRAME_START,
            frame_end: Some(FRAME_END),
            inverted: false,
            debounce_ticks: 0,
            clock_sync_timeout: None,
            frame_search_limit: Some(DEFAULT_FRAME_SEARCH_LIMIT),
        }
    }
}

impl ReceiverConfig {
    /// Checks the configuration for values the receiver cannot work with.
    ///
    /// The frame-start sentinel may not be zero: the sentinel register starts
    /// out cleared and would match before a single bit was sampled.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.frame_start == 0 || self.frame_end == Some(self.frame_start) {
            return Err(LinkError::InvalidSentinel);
        }
        if let Some(limit) = self.frame_search_limit {
            if limit < MIN_FRAME_SEARCH_LIMIT {
                return Err(LinkError::FrameSearchTooShort);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(TransmitterConfig::default().validate(), Ok(()));
        assert_eq!(ReceiverConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_ticks_per_bit_rejected() {
        let config = TransmitterConfig {
            ticks_per_bit: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(LinkError::ZeroTicksPerBit));
    }

    #[test]
    fn test_sentinel_checks() {
        let zero_start = ReceiverConfig {
            frame_start: 0,
            frame_end: None,
            ..Default::default()
        };
        assert_eq!(zero_start.validate(), Err(LinkError::InvalidSentinel));

        let clash = ReceiverConfig {
            frame_start: 0xa5,
            frame_end: Some(0xa5),
            ..Default::default()
        };
        assert_eq!(clash.validate(), Err(LinkError::InvalidSentinel));
    }

    #[test]
    fn test_short_frame_search_rejected() {
        let config = ReceiverConfig {
            frame_search_limit: Some(7),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(LinkError::FrameSearchTooShort));
    }
}
