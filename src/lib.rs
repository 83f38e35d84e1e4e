//! # lightlink
//!
//! A portable, no_std Rust driver for a self-clocking serial link over a single
//! digital line: an LED and a photodiode, an open-collector wire, or anything
//! else that carries one bit of level from one GPIO to another.
//!
//! The two ends share no clock. The transmitter bit-bangs each transmission
//! from a periodic timer tick, and the receiver recovers the bit period from
//! the preamble's edge spacing and samples the rest of the transmission at the
//! recovered rate. It is built on:
//! - `embedded-hal` traits for digital I/O and timing
//! - a software clock-recovery state machine for reception
//! - interrupt-safe shared state with `critical-section`
//! - optional tick sources using either timer interrupts or blocking delay
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` |
//! | `delay-loop`          | Uses `embedded_hal::delay::DelayNs` for tick timing |
//! | `timer-isr` (default) | Uses `critical_section::with` to share a [`timer::Node`] with an ISR |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Wire format
//!
//! Every transmission is eight preamble bits `10101010`, the sync block
//! `00001111` (which doubles as the frame-start sentinel `0x0F`), the payload
//! LSB first, and a trailing low line that reads as the frame-end sentinel
//! `0x00`. See [`transmit`] and [`receive`] for the details.
//!
//! ## Usage
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! use lightlink::config::TransmitterConfig;
//! use lightlink::timer::{Node, ticks_per_bit};
//! use lightlink::transmit::Transmitter;
//!
//! # let tx_pin = Pin::new(&[PinTransaction::set(PinState::Low), PinTransaction::set(PinState::Low)]);
//! let config = TransmitterConfig {
//!     ticks_per_bit: ticks_per_bit(62.5, 2_000),
//!     ..Default::default()
//! };
//! let mut transmitter: Transmitter<_, 16> = Transmitter::new(tx_pin, config).unwrap();
//! transmitter.init_send(b"ping").unwrap();
//! let mut node = Node::new(transmitter);
//! // node.tick() at every 62.5 µs timer interrupt
//! # node.session_mut().tx.done();
//! ```
//!
//! Or, use `run_tick_loop()` with a `DelayNs` implementation:
//!
//! ```rust,ignore
//! lightlink::timer::run_tick_loop(&mut node, &mut delay, 62);
//! ```
//!
//! ## Integration Notes
//!
//! - The receiver's tick should be several times faster than the bit rate;
//!   it only needs to be steady, not matched to the transmitter.
//! - A control line edge restarts (`Rising`) or stops (`Falling`) a session,
//!   see [`session::ControlEdge`].
//! - Only one node should be shared with interrupts at a time.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

pub mod clock;
pub mod config;
pub mod consts;
pub mod error;
pub mod link;
pub mod receive;
pub mod session;
pub mod timer;
pub mod transmit;

#[cfg(test)]
mod test_support;

pub use error::{LinkError, SyncFailure};
pub use link::Link;
pub use receive::{ReceiveState, Receiver};
pub use session::{ControlEdge, TickDriven};
pub use transmit::{TransmitPhase, Transmitter};
