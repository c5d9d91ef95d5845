//! # rdm-core
//!
//! A portable, `no_std` Rust transport core for RDM (Remote Device
//! Management), the request/response protocol layered on a DMX512 UART.
//!
//! This crate implements the parts of an RDM stack that are genuinely
//! hard to get right and have nothing to do with any particular MCU:
//! - the wire codec: a small format mini-language, big-endian byte-swap
//!   discipline, and checksum computation,
//! - 48-bit UID algebra: comparison, broadcast/null classification, and
//!   responder target matching,
//! - the Euro-ASCII discovery codec used by `DISC_UNIQUE_BRANCH`,
//! - a half-duplex transaction engine that drives request → turnaround →
//!   response and classifies the outcome.
//!
//! Everything below the HAL boundary ([`hal::Hal`]) — BREAK/MAB generation,
//! UART FIFOs, interrupt wiring — is supplied by the platform.
//!
//! ## Crate features
//! | Feature      | Description |
//! |--------------|--------------|
//! | `std` (default) | Disables `#![no_std]` and swaps `heapless` containers for `std` ones |
//! | `defmt-0-3`  | Uses `defmt` logging |
//! | `log`        | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use rdm_core::hal::{Direction, Hal, ReceivedFrame};
//! use rdm_core::header::{Ack, CommandClass, Header};
//! use rdm_core::port::Port;
//! use rdm_core::uid::Uid;
//! use rdm_core::transaction::request;
//!
//! struct MyHal;
//! impl Hal for MyHal {
//!     type Error = ();
//!     fn uid(&self) -> Uid { Uid::new(0x7FF0, 1) }
//!     fn set_rts(&mut self, _dir: Direction) {}
//!     fn get_rts(&self) -> Direction { Direction::Outbound }
//!     fn send(&mut self, _buffer: &[u8]) {}
//!     fn poll_sent(&mut self) -> nb::Result<(), Self::Error> { Ok(()) }
//!     fn poll_receive(&mut self) -> nb::Result<ReceivedFrame, Self::Error> {
//!         Err(nb::Error::WouldBlock)
//!     }
//!     fn read_slots(&mut self, _dst: &mut [u8]) -> usize { 0 }
//! }
//!
//! let port = Port::new(1, MyHal);
//! let mut header = Header {
//!     dest_uid: Uid::new(0x1234, 1),
//!     src_uid: Uid::NULL,
//!     tn: 0,
//!     port_id: 0,
//!     message_count: 0,
//!     sub_device: 0,
//!     cc: CommandClass::GetCommand,
//!     pid: 0x0060,
//!     pdl: 0,
//! };
//! let mut ack = Ack::NONE;
//! let _ = request(&port, &mut header, &[], None, &mut ack);
//! ```
//!
//! ## Status
//!
//! The core transport is complete; PID-specific parameter handlers and
//! non-volatile storage are higher-layer collaborators outside this crate's
//! scope.
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
#![cfg_attr(not(feature = "std"), no_std)]

pub use critical_section;

#[cfg(not(feature = "std"))]
pub use heapless;

pub mod consts;
pub mod discovery;
pub mod error;
pub mod format;
pub mod frame;
pub mod hal;
pub mod header;
pub mod port;
pub mod transaction;
pub mod uid;
