//! The platform boundary (module D/E's hardware seam).
//!
//! [`Hal`] is the Rust analogue of the reference driver's
//! `embedded_hal::digital::{InputPin, OutputPin}` split plus its `nb`-based
//! `wait_packet_sent` idiom: non-blocking polls the core composes into a
//! bounded retry, rather than a blocking call the core can't time-bound
//! itself.

use crate::uid::Uid;

/// RTS (request-to-send) line direction on a half-duplex RS-485 transceiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Transmitting onto the bus.
    Outbound,
    /// Listening on the bus.
    Inbound,
}

/// The result of a completed non-blocking receive poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Number of bytes available to read via [`Hal::read_slots`].
    pub len: usize,
}

/// Platform services a [`crate::port::Port`] needs: RTS control, frame
/// transmission, and non-blocking completion polling.
pub trait Hal {
    /// The platform's own error type for bus faults.
    type Error;

    /// This port's own UID, substituted for a null `src_uid` in a request.
    fn uid(&self) -> Uid;

    /// Sets the RTS line direction.
    fn set_rts(&mut self, dir: Direction);
    /// Reads back the current RTS line direction.
    fn get_rts(&self) -> Direction;

    /// Kicks off transmission of `buffer` (BREAK + MAB + the DMX slots).
    /// Non-blocking: completion is observed via [`Hal::poll_sent`].
    fn send(&mut self, buffer: &[u8]);

    /// Polls whether the in-flight [`Hal::send`] has completed.
    fn poll_sent(&mut self) -> nb::Result<(), Self::Error>;

    /// Polls whether a complete inbound frame is available.
    fn poll_receive(&mut self) -> nb::Result<ReceivedFrame, Self::Error>;

    /// Copies up to `dst.len()` received bytes into `dst`, returning the
    /// number actually copied.
    fn read_slots(&mut self, dst: &mut [u8]) -> usize;
}
