//! Owned, per-port shared state (module D's stateful half).
//!
//! The reference driver keeps a single global `AskDriver` behind a
//! `critical_section::Mutex<RefCell<Option<AskDriver<..>>>>` because an ISR
//! and the foreground task both need to reach it. This crate keeps the same
//! `Mutex<RefCell<_>>` discipline — an RDM UART's receive-complete interrupt
//! can still preempt a foreground `write`/`read` mid-buffer — but drops the
//! `static`/`Option`: a [`Port`] is constructed once, owns its buffer and its
//! [`Hal`] outright, and is dropped at uninstall rather than living in a
//! process-wide array (see `REDESIGN FLAGS` for why).

use core::cell::RefCell;
use critical_section::Mutex;

use crate::consts::PORT_BUFFER_LEN;
use crate::error::FrameError;
use crate::frame;
use crate::hal::{Direction, Hal};
use crate::header::Header;

struct PortInner<H: Hal> {
    buffer: [u8; PORT_BUFFER_LEN],
    is_sending: bool,
    tn: u8,
    hal: H,
}

/// A single DMX/RDM port: its shared tx/rx buffer, its send-in-flight latch,
/// its transaction-number counter, and the [`Hal`] that drives the wire.
pub struct Port<H: Hal> {
    inner: Mutex<RefCell<PortInner<H>>>,
    /// 1-based port index, substituted for a zero `port_id` in a request header.
    pub index: u8,
}

impl<H: Hal> Port<H> {
    /// Wraps a HAL instance into a port with a fresh, empty buffer.
    pub fn new(index: u8, hal: H) -> Self {
        Port {
            inner: Mutex::new(RefCell::new(PortInner {
                buffer: [0u8; PORT_BUFFER_LEN],
                is_sending: false,
                tn: 0,
                hal,
            })),
            index,
        }
    }

    /// Reads and post-increments the port's transaction number (wrapping modulo 256).
    pub fn next_tn(&self) -> u8 {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow(cs).borrow_mut();
            let tn = inner.tn;
            inner.tn = inner.tn.wrapping_add(1);
            tn
        })
    }

    /// This port's own UID, as reported by its [`Hal`].
    pub fn uid(&self) -> crate::uid::Uid {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().hal.uid())
    }

    /// True if a transaction is currently in flight on this port.
    pub fn is_sending(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().is_sending)
    }

    /// Serializes `header`/`pd` into the port's buffer and kicks off
    /// transmission. Fails without side effects if a transaction is already
    /// in flight.
    pub fn write(&self, header: &Header, pd: &[u8]) -> Result<usize, FrameError> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow(cs).borrow_mut();
            if inner.is_sending {
                return Err(FrameError::PortBusy);
            }
            if inner.hal.get_rts() == Direction::Inbound {
                inner.hal.set_rts(Direction::Outbound);
            }
            let n = frame::encode(&mut inner.buffer, header, pd)?;
            inner.is_sending = true;
            let PortInner { buffer, hal, .. } = &mut *inner;
            hal.send(&buffer[..n]);
            Ok(n)
        })
    }

    /// Deserializes a frame out of the port's buffer. Does not touch
    /// `is_sending` — the caller observes send/receive completion via the
    /// [`Hal`] polls in [`crate::transaction::request`].
    pub fn read(
        &self,
        want_header: bool,
        want_pdl: Option<u8>,
        pd_out: Option<&mut [u8]>,
    ) -> Result<frame::Decoded, FrameError> {
        critical_section::with(|cs| {
            let inner = self.inner.borrow(cs).borrow();
            frame::decode(&inner.buffer, want_header, want_pdl, pd_out)
        })
    }

    /// Raw access to the port's HAL and buffer under the critical section, for
    /// operations the frame codec doesn't cover (discovery polling, listening
    /// for send completion).
    pub(crate) fn with_inner<R>(
        &self,
        f: impl FnOnce(&mut [u8; PORT_BUFFER_LEN], &mut H) -> R,
    ) -> R {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow(cs).borrow_mut();
            let PortInner { buffer, hal, .. } = &mut *inner;
            f(buffer, hal)
        })
    }

    pub(crate) fn set_sending(&self, sending: bool) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).borrow_mut().is_sending = sending;
        });
    }
}

impl<H: Hal> core::fmt::Debug for Port<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Port")
            .field("index", &self.index)
            .field("is_sending", &self.is_sending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::ReceivedFrame;
    use crate::header::CommandClass;
    use crate::uid::Uid;

    struct MockHal {
        rts: Direction,
        uid: Uid,
    }

    impl Hal for MockHal {
        type Error = ();

        fn uid(&self) -> Uid {
            self.uid
        }
        fn set_rts(&mut self, dir: Direction) {
            self.rts = dir;
        }
        fn get_rts(&self) -> Direction {
            self.rts
        }
        fn send(&mut self, _buffer: &[u8]) {}
        fn poll_sent(&mut self) -> nb::Result<(), Self::Error> {
            Ok(())
        }
        fn poll_receive(&mut self) -> nb::Result<ReceivedFrame, Self::Error> {
            Err(nb::Error::WouldBlock)
        }
        fn read_slots(&mut self, _dst: &mut [u8]) -> usize {
            0
        }
    }

    fn header() -> Header {
        Header {
            dest_uid: Uid::new(1, 2),
            src_uid: Uid::new(3, 4),
            tn: 0,
            port_id: 1,
            message_count: 0,
            sub_device: 0,
            cc: CommandClass::GetCommand,
            pid: 0x60,
            pdl: 0,
        }
    }

    #[test]
    fn write_forces_rts_outbound_and_sets_is_sending() {
        let hal = MockHal {
            rts: Direction::Inbound,
            uid: Uid::new(9, 9),
        };
        let port = Port::new(1, hal);
        let n = port.write(&header(), &[]).unwrap();
        assert_eq!(n, 26);
        assert!(port.is_sending());
        port.with_inner(|_, hal| assert_eq!(hal.get_rts(), Direction::Outbound));
    }

    #[test]
    fn write_rejects_when_already_sending() {
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
        };
        let port = Port::new(1, hal);
        let _ = port.write(&header(), &[]).unwrap();
        assert_eq!(port.write(&header(), &[]), Err(FrameError::PortBusy));
    }

    #[test]
    fn tn_increments_and_wraps() {
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
        };
        let port = Port::new(1, hal);
        assert_eq!(port.next_tn(), 0);
        assert_eq!(port.next_tn(), 1);
    }
}
