//! The RDM transaction engine (module E): compose a request, transmit it,
//! conditionally await a response, and classify the outcome.
//!
//! This is the component that ties A-D together the way the reference
//! driver's `AskDriver::send`/`AskDriver::tick` tie the PLL, the 4b6b codec,
//! and the pin HAL together — except half-duplex request/response instead of
//! continuous demodulation, so completion is polled rather than ticked.

use crate::consts::{SUB_DEVICE_ALL_CALL, SUB_DEVICE_MAX_EXCLUSIVE};
use crate::discovery;
use crate::error::TransactionError;
use crate::hal::Hal;
use crate::header::{Ack, AckType, CommandClass, Header, PID_DISC_UNIQUE_BRANCH, ResponseType};
use crate::port::Port;
use crate::uid::Uid;

/// Number of non-blocking polls the engine spends waiting on `poll_sent`
/// before giving up. The HAL has no delay primitive of its own, so the
/// bound comes from the caller's scheduler tick instead of wall time.
const SEND_WAIT_TICKS: u32 = 1000;
/// Number of non-blocking polls spent waiting on `poll_receive`.
const RECEIVE_WAIT_TICKS: u32 = 2;
/// Milliseconds per ACK_TIMER pd unit; a scheduler tick is 1 ms in this crate,
/// so the tick count is the decoded unit count times this factor.
const ACK_TIMER_UNIT_MS: u32 = 10;

fn log_invalid(reason: &str) {
    #[cfg(feature = "log")]
    log::debug!("rdm transaction classified INVALID: {}", reason);
    #[cfg(feature = "defmt-0-3")]
    defmt::debug!("rdm transaction classified INVALID: {}", reason);
    #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
    let _ = reason;
}

fn check_preconditions(header: &Header, pd_in: &[u8]) -> bool {
    if pd_in.len() != header.pdl as usize {
        return false;
    }
    if header.dest_uid.is_null() || header.src_uid.is_broadcast() {
        return false;
    }
    if !header.cc.is_request() {
        return false;
    }
    if header.sub_device >= SUB_DEVICE_MAX_EXCLUSIVE && header.sub_device != SUB_DEVICE_ALL_CALL {
        return false;
    }
    if header.sub_device == SUB_DEVICE_ALL_CALL && header.cc == CommandClass::GetCommand {
        return false;
    }
    true
}

fn wait_send_complete<H: Hal>(port: &Port<H>) -> Result<(), H::Error> {
    for _ in 0..SEND_WAIT_TICKS {
        match port.with_inner(|_, hal| hal.poll_sent()) {
            Ok(()) => {
                port.set_sending(false);
                return Ok(());
            }
            Err(nb::Error::WouldBlock) => continue,
            Err(nb::Error::Other(e)) => {
                port.set_sending(false);
                return Err(e);
            }
        }
    }
    port.set_sending(false);
    Ok(())
}

/// Issues an RDM request on `port` and classifies the response.
///
/// `header` is normalized in place: a zero `port_id` becomes `port.index`,
/// a null `src_uid` is replaced with the port's own UID, `tn` is taken from
/// the port, and `message_count` is zeroed. Returns the number of bytes
/// transmitted (or received, for discovery).
pub fn request<H: Hal>(
    port: &Port<H>,
    header: &mut Header,
    pd_in: &[u8],
    pd_out: Option<&mut [u8]>,
    ack_out: &mut Ack,
) -> Result<usize, TransactionError<H::Error>> {
    if !check_preconditions(header, pd_in) {
        log_invalid("request precondition violated");
        return Err(TransactionError::Precondition);
    }

    if header.port_id == 0 {
        header.port_id = port.index;
    }
    if header.src_uid.is_null() {
        header.src_uid = port.uid();
    }
    header.tn = port.next_tn();
    header.message_count = 0;

    let req = *header;
    let is_discovery = req.cc == CommandClass::DiscCommand && req.pid == PID_DISC_UNIQUE_BRANCH;
    let response_expected = !req.dest_uid.is_broadcast() || is_discovery;

    let n = port.write(&req, pd_in)?;

    if !response_expected {
        wait_send_complete(port).map_err(TransactionError::Hal)?;
        *ack_out = Ack::NONE;
        return Ok(n);
    }

    let mut received_len = 0usize;
    let mut hal_err = None;
    'poll: for _ in 0..RECEIVE_WAIT_TICKS {
        match port.with_inner(|_, hal| hal.poll_receive()) {
            Ok(frame) => {
                received_len = frame.len;
                break 'poll;
            }
            Err(nb::Error::WouldBlock) => continue,
            Err(nb::Error::Other(e)) => {
                hal_err = Some(e);
                break 'poll;
            }
        }
    }
    port.set_sending(false);

    if let Some(e) = hal_err {
        *ack_out = Ack::INVALID;
        return Err(TransactionError::Hal(e));
    }

    if is_discovery {
        return classify_discovery(port, received_len, header, ack_out);
    }

    classify_response(port, header, &req, received_len, pd_out, ack_out)
}

fn classify_discovery<H: Hal>(
    port: &Port<H>,
    received_len: usize,
    header: &mut Header,
    ack_out: &mut Ack,
) -> Result<usize, TransactionError<H::Error>> {
    let clamped = received_len.min(24);
    let mut raw = [0u8; 24];
    let got = port.with_inner(|_buffer, hal| hal.read_slots(&mut raw[..clamped]));

    match discovery::uid_decode(&raw[..got]) {
        Ok((uid, _consumed)) => {
            *header = Header {
                dest_uid: Uid::NULL,
                src_uid: uid,
                tn: 0,
                port_id: ResponseType::Ack as u8,
                message_count: 0,
                sub_device: 0,
                cc: CommandClass::DiscCommandResponse,
                pid: PID_DISC_UNIQUE_BRANCH,
                pdl: 0,
            };
            *ack_out = Ack {
                kind: AckType::Ack,
                num: 0,
            };
            Ok(received_len)
        }
        Err(_) => {
            log_invalid("discovery checksum/delimiter failure");
            *ack_out = Ack::INVALID;
            Ok(received_len)
        }
    }
}

fn classify_response<H: Hal>(
    port: &Port<H>,
    header: &mut Header,
    req: &Header,
    received_len: usize,
    pd_out: Option<&mut [u8]>,
    ack_out: &mut Ack,
) -> Result<usize, TransactionError<H::Error>> {
    port.with_inner(|buffer, hal| {
        let n = received_len.min(buffer.len());
        let _ = hal.read_slots(&mut buffer[..n]);
    });

    let decoded = match port.read(true, None, pd_out) {
        Ok(d) => d,
        Err(_) => {
            log_invalid("frame read failed (framing/checksum)");
            *ack_out = Ack::INVALID;
            return Ok(received_len);
        }
    };
    *header = decoded.header.expect("want_header was true");

    let response_type = header.response_type();
    let valid = response_type.is_some()
        && req.cc.response_class() == Some(header.cc)
        && req.pid == header.pid
        && req.tn == header.tn
        && header.src_uid.is_target(&req.dest_uid)
        && req.src_uid == header.dest_uid;

    if !valid {
        log_invalid("response validation failed (cc/pid/tn/uid mismatch)");
        *ack_out = Ack::INVALID;
        return Ok(received_len);
    }

    let num = match response_type.unwrap() {
        ResponseType::Ack => header.pdl as u32,
        ResponseType::AckTimer => {
            if header.pdl >= 2 {
                let units = pd_head_u16(port);
                units as u32 * ACK_TIMER_UNIT_MS
            } else {
                0
            }
        }
        ResponseType::NackReason => {
            if header.pdl >= 2 {
                pd_head_u16(port) as u32
            } else {
                0
            }
        }
        ResponseType::AckOverflow => 0,
    };

    let kind = match response_type.unwrap() {
        ResponseType::Ack => AckType::Ack,
        ResponseType::AckTimer => AckType::AckTimer,
        ResponseType::NackReason => AckType::NackReason,
        ResponseType::AckOverflow => AckType::AckOverflow,
    };

    *ack_out = Ack { kind, num };
    Ok(received_len)
}

/// Reads the first two parameter-data bytes (big-endian) out of the port's
/// buffer, for ACK_TIMER/NACK_REASON's fixed-format payload.
fn pd_head_u16<H: Hal>(port: &Port<H>) -> u16 {
    port.with_inner(|buffer, _| {
        let start = crate::consts::HEADER_FRAME_LEN as usize;
        u16::from_be_bytes([buffer[start], buffer[start + 1]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{Direction, ReceivedFrame};
    use crate::header::CommandClass;

    struct MockHal {
        rts: Direction,
        uid: Uid,
        rx_frame: Option<heapless::Vec<u8, 64>>,
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
            match &self.rx_frame {
                Some(f) => Ok(ReceivedFrame { len: f.len() }),
                None => Err(nb::Error::WouldBlock),
            }
        }
        fn read_slots(&mut self, dst: &mut [u8]) -> usize {
            if let Some(f) = &self.rx_frame {
                let n = f.len().min(dst.len());
                dst[..n].copy_from_slice(&f[..n]);
                n
            } else {
                0
            }
        }
    }

    fn base_header() -> Header {
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

    fn encode_response(
        req: &Header,
        response_type: ResponseType,
        pd: &[u8],
    ) -> heapless::Vec<u8, 64> {
        let resp = Header {
            dest_uid: req.src_uid,
            src_uid: req.dest_uid,
            tn: req.tn,
            port_id: response_type as u8,
            message_count: 0,
            sub_device: req.sub_device,
            cc: req.cc.response_class().unwrap(),
            pid: req.pid,
            pdl: pd.len() as u8,
        };
        let mut buf = [0u8; 64];
        let n = crate::frame::encode(&mut buf, &resp, pd).unwrap();
        let mut v = heapless::Vec::new();
        let _ = v.extend_from_slice(&buf[..n]);
        v
    }

    #[test]
    fn rejects_null_dest_uid_precondition() {
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: None,
        };
        let port = Port::new(1, hal);
        let mut header = Header {
            dest_uid: Uid::NULL,
            ..base_header()
        };
        let mut ack = Ack::NONE;
        let err = request(&port, &mut header, &[], None, &mut ack).unwrap_err();
        assert_eq!(err, TransactionError::Precondition);
    }

    #[test]
    fn broadcast_non_discovery_gets_no_response() {
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: None,
        };
        let port = Port::new(1, hal);
        let mut header = Header {
            dest_uid: Uid::BROADCAST_ALL,
            ..base_header()
        };
        let mut ack = Ack::NONE;
        let _ = request(&port, &mut header, &[], None, &mut ack).unwrap();
        assert_eq!(ack.kind, AckType::None);
    }

    #[test]
    fn classifies_nack_reason() {
        let mut header = base_header();
        header.tn = 0; // port starts tn at 0
        let req = header;
        let resp = encode_response(&header, ResponseType::NackReason, &[0x00, 0x05]);
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: Some(resp),
        };
        let port = Port::new(1, hal);
        let mut ack = Ack::NONE;
        let _ = request(&port, &mut header, &[], None, &mut ack).unwrap();
        assert_eq!(ack.kind, AckType::NackReason);
        assert_eq!(ack.num, 5);
        // the response header is read back through the caller's `header` out-param
        assert_eq!(header.src_uid, req.dest_uid);
        assert_eq!(header.dest_uid, req.src_uid);
        assert_eq!(header.cc, req.cc.response_class().unwrap());
    }

    #[test]
    fn classifies_ack_timer() {
        let mut header = base_header();
        let resp = encode_response(&header, ResponseType::AckTimer, &[0x00, 0x0A]);
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: Some(resp),
        };
        let port = Port::new(1, hal);
        let mut ack = Ack::NONE;
        let _ = request(&port, &mut header, &[], None, &mut ack).unwrap();
        assert_eq!(ack.kind, AckType::AckTimer);
        // pd = 0x00 0x0A (10 units) * 10 ms/unit = 100 ticks
        assert_eq!(ack.num, 100);
    }

    #[test]
    fn response_header_carries_back_message_count() {
        let mut header = base_header();
        let req = header;
        let mut resp = Header {
            dest_uid: req.src_uid,
            src_uid: req.dest_uid,
            tn: req.tn,
            port_id: ResponseType::Ack as u8,
            message_count: 7,
            sub_device: req.sub_device,
            cc: req.cc.response_class().unwrap(),
            pid: req.pid,
            pdl: 0,
        };
        resp.pdl = 0;
        let mut buf = [0u8; 64];
        let n = crate::frame::encode(&mut buf, &resp, &[]).unwrap();
        let mut v: heapless::Vec<u8, 64> = heapless::Vec::new();
        let _ = v.extend_from_slice(&buf[..n]);
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: Some(v),
        };
        let port = Port::new(1, hal);
        let mut ack = Ack::NONE;
        let _ = request(&port, &mut header, &[], None, &mut ack).unwrap();
        assert_eq!(ack.kind, AckType::Ack);
        assert_eq!(header.message_count, 7);
    }

    #[test]
    fn mismatched_tn_is_invalid() {
        let mut header = base_header();
        let mut resp_header = header;
        resp_header.tn = 1; // engine will assign tn=0 to the request
        let resp = encode_response(&resp_header, ResponseType::Ack, &[]);
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: Some(resp),
        };
        let port = Port::new(1, hal);
        let mut ack = Ack::NONE;
        let _ = request(&port, &mut header, &[], None, &mut ack).unwrap();
        assert_eq!(ack.kind, AckType::Invalid);
    }

    #[test]
    fn discovery_response_synthesizes_ack() {
        let mut header = Header {
            dest_uid: Uid::BROADCAST_ALL,
            cc: CommandClass::DiscCommand,
            pid: PID_DISC_UNIQUE_BRANCH,
            ..base_header()
        };
        let uid = Uid::new(0x5AFE, 0x1234_5678);
        let mut disc_buf = [0u8; 32];
        let n = discovery::uid_encode(&mut disc_buf, &uid, 0);
        let mut v = heapless::Vec::new();
        let _ = v.extend_from_slice(&disc_buf[..n]);
        let hal = MockHal {
            rts: Direction::Outbound,
            uid: Uid::new(9, 9),
            rx_frame: Some(v),
        };
        let port = Port::new(1, hal);
        let mut ack = Ack::NONE;
        let _ = request(&port, &mut header, &[], None, &mut ack).unwrap();
        assert_eq!(ack.kind, AckType::Ack);
        // the discovered UID is the entire point of a DISC_UNIQUE_BRANCH call,
        // so it must come back through `header`, not just the ack.
        assert_eq!(header.src_uid, uid);
        assert_eq!(header.dest_uid, Uid::NULL);
        assert_eq!(header.tn, 0);
        assert_eq!(header.cc, CommandClass::DiscCommandResponse);
        assert_eq!(header.pid, PID_DISC_UNIQUE_BRANCH);
    }
}
