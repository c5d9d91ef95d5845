//! RDM frame I/O (module D): the pure codec half of `write`/`read`.
//!
//! The per-port bookkeeping (`is_sending`, RTS direction) lives in
//! [`crate::port`]; this module only ever touches caller-supplied buffers, so
//! — like [`crate::discovery`] — it needs no lock, matching the concurrency
//! model's split between pure codecs and the critical-section-guarded state
//! around them.

use crate::consts::{HEADER_FRAME_LEN, MAX_PDL};
use crate::error::FrameError;
use crate::format::{Direction, Program};
use crate::header::{CommandClass, Header};
use crate::uid::Uid;

/// The fixed C-style format of an RDM header: two literal framing bytes
/// (`SC`, `SUB_SC`) and a placeholder `MSG_LEN`, followed by the header
/// fields proper.
const HEADER_FORMAT: &str = "#cc01#18huubbbwbw";

/// Byte width of the native packed scratch buffer [`HEADER_FORMAT`] walks:
/// 3 bytes of literal padding (never read) + 20 bytes of real fields.
const HEADER_NATIVE_LEN: usize = 23;

fn header_program() -> Program {
    Program::parse(HEADER_FORMAT).expect("HEADER_FORMAT is a constant, known-valid format string")
}

fn pack_native(header: &Header) -> [u8; HEADER_NATIVE_LEN] {
    // The two leading literal tokens in HEADER_FORMAT never read from `src`,
    // so the real fields start at offset 0 here even though they land at
    // offset 3 on the wire side; the trailing 3 bytes of this buffer are
    // padding to keep `src.len() == dst.len() == param_size`.
    let mut buf = [0u8; HEADER_NATIVE_LEN];
    let mut off = 0;
    buf[off..off + 6].copy_from_slice(&uid_native(&header.dest_uid));
    off += 6;
    buf[off..off + 6].copy_from_slice(&uid_native(&header.src_uid));
    off += 6;
    buf[off] = header.tn;
    buf[off + 1] = header.port_id;
    buf[off + 2] = header.message_count;
    off += 3;
    buf[off..off + 2].copy_from_slice(&header.sub_device.to_ne_bytes());
    off += 2;
    buf[off] = header.cc as u8;
    off += 1;
    buf[off..off + 2].copy_from_slice(&header.pid.to_ne_bytes());
    buf
}

fn uid_native(uid: &Uid) -> [u8; 6] {
    let man = uid.man_id.to_ne_bytes();
    let dev = uid.dev_id.to_ne_bytes();
    [man[0], man[1], dev[0], dev[1], dev[2], dev[3]]
}

fn unpack_native(buf: &[u8; HEADER_NATIVE_LEN], pdl: u8) -> Result<Header, FrameError> {
    let mut off = 0;
    let dest_uid = uid_from_native(&buf[off..off + 6]);
    off += 6;
    let src_uid = uid_from_native(&buf[off..off + 6]);
    off += 6;
    let tn = buf[off];
    let port_id = buf[off + 1];
    let message_count = buf[off + 2];
    off += 3;
    let sub_device = u16::from_ne_bytes([buf[off], buf[off + 1]]);
    off += 2;
    let cc = CommandClass::from_u8(buf[off]).ok_or(FrameError::BadCommandClass)?;
    off += 1;
    let pid = u16::from_ne_bytes([buf[off], buf[off + 1]]);

    Ok(Header {
        dest_uid,
        src_uid,
        tn,
        port_id,
        message_count,
        sub_device,
        cc,
        pid,
        pdl,
    })
}

fn uid_from_native(raw: &[u8]) -> Uid {
    let man = u16::from_ne_bytes([raw[0], raw[1]]);
    let dev = u32::from_ne_bytes([raw[2], raw[3], raw[4], raw[5]]);
    Uid::new(man, dev)
}

fn checksum(buf: &[u8]) -> u16 {
    buf.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

/// Serializes `header` and `pd` into `dst`, returning the total frame length
/// (`MSG_LEN + 2`). Does not touch `is_sending` or RTS — see
/// [`crate::port::Port::write`] for the stateful wrapper.
pub fn encode(dst: &mut [u8], header: &Header, pd: &[u8]) -> Result<usize, FrameError> {
    let pdl = pd.len();
    if pdl > MAX_PDL as usize {
        return Err(FrameError::PdlTooLarge);
    }
    let msg_len = HEADER_FRAME_LEN as usize + pdl;
    if dst.len() < msg_len + 2 {
        return Err(FrameError::BufferTooSmall);
    }

    let native = pack_native(header);
    let program = header_program();
    let _ = program.emplace(
        &mut dst[..HEADER_NATIVE_LEN],
        &native,
        false,
        Direction::ToWire,
    );
    dst[2] = msg_len as u8;
    dst[HEADER_NATIVE_LEN] = pdl as u8;
    dst[HEADER_NATIVE_LEN + 1..HEADER_NATIVE_LEN + 1 + pdl].copy_from_slice(pd);

    let sum = checksum(&dst[..msg_len]);
    dst[msg_len..msg_len + 2].copy_from_slice(&sum.to_be_bytes());

    Ok(msg_len + 2)
}

/// The result of a successful [`decode`].
#[derive(Debug, Clone, Copy)]
pub struct Decoded {
    /// The deserialized header, if `want_header` was set.
    pub header: Option<Header>,
    /// Number of parameter-data bytes copied into the caller's `pd_out`.
    pub pd_len: usize,
    /// Total frame length on the wire (`MSG_LEN + 2`).
    pub frame_len: usize,
}

/// Validates and deserializes a frame from the front of `src`.
///
/// `want_pdl` caps how many parameter-data bytes are copied into `pd_out`
/// (the wire `pdl` if `None`); `pd_out` may be `None` to skip the copy
/// entirely.
pub fn decode(
    src: &[u8],
    want_header: bool,
    want_pdl: Option<u8>,
    pd_out: Option<&mut [u8]>,
) -> Result<Decoded, FrameError> {
    if src.len() < HEADER_FRAME_LEN as usize + 2
        || src[0] != crate::consts::SC_RDM
        || src[1] != crate::consts::SC_SUB_MESSAGE
    {
        return Err(FrameError::BadStartCode);
    }

    let msg_len = src[2] as usize;
    if src.len() < msg_len + 2 {
        return Err(FrameError::BufferTooSmall);
    }

    let sum = checksum(&src[..msg_len]);
    let on_wire = u16::from_be_bytes([src[msg_len], src[msg_len + 1]]);
    if sum != on_wire {
        return Err(FrameError::BadChecksum);
    }

    let pdl = src[HEADER_NATIVE_LEN];

    let header = if want_header {
        let mut native = [0u8; HEADER_NATIVE_LEN];
        let program = header_program();
        let _ = program.emplace(
            &mut native,
            &src[..HEADER_NATIVE_LEN],
            true,
            Direction::FromWire,
        );
        Some(unpack_native(&native, pdl)?)
    } else {
        None
    };

    let cpy = (want_pdl.unwrap_or(pdl) as usize).min(pdl as usize);
    let pd_start = HEADER_NATIVE_LEN + 1;
    let pd_len = if let Some(out) = pd_out {
        let n = cpy.min(out.len());
        out[..n].copy_from_slice(&src[pd_start..pd_start + n]);
        n
    } else {
        0
    };

    Ok(Decoded {
        header,
        pd_len,
        frame_len: msg_len + 2,
    })
}
