//! Euro-ASCII discovery response codec (module C).
//!
//! `DISC_UNIQUE_BRANCH` responses aren't framed like ordinary RDM messages —
//! the responder has no guarantee it is alone on the bus, so every UID byte
//! is doubled into two self-clocking bytes that survive a bitwise collision
//! with another responder's simultaneous reply. This is the same
//! "expand-then-reverse-lookup" shape as the 4b6b symbol table this crate's
//! teacher used for ASK/OOK framing, specialized to the two fixed masks RDM
//! uses (`0xAA`, `0x55`) instead of a 16-entry table.

use crate::consts::{DISC_MAX_PREAMBLE_LEN, DISC_PREAMBLE_BYTE, DISC_PREAMBLE_SEPARATOR};
use crate::error::DiscoveryError;
use crate::uid::Uid;

const EVEN_MASK: u8 = 0xAA;
const ODD_MASK: u8 = 0x55;

/// Minimum length of a well-formed discovery response: delimiter + 12 UID
/// bytes + 4 checksum bytes, with zero preamble.
const MIN_RESPONSE_LEN: usize = 1 + 12 + 4;

/// Encodes `uid` as a Euro-ASCII discovery response into `dst`, preceded by
/// `preamble_len` (clamped to 7) bytes of `0xFE`. Returns the number of bytes
/// written, or `0` if `dst` is too small.
pub fn uid_encode(dst: &mut [u8], uid: &Uid, preamble_len: u8) -> usize {
    let preamble_len = preamble_len.min(DISC_MAX_PREAMBLE_LEN) as usize;
    let total = preamble_len + MIN_RESPONSE_LEN;
    if dst.len() < total {
        return 0;
    }

    let mut off = 0;
    for b in &mut dst[..preamble_len] {
        *b = DISC_PREAMBLE_BYTE;
    }
    off += preamble_len;
    dst[off] = DISC_PREAMBLE_SEPARATOR;
    off += 1;

    let raw = uid.to_be_bytes();
    let mut checksum: u16 = 0;
    for &b in &raw {
        let even = b | EVEN_MASK;
        let odd = b | ODD_MASK;
        dst[off] = even;
        dst[off + 1] = odd;
        off += 2;
        checksum = checksum.wrapping_add(even as u16).wrapping_add(odd as u16);
    }

    let [hi, lo] = checksum.to_be_bytes();
    dst[off] = hi | EVEN_MASK;
    dst[off + 1] = hi | ODD_MASK;
    dst[off + 2] = lo | EVEN_MASK;
    dst[off + 3] = lo | ODD_MASK;
    off += 4;

    off
}

/// Decodes a Euro-ASCII discovery response from the front of `src`, returning
/// the recovered [`Uid`] and the total number of bytes consumed (including
/// preamble).
pub fn uid_decode(src: &[u8]) -> Result<(Uid, usize), DiscoveryError> {
    if src.len() < MIN_RESPONSE_LEN {
        return Err(DiscoveryError::TooShort);
    }

    let scan_len = (src.len().min(DISC_MAX_PREAMBLE_LEN as usize + 1)).max(1);
    let preamble_len = src[..scan_len]
        .iter()
        .position(|&b| b == DISC_PREAMBLE_SEPARATOR)
        .ok_or(DiscoveryError::NoDelimiter)?;

    if preamble_len > DISC_MAX_PREAMBLE_LEN as usize || src.len() < preamble_len + MIN_RESPONSE_LEN
    {
        return Err(DiscoveryError::NoDelimiter);
    }

    let body = &src[preamble_len + 1..preamble_len + 1 + 16];
    let mut raw = [0u8; 6];
    let mut checksum: u16 = 0;
    for i in 0..6 {
        let even = body[i * 2];
        let odd = body[i * 2 + 1];
        raw[i] = even & odd;
        checksum = checksum.wrapping_add(even as u16).wrapping_add(odd as u16);
    }

    let decoded_hi = body[12] & body[13];
    let decoded_lo = body[14] & body[15];
    let decoded_checksum = u16::from_be_bytes([decoded_hi, decoded_lo]);
    if decoded_checksum != checksum {
        return Err(DiscoveryError::BadChecksum);
    }

    Ok((Uid::from_be_bytes(&raw), preamble_len + MIN_RESPONSE_LEN))
}
