//! Constants used across the RDM wire protocol.
//!
//! These values mirror the ANSI E1.20 framing conventions: start codes,
//! checksum discipline, and the size limits that every codec and the
//! transaction engine must respect.

/// RDM start code, the first byte of every RDM frame.
pub const SC_RDM: u8 = 0xCC;
/// RDM sub-start code, the second byte of every RDM frame.
pub const SC_SUB_MESSAGE: u8 = 0x01;

/// Size of the framed header including `pdl` (`SC`, `SUB_SC`, `MSG_LEN`, header fields, `pdl`), before `pd`.
pub const HEADER_FRAME_LEN: u8 = 24;

/// Maximum parameter data length.
pub const MAX_PDL: u8 = 231;

/// Maximum total frame size: `HEADER_FRAME_LEN` + `MAX_PDL` + 2 (checksum).
pub const MAX_FRAME_LEN: usize = HEADER_FRAME_LEN as usize + MAX_PDL as usize + 2;

/// Size of the shared per-port tx/rx buffer (513 DMX slots, generously covers `MAX_FRAME_LEN`).
pub const PORT_BUFFER_LEN: usize = 513;

/// Discovery preamble byte.
pub const DISC_PREAMBLE_BYTE: u8 = 0xFE;
/// Discovery preamble/data delimiter.
pub const DISC_PREAMBLE_SEPARATOR: u8 = 0xAA;
/// Maximum discovery preamble length.
pub const DISC_MAX_PREAMBLE_LEN: u8 = 7;

/// `sub_device` value addressing every sub-device on a responder.
pub const SUB_DEVICE_ALL_CALL: u16 = 0xFFFF;
/// `sub_device` value addressing the root device.
pub const SUB_DEVICE_ROOT: u16 = 0x0000;
/// One past the highest legal `sub_device` value (0..512 inclusive, per spec §4.E).
pub const SUB_DEVICE_MAX_EXCLUSIVE: u16 = 513;

/// Maximum number of hex digits in a format-string integer literal.
pub const MAX_LITERAL_HEX_DIGITS: usize = 16;
/// Maximum length of a fixed or variable ASCII field.
pub const MAX_ASCII_LEN: usize = 32;
