//! RDM message header and the response vocabulary layered on top of it
//! (module D's data model).
//!
//! Grounded on the response-classification shape of a reference RDM crate:
//! a `CommandClass`/`ResponseType` pair with fallible `u8` conversions, and a
//! flat `Header` carrying every wire field rather than a request/response
//! type pair — this crate's `Header` is reused for both directions since
//! `frame::write`/`frame::read` and the transaction engine are the only
//! callers that care which direction it's in.

use crate::uid::Uid;

/// RDM command class, the `cc` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandClass {
    /// Discovery request.
    DiscCommand = 0x10,
    /// Discovery response.
    DiscCommandResponse = 0x11,
    /// GET request.
    GetCommand = 0x20,
    /// GET response.
    GetCommandResponse = 0x21,
    /// SET request.
    SetCommand = 0x30,
    /// SET response.
    SetCommandResponse = 0x31,
}

impl CommandClass {
    /// Decodes a raw `cc` byte, rejecting unknown command classes.
    pub const fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x10 => Self::DiscCommand,
            0x11 => Self::DiscCommandResponse,
            0x20 => Self::GetCommand,
            0x21 => Self::GetCommandResponse,
            0x30 => Self::SetCommand,
            0x31 => Self::SetCommandResponse,
            _ => return None,
        })
    }

    /// True for the three request-side classes a caller may issue.
    pub const fn is_request(&self) -> bool {
        matches!(
            self,
            Self::DiscCommand | Self::GetCommand | Self::SetCommand
        )
    }

    /// The response class for a request class (`cc + 1`).
    pub const fn response_class(&self) -> Option<Self> {
        Self::from_u8(*self as u8 + 1)
    }
}

/// RDM response type, overloads the `port_id` header field on a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseType {
    /// The request succeeded; `pd` carries the requested data.
    Ack = 0x00,
    /// The responder needs more time; `pd` carries an estimate.
    AckTimer = 0x01,
    /// The request failed; `pd` carries a NACK reason code.
    NackReason = 0x02,
    /// More response data is pending; the controller must re-request.
    AckOverflow = 0x03,
}

impl ResponseType {
    /// Decodes a raw `port_id`-overloaded response-type byte.
    pub const fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x00 => Self::Ack,
            0x01 => Self::AckTimer,
            0x02 => Self::NackReason,
            0x03 => Self::AckOverflow,
            _ => return None,
        })
    }
}

/// The well-known `DISC_UNIQUE_BRANCH` parameter ID.
pub const PID_DISC_UNIQUE_BRANCH: u16 = 0x0001;

/// The 24-byte RDM header, shared by request and response frames.
///
/// Wire layout: `dest_uid`(6) `src_uid`(6) `tn`(1) `port_id`(1)
/// `message_count`(1) `sub_device`(2, BE) `cc`(1) `pid`(2, BE) `pdl`(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Target responder UID (or a broadcast UID).
    pub dest_uid: Uid,
    /// Originating controller/responder UID.
    pub src_uid: Uid,
    /// Transaction number, echoed back on the response.
    pub tn: u8,
    /// Request-side port index (1-based); response-side [`ResponseType`] as a raw byte.
    pub port_id: u8,
    /// Count of queued messages the responder still has pending.
    pub message_count: u8,
    /// Target sub-device (`0` is the root device).
    pub sub_device: u16,
    /// Request or response command class.
    pub cc: CommandClass,
    /// Parameter ID.
    pub pid: u16,
    /// Parameter-data length in bytes.
    pub pdl: u8,
}

impl Header {
    /// Interprets `port_id` as a [`ResponseType`] (valid only on response frames).
    pub fn response_type(&self) -> Option<ResponseType> {
        ResponseType::from_u8(self.port_id)
    }
}

/// Classification of a transaction's outcome, returned to the caller of
/// [`crate::transaction::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckType {
    /// No response was expected (broadcast, non-discovery).
    None,
    /// The request succeeded.
    Ack,
    /// Estimated additional response time, in scheduler ticks.
    AckTimer,
    /// NACK reason code.
    NackReason,
    /// Multi-response paging; caller must re-issue to continue.
    AckOverflow,
    /// Timeout, framing error, checksum error, or response-validation failure.
    Invalid,
}

/// The classification result of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// The classification.
    pub kind: AckType,
    /// Meaning depends on `kind`: pd length for `Ack`, timer ticks for
    /// `AckTimer`, NACK reason code for `NackReason`, unused otherwise.
    pub num: u32,
}

impl Ack {
    /// No response was expected.
    pub const NONE: Ack = Ack {
        kind: AckType::None,
        num: 0,
    };
    /// The transaction failed validation or timed out.
    pub const INVALID: Ack = Ack {
        kind: AckType::Invalid,
        num: 0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_class_round_trips_through_u8() {
        for cc in [
            CommandClass::DiscCommand,
            CommandClass::DiscCommandResponse,
            CommandClass::GetCommand,
            CommandClass::GetCommandResponse,
            CommandClass::SetCommand,
            CommandClass::SetCommandResponse,
        ] {
            assert_eq!(CommandClass::from_u8(cc as u8), Some(cc));
        }
        assert_eq!(CommandClass::from_u8(0xFF), None);
    }

    #[test]
    fn response_class_is_request_plus_one() {
        assert_eq!(
            CommandClass::GetCommand.response_class(),
            Some(CommandClass::GetCommandResponse)
        );
        assert_eq!(CommandClass::GetCommandResponse.response_class(), None);
    }

    #[test]
    fn is_request_classifies_correctly() {
        assert!(CommandClass::DiscCommand.is_request());
        assert!(!CommandClass::DiscCommandResponse.is_request());
    }
}
