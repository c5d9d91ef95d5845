//! Error types surfaced by the RDM core.
//!
//! The distilled C source returns `0` (or `false`) on every failure path; this
//! crate replaces that convention with a typed [`Error`] so callers can tell a
//! rejected precondition from a checksum failure from a bus timeout.

/// Errors produced while parsing a format-mini-language string (module B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The computed parameter size exceeds [`crate::consts::MAX_PDL`].
    #[error("format param_size exceeds max pdl")]
    ParamSizeTooLarge,
    /// A `v`, variable-length `a`, or `$` token appeared before the end of the string.
    #[error("variable-length or anchor token not at end of format")]
    NotAtEnd,
    /// An integer literal had zero hex digits, more than 16, or an invalid terminator.
    #[error("invalid integer literal in format string")]
    InvalidLiteral,
    /// A fixed-length ASCII field declared a length of zero.
    #[error("fixed-length ascii field of size 0")]
    ZeroLengthAscii,
    /// An unrecognized token character.
    #[error("unrecognized format token")]
    UnknownToken,
    /// The parsed program has more fields than this crate's fixed-capacity buffer allows.
    #[error("format string has too many fields")]
    TooManyFields,
}

/// Errors produced while reading or writing a frame in the per-port buffer (module D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// `pdl` exceeds [`crate::consts::MAX_PDL`].
    #[error("pdl exceeds max pdl")]
    PdlTooLarge,
    /// A transaction is already in flight on this port.
    #[error("port is already sending")]
    PortBusy,
    /// `buffer[0..2]` did not match `{SC_RDM, SC_SUB_MESSAGE}`.
    #[error("bad start code")]
    BadStartCode,
    /// The recomputed checksum did not match the checksum on the wire.
    #[error("checksum mismatch")]
    BadChecksum,
    /// The destination buffer supplied by the caller was too small.
    #[error("destination buffer too small")]
    BufferTooSmall,
    /// The `cc` header field did not decode to a known [`crate::header::CommandClass`].
    #[error("unrecognized command class byte")]
    BadCommandClass,
}

/// Errors produced while decoding a Euro-ASCII discovery response (module C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// The input was shorter than the minimum 17-byte discovery response.
    #[error("discovery buffer too short")]
    TooShort,
    /// No `0xAA` delimiter was found within the first 8 bytes.
    #[error("no discovery delimiter found")]
    NoDelimiter,
    /// The recomputed checksum did not match the decoded checksum.
    #[error("discovery checksum mismatch")]
    BadChecksum,
}

/// Errors surfaced by a transaction, combining every layer below it with the
/// transport's own precondition and classification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError<E> {
    /// A request precondition was violated (null/broadcast UID misuse, bad command
    /// class, out-of-range sub-device). No side effects occur.
    #[error("request precondition violated")]
    Precondition,
    /// Propagated from [`crate::format`].
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    /// Propagated from [`crate::frame`].
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    /// Propagated from [`crate::discovery`].
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    /// Propagated from the platform [`crate::hal::Hal`] implementation.
    #[error("hal error")]
    Hal(E),
}
