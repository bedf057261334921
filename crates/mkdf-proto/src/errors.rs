//! Error types for the mkdf wire format.

use thiserror::Error;

/// Reasons a header byte is rejected.
///
/// Frames with an undecodable header are dropped without a response; the
/// receiver keeps listening for the next header byte.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeError {
    /// Bit 7 (protocol version) is set
    #[error("unsupported frame version in header {0:#04x}")]
    BadVersion(u8),

    /// Bit 2 is reserved on requests and must be zero
    #[error("reserved bit set in header {0:#04x}")]
    ReservedBitSet(u8),

    /// Length selector does not name a known length class
    #[error("unknown length selector {0:#04b}")]
    UnknownLength(u8),
}

/// Convenient Result type alias for decoding
pub type Result<T> = core::result::Result<T, DecodeError>;
