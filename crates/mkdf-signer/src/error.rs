//! Error types for the signer core.
//!
//! Request errors never end the run loop: the dispatcher logs them and
//! answers with a `BAD` status. Only a failing transport stops
//! [`Device::run`](crate::Device::run).

use core::fmt;

use mkdf_proto::LengthClass;
use thiserror::Error;

/// Broad class of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong payload length or command out of sequence
    Protocol,
    /// Declared message larger than the device can hold
    Capacity,
}

/// A request the dispatcher refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// Request used the wrong length class for its command
    #[error("expected a {expected:?} request, got {actual:?}")]
    WrongLength {
        /// Length class the command requires
        expected: LengthClass,
        /// Length class the request used
        actual: LengthClass,
    },

    /// Message data sent with no message size set
    #[error("no signing session open")]
    NoSession,

    /// Signature requested before a session completed
    #[error("no signature available")]
    NoSignature,

    /// Message still waiting for data
    #[error("message incomplete: {remaining} bytes outstanding")]
    Incomplete {
        /// Bytes still expected
        remaining: u32,
    },

    /// Declared size exceeds the message buffer
    #[error("message size {size} exceeds maximum {max}")]
    TooLarge {
        /// Declared size
        size: u32,
        /// Buffer capacity
        max: usize,
    },

    /// Message buffer rejected an append
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl RequestError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TooLarge { .. } | Self::Buffer(_) => ErrorKind::Capacity,
            Self::WrongLength { .. }
            | Self::NoSession
            | Self::NoSignature
            | Self::Incomplete { .. } => ErrorKind::Protocol,
        }
    }
}

/// Message buffer errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Append would run past the buffer capacity
    #[error("appending {extra} bytes to {len} would exceed capacity {capacity}")]
    Overflow {
        /// Bytes already buffered
        len: usize,
        /// Bytes being appended
        extra: usize,
        /// Buffer capacity
        capacity: usize,
    },
}

/// Identity errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// Public key does not belong to the secret
    #[error("public key does not match device secret")]
    KeyMismatch,
}

/// Errors that end the run loop.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeviceError<E: fmt::Debug> {
    /// The byte transport failed
    #[error("transport failure: {0:?}")]
    Transport(E),
}
