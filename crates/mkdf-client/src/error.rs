//! Client error types.

use std::io;

use mkdf_proto::{Command, DecodeError, Endpoint, LengthClass};
use thiserror::Error;

/// Errors talking to the signer.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The link to the device failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Response header did not decode
    #[error("bad response header: {0}")]
    Decode(#[from] DecodeError),

    /// Response came from an unexpected endpoint
    #[error("response from {actual:?}, expected {expected:?}")]
    WrongEndpoint {
        /// Endpoint the request went to
        expected: Endpoint,
        /// Endpoint the response claims
        actual: Endpoint,
    },

    /// Response used the wrong length class
    #[error("response length {actual:?}, expected {expected:?}")]
    UnexpectedLength {
        /// Length class the response code implies
        expected: LengthClass,
        /// Length class received
        actual: LengthClass,
    },

    /// Response carried the wrong response code
    #[error("unexpected response code {actual:#04x}, expected {expected:#04x}")]
    UnexpectedResponse {
        /// Code that answers the request
        expected: u8,
        /// Code received
        actual: u8,
    },

    /// Device answered with a `BAD` status
    #[error("{0:?} rejected by device")]
    Rejected(Command),

    /// Message does not fit the device buffer
    #[error("message of {size} bytes exceeds device maximum {max}")]
    MessageTooLarge {
        /// Message length
        size: usize,
        /// Device capacity
        max: usize,
    },

    /// Chunk longer than one `SignData` request carries
    #[error("chunk of {len} bytes exceeds {max}")]
    ChunkTooLarge {
        /// Chunk length
        len: usize,
        /// Bytes per request
        max: usize,
    },

    /// The device cannot sign an empty message
    #[error("message is empty")]
    EmptyMessage,

    /// Name/version body was malformed
    #[error("malformed name/version response")]
    MalformedNameVersion,
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;
