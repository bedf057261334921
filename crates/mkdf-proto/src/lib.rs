//! Wire format for the mkdf signer application.
//!
//! Every frame is a single header byte followed by a fixed-length payload of
//! 1, 4, 32 or 128 bytes. The header carries a 2-bit frame id, a 2-bit
//! endpoint and the payload length class. The first payload byte is the
//! application command (on requests) or response code (on responses).
//!
//! The crate is `no_std` and never allocates: frames are fixed-size buffers
//! that always start zeroed, so a response can never carry stale bytes from
//! a previous exchange.
//!
//! # Security
//!
//! Header decoding is total over all 256 byte values. A byte either yields a
//! [`FrameHeader`] or a [`DecodeError`]; there is no partially valid state.
#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod errors;
pub mod frame;
pub mod header;

pub use command::{
    CHUNK_SIZE, Command, MAX_MESSAGE_SIZE, NameVersion, PUBLIC_KEY_LEN, ResponseCode,
    SIGNATURE_LEN, Status,
};
pub use errors::{DecodeError, Result};
pub use frame::{Frame, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use header::{Endpoint, FrameHeader, FrameId, LengthClass, decode_header, encode_header};
