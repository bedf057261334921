//! Fixed-size frame buffer.
//!
//! A [`Frame`] owns a header byte plus the largest possible payload, laid out
//! exactly as on the wire. Only the first `1 + len.bytes()` bytes are ever
//! exposed; the rest stays zero. Every frame starts zeroed, so a response
//! built from a fresh frame can never reflect memory from an earlier one.

use core::fmt;

use crate::{
    command::ResponseCode,
    header::{Endpoint, FrameHeader, FrameId, LengthClass},
};

/// Largest payload (128-byte length class)
pub const MAX_PAYLOAD_SIZE: usize = LengthClass::Len128.bytes();

/// Largest frame on the wire: header byte plus payload
pub const MAX_FRAME_SIZE: usize = 1 + MAX_PAYLOAD_SIZE;

/// A header and its payload, stored contiguously in wire order.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    bytes: [u8; MAX_FRAME_SIZE],
}

impl Frame {
    /// Zeroed frame for `header`.
    #[must_use]
    pub const fn new(header: FrameHeader) -> Self {
        let mut bytes = [0u8; MAX_FRAME_SIZE];
        bytes[0] = header.encode();
        Self { header, bytes }
    }

    /// Request frame with `command` as the first payload byte.
    #[must_use]
    pub fn request(id: FrameId, endpoint: Endpoint, len: LengthClass, command: u8) -> Self {
        let mut frame = Self::new(FrameHeader::new(id, endpoint, len));
        frame.bytes[1] = command;
        frame
    }

    /// Response frame answering `request`.
    ///
    /// The id and endpoint are echoed from the request, the status bit is
    /// clear and the length class is fixed by `code`.
    #[must_use]
    pub fn response(request: &FrameHeader, code: ResponseCode) -> Self {
        let mut frame = Self::new(FrameHeader::new(request.id, request.endpoint, code.len()));
        frame.bytes[1] = code.to_u8();
        frame
    }

    /// Frame header
    #[must_use]
    pub const fn header(&self) -> FrameHeader {
        self.header
    }

    /// Payload, exactly `header.len.bytes()` long
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..self.wire_len()]
    }

    /// Mutable payload, exactly `header.len.bytes()` long
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let end = self.wire_len();
        &mut self.bytes[1..end]
    }

    /// First payload byte: command on requests, response code on responses
    #[must_use]
    pub const fn code(&self) -> u8 {
        self.bytes[1]
    }

    /// Payload after the code byte
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.bytes[2..self.wire_len()]
    }

    /// Mutable payload after the code byte
    pub fn body_mut(&mut self) -> &mut [u8] {
        let end = self.wire_len();
        &mut self.bytes[2..end]
    }

    /// Header byte followed by the payload
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.wire_len()]
    }

    /// Total frame length on the wire
    #[must_use]
    pub const fn wire_len(&self) -> usize {
        1 + self.header.len.bytes()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("header", &self.header)
            .field("code", &format_args!("{:#04x}", self.code()))
            .field("payload_len", &self.header.len.bytes())
            .finish_non_exhaustive()
    }
}
