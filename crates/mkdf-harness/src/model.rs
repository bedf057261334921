//! Reference model of the signer command protocol.
//!
//! [`ModelSigner`] answers request frames the way the device must, written as
//! directly as possible: plain fields, a `Vec` for the message and the free
//! signing function. Model-based tests feed the same [`Operation`]s to the
//! model and to a real device and compare the bytes that come back.

use arbitrary::Arbitrary;
use mkdf_proto::{
    CHUNK_SIZE, Command, Endpoint, FrameHeader, FrameId, LengthClass, MAX_MESSAGE_SIZE,
    NameVersion, ResponseCode, Status, encode_header,
};
use mkdf_signer::{
    DeviceSecret, PublicKey, Signature,
    identity::{derive_public_key, sign},
};

/// Length class of a generated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum WireLen {
    /// 1 byte
    Len1,
    /// 4 bytes
    Len4,
    /// 32 bytes
    Len32,
    /// 128 bytes
    Len128,
}

impl From<WireLen> for LengthClass {
    fn from(len: WireLen) -> Self {
        match len {
            WireLen::Len1 => Self::Len1,
            WireLen::Len4 => Self::Len4,
            WireLen::Len32 => Self::Len32,
            WireLen::Len128 => Self::Len128,
        }
    }
}

/// One thing a host can send to the device.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Well-formed `GetPublicKey`
    GetPublicKey,
    /// Well-formed `SetMessageSize`; sizes above the limit are included
    SetMessageSize {
        /// Declared message size
        size: u16,
    },
    /// Well-formed `SignData` with a chunk of `fill` bytes
    SignData {
        /// Chunk content
        fill: u8,
    },
    /// Well-formed `GetSignature`
    GetSignature,
    /// Well-formed `GetNameVersion`
    GetNameVersion,
    /// Arbitrary command byte and length class for the software endpoint
    Request {
        /// Length class
        len: WireLen,
        /// Command byte
        code: u8,
        /// Value of every other payload byte
        fill: u8,
    },
    /// Frame for the firmware endpoint
    Foreign {
        /// Length class
        len: WireLen,
        /// Command byte
        code: u8,
    },
    /// Header byte with the version bit forced on
    BadHeader {
        /// Low bits of the header
        byte: u8,
    },
}

impl Operation {
    /// Bytes the host puts on the wire for this operation.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            Self::GetPublicKey => request(LengthClass::Len1, Command::GetPublicKey.to_u8(), &[]),
            Self::SetMessageSize { size } => request(
                LengthClass::Len32,
                Command::SetMessageSize.to_u8(),
                &u32::from(*size).to_le_bytes(),
            ),
            Self::SignData { fill } => {
                request(LengthClass::Len128, Command::SignData.to_u8(), &[*fill; CHUNK_SIZE])
            },
            Self::GetSignature => request(LengthClass::Len1, Command::GetSignature.to_u8(), &[]),
            Self::GetNameVersion => {
                request(LengthClass::Len1, Command::GetNameVersion.to_u8(), &[])
            },
            Self::Request { len, code, fill } => {
                let len = LengthClass::from(*len);
                request(len, *code, &vec![*fill; len.bytes() - 1])
            },
            Self::Foreign { len, code } => {
                let len = LengthClass::from(*len);
                let mut wire = vec![0u8; 1 + len.bytes()];
                wire[0] = encode_header(FrameId::HOST, Endpoint::Firmware, false, len);
                wire[1] = *code;
                wire
            },
            Self::BadHeader { byte } => vec![byte | 0x80],
        }
    }
}

fn request(len: LengthClass, code: u8, body: &[u8]) -> Vec<u8> {
    let mut wire = vec![0u8; 1 + len.bytes()];
    wire[0] = encode_header(FrameId::HOST, Endpoint::Software, false, len);
    wire[1] = code;
    wire[2..2 + body.len()].copy_from_slice(body);
    wire
}

/// Straight-line model of the signer.
#[derive(Debug)]
pub struct ModelSigner {
    secret: DeviceSecret,
    public_key: PublicKey,
    name_version: NameVersion,
    expected: u32,
    remaining: u32,
    message: Vec<u8>,
    signature: Option<Signature>,
    signed: usize,
}

impl ModelSigner {
    /// Model of a device provisioned with `secret`.
    pub fn new(secret: DeviceSecret) -> Self {
        let public_key = derive_public_key(&secret);
        Self {
            secret,
            public_key,
            name_version: NameVersion::SIGNER,
            expected: 0,
            remaining: 0,
            message: Vec::new(),
            signature: None,
            signed: 0,
        }
    }

    /// Messages signed so far
    pub fn signed(&self) -> usize {
        self.signed
    }

    /// Public key the device must report
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Apply one operation and return the exact bytes the device must send
    /// back, or nothing.
    pub fn apply(&mut self, op: &Operation) -> Vec<u8> {
        let wire = op.to_wire();
        let Ok(header) = FrameHeader::decode(wire[0]) else {
            return Vec::new();
        };
        if header.endpoint != Endpoint::Software {
            return Vec::new();
        }
        self.respond(header, &wire[1..])
    }

    fn respond(&mut self, header: FrameHeader, payload: &[u8]) -> Vec<u8> {
        let Some(command) = Command::from_u8(payload[0]) else {
            return frame(header, ResponseCode::UnknownCommand, &[]);
        };

        let code = command.response_code();
        match command {
            Command::GetPublicKey => frame(header, code, &self.public_key),
            Command::SetMessageSize => {
                if header.len != LengthClass::Len32 {
                    return frame(header, code, &[Status::Bad.to_u8()]);
                }
                self.expected = 0;
                self.remaining = 0;
                self.message.clear();
                self.signature = None;

                let size = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
                if size as usize > MAX_MESSAGE_SIZE {
                    return frame(header, code, &[Status::Bad.to_u8()]);
                }
                self.expected = size;
                self.remaining = size;
                frame(header, code, &[Status::Ok.to_u8()])
            },
            Command::SignData => {
                if header.len != LengthClass::Len128 || self.expected == 0 {
                    return frame(header, code, &[Status::Bad.to_u8()]);
                }
                let take = (self.remaining as usize).min(CHUNK_SIZE);
                self.message.extend_from_slice(&payload[1..=take]);
                self.remaining -= take as u32;

                if self.remaining == 0 {
                    self.signature = sign(&self.secret, &self.public_key, &self.message).ok();
                    self.signed += 1;
                    self.expected = 0;
                    self.message.clear();
                }
                frame(header, code, &[Status::Ok.to_u8()])
            },
            Command::GetSignature => match self.signature {
                Some(signature) => frame(header, code, &signature),
                None => frame(header, code, &[Status::Bad.to_u8()]),
            },
            Command::GetNameVersion => {
                if header.len == LengthClass::Len1 {
                    frame(header, code, &self.name_version.to_wire())
                } else {
                    frame(header, code, &[])
                }
            },
        }
    }
}

fn frame(request: FrameHeader, code: ResponseCode, body: &[u8]) -> Vec<u8> {
    let len = code.len();
    let mut wire = vec![0u8; 1 + len.bytes()];
    wire[0] = encode_header(request.id, request.endpoint, false, len);
    wire[1] = code.to_u8();
    wire[2..2 + body.len()].copy_from_slice(body);
    wire
}
