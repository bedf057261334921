//! Application command and response codes.
//!
//! The first payload byte of every request selects a [`Command`]. The device
//! answers with the matching [`ResponseCode`] in the first payload byte of the
//! response, followed by a command-specific body.
//!
//! | Command           | Code | Response | Response length |
//! |-------------------|------|----------|-----------------|
//! | `GetPublicKey`    | 0x01 | 0x02     | 128             |
//! | `SetMessageSize`  | 0x03 | 0x04     | 4               |
//! | `SignData`        | 0x05 | 0x06     | 4               |
//! | `GetSignature`    | 0x07 | 0x08     | 128             |
//! | `GetNameVersion`  | 0x09 | 0x0a     | 32              |
//! | (anything else)   | -    | 0xff     | 1               |

use core::fmt;

use crate::header::LengthClass;

/// Largest message the device will sign, in bytes
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// Message bytes carried by one `SignData` request (128-byte payload minus
/// the command byte)
pub const CHUNK_SIZE: usize = LengthClass::Len128.bytes() - 1;

/// Ed25519 public key length
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signature length
pub const SIGNATURE_LEN: usize = 64;

/// Request command codes.
///
/// `from_u8` returns `None` for unknown values; the device answers those with
/// [`ResponseCode::UnknownCommand`] instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Read the 32-byte Ed25519 public key
    GetPublicKey = 0x01,
    /// Open a signing session for a message of the given size
    SetMessageSize = 0x03,
    /// Load up to 127 message bytes; signs when the message is complete
    SignData = 0x05,
    /// Read the 64-byte signature of the last completed session
    GetSignature = 0x07,
    /// Read the application name and version
    GetNameVersion = 0x09,
}

impl Command {
    /// Every command, in code order
    pub const ALL: [Self; 5] = [
        Self::GetPublicKey,
        Self::SetMessageSize,
        Self::SignData,
        Self::GetSignature,
        Self::GetNameVersion,
    ];

    /// Raw command byte
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a command byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::GetPublicKey),
            0x03 => Some(Self::SetMessageSize),
            0x05 => Some(Self::SignData),
            0x07 => Some(Self::GetSignature),
            0x09 => Some(Self::GetNameVersion),
            _ => None,
        }
    }

    /// Response code the device answers this command with
    #[must_use]
    pub const fn response_code(self) -> ResponseCode {
        match self {
            Self::GetPublicKey => ResponseCode::PublicKey,
            Self::SetMessageSize => ResponseCode::SetMessageSize,
            Self::SignData => ResponseCode::SignData,
            Self::GetSignature => ResponseCode::Signature,
            Self::GetNameVersion => ResponseCode::NameVersion,
        }
    }

    /// Length class a well-formed request for this command uses
    #[must_use]
    pub const fn request_len(self) -> LengthClass {
        match self {
            Self::GetPublicKey | Self::GetSignature | Self::GetNameVersion => LengthClass::Len1,
            Self::SetMessageSize => LengthClass::Len32,
            Self::SignData => LengthClass::Len128,
        }
    }
}

/// Response codes, carried in the first payload byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseCode {
    /// Public key follows
    PublicKey = 0x02,
    /// Status byte follows
    SetMessageSize = 0x04,
    /// Status byte follows
    SignData = 0x06,
    /// Signature (or `BAD` status) follows
    Signature = 0x08,
    /// Name and version follow
    NameVersion = 0x0a,
    /// Command byte was not recognised
    UnknownCommand = 0xff,
}

impl ResponseCode {
    /// Raw response byte
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a response byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(Self::PublicKey),
            0x04 => Some(Self::SetMessageSize),
            0x06 => Some(Self::SignData),
            0x08 => Some(Self::Signature),
            0x0a => Some(Self::NameVersion),
            0xff => Some(Self::UnknownCommand),
            _ => None,
        }
    }

    /// Fixed length class of responses carrying this code
    #[must_use]
    pub const fn len(self) -> LengthClass {
        match self {
            Self::PublicKey | Self::Signature => LengthClass::Len128,
            Self::SetMessageSize | Self::SignData => LengthClass::Len4,
            Self::NameVersion => LengthClass::Len32,
            Self::UnknownCommand => LengthClass::Len1,
        }
    }
}

/// Status byte at the start of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// Request accepted
    Ok = 0x00,
    /// Request rejected
    Bad = 0x01,
}

impl Status {
    /// Raw status byte
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a status byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Ok),
            0x01 => Some(Self::Bad),
            _ => None,
        }
    }
}

/// Application identity reported by `GetNameVersion`.
///
/// Names are stored in reading order (`b"mkdf"`) and sent byte-reversed on
/// the wire (`b"fdkm"`), so a little-endian `u32` load on the host yields
/// the readable tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameVersion {
    /// First 4-byte name tag
    pub name0: [u8; 4],
    /// Second 4-byte name tag
    pub name1: [u8; 4],
    /// Application version
    pub version: u32,
}

impl NameVersion {
    /// Encoded size on the wire
    pub const WIRE_SIZE: usize = 12;

    /// Name and version of this signer
    pub const SIGNER: Self = Self { name0: *b"mkdf", name1: *b"sign", version: 1 };

    /// Encode as `name0 (reversed) | name1 (reversed) | version (LE)`.
    #[must_use]
    pub fn to_wire(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..4].copy_from_slice(&reversed(self.name0));
        out[4..8].copy_from_slice(&reversed(self.name1));
        out[8..12].copy_from_slice(&self.version.to_le_bytes());
        out
    }

    /// Decode from a response body. Returns `None` if `raw` is too short.
    #[must_use]
    pub fn from_wire(raw: &[u8]) -> Option<Self> {
        let raw: &[u8; Self::WIRE_SIZE] = raw.get(..Self::WIRE_SIZE)?.try_into().ok()?;
        let mut name0 = [0u8; 4];
        let mut name1 = [0u8; 4];
        let mut version = [0u8; 4];
        name0.copy_from_slice(&raw[0..4]);
        name1.copy_from_slice(&raw[4..8]);
        version.copy_from_slice(&raw[8..12]);

        Some(Self {
            name0: reversed(name0),
            name1: reversed(name1),
            version: u32::from_le_bytes(version),
        })
    }
}

fn reversed(mut tag: [u8; 4]) -> [u8; 4] {
    tag.reverse();
    tag
}

impl fmt::Debug for NameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameVersion")
            .field("name0", &format_args!("{}", self.name0.escape_ascii()))
            .field("name1", &format_args!("{}", self.name1.escape_ascii()))
            .field("version", &self.version)
            .finish()
    }
}

impl fmt::Display for NameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} v{}", self.name0.escape_ascii(), self.name1.escape_ascii(), self.version)
    }
}
