//! One-byte frame header.
//!
//! ```text
//!    7     6   5     4   3     2     1   0
//! ┌─────┬───────┬─────────┬──────┬───────┐
//! │ ver │  id   │ endpoint│status│  len  │
//! └─────┴───────┴─────────┴──────┴───────┘
//! ```
//!
//! - `ver` must be zero. Any other value is a future protocol we don't speak.
//! - `id` is chosen by the sender and echoed back in the response.
//! - `endpoint` selects the receiver (hardware, firmware or application).
//! - `status` is reserved on requests and must be zero.
//! - `len` selects one of four payload lengths: 1, 4, 32 or 128 bytes.

use crate::errors::{DecodeError, Result};

const VERSION_BIT: u8 = 0b1000_0000;
const STATUS_BIT: u8 = 0b0000_0100;
const ID_SHIFT: u8 = 5;
const ENDPOINT_SHIFT: u8 = 3;
const FIELD_MASK: u8 = 0b11;

/// 2-bit frame id, chosen by the originator and echoed in responses.
///
/// Not used for access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct FrameId(u8);

impl FrameId {
    /// Largest representable id
    pub const MAX: u8 = FIELD_MASK;

    /// Id the host tooling stamps on its requests
    pub const HOST: Self = Self(2);

    /// Create an id, or `None` if it does not fit in two bits.
    #[must_use]
    pub const fn new(id: u8) -> Option<Self> {
        if id <= Self::MAX { Some(Self(id)) } else { None }
    }

    const fn from_bits(bits: u8) -> Self {
        Self(bits & FIELD_MASK)
    }

    /// Raw 2-bit value
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Frame destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Endpoint {
    /// Interface FPGA core
    HardwareIfpga = 0,
    /// Application FPGA core
    HardwareAfpga = 1,
    /// Device firmware
    Firmware = 2,
    /// Resident application (`DST_SW`)
    Software = 3,
}

impl Endpoint {
    /// All endpoints in wire order
    pub const ALL: [Self; 4] =
        [Self::HardwareIfpga, Self::HardwareAfpga, Self::Firmware, Self::Software];

    const fn from_bits(bits: u8) -> Self {
        // Masked to two bits: every value names an endpoint.
        match bits & FIELD_MASK {
            0 => Self::HardwareIfpga,
            1 => Self::HardwareAfpga,
            2 => Self::Firmware,
            _ => Self::Software,
        }
    }

    /// Raw 2-bit value
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Payload length class. These are the only legal payload lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LengthClass {
    /// 1 byte (command byte only)
    Len1 = 0b00,
    /// 4 bytes
    Len4 = 0b01,
    /// 32 bytes
    Len32 = 0b10,
    /// 128 bytes
    Len128 = 0b11,
}

impl LengthClass {
    /// All length classes in selector order
    pub const ALL: [Self; 4] = [Self::Len1, Self::Len4, Self::Len32, Self::Len128];

    /// Map a selector to a length class.
    ///
    /// Returns `None` for anything outside the 2-bit selector range.
    #[must_use]
    pub const fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            0b00 => Some(Self::Len1),
            0b01 => Some(Self::Len4),
            0b10 => Some(Self::Len32),
            0b11 => Some(Self::Len128),
            _ => None,
        }
    }

    /// Wire selector
    #[must_use]
    pub const fn selector(self) -> u8 {
        self as u8
    }

    /// Payload length in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Len1 => 1,
            Self::Len4 => 4,
            Self::Len32 => 32,
            Self::Len128 => 128,
        }
    }
}

/// Decoded view of a header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Originator id, echoed back in responses
    pub id: FrameId,
    /// Destination
    pub endpoint: Endpoint,
    /// Status bit. Always `false` on a decoded header.
    pub status: bool,
    /// Payload length class
    pub len: LengthClass,
}

impl FrameHeader {
    /// Header with the status bit cleared.
    #[must_use]
    pub const fn new(id: FrameId, endpoint: Endpoint, len: LengthClass) -> Self {
        Self { id, endpoint, status: false, len }
    }

    /// Pack the header into its wire byte.
    #[must_use]
    pub const fn encode(self) -> u8 {
        let status = if self.status { STATUS_BIT } else { 0 };
        (self.id.get() << ID_SHIFT)
            | (self.endpoint.to_bits() << ENDPOINT_SHIFT)
            | status
            | self.len.selector()
    }

    /// Parse a header byte.
    ///
    /// Checks run in a fixed order: version bit, reserved bit, length
    /// selector. The first failing check decides the error.
    pub const fn decode(byte: u8) -> Result<Self> {
        if byte & VERSION_BIT != 0 {
            return Err(DecodeError::BadVersion(byte));
        }

        if byte & STATUS_BIT != 0 {
            return Err(DecodeError::ReservedBitSet(byte));
        }

        let Some(len) = LengthClass::from_selector(byte & FIELD_MASK) else {
            return Err(DecodeError::UnknownLength(byte & FIELD_MASK));
        };

        Ok(Self {
            id: FrameId::from_bits(byte >> ID_SHIFT),
            endpoint: Endpoint::from_bits(byte >> ENDPOINT_SHIFT),
            status: false,
            len,
        })
    }
}

/// Pack header fields into a wire byte.
#[must_use]
pub const fn encode_header(id: FrameId, endpoint: Endpoint, status: bool, len: LengthClass) -> u8 {
    FrameHeader { id, endpoint, status, len }.encode()
}

/// Parse a wire byte into a header.
pub const fn decode_header(byte: u8) -> Result<FrameHeader> {
    FrameHeader::decode(byte)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn any_header() -> impl Strategy<Value = FrameHeader> {
        (0..=FrameId::MAX, 0usize..4, any::<bool>(), 0usize..4).prop_map(
            |(id, endpoint, status, len)| FrameHeader {
                id: FrameId::new(id).unwrap_or_default(),
                endpoint: Endpoint::ALL[endpoint],
                status,
                len: LengthClass::ALL[len],
            },
        )
    }

    #[test]
    fn every_byte_is_classified() {
        let mut accepted = 0;

        for byte in 0..=u8::MAX {
            let result = FrameHeader::decode(byte);
            assert_eq!(result, FrameHeader::decode(byte), "decoding must be deterministic");

            let expect_ok = byte & 0x80 == 0 && byte & 0x04 == 0;
            match result {
                Ok(header) => {
                    assert!(expect_ok, "byte {byte:#04x} should not decode");
                    assert_eq!(header.encode(), byte);
                    accepted += 1;
                },
                Err(DecodeError::BadVersion(b)) => {
                    assert_eq!(b, byte);
                    assert_ne!(byte & 0x80, 0);
                },
                Err(DecodeError::ReservedBitSet(b)) => {
                    assert_eq!(b, byte);
                    assert_eq!(byte & 0x80, 0);
                    assert_ne!(byte & 0x04, 0);
                },
                Err(DecodeError::UnknownLength(_)) => {
                    unreachable!("2-bit selector always maps to a length class")
                },
            }
        }

        // bit 7 and bit 2 clear, everything else free
        assert_eq!(accepted, 64);
    }

    #[test]
    fn version_checked_before_reserved_bit() {
        assert_eq!(FrameHeader::decode(0x84), Err(DecodeError::BadVersion(0x84)));
        assert_eq!(FrameHeader::decode(0x04), Err(DecodeError::ReservedBitSet(0x04)));
    }

    #[test]
    fn decode_known_bytes() {
        // id 2, endpoint DST_SW, 128-byte payload
        let header = FrameHeader::decode(0x5b).unwrap();
        assert_eq!(header.id, FrameId::new(2).unwrap());
        assert_eq!(header.endpoint, Endpoint::Software);
        assert!(!header.status);
        assert_eq!(header.len, LengthClass::Len128);
        assert_eq!(header.len.bytes(), 128);

        let header = FrameHeader::decode(0x00).unwrap();
        assert_eq!(header.id.get(), 0);
        assert_eq!(header.endpoint, Endpoint::HardwareIfpga);
        assert_eq!(header.len, LengthClass::Len1);
    }

    #[test]
    fn length_selectors() {
        assert_eq!(LengthClass::from_selector(0), Some(LengthClass::Len1));
        assert_eq!(LengthClass::from_selector(3), Some(LengthClass::Len128));
        assert_eq!(LengthClass::from_selector(4), None);
        let sizes: Vec<usize> = LengthClass::ALL.iter().map(|len| len.bytes()).collect();
        assert_eq!(sizes, [1, 4, 32, 128]);
    }

    #[test]
    fn frame_id_is_two_bits() {
        assert!(FrameId::new(3).is_some());
        assert!(FrameId::new(4).is_none());
    }

    #[test]
    fn status_bit_position() {
        let id = FrameId::new(1).unwrap();
        let byte = encode_header(id, Endpoint::Firmware, true, LengthClass::Len4);
        assert_eq!(byte, 0b0011_0101);
        assert_eq!(decode_header(byte), Err(DecodeError::ReservedBitSet(byte)));
    }

    proptest! {
        #[test]
        fn encode_then_decode(header in any_header()) {
            let byte = header.encode();
            prop_assert_eq!(byte & 0x80, 0);

            match FrameHeader::decode(byte) {
                Ok(decoded) => {
                    prop_assert!(!header.status);
                    prop_assert_eq!(decoded, header);
                },
                Err(err) => {
                    prop_assert!(header.status);
                    prop_assert_eq!(err, DecodeError::ReservedBitSet(byte));
                },
            }
        }
    }
}
