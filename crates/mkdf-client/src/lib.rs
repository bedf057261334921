//! Host-side client for the mkdf signer.
//!
//! [`SignerClient`] speaks the framed command protocol over any
//! `Read + Write` byte stream: a serial port, a TCP connection to the
//! emulator, or an in-memory pipe in tests. Every call sends one request and
//! blocks for its response, validating the response header, length class and
//! response code before looking at the body.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;

use std::io::{Read, Write};

pub use error::{ClientError, Result};
use mkdf_proto::{
    CHUNK_SIZE, Command, Endpoint, Frame, FrameHeader, FrameId, LengthClass, MAX_MESSAGE_SIZE,
    NameVersion, PUBLIC_KEY_LEN, ResponseCode, SIGNATURE_LEN, Status,
};
use tracing::{debug, trace};

/// Blocking client for the signer application.
#[derive(Debug)]
pub struct SignerClient<T> {
    io: T,
    id: FrameId,
    endpoint: Endpoint,
}

impl<T: Read + Write> SignerClient<T> {
    /// Client addressing the signer on the software endpoint.
    pub fn new(io: T) -> Self {
        Self { io, id: FrameId::HOST, endpoint: Endpoint::Software }
    }

    /// Ask the application for its name and version.
    pub fn get_name_version(&mut self) -> Result<NameVersion> {
        let response = self.exchange(&self.request(LengthClass::Len1, Command::GetNameVersion))?;
        NameVersion::from_wire(response.body()).ok_or(ClientError::MalformedNameVersion)
    }

    /// Fetch the device public key.
    pub fn get_public_key(&mut self) -> Result<[u8; PUBLIC_KEY_LEN]> {
        let response = self.exchange(&self.request(LengthClass::Len1, Command::GetPublicKey))?;
        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(&response.body()[..PUBLIC_KEY_LEN]);
        Ok(key)
    }

    /// Announce the size of the next message to sign.
    pub fn set_message_size(&mut self, size: u32) -> Result<()> {
        let mut request = self.request(LengthClass::Len32, Command::SetMessageSize);
        request.body_mut()[..4].copy_from_slice(&size.to_le_bytes());
        let response = self.exchange(&request)?;
        check_status(&response, Command::SetMessageSize)
    }

    /// Send one chunk of at most [`CHUNK_SIZE`] bytes, zero-padded to a full
    /// frame.
    ///
    /// The call returning the last chunk blocks until the operator touches
    /// the device.
    pub fn sign_data(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.len() > CHUNK_SIZE {
            return Err(ClientError::ChunkTooLarge { len: chunk.len(), max: CHUNK_SIZE });
        }

        let mut request = self.request(LengthClass::Len128, Command::SignData);
        request.body_mut()[..chunk.len()].copy_from_slice(chunk);
        let response = self.exchange(&request)?;
        check_status(&response, Command::SignData)
    }

    /// Fetch the signature of the last completed message.
    ///
    /// A success body is the bare signature, while a refusal is a single
    /// `BAD` status byte followed by zeros. The two are told apart by that
    /// exact pattern.
    pub fn get_signature(&mut self) -> Result<[u8; SIGNATURE_LEN]> {
        let response = self.exchange(&self.request(LengthClass::Len1, Command::GetSignature))?;
        let body = &response.body()[..SIGNATURE_LEN];

        if body[0] == Status::Bad.to_u8() && body[1..].iter().all(|b| *b == 0) {
            return Err(ClientError::Rejected(Command::GetSignature));
        }

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(body);
        Ok(signature)
    }

    /// Load `message` and return its signature.
    ///
    /// Blocks until the operator touches the device.
    pub fn sign(&mut self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
        if message.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        if message.len() > MAX_MESSAGE_SIZE {
            return Err(ClientError::MessageTooLarge { size: message.len(), max: MAX_MESSAGE_SIZE });
        }

        // fits: bounded by MAX_MESSAGE_SIZE above
        self.set_message_size(message.len() as u32)?;
        for (i, chunk) in message.chunks(CHUNK_SIZE).enumerate() {
            trace!(chunk = i, len = chunk.len(), "sending message data");
            self.sign_data(chunk)?;
        }
        self.get_signature()
    }

    /// Send `request` and read the response, checking that it answers it.
    pub fn exchange(&mut self, request: &Frame) -> Result<Frame> {
        debug!(header = ?request.header(), code = request.code(), "sending request");
        self.io.write_all(request.as_bytes())?;
        self.io.flush()?;

        let expected = Command::from_u8(request.code())
            .map_or(ResponseCode::UnknownCommand, Command::response_code);
        let response = self.read_frame(expected)?;

        if response.code() != expected.to_u8() {
            return Err(ClientError::UnexpectedResponse {
                expected: expected.to_u8(),
                actual: response.code(),
            });
        }
        Ok(response)
    }

    /// Read one response frame and validate its header against `expected`.
    pub fn read_frame(&mut self, expected: ResponseCode) -> Result<Frame> {
        let mut byte = [0u8; 1];
        self.io.read_exact(&mut byte)?;
        let header = FrameHeader::decode(byte[0])?;

        if header.endpoint != self.endpoint {
            return Err(ClientError::WrongEndpoint {
                expected: self.endpoint,
                actual: header.endpoint,
            });
        }

        let mut response = Frame::new(header);
        self.io.read_exact(response.payload_mut())?;

        if header.len != expected.len() {
            return Err(ClientError::UnexpectedLength {
                expected: expected.len(),
                actual: header.len,
            });
        }
        Ok(response)
    }

    /// Build a request frame stamped with this client's id and endpoint.
    pub fn request(&self, len: LengthClass, command: Command) -> Frame {
        Frame::request(self.id, self.endpoint, len, command.to_u8())
    }

    /// Return the underlying stream.
    pub fn into_inner(self) -> T {
        self.io
    }
}

fn check_status(response: &Frame, command: Command) -> Result<()> {
    if response.body()[0] == Status::Ok.to_u8() {
        Ok(())
    } else {
        Err(ClientError::Rejected(command))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use hex_literal::hex;

    use super::*;

    /// Replays canned device output and records what the client sends.
    struct Canned {
        rx: Cursor<Vec<u8>>,
        tx: Vec<u8>,
    }

    impl Canned {
        fn new(rx: &[u8]) -> Self {
            Self { rx: Cursor::new(rx.to_vec()), tx: Vec::new() }
        }
    }

    impl Read for Canned {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.rx.read(buf)
        }
    }

    impl Write for Canned {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn padded(bytes: &[u8], len: usize) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out.resize(len, 0);
        out
    }

    #[test]
    fn name_version_request_and_reply() {
        let reply = padded(&hex!("5a 0a 66646b6d 6e676973 01000000"), 33);
        let mut client = SignerClient::new(Canned::new(&reply));

        let name_version = client.get_name_version().unwrap();
        assert_eq!(name_version, NameVersion::SIGNER);
        assert_eq!(client.into_inner().tx, hex!("58 09"));
    }

    #[test]
    fn set_size_encodes_little_endian() {
        let mut client = SignerClient::new(Canned::new(&hex!("59 04 00 00 00")));
        client.set_message_size(0x0102).unwrap();

        let tx = client.into_inner().tx;
        assert_eq!(tx.len(), 33);
        assert_eq!(&tx[..6], &hex!("5a 03 02 01 00 00"));
    }

    #[test]
    fn bad_status_is_rejection() {
        let mut client = SignerClient::new(Canned::new(&hex!("59 06 01 00 00")));
        assert!(matches!(client.sign_data(b"x"), Err(ClientError::Rejected(Command::SignData))));
    }

    #[test]
    fn refused_signature_is_distinguished() {
        let reply = padded(&hex!("5b 08 01"), 129);
        let mut client = SignerClient::new(Canned::new(&reply));
        let refused = client.get_signature();
        assert!(matches!(refused, Err(ClientError::Rejected(Command::GetSignature))));

        let mut reply = padded(&hex!("5b 08"), 129);
        reply[2..66].fill(0x77);
        let mut client = SignerClient::new(Canned::new(&reply));
        assert_eq!(client.get_signature().unwrap(), [0x77; 64]);
    }

    #[test]
    fn mismatched_responses_are_errors() {
        // firmware endpoint
        let mut client = SignerClient::new(Canned::new(&hex!("50 02")));
        assert!(matches!(client.get_public_key(), Err(ClientError::WrongEndpoint { .. })));

        // right endpoint, wrong length class for a public key
        let mut client = SignerClient::new(Canned::new(&hex!("59 02 00 00 00")));
        assert!(matches!(client.get_public_key(), Err(ClientError::UnexpectedLength { .. })));

        // unknown-command answer
        let mut client = SignerClient::new(Canned::new(&hex!("59 ff 00 00 00")));
        assert!(matches!(client.set_message_size(1), Err(ClientError::UnexpectedResponse { .. })));

        // version bit
        let mut client = SignerClient::new(Canned::new(&hex!("d9")));
        assert!(matches!(client.get_public_key(), Err(ClientError::Decode(_))));
    }

    #[test]
    fn oversize_message_never_reaches_device() {
        let mut client = SignerClient::new(Canned::new(&[]));
        let message = vec![0u8; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(client.sign(&message), Err(ClientError::MessageTooLarge { .. })));
        assert!(client.into_inner().tx.is_empty());
    }

    #[test]
    fn empty_message_never_reaches_device() {
        let mut client = SignerClient::new(Canned::new(&[]));
        assert!(matches!(client.sign(b""), Err(ClientError::EmptyMessage)));
        assert!(client.into_inner().tx.is_empty());
    }

    #[test]
    fn overlong_chunk_is_refused_not_truncated() {
        let mut client = SignerClient::new(Canned::new(&[]));
        let chunk = [0x55; CHUNK_SIZE + 1];
        let err = client.sign_data(&chunk).unwrap_err();
        assert!(matches!(err, ClientError::ChunkTooLarge { len: 128, max: CHUNK_SIZE }));
        assert!(client.into_inner().tx.is_empty());

        // a full chunk still fits
        let mut client = SignerClient::new(Canned::new(&hex!("59 06 00 00 00")));
        client.sign_data(&[0x55; CHUNK_SIZE]).unwrap();
        let tx = client.into_inner().tx;
        assert_eq!(&tx[..2], &hex!("5b 05"));
        assert!(tx[2..].iter().all(|b| *b == 0x55));
    }

    #[test]
    fn sign_chunks_message() {
        let mut rx = hex!("59 04 00 00 00").to_vec();
        for _ in 0..3 {
            rx.extend_from_slice(&hex!("59 06 00 00 00"));
        }
        let mut signature = padded(&hex!("5b 08"), 129);
        signature[2..66].fill(0x42);
        rx.extend_from_slice(&signature);

        let mut client = SignerClient::new(Canned::new(&rx));
        let message: Vec<u8> = (0..300u16).map(|i| i as u8).collect();
        assert_eq!(client.sign(&message).unwrap(), [0x42; 64]);

        let tx = client.into_inner().tx;
        // size frame, three data frames, signature request
        assert_eq!(tx.len(), 33 + 3 * 129 + 2);
        let last_chunk = &tx[33 + 2 * 129..33 + 3 * 129];
        assert_eq!(&last_chunk[..2], &hex!("5b 05"));
        assert_eq!(&last_chunk[2..48], &message[254..]);
        assert!(last_chunk[48..].iter().all(|b| *b == 0));
    }
}
