//! TCP byte transport.

use std::{
    io::{self, Read, Write},
    net::TcpStream,
    time::Duration,
};

use mkdf_signer::ByteTransport;

/// How long one poll waits for a byte before reporting none.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A host connection presented as the device's byte link.
///
/// Polls time out after [`POLL_INTERVAL`], so the idle LED keeps flashing
/// while the host is quiet. A closed connection is an error, which ends the
/// device run loop for this connection.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wrap an accepted connection.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_read_timeout(Some(POLL_INTERVAL))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl ByteTransport for TcpTransport {
    type Error = io::Error;

    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut byte = [0u8; 1];
        match self.stream.read(&mut byte) {
            Ok(0) => Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.stream.write_all(&[byte])
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.stream.write_all(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    fn pair() -> (TcpTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let host = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (device, _) = listener.accept().unwrap();
        (TcpTransport::new(device).unwrap(), host)
    }

    /// Poll until something other than "no byte yet" comes back.
    fn next(transport: &mut TcpTransport) -> io::Result<u8> {
        loop {
            if let Some(byte) = transport.poll_byte()? {
                return Ok(byte);
            }
        }
    }

    #[test]
    fn quiet_host_polls_as_none() {
        let (mut transport, _host) = pair();
        assert!(matches!(transport.poll_byte(), Ok(None)));
        assert!(matches!(transport.poll_byte(), Ok(None)));
    }

    #[test]
    fn bytes_flow_both_ways() {
        let (mut transport, mut host) = pair();
        host.write_all(&[0x58, 0x09]).unwrap();
        assert_eq!(next(&mut transport).unwrap(), 0x58);
        assert_eq!(transport.read_byte().unwrap(), 0x09);

        transport.write_all(&[1, 2, 3]).unwrap();
        transport.write_byte(4).unwrap();
        let mut buf = [0u8; 4];
        host.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn closed_host_is_unexpected_eof() {
        let (mut transport, host) = pair();
        drop(host);
        let err = next(&mut transport).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
