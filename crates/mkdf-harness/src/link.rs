//! In-memory host link.
//!
//! [`duplex`] returns two ends of a byte pipe: the device end implements
//! [`ByteTransport`], the host end implements `Read + Write` so the real
//! client can sit on it. Dropping either end closes the link for the other.

use std::{
    io::{self, Read, Write},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
    time::Duration,
};

use mkdf_signer::ByteTransport;
use thiserror::Error;

/// How long a device poll waits before reporting no data
const DEVICE_POLL: Duration = Duration::from_millis(1);

/// How long the host waits for a response before giving up
const HOST_TIMEOUT: Duration = Duration::from_secs(10);

/// The host end of the link has gone away.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("host link closed")]
pub struct LinkClosed;

/// Device end of an in-memory link.
#[derive(Debug)]
pub struct DeviceLink {
    rx: Receiver<u8>,
    tx: Sender<u8>,
}

/// Host end of an in-memory link.
#[derive(Debug)]
pub struct HostLink {
    rx: Receiver<u8>,
    tx: Sender<u8>,
}

/// Create a connected device/host pair.
pub fn duplex() -> (DeviceLink, HostLink) {
    let (to_device, device_rx) = mpsc::channel();
    let (to_host, host_rx) = mpsc::channel();
    (DeviceLink { rx: device_rx, tx: to_host }, HostLink { rx: host_rx, tx: to_device })
}

impl ByteTransport for DeviceLink {
    type Error = LinkClosed;

    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        match self.rx.recv_timeout(DEVICE_POLL) {
            Ok(byte) => Ok(Some(byte)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LinkClosed),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.tx.send(byte).map_err(|_| LinkClosed)
    }
}

impl Read for HostLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(first) = buf.first_mut() else {
            return Ok(0);
        };

        *first = match self.rx.recv_timeout(HOST_TIMEOUT) {
            Ok(byte) => byte,
            Err(RecvTimeoutError::Timeout) => return Err(io::ErrorKind::TimedOut.into()),
            Err(RecvTimeoutError::Disconnected) => return Ok(0),
        };

        let mut n = 1;
        for slot in &mut buf[1..] {
            match self.rx.try_recv() {
                Ok(byte) => *slot = byte,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
            n += 1;
        }
        Ok(n)
    }
}

impl Write for HostLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for byte in buf {
            self.tx.send(*byte).map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_flow_both_ways() {
        let (mut device, mut host) = duplex();

        host.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(device.read_byte(), Ok(1));
        let mut rest = [0u8; 2];
        device.read_exact(&mut rest).unwrap();
        assert_eq!(rest, [2, 3]);
        assert_eq!(device.poll_byte(), Ok(None));

        device.write_all(&[9, 8]).unwrap();
        let mut buf = [0u8; 2];
        host.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [9, 8]);
    }

    #[test]
    fn dropping_host_closes_device() {
        let (mut device, host) = duplex();
        drop(host);
        assert_eq!(device.poll_byte(), Err(LinkClosed));
        assert_eq!(device.write_byte(0), Err(LinkClosed));
    }

    #[test]
    fn dropping_device_is_eof_for_host() {
        let (device, mut host) = duplex();
        drop(device);
        let mut buf = [0u8; 1];
        assert_eq!(host.read(&mut buf).unwrap(), 0);
    }
}
