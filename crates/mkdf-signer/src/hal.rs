//! Peripheral abstraction.
//!
//! The signer needs three things from the hardware: a byte pipe to the host,
//! a touch sensor with an explicit acknowledge, and a status LED. On the
//! device these are memory-mapped registers; in the emulator they are a TCP
//! socket, stdin and a log line; under test they are scripted.

use core::fmt;

use bitflags::bitflags;

/// Byte-oriented link to the host.
///
/// Mirrors the device's "byte available" / "ready to send" flags:
/// [`poll_byte`](Self::poll_byte) checks once and returns, everything else
/// is built on top of it and blocks.
///
/// Hardware transports cannot fail and use [`core::convert::Infallible`].
/// Emulated transports report a closed link through `Error`, which is the
/// only way out of [`Device::run`](crate::Device::run).
pub trait ByteTransport {
    /// Link failure
    type Error: fmt::Debug;

    /// Return the next received byte, or `None` if nothing is pending.
    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Send one byte, blocking until the link accepts it.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Block until a byte arrives.
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        loop {
            if let Some(byte) = self.poll_byte()? {
                return Ok(byte);
            }
        }
    }

    /// Fill `buf` completely, blocking per byte.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        for slot in buf {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    /// Send every byte of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for byte in bytes {
            self.write_byte(*byte)?;
        }
        Ok(())
    }
}

/// Physical presence sensor.
pub trait TouchSensor {
    /// Whether a touch event is latched.
    fn touched(&mut self) -> bool;

    /// Clear the latched event.
    fn acknowledge(&mut self);
}

bitflags! {
    /// RGB status LED value. Each channel is one register bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LedColor: u8 {
        /// Blue channel
        const BLUE = 1 << 0;
        /// Green channel
        const GREEN = 1 << 1;
        /// Red channel
        const RED = 1 << 2;
    }
}

impl LedColor {
    /// All channels off
    pub const OFF: Self = Self::empty();
}

impl Default for LedColor {
    fn default() -> Self {
        Self::OFF
    }
}

/// Status LED.
pub trait StatusLed {
    /// Drive the LED to `color`.
    fn set(&mut self, color: LedColor);
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    type Error = T::Error;

    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        (**self).poll_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        (**self).write_byte(byte)
    }
}

impl<T: TouchSensor + ?Sized> TouchSensor for &mut T {
    fn touched(&mut self) -> bool {
        (**self).touched()
    }

    fn acknowledge(&mut self) {
        (**self).acknowledge();
    }
}

impl<T: StatusLed + ?Sized> StatusLed for &mut T {
    fn set(&mut self, color: LedColor) {
        (**self).set(color);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Loopback {
        rx: VecDeque<Option<u8>>,
        tx: Vec<u8>,
    }

    impl ByteTransport for Loopback {
        type Error = &'static str;

        fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error> {
            self.rx.pop_front().ok_or("closed")
        }

        fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
            self.tx.push(byte);
            Ok(())
        }
    }

    #[test]
    fn read_byte_skips_empty_polls() {
        let mut link = Loopback { rx: VecDeque::from([None, None, Some(7), Some(8)]), tx: vec![] };
        assert_eq!(link.read_byte(), Ok(7));

        let mut buf = [0u8; 1];
        link.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [8]);
        assert_eq!(link.read_byte(), Err("closed"));
    }

    #[test]
    fn write_all_sends_in_order() {
        let mut link = Loopback { rx: VecDeque::new(), tx: vec![] };
        link.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(link.tx, [1, 2, 3]);
    }

    #[test]
    fn led_channels_match_register_bits() {
        assert_eq!(LedColor::BLUE.bits(), 0b001);
        assert_eq!(LedColor::GREEN.bits(), 0b010);
        assert_eq!(LedColor::RED.bits(), 0b100);
        assert_eq!(LedColor::default(), LedColor::OFF);
    }
}
