//! Run loop.
//!
//! [`Device`] owns the peripherals, the identity and the single [`Session`].
//! Each turn of the loop waits for a header byte (flashing the idle
//! pattern), reads the payload the header announces, and answers it if it is
//! addressed to this application.
//!
//! A header that fails to decode is dropped on its own: its payload length
//! is unknown, so nothing more is read for it. Frames for other endpoints
//! are read in full and discarded without a reply.

use core::convert::Infallible;

use mkdf_proto::{Command, DecodeError, Endpoint, Frame, FrameHeader, ResponseCode};
use tracing::{debug, warn};

use crate::{
    config::SignerConfig,
    dispatch::{SignerContext, dispatch},
    error::DeviceError,
    hal::{ByteTransport, StatusLed, TouchSensor},
    identity::{DeviceSecret, Identity, IdentityProvider},
    presence::{Heartbeat, PresenceGate},
    session::Session,
};

/// What happened to one incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Request answered with this response code
    Replied(ResponseCode),
    /// Frame addressed to another endpoint; payload consumed, no reply
    Ignored(Endpoint),
    /// Header byte did not decode; nothing else read
    Dropped(DecodeError),
}

/// The signer application.
pub struct Device<X, T, L, I = Identity> {
    config: SignerConfig,
    session: Session,
    identity: I,
    transport: X,
    gate: PresenceGate<T, L>,
}

impl<X, T, L> Device<X, T, L>
where
    X: ByteTransport,
    T: TouchSensor,
    L: StatusLed,
{
    /// Derive the identity from `secret` and assemble the device.
    pub fn new(config: SignerConfig, secret: DeviceSecret, transport: X, touch: T, led: L) -> Self {
        Self::with_identity(config, Identity::new(secret), transport, touch, led)
    }
}

impl<X, T, L, I> Device<X, T, L, I>
where
    X: ByteTransport,
    T: TouchSensor,
    L: StatusLed,
    I: IdentityProvider,
{
    /// Assemble the device around an existing identity.
    pub fn with_identity(
        config: SignerConfig,
        identity: I,
        transport: X,
        touch: T,
        led: L,
    ) -> Self {
        Self {
            config,
            session: Session::new(),
            identity,
            transport,
            gate: PresenceGate::new(touch, led),
        }
    }

    /// Handle exactly one incoming frame.
    ///
    /// # Errors
    ///
    /// - `DeviceError::Transport` if reading or writing fails.
    pub fn serve_one(&mut self) -> Result<Outcome, DeviceError<X::Error>> {
        let byte = self.wait_for_header()?;
        self.gate.led_mut().set(self.session.status_color());
        debug!(byte = format_args!("{byte:#04x}"), "header received");

        let header = match FrameHeader::decode(byte) {
            Ok(header) => header,
            Err(error) => {
                warn!(byte = format_args!("{byte:#04x}"), %error, "dropping header");
                return Ok(Outcome::Dropped(error));
            },
        };

        let mut request = Frame::new(header);
        self.transport.read_exact(request.payload_mut()).map_err(DeviceError::Transport)?;

        if header.endpoint != self.config.endpoint {
            debug!(endpoint = ?header.endpoint, "frame not for this application");
            return Ok(Outcome::Ignored(header.endpoint));
        }

        let code = Command::from_u8(request.code())
            .map_or(ResponseCode::UnknownCommand, Command::response_code);

        let mut ctx =
            SignerContext { identity: &self.identity, gate: &mut self.gate, config: &self.config };
        let response = dispatch(&mut self.session, &mut ctx, &request);

        self.transport.write_all(response.as_bytes()).map_err(DeviceError::Transport)?;
        Ok(Outcome::Replied(code))
    }

    /// Serve frames until the transport fails.
    ///
    /// # Errors
    ///
    /// - `DeviceError::Transport` once the link fails. This is the only way
    ///   out; with an infallible transport the loop never returns.
    pub fn run(&mut self) -> Result<Infallible, DeviceError<X::Error>> {
        loop {
            self.serve_one()?;
        }
    }

    /// The signing session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The device identity
    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// The host link
    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// The host link, mutably
    pub fn transport_mut(&mut self) -> &mut X {
        &mut self.transport
    }

    fn wait_for_header(&mut self) -> Result<u8, DeviceError<X::Error>> {
        let mut heartbeat = Heartbeat::new(self.config.idle_flash);
        loop {
            heartbeat.tick(self.gate.led_mut());
            if let Some(byte) = self.transport.poll_byte().map_err(DeviceError::Transport)? {
                return Ok(byte);
            }
        }
    }
}

impl<X, T, L, I: core::fmt::Debug> core::fmt::Debug for Device<X, T, L, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("config", &self.config)
            .field("phase", &self.session.phase())
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
