//! Command dispatcher.
//!
//! Executes one decoded request against the session and builds its
//! response. Every request addressed to this application gets exactly one
//! response; rejected requests answer with [`Status::Bad`] and leave the
//! device running.
//!
//! Each response is built in a fresh zeroed [`Frame`], so no bytes from an
//! earlier command or from the message buffer can leak into it.

use mkdf_proto::{Command, Frame, LengthClass, ResponseCode, Status};
use tracing::{debug, info, warn};

use crate::{
    config::SignerConfig,
    error::RequestError,
    hal::{LedColor, StatusLed, TouchSensor},
    identity::IdentityProvider,
    presence::PresenceGate,
    session::{LoadProgress, Session},
};

/// Everything a command may use besides the session.
pub struct SignerContext<'a, I, T, L> {
    /// Public key and signing
    pub identity: &'a I,
    /// Touch confirmation
    pub gate: &'a mut PresenceGate<T, L>,
    /// Device settings
    pub config: &'a SignerConfig,
}

/// Execute `request` and return the response frame.
pub fn dispatch<I, T, L>(
    session: &mut Session,
    ctx: &mut SignerContext<'_, I, T, L>,
    request: &Frame,
) -> Frame
where
    I: IdentityProvider,
    T: TouchSensor,
    L: StatusLed,
{
    let header = request.header();
    session.set_status_color(LedColor::OFF);

    let Some(command) = Command::from_u8(request.code()) else {
        warn!(code = request.code(), "unknown command");
        return Frame::response(&header, ResponseCode::UnknownCommand);
    };

    debug!(?command, len = ?header.len, "dispatching");

    let mut response = Frame::response(&header, command.response_code());
    let result = match command {
        Command::GetPublicKey => {
            let key = ctx.identity.public_key();
            response.body_mut()[..key.len()].copy_from_slice(key);
            Ok(())
        },
        Command::SetMessageSize => set_message_size(session, request, &mut response),
        Command::SignData => sign_data(session, ctx, request, &mut response),
        Command::GetSignature => get_signature(session, &mut response),
        Command::GetNameVersion => {
            // a malformed request still gets a reply, with an all-zero body
            if header.len == command.request_len() {
                let wire = ctx.config.name_version.to_wire();
                response.body_mut()[..wire.len()].copy_from_slice(&wire);
            }
            Ok(())
        },
    };

    if let Err(error) = result {
        warn!(?command, kind = ?error.kind(), %error, "request rejected");
    }
    response
}

fn require_len(request: &Frame, expected: LengthClass) -> Result<(), RequestError> {
    let actual = request.header().len;
    if actual == expected {
        Ok(())
    } else {
        Err(RequestError::WrongLength { expected, actual })
    }
}

fn set_status(response: &mut Frame, result: Result<(), RequestError>) -> Result<(), RequestError> {
    let status = if result.is_ok() { Status::Ok } else { Status::Bad };
    response.body_mut()[0] = status.to_u8();
    result
}

fn set_message_size(
    session: &mut Session,
    request: &Frame,
    response: &mut Frame,
) -> Result<(), RequestError> {
    let result = require_len(request, Command::SetMessageSize.request_len()).and_then(|()| {
        let mut size = [0u8; 4];
        size.copy_from_slice(&request.body()[..4]);
        session.begin(u32::from_le_bytes(size))
    });

    if result.is_ok() {
        session.set_status_color(LedColor::GREEN);
    }
    set_status(response, result)
}

fn sign_data<I, T, L>(
    session: &mut Session,
    ctx: &mut SignerContext<'_, I, T, L>,
    request: &Frame,
    response: &mut Frame,
) -> Result<(), RequestError>
where
    I: IdentityProvider,
    T: TouchSensor,
    L: StatusLed,
{
    let result = require_len(request, Command::SignData.request_len())
        .and_then(|()| session.load(request.body()))
        .and_then(|progress| match progress {
            LoadProgress::Pending { remaining } => {
                debug!(remaining, "chunk loaded");
                Ok(())
            },
            LoadProgress::Complete => {
                let size = session.expected_size();
                let confirmed =
                    ctx.gate.await_presence(ctx.config.presence_policy, ctx.config.touch_flash);
                session.complete(confirmed, ctx.identity)?;
                info!(size, "message signed");
                Ok(())
            },
        });

    if result.is_ok() {
        session.set_status_color(LedColor::GREEN);
    }
    set_status(response, result)
}

fn get_signature(session: &mut Session, response: &mut Frame) -> Result<(), RequestError> {
    match session.signature() {
        Some(signature) => {
            response.body_mut()[..signature.len()].copy_from_slice(signature);
            session.set_status_color(LedColor::GREEN);
            Ok(())
        },
        None => set_status(response, Err(RequestError::NoSignature)),
    }
}
