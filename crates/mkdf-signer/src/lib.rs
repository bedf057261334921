//! mkdf signer core logic
//!
//! The resident application of the device: it derives an Ed25519 identity
//! from the device secret, answers framed commands, and signs a loaded
//! message only after the operator touches the device.
//!
//! # Architecture
//!
//! All hardware access goes through the traits in [`hal`]: a byte transport,
//! a touch sensor and a status LED. The protocol logic never touches
//! registers directly, so the same code runs on the device, in the emulator
//! and under test with scripted peripherals.
//!
//! There is exactly one [`Session`], owned by the [`Device`] run loop and
//! handed to [`dispatch()`] by exclusive reference. Nothing else mutates it.
//! The crate is `no_std` and never allocates.
//!
//! # Components
//!
//! - [`hal`]: Peripheral traits (transport, touch sensor, LED)
//! - [`config`]: Device configuration
//! - [`identity`]: Device secret and Ed25519 identity
//! - [`presence`]: Touch confirmation gate
//! - [`buffer`]: Bounds-checked message buffer
//! - [`session`]: Signing session state machine
//! - [`dispatch`](mod@dispatch): Command dispatcher
//! - [`device`]: Run loop
//! - [`error`]: Error types
#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod hal;
pub mod identity;
pub mod presence;
pub mod session;

pub use buffer::MessageBuffer;
pub use config::{FlashPattern, SignerConfig};
pub use device::{Device, Outcome};
pub use dispatch::{SignerContext, dispatch};
pub use error::{BufferError, DeviceError, ErrorKind, IdentityError, RequestError};
pub use hal::{ByteTransport, LedColor, StatusLed, TouchSensor};
pub use identity::{DeviceSecret, Identity, IdentityProvider, PublicKey, Signature};
pub use presence::{Confirmed, Heartbeat, PresenceGate, PresencePolicy};
pub use session::{LoadProgress, Session, SessionPhase};
