//! Simulation harness for the mkdf signer.
//!
//! Scripted stand-ins for the device peripherals, an in-memory host link, a
//! reference model of the command protocol, and a [`SimDevice`] that runs the
//! real device loop on a thread so tests can drive it with the real
//! [`SignerClient`](mkdf_client::SignerClient).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod link;
pub mod model;
pub mod peripherals;
pub mod script;
pub mod sim;

pub use link::{DeviceLink, HostLink, LinkClosed, duplex};
pub use model::{ModelSigner, Operation, WireLen};
pub use peripherals::{CountingIdentity, RecordingLed, ScriptedTouch, TouchStats};
pub use script::{ScriptExhausted, ScriptTransport};
pub use sim::{SimDevice, SimReport, seeded_message, seeded_secret};
