//! Threaded device simulation and seeded test data.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use mkdf_client::SignerClient;
use mkdf_signer::{Device, DeviceError, DeviceSecret, SessionPhase, SignerConfig};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{
    link::{HostLink, LinkClosed, duplex},
    peripherals::{CountingIdentity, RecordingLed, ScriptedTouch, TouchStats},
};

/// Deterministic device secret for `seed`.
pub fn seeded_secret(seed: u64) -> DeviceSecret {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    DeviceSecret::new(bytes)
}

/// Deterministic message of `len` bytes for `seed`.
pub fn seeded_message(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.r#gen::<u8>()).collect()
}

/// State of a simulated device after its host went away.
#[derive(Debug)]
pub struct SimReport {
    /// Session phase when the loop ended
    pub phase: SessionPhase,
    /// Why the loop ended
    pub error: DeviceError<LinkClosed>,
}

/// The real device loop on a background thread, attached to an in-memory
/// link.
///
/// The loop ends when the host end of the link is dropped; [`finish`]
/// does that and collects the result.
///
/// [`finish`]: SimDevice::finish
#[derive(Debug)]
pub struct SimDevice {
    handle: JoinHandle<SimReport>,
    touches: Arc<TouchStats>,
    signs: Arc<AtomicUsize>,
    led: RecordingLed,
}

impl SimDevice {
    /// Start a device for `secret` whose touch sensor fires promptly.
    pub fn spawn(secret: DeviceSecret) -> (Self, SignerClient<HostLink>) {
        Self::spawn_with(SignerConfig::default(), secret, ScriptedTouch::after(3))
    }

    /// Start a device with explicit configuration and touch behaviour.
    pub fn spawn_with(
        config: SignerConfig,
        secret: DeviceSecret,
        touch: ScriptedTouch,
    ) -> (Self, SignerClient<HostLink>) {
        let (device_link, host_link) = duplex();
        let identity = CountingIdentity::new(secret);
        let signs = identity.counter();
        let touches = touch.stats();
        let led = RecordingLed::default();

        let mut device =
            Device::with_identity(config, identity, device_link, touch, led.clone());
        let handle = thread::spawn(move || {
            let error = match device.run() {
                Err(error) => error,
                Ok(never) => match never {},
            };
            debug!(%error, "simulated device stopped");
            SimReport { phase: device.session().phase(), error }
        });

        (Self { handle, touches, signs, led }, SignerClient::new(host_link))
    }

    /// Touch sensor counters
    pub fn touches(&self) -> &TouchStats {
        &self.touches
    }

    /// Signing operations performed
    pub fn signs(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }

    /// The device LED
    pub fn led(&self) -> &RecordingLed {
        &self.led
    }

    /// Disconnect `client` and wait for the device loop to stop.
    pub fn finish(self, client: SignerClient<HostLink>) -> thread::Result<SimReport> {
        drop(client.into_inner());
        self.handle.join()
    }
}
