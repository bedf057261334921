//! Scripted touch sensor, recording LED and counting identity.
//!
//! Each keeps its counters behind an `Arc` so a test can hand the peripheral
//! to a device (possibly on another thread) and still observe it.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use mkdf_signer::{
    DeviceSecret, Identity, IdentityProvider, LedColor, PublicKey, Signature, StatusLed,
    TouchSensor,
};

/// Counters shared with a [`ScriptedTouch`].
#[derive(Debug, Default)]
pub struct TouchStats {
    polls: AtomicUsize,
    confirmations: AtomicUsize,
    acknowledgements: AtomicUsize,
}

impl TouchStats {
    /// Sensor reads
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Reads that reported a touch
    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }

    /// Acknowledge calls
    pub fn acknowledgements(&self) -> usize {
        self.acknowledgements.load(Ordering::SeqCst)
    }
}

/// Touch sensor that reports a touch a fixed number of polls after each
/// acknowledge.
#[derive(Debug, Clone)]
pub struct ScriptedTouch {
    after: usize,
    since_ack: usize,
    latched: bool,
    stats: Arc<TouchStats>,
}

impl ScriptedTouch {
    /// Touch on the `polls`-th read after each acknowledge (at least one).
    pub fn after(polls: usize) -> Self {
        Self { after: polls.max(1), since_ack: 0, latched: false, stats: Arc::default() }
    }

    /// Start with a stray event already latched.
    #[must_use]
    pub fn with_stray_event(mut self) -> Self {
        self.latched = true;
        self
    }

    /// Shared counters
    pub fn stats(&self) -> Arc<TouchStats> {
        Arc::clone(&self.stats)
    }
}

impl TouchSensor for ScriptedTouch {
    fn touched(&mut self) -> bool {
        self.stats.polls.fetch_add(1, Ordering::SeqCst);
        self.since_ack += 1;
        if self.since_ack >= self.after {
            self.latched = true;
        }
        if self.latched {
            self.stats.confirmations.fetch_add(1, Ordering::SeqCst);
        }
        self.latched
    }

    fn acknowledge(&mut self) {
        self.stats.acknowledgements.fetch_add(1, Ordering::SeqCst);
        self.latched = false;
        self.since_ack = 0;
    }
}

/// LED that records every colour it is driven to.
#[derive(Debug, Clone, Default)]
pub struct RecordingLed {
    history: Arc<Mutex<Vec<LedColor>>>,
}

impl RecordingLed {
    /// Colours set so far, oldest first
    pub fn history(&self) -> Vec<LedColor> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Most recent colour, `OFF` if never set
    pub fn current(&self) -> LedColor {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
            .unwrap_or(LedColor::OFF)
    }
}

impl StatusLed for RecordingLed {
    fn set(&mut self, color: LedColor) {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).push(color);
    }
}

/// Real identity that counts signing operations.
#[derive(Debug)]
pub struct CountingIdentity {
    inner: Identity,
    signs: Arc<AtomicUsize>,
}

impl CountingIdentity {
    /// Derive from `secret`.
    pub fn new(secret: DeviceSecret) -> Self {
        Self { inner: Identity::new(secret), signs: Arc::default() }
    }

    /// Shared signing counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.signs)
    }
}

impl IdentityProvider for CountingIdentity {
    fn public_key(&self) -> &PublicKey {
        self.inner.public_key()
    }

    fn sign(&self, message: &[u8]) -> Signature {
        self.signs.fetch_add(1, Ordering::SeqCst);
        self.inner.sign(message)
    }
}
