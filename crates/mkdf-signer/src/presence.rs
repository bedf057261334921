//! Touch confirmation gate.
//!
//! Signing requires a physical touch after the complete message is loaded.
//! The gate blocks until the operator touches the device, flashing the LED so
//! they can see it is waiting. There is no timeout and no way to cancel: a
//! device nobody touches never signs, at the cost of hanging until someone
//! does.
//!
//! The gate hands out a [`Confirmed`] token, which is the only way to obtain
//! one. [`Session::complete`](crate::Session::complete) demands it, so a signature
//! without a touch cannot be produced through the session API.

use tracing::debug;

use crate::{
    config::FlashPattern,
    hal::{LedColor, StatusLed, TouchSensor},
};

/// How long the gate waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresencePolicy {
    /// Block until touched, however long that takes
    #[default]
    Indefinite,
}

/// Proof that the operator touched the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a confirmation is only useful when passed on to the signing step"]
pub struct Confirmed {
    _private: (),
}

/// Flashing LED driven by a poll loop.
///
/// Call [`tick`](Self::tick) once per poll. The LED starts dark and toggles
/// between dark and `pattern.color` every `pattern.poll_count` ticks.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    pattern: FlashPattern,
    polls: u32,
    lit: bool,
}

impl Heartbeat {
    /// Start a heartbeat in the dark phase.
    #[must_use]
    pub const fn new(pattern: FlashPattern) -> Self {
        Self { pattern, polls: 0, lit: false }
    }

    /// Advance one poll, driving the LED at each phase start.
    pub fn tick<L: StatusLed>(&mut self, led: &mut L) {
        if self.polls == 0 {
            led.set(if self.lit { self.pattern.color } else { LedColor::OFF });
        }

        self.polls += 1;
        if self.polls >= self.pattern.poll_count.max(1) {
            self.polls = 0;
            self.lit = !self.lit;
        }
    }
}

/// Touch sensor plus the LED it flashes while waiting.
#[derive(Debug)]
pub struct PresenceGate<T, L> {
    touch: T,
    led: L,
}

impl<T: TouchSensor, L: StatusLed> PresenceGate<T, L> {
    /// Create a gate over the given peripherals.
    pub const fn new(touch: T, led: L) -> Self {
        Self { touch, led }
    }

    /// Block until the operator touches the device.
    ///
    /// Any event latched before the call is discarded first, so only a touch
    /// made while the LED is flashing counts. The detected event is
    /// acknowledged once before returning.
    pub fn await_presence(&mut self, policy: PresencePolicy, pattern: FlashPattern) -> Confirmed {
        match policy {
            PresencePolicy::Indefinite => {},
        }

        self.touch.acknowledge();
        debug!("waiting for touch");

        let mut heartbeat = Heartbeat::new(pattern);
        loop {
            heartbeat.tick(&mut self.led);
            if self.touch.touched() {
                self.touch.acknowledge();
                debug!("touch confirmed");
                return Confirmed { _private: () };
            }
        }
    }

    /// The status LED, for callers that drive it between waits
    pub fn led_mut(&mut self) -> &mut L {
        &mut self.led
    }

    /// Split back into the touch sensor and LED.
    pub fn into_parts(self) -> (T, L) {
        (self.touch, self.led)
    }
}
