//! Device configuration.

use mkdf_proto::{Endpoint, NameVersion};

use crate::{hal::LedColor, presence::PresencePolicy};

/// LED flashing pattern shown while the device blocks on something.
///
/// The LED alternates between `color` and off, switching every
/// `poll_count` polls of whatever the device is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPattern {
    /// Colour of the lit phase
    pub color: LedColor,
    /// Polls per phase
    pub poll_count: u32,
}

impl FlashPattern {
    /// Waiting for a command
    pub const IDLE: Self = Self { color: LedColor::BLUE, poll_count: 700_000 };

    /// Waiting for the operator to touch the device
    pub const TOUCH: Self = Self { color: LedColor::GREEN, poll_count: 200_000 };
}

/// Signer configuration
#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// Endpoint this application answers on
    pub endpoint: Endpoint,
    /// Pattern while waiting for a header byte
    pub idle_flash: FlashPattern,
    /// Pattern while waiting for touch confirmation
    pub touch_flash: FlashPattern,
    /// How long to wait for touch confirmation
    pub presence_policy: PresencePolicy,
    /// Reported by `GetNameVersion`
    pub name_version: NameVersion,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Software,
            idle_flash: FlashPattern::IDLE,
            touch_flash: FlashPattern::TOUCH,
            presence_policy: PresencePolicy::default(),
            name_version: NameVersion::SIGNER,
        }
    }
}
