//! Signing session state machine.
//!
//! A session runs from an accepted `SetMessageSize` until the loaded message
//! is signed, or until another `SetMessageSize` supersedes it.
//!
//! ```text
//!  Idle / Signed ── begin(n > 0) ──▶ Loading ── load (last) + complete ──▶ Signed
//!        ▲                            │  ▲
//!        └──────── begin(0) ──────────┘  └── load (not last)
//! ```
//!
//! # Invariants
//!
//! - While loading, `message.len() + remaining == expected_size`.
//! - A signature is only exposed for the most recently completed session;
//!   `begin` discards it before anything else.
//! - [`Session::complete`] demands a [`Confirmed`] token, so no signature is
//!   produced without a touch.

use mkdf_proto::{MAX_MESSAGE_SIZE, SIGNATURE_LEN};
use tracing::debug;

use crate::{
    buffer::MessageBuffer,
    error::RequestError,
    hal::LedColor,
    identity::{IdentityProvider, Signature},
    presence::Confirmed,
};

/// Observable phase of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session open and no signature available
    Idle,
    /// Message size accepted, data still being loaded or awaiting touch
    Loading,
    /// Last session completed; its signature can be read
    Signed,
}

/// Result of loading one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    /// More data expected
    Pending {
        /// Bytes still expected
        remaining: u32,
    },
    /// Whole message loaded; ready for [`Session::complete`]
    Complete,
}

/// State of the single signing session.
#[derive(Debug, Clone)]
pub struct Session {
    expected_size: u32,
    remaining: u32,
    message: MessageBuffer,
    signature: Signature,
    signature_ready: bool,
    status_color: LedColor,
}

impl Session {
    /// Idle session with no signature.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expected_size: 0,
            remaining: 0,
            message: MessageBuffer::new(),
            signature: [0; SIGNATURE_LEN],
            signature_ready: false,
            status_color: LedColor::OFF,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        if self.expected_size != 0 {
            SessionPhase::Loading
        } else if self.signature_ready {
            SessionPhase::Signed
        } else {
            SessionPhase::Idle
        }
    }

    /// Start a session for a `size`-byte message.
    ///
    /// Any open session and any unread signature are discarded first, even
    /// when `size` is rejected. A size of zero is accepted but opens no
    /// session.
    ///
    /// # Errors
    ///
    /// - `RequestError::TooLarge` if `size` exceeds the message buffer.
    pub fn begin(&mut self, size: u32) -> Result<(), RequestError> {
        self.reset();

        if size as usize > MAX_MESSAGE_SIZE {
            return Err(RequestError::TooLarge { size, max: MAX_MESSAGE_SIZE });
        }

        self.expected_size = size;
        self.remaining = size;
        debug!(size, "session started");
        Ok(())
    }

    /// Append the next chunk of message data.
    ///
    /// Only the first `remaining` bytes of `chunk` are used; a final chunk
    /// padded to the frame size is fine.
    ///
    /// # Errors
    ///
    /// - `RequestError::NoSession` if no session is open.
    /// - `RequestError::Buffer` if the buffer rejects the data, which the
    ///   size check in [`begin`](Self::begin) rules out.
    pub fn load(&mut self, chunk: &[u8]) -> Result<LoadProgress, RequestError> {
        if self.expected_size == 0 {
            return Err(RequestError::NoSession);
        }

        let take = chunk.len().min(self.remaining as usize);
        self.message.append(&chunk[..take])?;
        // take <= remaining, which is a u32
        self.remaining -= take as u32;

        if self.remaining == 0 {
            Ok(LoadProgress::Complete)
        } else {
            Ok(LoadProgress::Pending { remaining: self.remaining })
        }
    }

    /// Sign the loaded message and close the session.
    ///
    /// The message buffer is wiped once signed.
    ///
    /// # Errors
    ///
    /// - `RequestError::NoSession` if no session is open.
    /// - `RequestError::Incomplete` if message data is still outstanding.
    pub fn complete<I: IdentityProvider>(
        &mut self,
        _confirmed: Confirmed,
        identity: &I,
    ) -> Result<&Signature, RequestError> {
        if self.expected_size == 0 {
            return Err(RequestError::NoSession);
        }
        if self.remaining != 0 {
            return Err(RequestError::Incomplete { remaining: self.remaining });
        }

        self.signature = identity.sign(self.message.as_slice());
        self.signature_ready = true;
        self.message.clear();
        self.expected_size = 0;
        Ok(&self.signature)
    }

    /// Signature of the last completed session, if still valid.
    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.signature_ready.then_some(&self.signature)
    }

    /// Message bytes loaded so far in the open session
    #[must_use]
    pub fn message(&self) -> &[u8] {
        self.message.as_slice()
    }

    /// Declared size of the open session, zero if none
    #[must_use]
    pub const fn expected_size(&self) -> u32 {
        self.expected_size
    }

    /// Bytes still expected in the open session
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Steady LED colour shown between commands
    #[must_use]
    pub const fn status_color(&self) -> LedColor {
        self.status_color
    }

    /// Set the steady LED colour.
    pub fn set_status_color(&mut self, color: LedColor) {
        self.status_color = color;
    }

    fn reset(&mut self) {
        self.expected_size = 0;
        self.remaining = 0;
        self.message.clear();
        self.signature = [0; SIGNATURE_LEN];
        self.signature_ready = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
