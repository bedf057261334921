//! Emulated touch sensor and status LED.

use std::{
    io::{self, BufRead},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use mkdf_signer::{LedColor, StatusLed, TouchSensor};
use tracing::{debug, info, warn};

const TOUCH_POLL: Duration = Duration::from_millis(1);

/// Touch sensor driven by the operator's terminal.
#[derive(Debug, Clone)]
pub enum Touch {
    /// Every line on stdin latches a touch event
    Stdin {
        /// Set by the stdin reader thread
        latched: Arc<AtomicBool>,
        /// Whether the operator was told to confirm since the last event
        prompted: bool,
    },
    /// Always touched
    Auto,
}

impl Touch {
    /// Latch a touch for every line read from stdin.
    ///
    /// Spawns a reader thread that lives as long as stdin stays open.
    pub fn stdin() -> Self {
        let latched = Arc::new(AtomicBool::new(false));
        let writer = Arc::clone(&latched);
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                if let Err(e) = line {
                    warn!(error = %e, "stdin closed");
                    break;
                }
                writer.store(true, Ordering::SeqCst);
            }
        });
        Self::Stdin { latched, prompted: false }
    }
}

impl TouchSensor for Touch {
    fn touched(&mut self) -> bool {
        match self {
            Self::Stdin { latched, prompted } => {
                if !*prompted {
                    info!("touch requested: press enter to confirm");
                    *prompted = true;
                }
                thread::sleep(TOUCH_POLL);
                latched.load(Ordering::SeqCst)
            },
            Self::Auto => true,
        }
    }

    fn acknowledge(&mut self) {
        if let Self::Stdin { latched, prompted } = self {
            latched.store(false, Ordering::SeqCst);
            *prompted = false;
        }
    }
}

/// LED whose changes go to the log.
#[derive(Debug, Default)]
pub struct LogLed {
    current: LedColor,
}

impl StatusLed for LogLed {
    fn set(&mut self, color: LedColor) {
        if color != self.current {
            self.current = color;
            debug!(?color, "led");
        }
    }
}
