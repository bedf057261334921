//! `mkdf-device`: run the signer application against a TCP socket.
//!
//! Stands in for the hardware during development. The host link is a TCP
//! connection, touch confirmation is a line typed on stdin (or automatic),
//! and LED changes are logged. One connection is served at a time; the
//! identity is derived once at start and survives reconnects, while each
//! connection starts with a fresh session.

mod peripherals;
mod secret;
mod transport;

use std::{
    io,
    net::{TcpListener, TcpStream},
    process::ExitCode,
};

use clap::Parser;
use mkdf_signer::{
    Device, DeviceError, FlashPattern, Identity, IdentityProvider, LedColor, SignerConfig,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    peripherals::{LogLed, Touch},
    secret::{SecretSource, provision},
    transport::TcpTransport,
};

/// Polls are 1 ms apart in the emulator, so these give roughly the
/// device's flash rates.
const IDLE_FLASH: FlashPattern = FlashPattern { color: LedColor::BLUE, poll_count: 700 };
const TOUCH_FLASH: FlashPattern = FlashPattern { color: LedColor::GREEN, poll_count: 200 };

/// Emulated mkdf signer
#[derive(Parser, Debug)]
#[command(name = "mkdf-device", version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Device secret as 64 hex characters
    #[arg(long, env = "MKDF_CDI", conflicts_with = "seed", hide_env_values = true)]
    secret: Option<String>,

    /// Derive the device secret from a passphrase
    #[arg(long)]
    seed: Option<String>,

    /// Confirm every signing request without waiting for stdin
    #[arg(long)]
    auto_touch: bool,
}

impl Args {
    fn secret_source(&self) -> SecretSource {
        match (&self.secret, &self.seed) {
            (Some(text), _) => SecretSource::Hex(text.clone()),
            (None, Some(phrase)) => SecretSource::Seed(phrase.clone()),
            (None, None) => SecretSource::Random,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "device failed");
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = args.secret_source();
    if source == SecretSource::Random {
        warn!("no secret configured; using a random identity for this run");
    }
    let identity = Identity::new(provision(&source)?);
    info!(public_key = %hex::encode(identity.public_key()), "identity ready");

    let config = SignerConfig {
        idle_flash: IDLE_FLASH,
        touch_flash: TOUCH_FLASH,
        ..SignerConfig::default()
    };
    let mut touch = if args.auto_touch { Touch::Auto } else { Touch::stdin() };
    let mut led = LogLed::default();

    let listener = TcpListener::bind(&args.listen)?;
    info!(addr = %listener.local_addr()?, "listening");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            },
        };
        if let Err(e) = serve(stream, &config, &identity, &mut touch, &mut led) {
            warn!(error = %e, "connection failed");
        }
    }
    Ok(())
}

/// Serve one host connection until it closes.
///
/// A clean disconnect is `Ok`; setup failures and link errors are returned
/// so the caller can move on to the next connection.
fn serve(
    stream: TcpStream,
    config: &SignerConfig,
    identity: &Identity,
    touch: &mut Touch,
    led: &mut LogLed,
) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    info!(%peer, "host connected");

    let transport = TcpTransport::new(stream)?;
    let mut device = Device::with_identity(config.clone(), identity, transport, touch, led);
    match device.run() {
        Err(DeviceError::Transport(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            info!(%peer, "host disconnected");
            Ok(())
        },
        Err(DeviceError::Transport(e)) => Err(e),
        Ok(never) => match never {},
    }
}
