//! `mkdf-sign`: sign a file with a connected mkdf signer.
//!
//! Connects to the device (or the `mkdf-device` emulator) over TCP, prints
//! the application name, version and public key, then signs the file and
//! verifies the signature locally before printing it.

use std::{
    fs,
    io::{self, Write},
    net::TcpStream,
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use mkdf_client::{ClientError, SignerClient};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Sign a file with the mkdf signer
#[derive(Parser, Debug)]
#[command(name = "mkdf-sign", version, about)]
struct Args {
    /// Device address
    #[arg(short, long, default_value = "127.0.0.1:7878", env = "MKDF_ADDR")]
    addr: String,

    /// File to sign
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Write the raw 64-byte signature here
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum SignError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("device returned an invalid public key")]
    BadPublicKey,

    #[error("signature does not verify under the device public key")]
    Verification,
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
            error!(error = %e, "signing failed");
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<(), SignError> {
    let message = fs::read(&args.file)
        .map_err(|source| SignError::Read { path: args.file.clone(), source })?;

    info!(addr = %args.addr, "connecting");
    let stream = TcpStream::connect(&args.addr)?;
    stream.set_nodelay(true)?;
    let mut client = SignerClient::new(stream);

    let mut out = io::stdout().lock();

    let name_version = client.get_name_version()?;
    writeln!(out, "app: {name_version}")?;

    let public_key = client.get_public_key()?;
    writeln!(out, "public key: {}", hex::encode(public_key))?;

    info!(bytes = message.len(), "signing; touch the device to confirm");
    let signature = client.sign(&message)?;

    let verifying = VerifyingKey::from_bytes(&public_key).map_err(|_| SignError::BadPublicKey)?;
    verifying
        .verify(&message, &Signature::from_bytes(&signature))
        .map_err(|_| SignError::Verification)?;
    writeln!(out, "signature: {}", hex::encode(signature))?;

    if let Some(path) = &args.output {
        fs::write(path, signature)?;
        info!(path = %path.display(), "signature written");
    }
    Ok(())
}
