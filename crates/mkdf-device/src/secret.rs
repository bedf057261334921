//! Device secret provisioning for the emulator.

use mkdf_signer::{DeviceSecret, identity::SECRET_LEN};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Domain separator for passphrase-derived secrets
const SEED_CONTEXT: &[u8] = b"mkdf-device secret v1";

/// Where the secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// 64 hex characters
    Hex(String),
    /// Passphrase hashed into the secret
    Seed(String),
    /// Fresh random secret, different on every start
    Random,
}

/// Secret provisioning errors.
#[derive(Error, Debug)]
pub enum SecretError {
    /// Not valid hex
    #[error("secret is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Wrong number of bytes
    #[error("secret must be {expected} bytes, got {actual}")]
    Length {
        /// Required length
        expected: usize,
        /// Decoded length
        actual: usize,
    },
}

/// Produce the device secret from `source`.
pub fn provision(source: &SecretSource) -> Result<DeviceSecret, SecretError> {
    match source {
        SecretSource::Hex(text) => {
            let bytes = hex::decode(text.trim())?;
            let actual = bytes.len();
            let bytes: [u8; SECRET_LEN] = bytes
                .try_into()
                .map_err(|_| SecretError::Length { expected: SECRET_LEN, actual })?;
            Ok(DeviceSecret::new(bytes))
        },
        SecretSource::Seed(phrase) => {
            let digest = Sha256::new()
                .chain_update(SEED_CONTEXT)
                .chain_update(phrase.as_bytes())
                .finalize();
            Ok(DeviceSecret::new(digest.into()))
        },
        SecretSource::Random => {
            let mut bytes = [0u8; SECRET_LEN];
            OsRng.fill_bytes(&mut bytes);
            Ok(DeviceSecret::new(bytes))
        },
    }
}
