//! Device identity.
//!
//! The device secret (CDI) is the only entropy behind the keypair. It is
//! used as an Ed25519 seed: the public key and every signature are
//! deterministic functions of it. The secret is read once at start of day,
//! never transmitted, and wiped when the identity is dropped.

use core::fmt;

use ed25519_dalek::{Signer, SigningKey};
use mkdf_proto::{PUBLIC_KEY_LEN, SIGNATURE_LEN};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::IdentityError;

/// Length of the device secret in bytes
pub const SECRET_LEN: usize = 32;

/// Ed25519 public key
pub type PublicKey = [u8; PUBLIC_KEY_LEN];

/// Ed25519 signature
pub type Signature = [u8; SIGNATURE_LEN];

/// Device-unique secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeviceSecret([u8; SECRET_LEN]);

impl DeviceSecret {
    /// Wrap raw secret bytes.
    #[must_use]
    pub const fn new(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Assemble the secret from the eight 32-bit words the hardware exposes.
    ///
    /// The secret register only allows word-aligned reads; words are laid
    /// out little-endian, lowest address first.
    #[must_use]
    pub fn from_words(words: [u32; SECRET_LEN / 4]) -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Self(bytes)
    }

    fn expose(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for DeviceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceSecret(..)")
    }
}

/// Derive the public key for `secret`.
#[must_use]
pub fn derive_public_key(secret: &DeviceSecret) -> PublicKey {
    SigningKey::from_bytes(secret.expose()).verifying_key().to_bytes()
}

/// Sign `message` with the keypair (`secret`, `public_key`).
///
/// Deterministic for identical inputs. Fails only if `public_key` does not
/// belong to `secret`, which would otherwise yield an unverifiable
/// signature.
pub fn sign(
    secret: &DeviceSecret,
    public_key: &PublicKey,
    message: &[u8],
) -> Result<Signature, IdentityError> {
    let mut keypair = [0u8; SECRET_LEN + PUBLIC_KEY_LEN];
    keypair[..SECRET_LEN].copy_from_slice(secret.expose());
    keypair[SECRET_LEN..].copy_from_slice(public_key);

    let key = SigningKey::from_keypair_bytes(&keypair);
    keypair.zeroize();

    Ok(key.map_err(|_| IdentityError::KeyMismatch)?.sign(message).to_bytes())
}

/// Source of the public key and of signatures.
///
/// The dispatcher only ever signs through this trait, which lets tests count
/// and observe signing operations.
pub trait IdentityProvider {
    /// Public key of the device identity
    fn public_key(&self) -> &PublicKey;

    /// Sign `message`. Must not retain `message` beyond the call.
    fn sign(&self, message: &[u8]) -> Signature;
}

/// Ed25519 identity derived from the device secret at start of day.
pub struct Identity {
    key: SigningKey,
    public_key: PublicKey,
}

impl Identity {
    /// Derive the identity. The secret is consumed and wiped.
    #[must_use]
    pub fn new(secret: DeviceSecret) -> Self {
        let public_key = derive_public_key(&secret);
        let key = SigningKey::from_bytes(secret.expose());
        Self { key, public_key }
    }
}

impl IdentityProvider for Identity {
    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn sign(&self, message: &[u8]) -> Signature {
        self.key.sign(message).to_bytes()
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn public_key(&self) -> &PublicKey {
        (**self).public_key()
    }

    fn sign(&self, message: &[u8]) -> Signature {
        (**self).sign(message)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity").field("public_key", &self.public_key).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Verifier, VerifyingKey};
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    // RFC 8032, section 7.1, TEST 1
    const RFC_SECRET: [u8; 32] =
        hex!("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60");
    const RFC_PUBLIC: [u8; 32] =
        hex!("d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a");
    const RFC_SIGNATURE: [u8; 64] = hex!(
        "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
    );

    #[test]
    fn rfc8032_vector() {
        let secret = DeviceSecret::new(RFC_SECRET);
        assert_eq!(derive_public_key(&secret), RFC_PUBLIC);
        assert_eq!(sign(&secret, &RFC_PUBLIC, b"").unwrap(), RFC_SIGNATURE);

        let identity = Identity::new(secret);
        assert_eq!(identity.public_key(), &RFC_PUBLIC);
        assert_eq!(identity.sign(b""), RFC_SIGNATURE);
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let secret = DeviceSecret::new(RFC_SECRET);
        let other = derive_public_key(&DeviceSecret::new([7u8; 32]));
        assert_eq!(sign(&secret, &other, b"msg"), Err(IdentityError::KeyMismatch));
    }

    #[test]
    fn secret_words_are_little_endian() {
        let mut words = [0u32; 8];
        words[0] = 0x0403_0201;
        words[7] = 0xddcc_bbaa;
        let secret = DeviceSecret::from_words(words);
        assert_eq!(&secret.expose()[..4], &[1, 2, 3, 4]);
        assert_eq!(&secret.expose()[28..], &[0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let secret = DeviceSecret::new([0x42; 32]);
        assert_eq!(format!("{secret:?}"), "DeviceSecret(..)");
    }

    proptest! {
        #[test]
        fn identity_agrees_with_free_functions(
            seed in any::<[u8; 32]>(),
            message in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let secret = DeviceSecret::new(seed);
            let public_key = derive_public_key(&secret);
            let expected = sign(&secret, &public_key, &message).unwrap();

            let identity = Identity::new(secret);
            let signature = identity.sign(&message);
            prop_assert_eq!(signature, expected);

            let verifying = VerifyingKey::from_bytes(&public_key).unwrap();
            let signature = ed25519_dalek::Signature::from_bytes(&signature);
            prop_assert!(verifying.verify(&message, &signature).is_ok());
        }
    }
}
