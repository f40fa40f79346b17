//! X25519 key agreement and HKDF-SHA256 key derivation.
//!
//! Static pairs identify long-lived endpoints; ephemeral pairs are
//! single-use and consumed by the Diffie-Hellman operation, which is what
//! gives [`crate::crypto::envelope::encrypt_for_recipient`] forward secrecy.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{AttestError, Result};

/// Domain-separation string for point-to-point message keys.
pub const MESSAGING_INFO: &str = "agentic-attest/messaging/v1";

/// An X25519 static key pair for Diffie-Hellman key exchange.
pub struct ExchangeKeyPair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl ExchangeKeyPair {
    /// Generate a new random X25519 key pair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(rand::thread_rng());
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct from secret key bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Perform Diffie-Hellman key exchange with a peer's public key.
    ///
    /// Symmetric: `dh(A.secret, B.public) == dh(B.secret, A.public)`.
    pub fn diffie_hellman(&self, peer_public: &X25519PublicKey) -> [u8; 32] {
        *self.secret.diffie_hellman(peer_public).as_bytes()
    }

    /// Return the public key.
    pub fn public_key(&self) -> &X25519PublicKey {
        &self.public
    }

    /// Return the public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }
}

/// Generate an ephemeral X25519 key pair for one-time use. The secret is
/// consumed by its single `diffie_hellman` call and cannot be persisted.
pub fn ephemeral_exchange() -> (EphemeralSecret, X25519PublicKey) {
    let secret = EphemeralSecret::random_from_rng(rand::thread_rng());
    let public = X25519PublicKey::from(&secret);
    (secret, public)
}

/// Derive a 32-byte symmetric encryption key from a shared secret and a
/// domain-separation string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the shared secret as IKM and `info`
/// as the expansion context; distinct `info` values yield independent keys.
pub fn derive_encryption_key(shared_secret: &[u8; 32], info: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut output = [0u8; 32];
    hk.expand(info.as_bytes(), &mut output)
        .map_err(|e| AttestError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}
