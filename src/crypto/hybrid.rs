//! Hybrid classical / post-quantum signing keys.
//!
//! Every keypair carries an explicit [`KeyScheme`] tag fixed at generation;
//! dispatch never sniffs buffer lengths. A hybrid key signs a message
//! independently under Ed25519 and ML-DSA-65, and verification requires
//! both sub-signatures, so forging one demands breaking both primitives.
//!
//! Wire formats:
//! - keys: hex of the byte concatenation at fixed offsets, classical first
//! - hybrid signature: two little-endian u16 lengths, then the classical
//!   signature, then the post-quantum signature

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use pqcrypto_mldsa::mldsa65;
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{AttestError, Result};

/// Ed25519 public / private key length in bytes.
pub const CLASSICAL_KEY_LEN: usize = 32;

/// Ed25519 signature length in bytes.
pub const CLASSICAL_SIG_LEN: usize = 64;

/// ML-DSA-65 public key length in bytes.
pub fn post_quantum_public_len() -> usize {
    mldsa65::public_key_bytes()
}

/// ML-DSA-65 secret key length in bytes.
pub fn post_quantum_secret_len() -> usize {
    mldsa65::secret_key_bytes()
}

/// Which signature primitives a key was created with.
///
/// The tag is assigned once at generation and carried through every
/// operation; it is never re-derived from key or signature lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyScheme {
    /// Ed25519 only.
    Classical,
    /// Ed25519 + ML-DSA-65. Both signatures are required to verify.
    Hybrid,
}

impl KeyScheme {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Classical => "classical",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Public half of a hybrid keypair (shareable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridPublicKey {
    scheme: KeyScheme,
    classical: [u8; CLASSICAL_KEY_LEN],
    post_quantum: Option<Vec<u8>>,
}

impl HybridPublicKey {
    /// Return the scheme tag.
    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// Return the Ed25519 public key bytes.
    pub fn classical_bytes(&self) -> &[u8; CLASSICAL_KEY_LEN] {
        &self.classical
    }

    /// Return the ML-DSA-65 public key bytes, if the key is hybrid.
    pub fn post_quantum_bytes(&self) -> Option<&[u8]> {
        self.post_quantum.as_deref()
    }

    /// Combined public key: classical bytes then post-quantum bytes.
    pub fn combined(&self) -> Vec<u8> {
        let mut out = self.classical.to_vec();
        if let Some(pq) = &self.post_quantum {
            out.extend_from_slice(pq);
        }
        out
    }

    /// Hex wire encoding of the combined public key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.combined())
    }

    /// Decode from the hex wire format. The scheme tag travels out of band
    /// (identity document), so the caller supplies it; the buffer length is
    /// validated against it, never the other way around.
    pub fn from_hex(scheme: KeyScheme, hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key)
            .map_err(|e| AttestError::Format(format!("invalid hex public key: {e}")))?;
        let expected = match scheme {
            KeyScheme::Classical => CLASSICAL_KEY_LEN,
            KeyScheme::Hybrid => CLASSICAL_KEY_LEN + post_quantum_public_len(),
        };
        if bytes.len() != expected {
            return Err(AttestError::Construction(format!(
                "combined public key must be {expected} bytes for {} scheme, got {}",
                scheme.as_str(),
                bytes.len()
            )));
        }
        let mut classical = [0u8; CLASSICAL_KEY_LEN];
        classical.copy_from_slice(&bytes[..CLASSICAL_KEY_LEN]);
        let post_quantum = match scheme {
            KeyScheme::Classical => None,
            KeyScheme::Hybrid => Some(bytes[CLASSICAL_KEY_LEN..].to_vec()),
        };
        Ok(Self {
            scheme,
            classical,
            post_quantum,
        })
    }
}

/// A signing keypair, classical-only or hybrid.
///
/// The classical signing key is zeroized on drop to prevent leakage.
pub struct HybridKeyPair {
    scheme: KeyScheme,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    pq_public: Option<mldsa65::PublicKey>,
    pq_secret: Option<mldsa65::SecretKey>,
}

impl HybridKeyPair {
    /// Generate a new keypair. `quantum_safe` adds an ML-DSA-65 pair
    /// alongside the Ed25519 pair and tags the key as [`KeyScheme::Hybrid`].
    ///
    /// A key size the backend should never produce is fatal; material is
    /// never truncated or padded to fit.
    pub fn generate(quantum_safe: bool) -> Result<Self> {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();

        let (pq_public, pq_secret) = if quantum_safe {
            let (pk, sk) = mldsa65::keypair();
            if pk.as_bytes().len() != post_quantum_public_len()
                || sk.as_bytes().len() != post_quantum_secret_len()
            {
                return Err(AttestError::Construction(format!(
                    "ML-DSA-65 keypair has unexpected sizes: public {}, secret {}",
                    pk.as_bytes().len(),
                    sk.as_bytes().len()
                )));
            }
            (Some(pk), Some(sk))
        } else {
            (None, None)
        };

        Ok(Self {
            scheme: if quantum_safe {
                KeyScheme::Hybrid
            } else {
                KeyScheme::Classical
            },
            signing_key,
            verifying_key,
            pq_public,
            pq_secret,
        })
    }

    /// Reconstruct a keypair from its hex wire encodings. As with
    /// [`HybridPublicKey::from_hex`], the scheme tag is supplied by the
    /// caller and the buffer lengths are checked against it.
    pub fn from_hex(scheme: KeyScheme, public_hex: &str, private_hex: &str) -> Result<Self> {
        let public = HybridPublicKey::from_hex(scheme, public_hex)?;
        let private = hex::decode(private_hex)
            .map_err(|e| AttestError::Format(format!("invalid hex private key: {e}")))?;
        let expected = match scheme {
            KeyScheme::Classical => CLASSICAL_KEY_LEN,
            KeyScheme::Hybrid => CLASSICAL_KEY_LEN + post_quantum_secret_len(),
        };
        if private.len() != expected {
            return Err(AttestError::Construction(format!(
                "combined private key must be {expected} bytes for {} scheme, got {}",
                scheme.as_str(),
                private.len()
            )));
        }

        let mut seed = [0u8; CLASSICAL_KEY_LEN];
        seed.copy_from_slice(&private[..CLASSICAL_KEY_LEN]);
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        let verifying_key = signing_key.verifying_key();
        if verifying_key.to_bytes() != *public.classical_bytes() {
            return Err(AttestError::InvalidKey(
                "classical private key does not match public key".into(),
            ));
        }

        let (pq_public, pq_secret) = match scheme {
            KeyScheme::Classical => (None, None),
            KeyScheme::Hybrid => {
                let pk_bytes = public
                    .post_quantum_bytes()
                    .ok_or_else(|| AttestError::InvalidKey("hybrid key missing ML-DSA half".into()))?;
                let pk = mldsa65::PublicKey::from_bytes(pk_bytes)
                    .map_err(|e| AttestError::InvalidKey(format!("invalid ML-DSA public key: {e}")))?;
                let sk = mldsa65::SecretKey::from_bytes(&private[CLASSICAL_KEY_LEN..])
                    .map_err(|e| AttestError::InvalidKey(format!("invalid ML-DSA secret key: {e}")))?;
                (Some(pk), Some(sk))
            }
        };

        Ok(Self {
            scheme,
            signing_key,
            verifying_key,
            pq_public,
            pq_secret,
        })
    }

    /// Return the scheme tag.
    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// Return the shareable public half.
    pub fn public_key(&self) -> HybridPublicKey {
        HybridPublicKey {
            scheme: self.scheme,
            classical: self.verifying_key.to_bytes(),
            post_quantum: self.pq_public.as_ref().map(|pk| pk.as_bytes().to_vec()),
        }
    }

    /// Hex wire encoding of the combined public key.
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Hex wire encoding of the combined private key (classical seed, then
    /// ML-DSA secret). Zeroized when the returned guard drops.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let mut combined = self.signing_key.to_bytes().to_vec();
        if let Some(sk) = &self.pq_secret {
            combined.extend_from_slice(sk.as_bytes());
        }
        let out = Zeroizing::new(hex::encode(&combined));
        combined.zeroize();
        out
    }

    /// Sign a message.
    ///
    /// Classical keys produce a raw 64-byte Ed25519 signature. Hybrid keys
    /// sign under both primitives and pack the result as two little-endian
    /// u16 lengths followed by each signature in order.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let classical = self.signing_key.sign(message).to_bytes();
        match self.scheme {
            KeyScheme::Classical => Ok(classical.to_vec()),
            KeyScheme::Hybrid => {
                let sk = self.pq_secret.as_ref().ok_or_else(|| {
                    AttestError::SigningFailed("hybrid keypair missing ML-DSA secret".into())
                })?;
                let pq = mldsa65::detached_sign(message, sk);
                let pq_bytes = pq.as_bytes();
                if classical.len() > u16::MAX as usize || pq_bytes.len() > u16::MAX as usize {
                    return Err(AttestError::SigningFailed(
                        "sub-signature exceeds u16 length prefix".into(),
                    ));
                }
                let mut out = Vec::with_capacity(4 + classical.len() + pq_bytes.len());
                out.extend_from_slice(&(classical.len() as u16).to_le_bytes());
                out.extend_from_slice(&(pq_bytes.len() as u16).to_le_bytes());
                out.extend_from_slice(&classical);
                out.extend_from_slice(pq_bytes);
                Ok(out)
            }
        }
    }
}

impl Drop for HybridKeyPair {
    fn drop(&mut self) {
        // SigningKey stores bytes internally; zeroize via conversion
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

/// Verify a signature against a message and public key.
///
/// Dispatches on the key's scheme tag. Hybrid verification requires both
/// sub-signatures to pass. Malformed input of any kind returns `false`;
/// this function never panics and never returns an error.
pub fn verify(message: &[u8], signature: &[u8], public: &HybridPublicKey) -> bool {
    match public.scheme() {
        KeyScheme::Classical => verify_classical(message, signature, public.classical_bytes()),
        KeyScheme::Hybrid => {
            let pq_key = match public.post_quantum_bytes() {
                Some(pq) => pq,
                None => return false,
            };
            let (classical_sig, pq_sig) = match split_hybrid_signature(signature) {
                Some(parts) => parts,
                None => return false,
            };
            verify_classical(message, classical_sig, public.classical_bytes())
                && verify_post_quantum(message, pq_sig, pq_key)
        }
    }
}

fn verify_classical(message: &[u8], signature: &[u8], key: &[u8; CLASSICAL_KEY_LEN]) -> bool {
    let verifying_key = match VerifyingKey::from_bytes(key) {
        Ok(k) => k,
        Err(_) => return false,
    };
    let signature = match Signature::from_slice(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    verifying_key.verify(message, &signature).is_ok()
}

fn verify_post_quantum(message: &[u8], signature: &[u8], key: &[u8]) -> bool {
    let pk = match mldsa65::PublicKey::from_bytes(key) {
        Ok(k) => k,
        Err(_) => return false,
    };
    let sig = match mldsa65::DetachedSignature::from_bytes(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    mldsa65::verify_detached_signature(&sig, message, &pk).is_ok()
}

/// Split a packed hybrid signature into its classical and post-quantum
/// parts. All length checks happen before any slicing.
fn split_hybrid_signature(signature: &[u8]) -> Option<(&[u8], &[u8])> {
    if signature.len() < 4 {
        return None;
    }
    let classical_len = u16::from_le_bytes([signature[0], signature[1]]) as usize;
    let pq_len = u16::from_le_bytes([signature[2], signature[3]]) as usize;
    if signature.len() != 4 + classical_len + pq_len {
        return None;
    }
    let classical = &signature[4..4 + classical_len];
    let pq = &signature[4 + classical_len..];
    Some((classical, pq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classical_keypair_lengths() {
        let kp = HybridKeyPair::generate(false).unwrap();
        assert_eq!(kp.scheme(), KeyScheme::Classical);
        assert_eq!(kp.public_key().combined().len(), CLASSICAL_KEY_LEN);
        assert_eq!(kp.private_key_hex().len(), CLASSICAL_KEY_LEN * 2);
    }

    #[test]
    fn test_hybrid_keypair_lengths() {
        let kp = HybridKeyPair::generate(true).unwrap();
        assert_eq!(kp.scheme(), KeyScheme::Hybrid);
        assert_eq!(
            kp.public_key().combined().len(),
            CLASSICAL_KEY_LEN + post_quantum_public_len()
        );
        assert_eq!(
            kp.private_key_hex().len(),
            (CLASSICAL_KEY_LEN + post_quantum_secret_len()) * 2
        );
    }

    #[test]
    fn test_classical_sign_verify() {
        let kp = HybridKeyPair::generate(false).unwrap();
        let message = b"agent attestation payload";
        let sig = kp.sign(message).unwrap();
        assert_eq!(sig.len(), CLASSICAL_SIG_LEN);
        assert!(verify(message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_hybrid_sign_verify() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let message = b"agent attestation payload";
        let sig = kp.sign(message).unwrap();
        assert!(sig.len() > CLASSICAL_SIG_LEN + 4);
        assert!(verify(message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_verify_wrong_message_false() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let sig = kp.sign(b"original").unwrap();
        assert!(!verify(b"tampered", &sig, &kp.public_key()));
    }

    #[test]
    fn test_verify_wrong_key_false() {
        let a = HybridKeyPair::generate(true).unwrap();
        let b = HybridKeyPair::generate(true).unwrap();
        let sig = a.sign(b"message").unwrap();
        assert!(!verify(b"message", &sig, &b.public_key()));
    }

    #[test]
    fn test_corrupted_classical_half_fails() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let message = b"message";
        let mut sig = kp.sign(message).unwrap();
        // First sub-signature starts after the two length prefixes
        sig[4] ^= 0xFF;
        assert!(!verify(message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_corrupted_post_quantum_half_fails() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let message = b"message";
        let mut sig = kp.sign(message).unwrap();
        let last = sig.len() - 1;
        sig[last] ^= 0xFF;
        assert!(!verify(message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_malformed_signatures_return_false() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let pk = kp.public_key();
        assert!(!verify(b"m", &[], &pk));
        assert!(!verify(b"m", &[0u8; 3], &pk));
        // Length prefixes claim more bytes than present
        assert!(!verify(b"m", &[0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3], &pk));
        // Classical signature against a hybrid key
        let classical = HybridKeyPair::generate(false).unwrap();
        let sig = classical.sign(b"m").unwrap();
        assert!(!verify(b"m", &sig, &pk));
    }

    #[test]
    fn test_signature_format_length_prefixes() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let sig = kp.sign(b"m").unwrap();
        let classical_len = u16::from_le_bytes([sig[0], sig[1]]) as usize;
        let pq_len = u16::from_le_bytes([sig[2], sig[3]]) as usize;
        assert_eq!(classical_len, CLASSICAL_SIG_LEN);
        assert_eq!(sig.len(), 4 + classical_len + pq_len);
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let pk = kp.public_key();
        let decoded = HybridPublicKey::from_hex(KeyScheme::Hybrid, &pk.to_hex()).unwrap();
        assert_eq!(decoded, pk);
    }

    #[test]
    fn test_public_key_hex_wrong_length_is_fatal() {
        let kp = HybridKeyPair::generate(false).unwrap();
        let hex_key = kp.public_key_hex();
        // A classical-length buffer does not construct a hybrid key
        let err = HybridPublicKey::from_hex(KeyScheme::Hybrid, &hex_key).unwrap_err();
        assert!(matches!(err, AttestError::Construction(_)));
    }

    #[test]
    fn test_keypair_hex_roundtrip() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let restored = HybridKeyPair::from_hex(
            KeyScheme::Hybrid,
            &kp.public_key_hex(),
            &kp.private_key_hex(),
        )
        .unwrap();
        let message = b"restored key still signs";
        let sig = restored.sign(message).unwrap();
        assert!(verify(message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_scheme_tag_survives_serde() {
        let kp = HybridKeyPair::generate(true).unwrap();
        let json = serde_json::to_string(&kp.public_key()).unwrap();
        let decoded: HybridPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.scheme(), KeyScheme::Hybrid);
    }
}
