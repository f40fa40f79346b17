//! Authenticated encryption envelopes using ChaCha20-Poly1305.
//!
//! Wire format (hex): IV (12 bytes) ‖ auth tag (16 bytes) ‖ ciphertext.
//! `encrypt_for_recipient` prefixes the sender's ephemeral X25519 public
//! key, separated by a single `:`. The ephemeral secret is consumed by the
//! Diffie-Hellman step and never stored, so a later compromise of the
//! recipient's long-term key cannot recover already-sent messages.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use x25519_dalek::PublicKey as X25519PublicKey;
use zeroize::Zeroize;

use crate::crypto::exchange::{self, ExchangeKeyPair, MESSAGING_INFO};
use crate::crypto::random::random_iv_12;
use crate::error::{AttestError, Result};

/// IV length in bytes.
pub const IV_LEN: usize = 12;

/// Poly1305 authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Delimiter between the ephemeral public key and the envelope in
/// recipient-addressed blobs.
pub const BLOB_DELIMITER: char = ':';

/// An authenticated ciphertext with its IV and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Hex wire encoding: IV ‖ tag ‖ ciphertext.
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(IV_LEN + TAG_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.tag);
        bytes.extend_from_slice(&self.ciphertext);
        hex::encode(bytes)
    }

    /// Decode from the hex wire format. Length is validated before any
    /// slicing.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded)
            .map_err(|e| AttestError::Format(format!("invalid hex envelope: {e}")))?;
        if bytes.len() < IV_LEN + TAG_LEN {
            return Err(AttestError::Format(format!(
                "envelope too short: {} bytes, need at least {}",
                bytes.len(),
                IV_LEN + TAG_LEN
            )));
        }
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&bytes[..IV_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[IV_LEN..IV_LEN + TAG_LEN]);
        Ok(Self {
            iv,
            tag,
            ciphertext: bytes[IV_LEN + TAG_LEN..].to_vec(),
        })
    }
}

/// Encrypt plaintext under a 32-byte key.
///
/// A fresh random IV is drawn on every call; reusing an IV under the same
/// key breaks both confidentiality and authenticity of the AEAD.
pub fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Result<EncryptedEnvelope> {
    let iv = random_iv_12();
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| AttestError::EncryptionFailed(format!("encrypt: {e}")))?;
    // AEAD output is ciphertext ‖ tag; the envelope carries the tag first
    let split = sealed.len() - TAG_LEN;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&sealed[split..]);
    Ok(EncryptedEnvelope {
        iv,
        tag,
        ciphertext: sealed[..split].to_vec(),
    })
}

/// Decrypt an envelope under a 32-byte key.
///
/// Fails closed: any tag mismatch is [`AttestError::AuthenticationFailed`]
/// and no plaintext, partial or otherwise, is returned.
pub fn decrypt(envelope: &EncryptedEnvelope, key: &[u8; 32]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut sealed = envelope.ciphertext.clone();
    sealed.extend_from_slice(&envelope.tag);
    cipher
        .decrypt(Nonce::from_slice(&envelope.iv), sealed.as_ref())
        .map_err(|_| AttestError::AuthenticationFailed)
}

/// Encrypt a message for a recipient identified by their X25519 public key.
///
/// Generates a fresh ephemeral exchange pair, derives a message key via
/// ECDH + HKDF, and returns `<ephemeral-public-key-hex>:<envelope-hex>`.
/// The ephemeral secret is consumed here and discarded.
pub fn encrypt_for_recipient(
    plaintext: &[u8],
    recipient_public: &X25519PublicKey,
) -> Result<String> {
    let (ephemeral_secret, ephemeral_public) = exchange::ephemeral_exchange();
    let shared = ephemeral_secret.diffie_hellman(recipient_public);
    let mut key = exchange::derive_encryption_key(shared.as_bytes(), MESSAGING_INFO)?;
    let envelope = encrypt(plaintext, &key);
    key.zeroize();
    Ok(format!(
        "{}{}{}",
        hex::encode(ephemeral_public.as_bytes()),
        BLOB_DELIMITER,
        envelope?.to_hex()
    ))
}

/// Decrypt a recipient-addressed blob produced by [`encrypt_for_recipient`].
///
/// A missing delimiter is a [`AttestError::Format`] error.
pub fn decrypt_from_sender(blob: &str, recipient: &ExchangeKeyPair) -> Result<Vec<u8>> {
    let (ephemeral_hex, envelope_hex) = blob
        .split_once(BLOB_DELIMITER)
        .ok_or_else(|| AttestError::Format("missing ephemeral-key delimiter".into()))?;
    let ephemeral_bytes = hex::decode(ephemeral_hex)
        .map_err(|e| AttestError::Format(format!("invalid hex ephemeral key: {e}")))?;
    let ephemeral: [u8; 32] = ephemeral_bytes
        .try_into()
        .map_err(|_| AttestError::Format("ephemeral public key must be 32 bytes".into()))?;
    let shared = recipient.diffie_hellman(&X25519PublicKey::from(ephemeral));
    let mut key = exchange::derive_encryption_key(&shared, MESSAGING_INFO)?;
    let envelope = EncryptedEnvelope::from_hex(envelope_hex)?;
    let result = decrypt(&envelope, &key);
    key.zeroize();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [42u8; 32];
        let plaintext = b"confidential agent coordination message";
        let envelope = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&envelope, &key).unwrap();
        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let key = [42u8; 32];
        let plaintext = b"same message twice";
        let a = encrypt(plaintext, &key).unwrap();
        let b = encrypt(plaintext, &key).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.to_hex(), b.to_hex());
        assert_eq!(decrypt(&a, &key).unwrap(), plaintext);
        assert_eq!(decrypt(&b, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_tag_bit_flip_rejected() {
        let key = [7u8; 32];
        let mut envelope = encrypt(b"payload", &key).unwrap();
        for bit in 0..8 {
            envelope.tag[0] ^= 1 << bit;
            assert!(matches!(
                decrypt(&envelope, &key),
                Err(AttestError::AuthenticationFailed)
            ));
            envelope.tag[0] ^= 1 << bit;
        }
    }

    #[test]
    fn test_ciphertext_bit_flip_rejected() {
        let key = [7u8; 32];
        let mut envelope = encrypt(b"payload", &key).unwrap();
        for bit in 0..8 {
            envelope.ciphertext[0] ^= 1 << bit;
            assert!(decrypt(&envelope, &key).is_err());
            envelope.ciphertext[0] ^= 1 << bit;
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let envelope = encrypt(b"payload", &[1u8; 32]).unwrap();
        assert!(matches!(
            decrypt(&envelope, &[2u8; 32]),
            Err(AttestError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_envelope_hex_roundtrip() {
        let envelope = encrypt(b"wire format check", &[9u8; 32]).unwrap();
        let decoded = EncryptedEnvelope::from_hex(&envelope.to_hex()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_envelope_too_short() {
        let err = EncryptedEnvelope::from_hex("abcd").unwrap_err();
        assert!(matches!(err, AttestError::Format(_)));
    }

    #[test]
    fn test_encrypt_for_recipient_roundtrip() {
        let recipient = ExchangeKeyPair::generate();
        let plaintext = b"forward-secret hello";
        let blob = encrypt_for_recipient(plaintext, recipient.public_key()).unwrap();
        let decrypted = decrypt_from_sender(&blob, &recipient).unwrap();
        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_from_sender_missing_delimiter() {
        let recipient = ExchangeKeyPair::generate();
        let err = decrypt_from_sender("deadbeef", &recipient).unwrap_err();
        assert!(matches!(err, AttestError::Format(_)));
    }

    #[test]
    fn test_decrypt_from_sender_wrong_recipient() {
        let recipient = ExchangeKeyPair::generate();
        let eavesdropper = ExchangeKeyPair::generate();
        let blob = encrypt_for_recipient(b"secret", recipient.public_key()).unwrap();
        assert!(matches!(
            decrypt_from_sender(&blob, &eavesdropper),
            Err(AttestError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [3u8; 32];
        let envelope = encrypt(b"", &key).unwrap();
        assert!(envelope.ciphertext.is_empty());
        assert_eq!(decrypt(&envelope, &key).unwrap(), b"");
    }
}
