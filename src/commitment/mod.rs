//! Hash-based commitments and Fiat-Shamir challenge/response derivation.
//!
//! `commit` is a hash-based simplification of a Pedersen commitment:
//! binding and hiding under standard hash assumptions, but not homomorphic,
//! so committed values cannot be combined without reopening. The
//! challenge/response construction is likewise NOT a sound Sigma protocol:
//! [`derive_response`] performs no reduction over a defined field, and
//! verifiers check structural well-formedness only. A genuine
//! zero-knowledge backend would replace this module behind the same
//! [`crate::proofs::Proof`] shape without affecting callers.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::crypto::random;
use crate::error::{AttestError, Result};

/// Domain tag mixed into every Fiat-Shamir challenge, so a challenge
/// derived for another protocol cannot be replayed here.
const CHALLENGE_DOMAIN: &str = "agentic-attest/fiat-shamir/v1";

/// Hex length of a SHA-256 commitment or challenge digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// A commitment digest together with the blinding that opens it.
///
/// Only `digest` is ever published; the blinding stays with the prover.
#[derive(Debug, Clone)]
pub struct Commitment {
    pub digest: String,
    pub blinding: String,
}

/// Commit to a canonical-string value under a blinding factor.
///
/// Binding: the same (value, blinding) pair always yields the same digest.
/// Hiding: recovering the value without the blinding requires a preimage
/// attack on SHA-256.
pub fn commit(value: &str, blinding: &str) -> String {
    let digest = Sha256::digest(format!("{value}:{blinding}").as_bytes());
    hex::encode(digest)
}

/// Commit to a value under a freshly drawn 32-byte blinding factor.
pub fn commit_with_fresh_blinding(value: &str) -> Commitment {
    let blinding = random::random_blinding();
    Commitment {
        digest: commit(value, &blinding),
        blinding,
    }
}

/// Derive a Fiat-Shamir challenge over a commitment and its public context.
pub fn derive_challenge(commitment: &str, public_context: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CHALLENGE_DOMAIN.as_bytes());
    hasher.update(commitment.as_bytes());
    for ctx in public_context {
        hasher.update(ctx.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Compute the structured response `blinding + challenge * secret` over
/// arbitrary-precision integers, deliberately without modular reduction
/// (see module docs). Returned as a decimal string.
pub fn derive_response(blinding: &str, challenge: &str, secret_value: u64) -> Result<String> {
    let blinding = BigUint::parse_bytes(blinding.as_bytes(), 16)
        .ok_or_else(|| AttestError::Format("blinding factor is not valid hex".into()))?;
    let challenge = BigUint::parse_bytes(challenge.as_bytes(), 16)
        .ok_or_else(|| AttestError::Format("challenge is not valid hex".into()))?;
    Ok((blinding + challenge * BigUint::from(secret_value)).to_str_radix(10))
}

/// Structural well-formedness of a commitment/challenge/response triple:
/// both digests are full-length hex and the response parses as a decimal
/// integer. This is the whole verification contract of the construction.
pub fn triple_is_well_formed(commitment: &str, challenge: &str, response: &str) -> bool {
    is_hex_digest(commitment)
        && is_hex_digest(challenge)
        && !response.is_empty()
        && response.bytes().all(|b| b.is_ascii_digit())
}

fn is_hex_digest(digest: &str) -> bool {
    digest.len() == DIGEST_HEX_LEN && digest.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Project a hex digest onto a u64 secret (its first 8 bytes), for proof
/// types whose committed value is itself a digest.
pub fn secret_from_digest(digest: &str) -> u64 {
    let mut buf = [0u8; 8];
    let bytes = hex::decode(digest).unwrap_or_default();
    let take = bytes.len().min(8);
    buf[..take].copy_from_slice(&bytes[..take]);
    u64::from_be_bytes(buf)
}
