//! Cryptographic primitives for AgenticAttest.
//!
//! This module provides:
//! - Hybrid Ed25519 + ML-DSA-65 key generation, signing, and verification
//! - X25519 Diffie-Hellman key exchange
//! - HKDF-SHA256 key derivation
//! - ChaCha20-Poly1305 authenticated encryption envelopes
//! - Cryptographically secure random number generation

pub mod envelope;
pub mod exchange;
pub mod hybrid;
pub mod random;
