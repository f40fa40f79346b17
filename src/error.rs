//! Error types for AgenticAttest.
//!
//! Construction failures are fatal and propagate as errors. Verification
//! failures never raise — they surface as `false` or as per-requirement
//! flags, so an adversary probing a verifier learns nothing from exception
//! paths. Private key material is never included in error messages.

/// Attestation error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    #[error("Construction failed: {0}")]
    Construction(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Malformed wire format: {0}")]
    Format(String),

    /// AEAD tag mismatch. Tampered plaintext is never returned.
    #[error("Authentication failed: ciphertext rejected")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Trust score below threshold: required {required}, actual {actual}")]
    TrustBelowThreshold { required: f64, actual: f64 },

    #[error("Success rate below threshold: required {required}, actual {actual}")]
    SuccessRateBelowThreshold { required: f64, actual: f64 },

    #[error("Cannot claim a clean record: {count} violation(s) on record")]
    ViolationsRecorded { count: u64 },

    #[error("No interactions recorded in the requested window")]
    InsufficientInteractions,

    #[error("Credential not available: {0}")]
    CredentialNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, AttestError>;
