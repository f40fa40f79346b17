//! AgenticAttest — Cryptographic attestation primitives for AI agents.
//!
//! Provides hybrid classical/post-quantum signing, forward-secret
//! encrypted messaging, commitment-based zero-disclosure proofs,
//! a Merkle-backed behavior ledger, and a challenge-response
//! protocol for establishing trust between agents.

pub mod commitment;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod proofs;
pub mod protocol;
pub mod time;

// Re-export primary types
pub use error::{AttestError, Result};

// Re-export crypto types
pub use crypto::envelope::EncryptedEnvelope;
pub use crypto::exchange::ExchangeKeyPair;
pub use crypto::hybrid::{HybridKeyPair, HybridPublicKey, KeyScheme};

// Re-export proof types
pub use proofs::{
    AgentProfile, BehaviorClaim, BehaviorCounters, DisclosedLeaf, Proof, ProofType,
    VerifiableCredential,
};

// Re-export ledger types
pub use ledger::{BehaviorCommitment, BehaviorMerkleTree, InclusionProof, InteractionOutcome};

// Re-export protocol types
pub use protocol::{
    build_auth_request, verify_auth_response, AuthRequest, AuthResult, Challenge, ChallengeId,
    ProofCheck, ProofRequirement,
};
