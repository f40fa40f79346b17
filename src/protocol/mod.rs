//! Challenge-response protocol between a verifier and a prover.

pub mod challenge;
pub mod engine;

pub use challenge::{Challenge, ChallengeId, ProofRequirement, DEFAULT_TTL_MICROS};
pub use engine::{build_auth_request, verify_auth_response, AuthRequest, AuthResult, ProofCheck};
