//! Zero-disclosure proof constructors and verifiers.
//!
//! Four proof types share one shape ([`Proof`]): a commitment, a
//! Fiat–Shamir challenge bound to the public inputs, and a response.
//! Generation is honest by construction — a claim the prover's data does
//! not support is an error, never a proof. Verification never raises; a
//! proof either checks out or it does not.

pub mod behavior;
pub mod credential;
pub mod identity;
pub mod trust_level;
pub mod types;

pub use types::{
    AgentProfile, BehaviorClaim, BehaviorCounters, DisclosedLeaf, Proof, ProofType,
    VerifiableCredential,
};
