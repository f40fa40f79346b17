//! Data structures shared by all proof types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::commitment;

/// Which property a proof attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofType {
    TrustLevel,
    Credential,
    Identity,
    Behavior,
}

impl ProofType {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::TrustLevel => "trust_level",
            Self::Credential => "credential",
            Self::Identity => "identity",
            Self::Behavior => "behavior",
        }
    }
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position and hash of one disclosed Merkle leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosedLeaf {
    pub index: usize,
    pub hash: String,
}

/// A single zero-disclosure proof, serializable for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    pub proof_type: ProofType,
    pub commitment: String,
    pub challenge: String,
    pub response: String,
    pub public_inputs: Vec<String>,
    pub merkle_root: Option<String>,
    pub merkle_proof: Option<Vec<DisclosedLeaf>>,
    pub timestamp: u64,
}

impl Proof {
    /// Structural checks shared by every proof type: well-formed digests,
    /// a parseable response, and a challenge that re-derives from the
    /// commitment and public inputs.
    pub fn is_well_formed(&self) -> bool {
        commitment::triple_is_well_formed(&self.commitment, &self.challenge, &self.response)
            && self.challenge == commitment::derive_challenge(&self.commitment, &self.public_inputs)
    }
}

/// Behavior claims a verifier can request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BehaviorClaim {
    /// No violations in the window.
    NoViolations,
    /// Success rate at or above a threshold.
    SuccessRateAtLeast { threshold: f64 },
    /// Full policy compliance in the window.
    PolicyCompliance,
}

impl BehaviorClaim {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoViolations => "no_violations",
            Self::SuccessRateAtLeast { .. } => "success_rate",
            Self::PolicyCompliance => "policy_compliance",
        }
    }
}

/// Success/violation counters supplied by the telemetry collaborator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BehaviorCounters {
    pub successes: u64,
    pub violations: u64,
}

impl BehaviorCounters {
    /// Total interactions counted.
    pub fn total(&self) -> u64 {
        self.successes + self.violations
    }

    /// Success rate in [0, 1]; zero when nothing was counted.
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.successes as f64 / self.total() as f64
    }
}

/// A verifiable credential record from the credential collaborator.
///
/// Claims live in a `BTreeMap` so leaf order is deterministic: two parties
/// hashing the same credential always derive the same claim root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiableCredential {
    pub credential_type: String,
    pub issuer: String,
    pub claims: BTreeMap<String, String>,
    pub issued_at: u64,
}

/// Prover-side inputs gathered from the surrounding services: the identity
/// document from the identity service, credentials from the credential
/// service, counters from telemetry. The core persists none of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent_id: String,
    pub identity_document: String,
    pub trust_score: f64,
    pub credentials: Vec<VerifiableCredential>,
    pub counters: BehaviorCounters,
}

/// Scale a score or rate in [0, 1] to basis points, so commitment
/// preimages are canonical integers rather than formatted floats.
pub(crate) fn score_basis_points(score: f64) -> u64 {
    (score * 10_000.0).round() as u64
}
