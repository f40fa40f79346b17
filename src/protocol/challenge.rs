//! Challenges a verifier issues to a prover.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::random;
use crate::proofs::BehaviorClaim;
use crate::time;

/// Default challenge lifetime: five minutes, in microseconds.
pub const DEFAULT_TTL_MICROS: u64 = 5 * 60 * 1_000_000;

/// One proof requirement inside a challenge, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProofRequirement {
    /// Trust score at or above a minimum.
    TrustLevel { min_required: f64 },
    /// Possession of a credential type, disclosing the named claims.
    Credential {
        credential_type: String,
        disclose: Vec<String>,
    },
    /// Registration under an identity method.
    Identity { method: String },
    /// A behavior claim over a time window (epoch microseconds).
    Behavior {
        claim: BehaviorClaim,
        window_start: u64,
        window_end: u64,
    },
}

impl ProofRequirement {
    /// Stable string tag, used in per-requirement verification reports.
    pub fn kind(&self) -> &str {
        match self {
            Self::TrustLevel { .. } => "trust_level",
            Self::Credential { .. } => "credential",
            Self::Identity { .. } => "identity",
            Self::Behavior { .. } => "behavior",
        }
    }
}

/// Unique challenge identifier, prefixed for readability in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(pub String);

impl std::fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A challenge issued by a verifier. Single-use is expected of callers but
/// not enforced here; a verifier wanting early invalidation tracks issued
/// ids out of band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: ChallengeId,
    pub verifier_id: String,
    pub prover_id: String,
    pub required_proofs: Vec<ProofRequirement>,
    pub nonce: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl Challenge {
    /// Issue a challenge with the default five-minute lifetime.
    pub fn issue(
        verifier_id: impl Into<String>,
        prover_id: impl Into<String>,
        required_proofs: Vec<ProofRequirement>,
    ) -> Self {
        Self::issue_with_ttl(verifier_id, prover_id, required_proofs, DEFAULT_TTL_MICROS)
    }

    /// Issue a challenge with an explicit lifetime in microseconds.
    pub fn issue_with_ttl(
        verifier_id: impl Into<String>,
        prover_id: impl Into<String>,
        required_proofs: Vec<ProofRequirement>,
        ttl_micros: u64,
    ) -> Self {
        let nonce = hex::encode(random::random_nonce_32());
        let now = time::now_micros();
        let id_hash = Sha256::digest(format!("{nonce}:{now}").as_bytes());
        let id_encoded = bs58::encode(&id_hash[..16]).into_string();
        Self {
            challenge_id: ChallengeId(format!("achl_{id_encoded}")),
            verifier_id: verifier_id.into(),
            prover_id: prover_id.into(),
            required_proofs,
            nonce,
            issued_at: now,
            expires_at: now.saturating_add(ttl_micros),
        }
    }

    /// True once the current time is past `expires_at`.
    pub fn is_expired(&self) -> bool {
        time::now_micros() > self.expires_at
    }
}
