//! Challenge-response orchestration.
//!
//! The prover side builds one proof per requirement and signs the bundle
//! with its hybrid key; construction fails immediately if any requirement
//! cannot be honestly met, so no partial submission leaves the agent. The
//! verifier side rejects outright on id mismatch or expiry, then checks
//! the bundle signature and every proof against its requirement in
//! submitted order, aggregating per-requirement results.

use serde::{Deserialize, Serialize};

use crate::crypto::hybrid::{self, HybridKeyPair};
use crate::crypto::random;
use crate::error::{AttestError, Result};
use crate::ledger::BehaviorMerkleTree;
use crate::proofs::{self, AgentProfile, Proof};
use crate::protocol::challenge::{Challenge, ChallengeId, ProofRequirement};
use crate::time;

/// A signed multi-proof response to a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub challenge_id: ChallengeId,
    pub prover_id: String,
    /// Hybrid public key of the prover, hex-encoded.
    pub prover_public_key: String,
    pub key_scheme: hybrid::KeyScheme,
    /// One proof per challenge requirement, in requirement order.
    pub proofs: Vec<Proof>,
    /// Hex signature over the bundle payload.
    pub signature: String,
    pub timestamp: u64,
}

/// Verification outcome for one requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofCheck {
    pub requirement: String,
    pub verified: bool,
}

/// Aggregate verification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResult {
    pub challenge_id: ChallengeId,
    pub trust_established: bool,
    pub checks: Vec<ProofCheck>,
    /// Present only when every requested proof verified.
    pub session_token: Option<String>,
}

impl AuthResult {
    fn rejected(challenge_id: ChallengeId, checks: Vec<ProofCheck>) -> Self {
        Self {
            challenge_id,
            trust_established: false,
            checks,
            session_token: None,
        }
    }
}

/// Payload covered by the bundle signature (excludes the signature field).
#[derive(Serialize)]
struct RequestSignPayload<'a> {
    challenge_id: &'a str,
    nonce: &'a str,
    prover_id: &'a str,
    proofs: &'a [Proof],
    timestamp: u64,
}

fn sign_payload_bytes(
    challenge_id: &ChallengeId,
    nonce: &str,
    prover_id: &str,
    proofs: &[Proof],
    timestamp: u64,
) -> Result<Vec<u8>> {
    let payload = RequestSignPayload {
        challenge_id: &challenge_id.0,
        nonce,
        prover_id,
        proofs,
        timestamp,
    };
    serde_json::to_vec(&payload).map_err(|e| AttestError::SerializationError(e.to_string()))
}

/// Build a signed response to a challenge from the prover's data.
///
/// Fails fast on the first requirement that cannot be honestly met, e.g. a
/// trust score below the requested minimum or a credential the agent does
/// not hold.
pub fn build_auth_request(
    challenge: &Challenge,
    profile: &AgentProfile,
    ledger: &BehaviorMerkleTree,
    keypair: &HybridKeyPair,
) -> Result<AuthRequest> {
    let mut bundle = Vec::with_capacity(challenge.required_proofs.len());
    for requirement in &challenge.required_proofs {
        let proof = match requirement {
            ProofRequirement::TrustLevel { min_required } => {
                proofs::trust_level::create(profile.trust_score, *min_required)?
            }
            ProofRequirement::Credential {
                credential_type,
                disclose,
            } => proofs::credential::create(&profile.credentials, credential_type, disclose)?,
            ProofRequirement::Identity { .. } => {
                proofs::identity::create(&profile.agent_id, &profile.identity_document)?
            }
            ProofRequirement::Behavior {
                claim,
                window_start,
                window_end,
            } => proofs::behavior::create(
                *claim,
                &profile.counters,
                ledger,
                *window_start,
                *window_end,
            )?,
        };
        bundle.push(proof);
    }

    let timestamp = time::now_micros();
    let to_sign = sign_payload_bytes(
        &challenge.challenge_id,
        &challenge.nonce,
        &profile.agent_id,
        &bundle,
        timestamp,
    )?;
    let signature = hex::encode(keypair.sign(&to_sign)?);

    log::debug!(
        "built auth request for challenge {} with {} proof(s)",
        challenge.challenge_id,
        bundle.len()
    );

    Ok(AuthRequest {
        challenge_id: challenge.challenge_id.clone(),
        prover_id: profile.agent_id.clone(),
        prover_public_key: keypair.public_key_hex(),
        key_scheme: keypair.scheme(),
        proofs: bundle,
        signature,
        timestamp,
    })
}

/// Verify a response against the challenge it answers.
///
/// Expiry, challenge-id mismatch, and a prover other than the one the
/// challenge was issued to are rejected outcomes, not errors. Proof
/// failures are aggregated per requirement rather than aborting on the
/// first, so the verifier sees the complete picture.
pub fn verify_auth_response(challenge: &Challenge, request: &AuthRequest) -> AuthResult {
    if request.challenge_id != challenge.challenge_id {
        log::warn!(
            "challenge id mismatch: expected {}, got {}",
            challenge.challenge_id,
            request.challenge_id
        );
        return AuthResult::rejected(challenge.challenge_id.clone(), Vec::new());
    }
    if request.prover_id != challenge.prover_id {
        log::warn!(
            "prover mismatch on challenge {}: expected {}, got {}",
            challenge.challenge_id,
            challenge.prover_id,
            request.prover_id
        );
        return AuthResult::rejected(challenge.challenge_id.clone(), Vec::new());
    }
    if challenge.is_expired() {
        log::debug!(
            "challenge {} expired at {}",
            challenge.challenge_id,
            time::micros_to_rfc3339(challenge.expires_at)
        );
        return AuthResult::rejected(challenge.challenge_id.clone(), Vec::new());
    }

    if !bundle_signature_valid(challenge, request) {
        return AuthResult::rejected(challenge.challenge_id.clone(), Vec::new());
    }

    let mut checks = Vec::with_capacity(challenge.required_proofs.len());
    for (i, requirement) in challenge.required_proofs.iter().enumerate() {
        let verified = match request.proofs.get(i) {
            Some(proof) => proof_meets_requirement(proof, requirement),
            None => false,
        };
        checks.push(ProofCheck {
            requirement: requirement.kind().to_string(),
            verified,
        });
    }

    let trust_established = !checks.is_empty() && checks.iter().all(|c| c.verified);
    let session_token = trust_established.then(|| {
        format!(
            "sess_{}",
            bs58::encode(random::random_bytes::<32>()).into_string()
        )
    });

    AuthResult {
        challenge_id: challenge.challenge_id.clone(),
        trust_established,
        checks,
        session_token,
    }
}

fn bundle_signature_valid(challenge: &Challenge, request: &AuthRequest) -> bool {
    let public = match hybrid::HybridPublicKey::from_hex(
        request.key_scheme,
        &request.prover_public_key,
    ) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    let signature = match hex::decode(&request.signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let payload = match sign_payload_bytes(
        &request.challenge_id,
        &challenge.nonce,
        &request.prover_id,
        &request.proofs,
        request.timestamp,
    ) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    hybrid::verify(&payload, &signature, &public)
}

fn proof_meets_requirement(proof: &Proof, requirement: &ProofRequirement) -> bool {
    match requirement {
        ProofRequirement::TrustLevel { min_required } => {
            proofs::trust_level::verify(proof, *min_required)
        }
        ProofRequirement::Credential {
            credential_type, ..
        } => proofs::credential::verify(proof, credential_type),
        ProofRequirement::Identity { method } => proofs::identity::verify(proof, Some(method)),
        ProofRequirement::Behavior {
            claim,
            window_start,
            window_end,
        } => proofs::behavior::verify(proof, *claim, *window_start, *window_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hybrid::KeyScheme;
    use crate::ledger::{BehaviorCommitment, InteractionOutcome};
    use crate::proofs::types::{BehaviorCounters, VerifiableCredential};
    use std::collections::BTreeMap;

    fn profile() -> AgentProfile {
        let mut claims = BTreeMap::new();
        claims.insert("level".to_string(), "advanced".to_string());
        AgentProfile {
            agent_id: "did:agent:7GxkQw2mVb".to_string(),
            identity_document: r#"{"id":"did:agent:7GxkQw2mVb"}"#.to_string(),
            trust_score: 0.92,
            credentials: vec![VerifiableCredential {
                credential_type: "agent-certification".to_string(),
                issuer: "did:agent:registry".to_string(),
                claims,
                issued_at: time::now_micros(),
            }],
            counters: BehaviorCounters {
                successes: 9,
                violations: 0,
            },
        }
    }

    fn ledger() -> BehaviorMerkleTree {
        let mut tree = BehaviorMerkleTree::new();
        for i in 0..9 {
            let (entry, _) =
                BehaviorCommitment::conceal(format!("int-{i}"), InteractionOutcome::Success);
            tree.add_commitment(entry);
        }
        tree
    }

    fn all_requirements() -> Vec<ProofRequirement> {
        vec![
            ProofRequirement::TrustLevel { min_required: 0.7 },
            ProofRequirement::Credential {
                credential_type: "agent-certification".to_string(),
                disclose: vec!["level".to_string()],
            },
            ProofRequirement::Identity {
                method: "did:agent".to_string(),
            },
            ProofRequirement::Behavior {
                claim: proofs::BehaviorClaim::NoViolations,
                window_start: 0,
                window_end: u64::MAX,
            },
        ]
    }

    #[test]
    fn test_full_exchange_accepted() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue("verifier-1", "did:agent:7GxkQw2mVb", all_requirements());
        let request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        let result = verify_auth_response(&challenge, &request);
        assert!(result.trust_established);
        assert_eq!(result.checks.len(), 4);
        assert!(result.checks.iter().all(|c| c.verified));
        assert!(result.session_token.as_ref().unwrap().starts_with("sess_"));
    }

    #[test]
    fn test_full_exchange_hybrid_key() {
        let keypair = HybridKeyPair::generate(true).unwrap();
        assert_eq!(keypair.scheme(), KeyScheme::Hybrid);
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        let request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        let result = verify_auth_response(&challenge, &request);
        assert!(result.trust_established);
    }

    #[test]
    fn test_build_fails_on_low_trust() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.95 }],
        );
        let err = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap_err();
        assert!(matches!(err, AttestError::TrustBelowThreshold { .. }));
    }

    #[test]
    fn test_build_fails_on_missing_credential() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::Credential {
                credential_type: "compliance-audit".to_string(),
                disclose: vec![],
            }],
        );
        let err = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap_err();
        assert!(matches!(err, AttestError::CredentialNotFound(_)));
    }

    #[test]
    fn test_expired_challenge_rejected() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue_with_ttl(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
            0,
        );
        let request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let result = verify_auth_response(&challenge, &request);
        assert!(!result.trust_established);
        assert!(result.checks.is_empty());
        assert!(result.session_token.is_none());
    }

    #[test]
    fn test_challenge_id_mismatch_rejected() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        let other = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        let request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        let result = verify_auth_response(&other, &request);
        assert!(!result.trust_established);
    }

    #[test]
    fn test_wrong_prover_rejected() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:someone-else",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        // The request is validly self-signed, but by an agent the challenge
        // was not issued to
        let request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        let result = verify_auth_response(&challenge, &request);
        assert!(!result.trust_established);
        assert!(result.checks.is_empty());
        assert!(result.session_token.is_none());
    }

    #[test]
    fn test_tampered_bundle_rejected() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        let mut request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        request.prover_id = "did:agent:attacker".to_string();
        let result = verify_auth_response(&challenge, &request);
        assert!(!result.trust_established);
    }

    #[test]
    fn test_signature_from_wrong_key_rejected() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let other = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        let mut request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        // Swapping in another agent's key breaks the bundle signature
        request.prover_public_key = other.public_key_hex();
        let result = verify_auth_response(&challenge, &request);
        assert!(!result.trust_established);
    }

    #[test]
    fn test_missing_proof_reported_unverified() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let challenge = Challenge::issue(
            "verifier-1",
            "did:agent:7GxkQw2mVb",
            vec![ProofRequirement::TrustLevel { min_required: 0.7 }],
        );
        let request = build_auth_request(&challenge, &profile(), &ledger(), &keypair).unwrap();
        let mut wider = challenge.clone();
        wider.required_proofs.push(ProofRequirement::Identity {
            method: "did:agent".to_string(),
        });
        // Re-signing is not needed: the bundle still matches what was sent,
        // but the second requirement has no proof to check.
        let result = verify_auth_response(&wider, &request);
        assert!(!result.trust_established);
        assert_eq!(result.checks.len(), 2);
        assert!(result.checks[0].verified);
        assert!(!result.checks[1].verified);
    }

    #[test]
    fn test_session_tokens_unique() {
        let keypair = HybridKeyPair::generate(false).unwrap();
        let reqs = vec![ProofRequirement::TrustLevel { min_required: 0.7 }];
        let c1 = Challenge::issue("verifier-1", "did:agent:7GxkQw2mVb", reqs.clone());
        let c2 = Challenge::issue("verifier-1", "did:agent:7GxkQw2mVb", reqs);
        let r1 = build_auth_request(&c1, &profile(), &ledger(), &keypair).unwrap();
        let r2 = build_auth_request(&c2, &profile(), &ledger(), &keypair).unwrap();
        let t1 = verify_auth_response(&c1, &r1).session_token.unwrap();
        let t2 = verify_auth_response(&c2, &r2).session_token.unwrap();
        assert_ne!(t1, t2);
    }
}
