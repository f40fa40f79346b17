//! Behavior proofs — attest to conduct over a time window without
//! revealing individual interactions.
//!
//! The proof commits to the agent's success/violation counters and carries
//! the Merkle root of the ledger entries inside the window, so a verifier
//! can later audit individual inclusion proofs against the same root.

use sha2::{Digest, Sha256};

use crate::commitment;
use crate::error::{AttestError, Result};
use crate::ledger::{self, BehaviorMerkleTree};
use crate::proofs::types::{score_basis_points, BehaviorClaim, BehaviorCounters, Proof, ProofType};
use crate::time;

/// Create a behavior proof for a claim over `[window_start, window_end]`.
///
/// Generation is honest: a claim the counters do not support is refused
/// rather than proven. `NoViolations` and `PolicyCompliance` fail with
/// [`AttestError::ViolationsRecorded`] when any violation was logged;
/// `SuccessRateAtLeast` fails when the window has no interactions or the
/// rate falls short.
pub fn create(
    claim: BehaviorClaim,
    counters: &BehaviorCounters,
    ledger: &BehaviorMerkleTree,
    window_start: u64,
    window_end: u64,
) -> Result<Proof> {
    let claimed_value = match claim {
        BehaviorClaim::NoViolations => {
            if counters.violations > 0 {
                return Err(AttestError::ViolationsRecorded {
                    count: counters.violations,
                });
            }
            "0".to_string()
        }
        BehaviorClaim::SuccessRateAtLeast { threshold } => {
            if counters.total() == 0 {
                return Err(AttestError::InsufficientInteractions);
            }
            let rate = counters.success_rate();
            if rate < threshold {
                return Err(AttestError::SuccessRateBelowThreshold {
                    required: threshold,
                    actual: rate,
                });
            }
            score_basis_points(threshold).to_string()
        }
        BehaviorClaim::PolicyCompliance => {
            if counters.violations > 0 {
                return Err(AttestError::ViolationsRecorded {
                    count: counters.violations,
                });
            }
            "1".to_string()
        }
    };

    // The counters themselves stay hidden behind the commitment.
    let counters_digest = hex::encode(Sha256::digest(
        format!("{}:{}", counters.successes, counters.violations).as_bytes(),
    ));
    let opened = commitment::commit_with_fresh_blinding(&counters_digest);

    let window: Vec<_> = ledger
        .commitments_in_range(window_start, window_end)
        .into_iter()
        .cloned()
        .collect();
    let window_root = ledger::root_of(&window);

    let public_inputs = public_inputs_for(claim, &claimed_value, window_start, window_end);
    let challenge = commitment::derive_challenge(&opened.digest, &public_inputs);
    let response = commitment::derive_response(
        &opened.blinding,
        &challenge,
        commitment::secret_from_digest(&counters_digest),
    )?;

    Ok(Proof {
        proof_type: ProofType::Behavior,
        commitment: opened.digest,
        challenge,
        response,
        public_inputs,
        merkle_root: Some(window_root),
        merkle_proof: None,
        timestamp: time::now_micros(),
    })
}

/// Verify a behavior proof against the claim and window the verifier asked
/// for.
pub fn verify(proof: &Proof, claim: BehaviorClaim, window_start: u64, window_end: u64) -> bool {
    if proof.proof_type != ProofType::Behavior || !proof.is_well_formed() {
        return false;
    }
    let expected_value = match claim {
        BehaviorClaim::NoViolations => "0".to_string(),
        BehaviorClaim::SuccessRateAtLeast { threshold } => {
            score_basis_points(threshold).to_string()
        }
        BehaviorClaim::PolicyCompliance => "1".to_string(),
    };
    if proof.public_inputs != public_inputs_for(claim, &expected_value, window_start, window_end) {
        return false;
    }
    matches!(
        &proof.merkle_root,
        Some(root) if root.len() == commitment::DIGEST_HEX_LEN
            && root.bytes().all(|b| b.is_ascii_hexdigit())
    )
}

fn public_inputs_for(
    claim: BehaviorClaim,
    value: &str,
    window_start: u64,
    window_end: u64,
) -> Vec<String> {
    vec![
        ProofType::Behavior.as_str().to_string(),
        claim.as_str().to_string(),
        value.to_string(),
        window_start.to_string(),
        window_end.to_string(),
    ]
}
