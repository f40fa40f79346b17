//! Trust-level proofs — prove "score ≥ threshold" without revealing the
//! score.

use crate::commitment;
use crate::error::{AttestError, Result};
use crate::proofs::types::{score_basis_points, Proof, ProofType};
use crate::time;

/// Create a trust-level proof.
///
/// Fails when the actual score is below the requested minimum: a proof
/// that cannot be made honestly is never emitted. Only the threshold
/// appears in the public inputs; the committed score stays with the prover.
pub fn create(actual_score: f64, min_required: f64) -> Result<Proof> {
    if actual_score < min_required {
        return Err(AttestError::TrustBelowThreshold {
            required: min_required,
            actual: actual_score,
        });
    }
    let scaled = score_basis_points(actual_score);
    let opened = commitment::commit_with_fresh_blinding(&scaled.to_string());
    let public_inputs = vec![
        ProofType::TrustLevel.as_str().to_string(),
        score_basis_points(min_required).to_string(),
    ];
    let challenge = commitment::derive_challenge(&opened.digest, &public_inputs);
    let response = commitment::derive_response(&opened.blinding, &challenge, scaled)?;
    Ok(Proof {
        proof_type: ProofType::TrustLevel,
        commitment: opened.digest,
        challenge,
        response,
        public_inputs,
        merkle_root: None,
        merkle_proof: None,
        timestamp: time::now_micros(),
    })
}

/// Verify a trust-level proof against the requested minimum.
pub fn verify(proof: &Proof, min_required: f64) -> bool {
    proof.proof_type == ProofType::TrustLevel
        && proof.is_well_formed()
        && proof.public_inputs
            == vec![
                ProofType::TrustLevel.as_str().to_string(),
                score_basis_points(min_required).to_string(),
            ]
}
