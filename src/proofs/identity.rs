//! Identity proofs — prove registration under an identity method without
//! revealing the full identifier.
//!
//! The proof commits to a hash of the agent's full identity document but
//! discloses only the method prefix (the scheme portion of the identifier)
//! and a truncated document hash: "I am a registered agent under method X".

use sha2::{Digest, Sha256};

use crate::commitment;
use crate::error::Result;
use crate::proofs::types::{Proof, ProofType};
use crate::time;

/// Hex characters of the document hash that are disclosed.
pub const TRUNCATED_HASH_LEN: usize = 16;

/// The scheme portion of an identifier: everything before the final
/// segment, e.g. `did:agent` for `did:agent:7Gx...`.
pub fn method_prefix(agent_id: &str) -> &str {
    match agent_id.rsplit_once(':') {
        Some((method, _)) => method,
        None => agent_id,
    }
}

/// Create an identity proof for an agent id and its identity document.
pub fn create(agent_id: &str, identity_document: &str) -> Result<Proof> {
    let document_hash = hex::encode(Sha256::digest(identity_document.as_bytes()));
    let opened = commitment::commit_with_fresh_blinding(&document_hash);
    let public_inputs = vec![
        ProofType::Identity.as_str().to_string(),
        method_prefix(agent_id).to_string(),
        document_hash[..TRUNCATED_HASH_LEN].to_string(),
    ];
    let challenge = commitment::derive_challenge(&opened.digest, &public_inputs);
    let response = commitment::derive_response(
        &opened.blinding,
        &challenge,
        commitment::secret_from_digest(&document_hash),
    )?;
    Ok(Proof {
        proof_type: ProofType::Identity,
        commitment: opened.digest,
        challenge,
        response,
        public_inputs,
        merkle_root: None,
        merkle_proof: None,
        timestamp: time::now_micros(),
    })
}

/// Verify an identity proof, optionally requiring a specific method prefix.
pub fn verify(proof: &Proof, required_method: Option<&str>) -> bool {
    if proof.proof_type != ProofType::Identity || !proof.is_well_formed() {
        return false;
    }
    if proof.public_inputs.len() != 3 {
        return false;
    }
    if proof.public_inputs[0] != ProofType::Identity.as_str() {
        return false;
    }
    if let Some(method) = required_method {
        if proof.public_inputs[1] != method {
            return false;
        }
    }
    let truncated = &proof.public_inputs[2];
    truncated.len() == TRUNCATED_HASH_LEN && truncated.bytes().all(|b| b.is_ascii_hexdigit())
}
