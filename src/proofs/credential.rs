//! Credential proofs — selective disclosure over a claim Merkle root.
//!
//! Every claim of a credential becomes a Merkle leaf in sorted-name order.
//! The proof commits to the claim root and carries (index, leaf-hash) pairs
//! only for the claims the prover chose to disclose; undisclosed claims
//! stay hidden behind the root.

use sha2::{Digest, Sha256};

use crate::commitment;
use crate::error::{AttestError, Result};
use crate::ledger;
use crate::proofs::types::{DisclosedLeaf, Proof, ProofType, VerifiableCredential};
use crate::time;

/// Hash of one claim leaf, bound to the credential type.
fn claim_leaf(credential_type: &str, name: &str, value: &str) -> [u8; 32] {
    Sha256::digest(format!("{credential_type}:{name}={value}").as_bytes()).into()
}

/// Merkle root over all claims of a credential, in sorted-name order.
pub fn claims_root(credential: &VerifiableCredential) -> String {
    let leaves: Vec<[u8; 32]> = credential
        .claims
        .iter()
        .map(|(name, value)| claim_leaf(&credential.credential_type, name, value))
        .collect();
    if leaves.is_empty() {
        return hex::encode(Sha256::digest(credential.credential_type.as_bytes()));
    }
    hex::encode(ledger::root_of_hashes(&leaves))
}

/// Create a credential proof disclosing the named claims.
///
/// Fails when no credential of the requested type is held, or when a
/// disclosure names a claim the credential does not contain — the prover
/// never fabricates a leaf.
pub fn create(
    credentials: &[VerifiableCredential],
    credential_type: &str,
    disclose: &[String],
) -> Result<Proof> {
    let credential = credentials
        .iter()
        .find(|c| c.credential_type == credential_type)
        .ok_or_else(|| AttestError::CredentialNotFound(credential_type.to_string()))?;

    let mut disclosed = Vec::with_capacity(disclose.len());
    for name in disclose {
        // BTreeMap iteration order gives each claim a stable leaf index
        let (index, (_, value)) = credential
            .claims
            .iter()
            .enumerate()
            .find(|(_, (k, _))| *k == name)
            .ok_or_else(|| {
                AttestError::CredentialNotFound(format!(
                    "claim '{name}' not present in '{credential_type}'"
                ))
            })?;
        disclosed.push(DisclosedLeaf {
            index,
            hash: hex::encode(claim_leaf(credential_type, name, value)),
        });
    }

    let root = claims_root(credential);
    let opened = commitment::commit_with_fresh_blinding(&root);
    let public_inputs = vec![
        ProofType::Credential.as_str().to_string(),
        credential_type.to_string(),
    ];
    let challenge = commitment::derive_challenge(&opened.digest, &public_inputs);
    let response = commitment::derive_response(
        &opened.blinding,
        &challenge,
        commitment::secret_from_digest(&root),
    )?;

    Ok(Proof {
        proof_type: ProofType::Credential,
        commitment: opened.digest,
        challenge,
        response,
        public_inputs,
        merkle_root: Some(root),
        merkle_proof: Some(disclosed),
        timestamp: time::now_micros(),
    })
}

/// Verify a credential proof: the type tag is present, the claim root is a
/// full digest, and every disclosed (index, hash) pair is structurally
/// valid.
pub fn verify(proof: &Proof, credential_type: &str) -> bool {
    if proof.proof_type != ProofType::Credential || !proof.is_well_formed() {
        return false;
    }
    if proof.public_inputs
        != vec![
            ProofType::Credential.as_str().to_string(),
            credential_type.to_string(),
        ]
    {
        return false;
    }
    let root_ok = matches!(&proof.merkle_root, Some(root) if is_digest(root));
    let leaves_ok = match &proof.merkle_proof {
        Some(leaves) => leaves.iter().all(|l| is_digest(&l.hash)),
        None => false,
    };
    root_ok && leaves_ok
}

fn is_digest(hash: &str) -> bool {
    hash.len() == commitment::DIGEST_HEX_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit())
}
