//! Append-only behavior ledger backed by a Merkle tree.
//!
//! Each leaf commits to one interaction outcome without revealing it. The
//! root is recomputed lazily and cached; any append invalidates the cache.
//! Appends are not internally synchronized: callers keep a single writer
//! per agent.
//!
//! Pairing rule: at every level an unpaired final node is hashed with
//! itself. [`BehaviorMerkleTree::proof`] and the root computation use the
//! same rule, so inclusion proofs interoperate with independently built
//! trees over the same leaf sequence.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::commitment;
use crate::time;

/// Preimage of the empty ledger's root. An empty tree hashes this sentinel
/// rather than reporting all zeros.
const EMPTY_ROOT_SENTINEL: &str = "agentic-attest/ledger/empty";

/// Outcome of one logged interaction. Only its commitment enters the
/// ledger; the outcome itself stays with the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionOutcome {
    Success,
    Violation,
}

impl InteractionOutcome {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Violation => "violation",
        }
    }
}

/// Hidden outcome of one logged interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCommitment {
    pub interaction_id: String,
    pub commitment: String,
    pub timestamp: u64,
}

impl BehaviorCommitment {
    /// Commit to an interaction outcome under a fresh blinding factor.
    /// Returns the ledger entry and the blinding, which stays with the
    /// agent and never enters the ledger.
    pub fn conceal(interaction_id: impl Into<String>, outcome: InteractionOutcome) -> (Self, String) {
        let opened = commitment::commit_with_fresh_blinding(outcome.as_str());
        (
            Self {
                interaction_id: interaction_id.into(),
                commitment: opened.digest,
                timestamp: time::now_micros(),
            },
            opened.blinding,
        )
    }

    /// Leaf hash binding the interaction id, the commitment, and the
    /// timestamp.
    pub fn leaf_hash(&self) -> [u8; 32] {
        Sha256::digest(
            format!(
                "{}:{}:{}",
                self.interaction_id, self.commitment, self.timestamp
            )
            .as_bytes(),
        )
        .into()
    }
}

/// Sibling path proving a leaf belongs to a root, bottom-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub siblings: Vec<String>,
}

/// The append-only ledger.
#[derive(Debug, Clone, Default)]
pub struct BehaviorMerkleTree {
    leaves: Vec<BehaviorCommitment>,
    cached_root: Option<String>,
}

impl BehaviorMerkleTree {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and invalidate the cached root.
    pub fn add_commitment(&mut self, entry: BehaviorCommitment) {
        self.leaves.push(entry);
        self.cached_root = None;
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True when no entries have been logged.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// All entries in append order.
    pub fn leaves(&self) -> &[BehaviorCommitment] {
        &self.leaves
    }

    /// Entries whose timestamps fall in `[start, end]`.
    pub fn commitments_in_range(&self, start: u64, end: u64) -> Vec<&BehaviorCommitment> {
        self.leaves
            .iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= end)
            .collect()
    }

    /// Root over the current leaf set, cached until the next append.
    pub fn root(&mut self) -> String {
        if let Some(root) = &self.cached_root {
            return root.clone();
        }
        let root = root_of(&self.leaves);
        self.cached_root = Some(root.clone());
        root
    }

    /// Inclusion proof for the leaf at `index`, or `None` when out of range.
    pub fn proof(&self, index: usize) -> Option<InclusionProof> {
        if index >= self.leaves.len() {
            return None;
        }
        let mut level: Vec<[u8; 32]> = self.leaves.iter().map(|l| l.leaf_hash()).collect();
        let mut idx = index;
        let mut siblings = Vec::new();
        while level.len() > 1 {
            let sibling = if idx % 2 == 0 {
                // unpaired final node pairs with itself
                if idx + 1 < level.len() {
                    idx + 1
                } else {
                    idx
                }
            } else {
                idx - 1
            };
            siblings.push(hex::encode(level[sibling]));
            level = fold_level(&level);
            idx /= 2;
        }
        Some(InclusionProof {
            leaf_index: index,
            siblings,
        })
    }
}

/// Root of an arbitrary ordered leaf slice, e.g. a time-window restriction
/// of a ledger. A pure function of the leaf sequence.
pub fn root_of(leaves: &[BehaviorCommitment]) -> String {
    if leaves.is_empty() {
        return hex::encode(Sha256::digest(EMPTY_ROOT_SENTINEL.as_bytes()));
    }
    let hashes: Vec<[u8; 32]> = leaves.iter().map(|l| l.leaf_hash()).collect();
    hex::encode(root_of_hashes(&hashes))
}

/// Root over pre-hashed leaves. Callers guarantee `hashes` is non-empty.
pub(crate) fn root_of_hashes(hashes: &[[u8; 32]]) -> [u8; 32] {
    let mut level = hashes.to_vec();
    while level.len() > 1 {
        level = fold_level(&level);
    }
    level[0]
}

fn fold_level(level: &[[u8; 32]]) -> Vec<[u8; 32]> {
    let mut next = Vec::with_capacity((level.len() + 1) / 2);
    for pair in level.chunks(2) {
        let left = pair[0];
        let right = if pair.len() == 2 { pair[1] } else { pair[0] };
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        next.push(hasher.finalize().into());
    }
    next
}

/// Check that `leaf` belongs to `root` via `proof`.
pub fn verify_inclusion(leaf: &BehaviorCommitment, proof: &InclusionProof, root: &str) -> bool {
    let mut hash = leaf.leaf_hash();
    let mut idx = proof.leaf_index;
    for sibling_hex in &proof.siblings {
        let sibling_bytes = match hex::decode(sibling_hex) {
            Ok(b) => b,
            Err(_) => return false,
        };
        let sibling: [u8; 32] = match sibling_bytes.try_into() {
            Ok(a) => a,
            Err(_) => return false,
        };
        let mut hasher = Sha256::new();
        if idx % 2 == 0 {
            hasher.update(hash);
            hasher.update(sibling);
        } else {
            hasher.update(sibling);
            hasher.update(hash);
        }
        hash = hasher.finalize().into();
        idx /= 2;
    }
    hex::encode(hash) == root
}
