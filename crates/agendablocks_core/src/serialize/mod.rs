//! Canonical wire encoding for block snapshots.
//!
//! # Responsibility
//! - Encode/decode blocks as fixed-arity tuples with a content hash.
//! - Surface corrupt payloads as errors; this is the one layer where
//!   "nothing happened" and "received bad data" must be distinguishable.
//!
//! # Invariants
//! - Wire tuple shape is `[id, parentId, order, type, itemId]`.
//! - Canonical tuple order: groups by first pre-order appearance (root
//!   group first), `order` ascending inside a group.
//! - The hash is SHA-256 hex over the canonical JSON and is used for
//!   equality/idempotence checks only.

pub mod diff;

use crate::index::BlockIndex;
use crate::model::block::{Block, BlockId, BlockKind, ItemId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from decoding or verifying wire payloads.
///
/// Engine operations never fault on bad input; this error exists because a
/// corrupt payload signals a version/integrity problem, not a user action.
#[derive(Debug)]
pub enum CodecError {
    /// Payload is not the expected tuple array (wrong arity, unknown type
    /// tag, malformed JSON).
    Malformed(serde_json::Error),
    /// Carried content hash disagrees with the payload body.
    HashMismatch { expected: String, actual: String },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed block payload: {err}"),
            Self::HashMismatch { expected, actual } => write!(
                f,
                "payload hash mismatch: carried {expected}, computed {actual}"
            ),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::HashMismatch { .. } => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

/// Fixed-arity wire tuple: `[id, parentId, order, type, itemId]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBlock(
    pub BlockId,
    pub Option<BlockId>,
    pub u32,
    pub BlockKind,
    pub ItemId,
);

impl WireBlock {
    /// Wire id accessor.
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Rehydrates a domain block from the tuple.
    pub fn into_block(self) -> Block {
        Block::with_ids(self.0, self.3, self.1, self.2, self.4)
    }
}

impl From<&Block> for WireBlock {
    fn from(block: &Block) -> Self {
        Self(
            block.id.clone(),
            block.parent_id.clone(),
            block.order,
            block.kind,
            block.item_id.clone(),
        )
    }
}

/// Encoded snapshot plus its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedBlocks {
    /// Canonical JSON array of wire tuples.
    pub blocks: String,
    /// SHA-256 hex digest of `blocks`.
    pub hash: String,
}

/// Produces the canonical tuple sequence for one index.
///
/// Groups appear by first pre-order appearance: the root group, then each
/// section's group in root order. Inside a group, tuples run `order`
/// ascending with ranks rewritten from list position.
pub fn canonical_tuples(index: &BlockIndex) -> Vec<WireBlock> {
    let mut tuples = Vec::with_capacity(index.len());
    let mut group_keys: Vec<Option<BlockId>> = vec![None];
    for block in index.materialize() {
        if !index.children(Some(&block.id)).is_empty() {
            group_keys.push(Some(block.id));
        }
    }
    for key in group_keys {
        for (rank, id) in index.children(key.as_ref()).iter().enumerate() {
            if let Some(block) = index.get(id) {
                let mut tuple = WireBlock::from(block);
                tuple.2 = rank as u32;
                tuples.push(tuple);
            }
        }
    }
    tuples
}

/// Encodes one index to its canonical payload.
pub fn encode(index: &BlockIndex) -> CodecResult<SerializedBlocks> {
    let raw = serde_json::to_string(&canonical_tuples(index))?;
    let hash = sha256_hex(raw.as_bytes());
    Ok(SerializedBlocks { blocks: raw, hash })
}

/// Decodes a raw tuple array into domain blocks.
///
/// # Errors
/// - [`CodecError::Malformed`] on wrong tuple arity, unknown type tags, or
///   malformed JSON.
pub fn decode(raw: &str) -> CodecResult<Vec<Block>> {
    let tuples: Vec<WireBlock> = serde_json::from_str(raw)?;
    Ok(tuples.into_iter().map(WireBlock::into_block).collect())
}

/// Decodes a full payload after verifying its carried hash.
///
/// # Errors
/// - [`CodecError::HashMismatch`] when the carried hash disagrees.
/// - [`CodecError::Malformed`] as for [`decode`].
pub fn decode_verified(payload: &SerializedBlocks) -> CodecResult<Vec<Block>> {
    let actual = sha256_hex(payload.blocks.as_bytes());
    if actual != payload.hash {
        return Err(CodecError::HashMismatch {
            expected: payload.hash.clone(),
            actual,
        });
    }
    decode(&payload.blocks)
}

/// SHA-256 hex digest of a byte slice.
pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{canonical_tuples, decode, decode_verified, encode, CodecError, SerializedBlocks};
    use crate::index::BlockIndex;
    use crate::model::block::{Block, BlockKind};

    fn sample() -> BlockIndex {
        BlockIndex::normalize(vec![
            Block::with_ids("S1", BlockKind::Section, None, 0, "i-s1"),
            Block::with_ids("T1", BlockKind::Topic, Some("S1".to_string()), 0, "i-t1"),
            Block::with_ids("S2", BlockKind::Section, None, 1, "i-s2"),
            Block::with_ids("A1", BlockKind::ActionItem, Some("S2".to_string()), 0, "i-a1"),
        ])
    }

    #[test]
    fn canonical_order_is_root_group_then_section_groups() {
        let tuples = canonical_tuples(&sample());
        let ids: Vec<&str> = tuples.iter().map(|t| t.id()).collect();
        assert_eq!(ids, ["S1", "S2", "T1", "A1"]);
        let orders: Vec<u32> = tuples.iter().map(|t| t.2).collect();
        assert_eq!(orders, [0, 1, 0, 0]);
    }

    #[test]
    fn encode_emits_fixed_arity_tuples() {
        let payload = encode(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload.blocks).unwrap();
        let first = value.as_array().unwrap().first().unwrap();
        assert_eq!(first.as_array().unwrap().len(), 5);
        assert_eq!(first[0], "S1");
        assert_eq!(first[3], "section");
        assert_eq!(first[4], "i-s1");
    }

    #[test]
    fn hash_is_stable_across_encodes() {
        let a = encode(&sample()).unwrap();
        let b = encode(&sample()).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn decode_round_trips_membership_and_placement() {
        let payload = encode(&sample()).unwrap();
        let blocks = decode_verified(&payload).unwrap();
        let rebuilt = BlockIndex::normalize(blocks);
        assert_eq!(rebuilt, sample());
    }

    #[test]
    fn decode_rejects_wrong_arity() {
        let err = decode(r#"[["id-only","x",0]]"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_unknown_type_tag() {
        let err = decode(r#"[["b1",null,0,"chapter","i1"]]"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn decode_verified_rejects_hash_mismatch() {
        let mut payload = encode(&sample()).unwrap();
        payload.hash = "0".repeat(64);
        let err = decode_verified(&payload).unwrap_err();
        assert!(matches!(err, CodecError::HashMismatch { .. }));

        let tampered = SerializedBlocks {
            blocks: "[]".to_string(),
            hash: encode(&sample()).unwrap().hash,
        };
        assert!(matches!(
            decode_verified(&tampered),
            Err(CodecError::HashMismatch { .. })
        ));
    }
}
