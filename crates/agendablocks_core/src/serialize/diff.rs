//! Snapshot diffing and replay.
//!
//! # Responsibility
//! - Compute the minimal three-bucket structural delta between two flat
//!   snapshots.
//! - Replay a delta onto an index through the same positional engine that
//!   handles live gestures.
//!
//! # Invariants
//! - A block unchanged between snapshots appears in no bucket.
//! - Replay order is removed, added, changed.
//! - Applying the same diff twice leaves the state content-equal.

use crate::engine::reparent::move_to;
use crate::index::{BlockIndex, ParentKey};
use crate::model::block::{Block, BlockId};
use crate::serialize::{sha256_hex, CodecError, CodecResult, WireBlock};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Three-bucket structural delta between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDiff {
    /// Present in `next` only.
    pub added: Vec<WireBlock>,
    /// Present in `prev` only.
    pub removed: Vec<WireBlock>,
    /// Present in both with differing `parentId`, `order`, or `type`.
    pub changed: Vec<WireBlock>,
    /// SHA-256 hex digest over the canonical JSON of the three buckets.
    pub hash: String,
}

impl BlockDiff {
    /// Returns whether the delta carries no structural change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Recomputes the digest over the bucket contents.
    pub fn computed_hash(&self) -> CodecResult<String> {
        bundle_hash(&self.added, &self.removed, &self.changed)
    }

    /// Returns whether the carried hash matches the bucket contents.
    pub fn verify_hash(&self) -> bool {
        self.computed_hash()
            .map(|hash| hash == self.hash)
            .unwrap_or(false)
    }

    /// Encodes the diff for transport.
    pub fn to_json(&self) -> CodecResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a transported diff, verifying its carried hash.
    ///
    /// # Errors
    /// - [`CodecError::Malformed`] on arity/tag/JSON problems.
    /// - [`CodecError::HashMismatch`] when the carried hash disagrees.
    pub fn from_json(raw: &str) -> CodecResult<Self> {
        let diff: Self = serde_json::from_str(raw)?;
        let actual = bundle_hash(&diff.added, &diff.removed, &diff.changed)?;
        if actual != diff.hash {
            return Err(CodecError::HashMismatch {
                expected: diff.hash,
                actual,
            });
        }
        Ok(diff)
    }
}

/// Computes the minimal delta from `prev` to `next`.
///
/// Buckets keep snapshot order (deterministic input, deterministic hash).
pub fn diff(prev: &[Block], next: &[Block]) -> CodecResult<BlockDiff> {
    let prev_by_id: HashMap<&str, &Block> =
        prev.iter().map(|block| (block.id.as_str(), block)).collect();
    let next_by_id: HashMap<&str, &Block> =
        next.iter().map(|block| (block.id.as_str(), block)).collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for block in next {
        match prev_by_id.get(block.id.as_str()) {
            None => added.push(WireBlock::from(block)),
            Some(before) => {
                let moved = before.parent_id != block.parent_id || before.order != block.order;
                if moved || before.kind != block.kind {
                    changed.push(WireBlock::from(block));
                }
            }
        }
    }

    let removed: Vec<WireBlock> = prev
        .iter()
        .filter(|block| !next_by_id.contains_key(block.id.as_str()))
        .map(WireBlock::from)
        .collect();

    let hash = bundle_hash(&added, &removed, &changed)?;
    Ok(BlockDiff {
        added,
        removed,
        changed,
        hash,
    })
}

/// Replays a delta onto the index.
///
/// Removed tuples delete exactly the ids they list. The bucket is already
/// transitively complete for true deletions, and a cascade here would take
/// down children that survived the interval by moving elsewhere (those sit
/// in `changed`, waiting to be repositioned). Added tuples insert as new
/// blocks, sections before leaves so parents exist first; changed tuples
/// adopt their new parent through the positional move core. Bucket order
/// carries no placement information, so replay finishes with a per-group
/// merge that puts every added/changed member at its exact target rank.
/// Total: entries that no longer apply are skipped, which is what makes a
/// second application a no-op.
pub fn apply_diff(index: BlockIndex, diff: &BlockDiff) -> BlockIndex {
    use crate::engine::reducer::{reduce, BlockAction};

    let mut state = index;

    for tuple in &diff.removed {
        let Some(block) = state.get(tuple.id()) else {
            continue;
        };
        let surviving_parent = block.parent_id.clone();
        state.remove_block(tuple.id());
        state.renumber(&surviving_parent);
    }

    let (sections, leaves): (Vec<&WireBlock>, Vec<&WireBlock>) = diff
        .added
        .iter()
        .partition(|tuple| tuple.3.is_container());
    for tuple in sections.into_iter().chain(leaves) {
        state = reduce(state, BlockAction::Add(tuple.clone().into_block()));
    }

    for tuple in &diff.changed {
        let Some(current) = state.get(tuple.id()) else {
            debug!(
                "event=diff_apply module=serialize status=skip reason=unknown_id id={}",
                tuple.id()
            );
            continue;
        };
        if !current.is_container() && !tuple.3.is_container() {
            state = reduce(
                state,
                BlockAction::Convert {
                    id: tuple.id().to_string(),
                    kind: tuple.3,
                    item_id: tuple.4.clone(),
                },
            );
        }
        let parent_differs = state
            .get(tuple.id())
            .is_some_and(|block| block.parent_id != tuple.1);
        if parent_differs {
            state = move_to(state, tuple.id(), tuple.1.clone(), tuple.2 as usize);
        }
    }

    let mut desired: HashMap<BlockId, u32> = HashMap::new();
    let mut affected: Vec<ParentKey> = Vec::new();
    for tuple in diff.added.iter().chain(diff.changed.iter()) {
        if !state.contains(tuple.id()) {
            continue;
        }
        desired.insert(tuple.id().to_string(), tuple.2);
        if !affected.contains(&tuple.1) {
            affected.push(tuple.1.clone());
        }
    }
    for key in &affected {
        state.arrange(key, &desired);
    }

    state
}

fn bundle_hash(
    added: &[WireBlock],
    removed: &[WireBlock],
    changed: &[WireBlock],
) -> CodecResult<String> {
    let raw = serde_json::to_string(&(added, removed, changed))?;
    Ok(sha256_hex(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::{apply_diff, diff, BlockDiff};
    use crate::index::BlockIndex;
    use crate::model::block::{Block, BlockKind};

    fn section(id: &str, order: u32) -> Block {
        Block::with_ids(id, BlockKind::Section, None, order, format!("item-{id}"))
    }

    fn topic(id: &str, parent: Option<&str>, order: u32) -> Block {
        Block::with_ids(
            id,
            BlockKind::Topic,
            parent.map(str::to_string),
            order,
            format!("item-{id}"),
        )
    }

    #[test]
    fn removed_only_for_disappeared_blocks() {
        let prev = vec![topic("A", None, 0), topic("B", None, 1)];
        let next = vec![topic("A", None, 0)];
        let delta = diff(&prev, &next).unwrap();
        assert!(delta.added.is_empty());
        assert!(delta.changed.is_empty());
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].id(), "B");
    }

    #[test]
    fn unchanged_blocks_appear_in_no_bucket() {
        let prev = vec![section("S", 0), topic("T", Some("S"), 0)];
        let next = vec![
            section("S", 0),
            topic("T", Some("S"), 0),
            topic("N", Some("S"), 1),
        ];
        let delta = diff(&prev, &next).unwrap();
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].id(), "N");
        assert!(delta.removed.is_empty());
        assert!(delta.changed.is_empty());
    }

    #[test]
    fn changed_tracks_parent_order_and_kind() {
        let prev = vec![
            section("S", 0),
            topic("T", Some("S"), 0),
            topic("U", None, 1),
        ];
        let next = vec![
            section("S", 0),
            topic("T", None, 1),
            Block::with_ids("U", BlockKind::Objective, None, 2, "item-U"),
        ];
        let delta = diff(&prev, &next).unwrap();
        let changed_ids: Vec<&str> = delta.changed.iter().map(|t| t.id()).collect();
        assert_eq!(changed_ids, ["T", "U"]);
    }

    #[test]
    fn diff_hash_round_trips_through_json() {
        let prev = vec![section("S", 0)];
        let next = vec![section("S", 0), topic("T", Some("S"), 0)];
        let delta = diff(&prev, &next).unwrap();
        assert!(delta.verify_hash());

        let decoded = BlockDiff::from_json(&delta.to_json().unwrap()).unwrap();
        assert_eq!(decoded, delta);
    }

    #[test]
    fn apply_reconstructs_target_snapshot() {
        let prev = vec![
            section("S1", 0),
            topic("T1", Some("S1"), 0),
            topic("T2", Some("S1"), 1),
            section("S2", 1),
        ];
        let next = vec![
            section("S1", 0),
            topic("T2", Some("S1"), 0),
            section("S2", 1),
            topic("T1", Some("S2"), 0),
            topic("T3", Some("S2"), 1),
        ];
        let delta = diff(&prev, &next).unwrap();
        let replayed = apply_diff(BlockIndex::normalize(prev), &delta);
        assert_eq!(replayed, BlockIndex::normalize(next));
    }

    #[test]
    fn apply_is_idempotent() {
        let prev = vec![section("S", 0), topic("T", Some("S"), 0)];
        let next = vec![section("S", 0)];
        let delta = diff(&prev, &next).unwrap();

        let once = apply_diff(BlockIndex::normalize(prev), &delta);
        let twice = apply_diff(once.clone(), &delta);
        assert_eq!(once, twice);
    }

    #[test]
    fn apply_converges_for_any_changed_bucket_order() {
        // Snapshot lists carry no ordering guarantee: here departures from
        // G precede the arrivals, and the arrival bound for rank 3 comes
        // before the one bound for rank 1.
        let prev = vec![
            section("G", 0),
            section("H", 1),
            topic("U0", Some("G"), 0),
            topic("U1", Some("G"), 1),
            topic("U2", Some("G"), 2),
            topic("U3", Some("G"), 3),
            topic("U4", Some("G"), 4),
            topic("X", Some("H"), 0),
            topic("Z", Some("H"), 1),
        ];
        let next = vec![
            section("G", 0),
            section("H", 1),
            topic("U1", Some("H"), 0),
            topic("U3", Some("H"), 1),
            topic("Z", Some("G"), 3),
            topic("X", Some("G"), 1),
            topic("U0", Some("G"), 0),
            topic("U2", Some("G"), 2),
            topic("U4", Some("G"), 4),
        ];

        let delta = diff(&prev, &next).unwrap();
        let changed_ids: Vec<&str> = delta.changed.iter().map(|t| t.id()).collect();
        assert_eq!(changed_ids, ["U1", "U3", "Z", "X"]);

        let replayed = apply_diff(BlockIndex::normalize(prev), &delta);
        assert_eq!(replayed, BlockIndex::normalize(next));
        assert_eq!(
            replayed.children(Some(&"G".to_string())),
            ["U0", "X", "U2", "Z", "U4"].map(str::to_string)
        );
        assert_eq!(
            replayed.children(Some(&"H".to_string())),
            ["U1", "U3"].map(str::to_string)
        );
    }

    #[test]
    fn added_sections_land_before_their_children() {
        let prev: Vec<Block> = vec![];
        let next = vec![
            topic("T", Some("S"), 0),
            section("S", 0),
        ];
        let delta = diff(&prev, &next).unwrap();
        let replayed = apply_diff(BlockIndex::default(), &delta);
        assert_eq!(replayed.get("T").unwrap().parent_id.as_deref(), Some("S"));
    }
}
