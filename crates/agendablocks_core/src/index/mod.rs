//! Normalized block index.
//!
//! # Responsibility
//! - Hold the whole tree as an id map plus per-parent ordered child lists.
//! - Provide `normalize` (flat list in) and `materialize` (flat list out).
//! - Keep both sides mutually consistent after every structural edit.
//!
//! # Invariants
//! - Child listing is deterministic: list position is authoritative and the
//!   stored `order` field is rewritten from it.
//! - `by_parent` never holds an empty child list, so two content-equal
//!   indexes always compare equal.
//! - Mutating operations are value-to-value; an index handed to a reader is
//!   never changed behind its back.

use crate::model::block::{Block, BlockId};
use log::debug;
use std::collections::HashMap;

/// Key into the per-parent child lists. `None` is the root group.
pub type ParentKey = Option<BlockId>;

const EMPTY: &[BlockId] = &[];

/// Normalized representation of the whole block tree.
///
/// `by_id` gives O(1) lookup per block; `by_parent` gives O(1) access to a
/// parent's ordered children. Every transition builds a new value (clone
/// plus scoped edits), so earlier snapshots stay valid for diffing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIndex {
    by_id: HashMap<BlockId, Block>,
    by_parent: HashMap<ParentKey, Vec<BlockId>>,
}

impl BlockIndex {
    /// Builds an index from a flat block list.
    ///
    /// Per-parent lists are ordered by each block's declared `order`, ties
    /// broken by input position. Malformed input is repaired rather than
    /// rejected, one log event per repair:
    /// - a duplicate id keeps its first occurrence;
    /// - a block whose parent is absent or not a section becomes a root;
    /// - a section carrying a parent has the parent cleared.
    pub fn normalize(flat: Vec<Block>) -> Self {
        let mut by_id: HashMap<BlockId, Block> = HashMap::with_capacity(flat.len());
        let mut arrival: Vec<BlockId> = Vec::with_capacity(flat.len());

        for block in flat {
            if by_id.contains_key(&block.id) {
                debug!(
                    "event=normalize_repair module=index status=duplicate_id id={}",
                    block.id
                );
                continue;
            }
            arrival.push(block.id.clone());
            by_id.insert(block.id.clone(), block);
        }

        // Resolve effective parents against the deduplicated id map.
        let mut repaired: Vec<(BlockId, ParentKey)> = Vec::with_capacity(arrival.len());
        for id in &arrival {
            let block = &by_id[id];
            let effective = effective_parent(block, &by_id);
            repaired.push((id.clone(), effective));
        }
        for (id, parent) in &repaired {
            if let Some(block) = by_id.get_mut(id) {
                block.parent_id = parent.clone();
            }
        }

        let mut by_parent: HashMap<ParentKey, Vec<BlockId>> = HashMap::new();
        for (id, parent) in repaired {
            by_parent.entry(parent).or_default().push(id);
        }
        for ids in by_parent.values_mut() {
            // Stable sort keeps input order for equal declared ranks.
            ids.sort_by_key(|id| by_id[id].order);
        }

        let mut index = Self { by_id, by_parent };
        let keys: Vec<ParentKey> = index.by_parent.keys().cloned().collect();
        for key in keys {
            index.renumber(&key);
        }
        index
    }

    /// Flattens the tree to a pre-order, order-respecting block list.
    ///
    /// Parents come before children and `order` is recomputed from list
    /// position. Traversal is an explicit stack, never recursion.
    pub fn materialize(&self) -> Vec<Block> {
        let mut out = Vec::with_capacity(self.by_id.len());
        let mut stack: Vec<(&BlockId, u32)> = Vec::new();

        for (rank, id) in self.children(None).iter().enumerate().rev() {
            stack.push((id, rank as u32));
        }
        while let Some((id, rank)) = stack.pop() {
            let Some(block) = self.by_id.get(id) else {
                continue;
            };
            let mut flat = block.clone();
            flat.order = rank;
            out.push(flat);

            for (child_rank, child) in self.children(Some(id)).iter().enumerate().rev() {
                stack.push((child, child_rank as u32));
            }
        }
        out
    }

    /// Looks up one block by id.
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.by_id.get(id)
    }

    /// Returns whether the id names a live block.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Returns the ordered child ids under one parent (root when `None`).
    pub fn children(&self, parent: Option<&BlockId>) -> &[BlockId] {
        self.by_parent
            .get(&parent.cloned())
            .map(Vec::as_slice)
            .unwrap_or(EMPTY)
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns whether the tree holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Collects `id` plus every transitive descendant.
    ///
    /// Explicit stack traversal; safe for arbitrarily deep or wide trees.
    /// Returns an empty set when `id` is unknown.
    pub fn descendants(&self, id: &str) -> Vec<BlockId> {
        if !self.by_id.contains_key(id) {
            return Vec::new();
        }
        let mut collected = Vec::new();
        let mut stack: Vec<BlockId> = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            for child in self.children(Some(&current)) {
                stack.push(child.clone());
            }
            collected.push(current);
        }
        collected
    }

    // ---- crate-internal structural edits ------------------------------

    /// Position of `id` within its parent group, if present.
    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        let block = self.by_id.get(id)?;
        self.children(block.parent_id.as_ref())
            .iter()
            .position(|child| child == id)
    }

    /// Removes `id` from its parent's child list, leaving `by_id` intact.
    /// The caller renumbers the group afterwards.
    pub(crate) fn detach(&mut self, id: &str) {
        let Some(block) = self.by_id.get(id) else {
            return;
        };
        let key = block.parent_id.clone();
        if let Some(ids) = self.by_parent.get_mut(&key) {
            ids.retain(|child| child != id);
            if ids.is_empty() {
                self.by_parent.remove(&key);
            }
        }
    }

    /// Inserts `id` into `parent`'s child list at `position` (clamped) and
    /// updates the block's stored `parent_id`.
    pub(crate) fn attach(&mut self, id: &str, parent: ParentKey, position: usize) {
        let Some(block) = self.by_id.get_mut(id) else {
            return;
        };
        block.parent_id = parent.clone();
        let ids = self.by_parent.entry(parent).or_default();
        let at = position.min(ids.len());
        ids.insert(at, id.to_string());
    }

    /// Adds a new block record and places it in its parent group.
    pub(crate) fn insert_block(&mut self, block: Block, position: usize) {
        let id = block.id.clone();
        let parent = block.parent_id.clone();
        self.by_id.insert(id.clone(), block);
        let ids = self.by_parent.entry(parent).or_default();
        let at = position.min(ids.len());
        ids.insert(at, id);
    }

    /// Removes one block from both maps. Its own child list, if any, is
    /// dropped wholesale; callers delete descendants explicitly first.
    pub(crate) fn remove_block(&mut self, id: &str) {
        self.detach(id);
        self.by_parent.remove(&Some(id.to_string()));
        self.by_id.remove(id);
    }

    /// Rewrites a leaf's kind and content key in place. Placement maps are
    /// untouched; callers enforce the leaf-only contract.
    pub(crate) fn set_kind_and_item(
        &mut self,
        id: &str,
        kind: crate::model::block::BlockKind,
        item_id: crate::model::block::ItemId,
    ) {
        if let Some(block) = self.by_id.get_mut(id) {
            block.kind = kind;
            block.item_id = item_id;
        }
    }

    /// Reorders one parent group so every member with a desired rank lands
    /// at that rank while the remaining members keep their relative order,
    /// then renumbers. Desired ranks are absolute slots in the final list;
    /// members without an entry fill the gaps in between.
    pub(crate) fn arrange(&mut self, parent: &ParentKey, desired: &HashMap<BlockId, u32>) {
        let Some(ids) = self.by_parent.get(parent) else {
            return;
        };
        let total = ids.len();
        let mut ranked: Vec<(u32, BlockId)> = Vec::new();
        let mut unranked: Vec<BlockId> = Vec::new();
        for id in ids {
            match desired.get(id) {
                Some(rank) => ranked.push((*rank, id.clone())),
                None => unranked.push(id.clone()),
            }
        }
        if ranked.is_empty() {
            return;
        }
        ranked.sort_by_key(|(rank, _)| *rank);

        let mut merged: Vec<BlockId> = Vec::with_capacity(total);
        let mut ranked = ranked.into_iter().peekable();
        let mut unranked = unranked.into_iter();
        for slot in 0..total as u32 {
            if ranked.peek().is_some_and(|(rank, _)| *rank <= slot) {
                if let Some((_, id)) = ranked.next() {
                    merged.push(id);
                    continue;
                }
            }
            if let Some(id) = unranked.next() {
                merged.push(id);
            } else if let Some((_, id)) = ranked.next() {
                merged.push(id);
            }
        }

        self.by_parent.insert(parent.clone(), merged);
        self.renumber(parent);
    }

    /// Rewrites stored `order` ranks for one parent group from list position.
    pub(crate) fn renumber(&mut self, parent: &ParentKey) {
        let Some(ids) = self.by_parent.get(parent) else {
            return;
        };
        let snapshot: Vec<BlockId> = ids.clone();
        for (rank, id) in snapshot.iter().enumerate() {
            if let Some(block) = self.by_id.get_mut(id) {
                block.order = rank as u32;
            }
        }
    }
}

/// Resolves the parent a block may legally keep, per the tree invariants.
fn effective_parent(block: &Block, by_id: &HashMap<BlockId, Block>) -> ParentKey {
    if block.is_container() {
        if block.parent_id.is_some() {
            debug!(
                "event=normalize_repair module=index status=parented_section id={}",
                block.id
            );
        }
        return None;
    }
    match &block.parent_id {
        None => None,
        Some(parent_id) => match by_id.get(parent_id) {
            Some(parent) if parent.is_container() => Some(parent_id.clone()),
            _ => {
                debug!(
                    "event=normalize_repair module=index status=orphan_demoted id={} parent={}",
                    block.id, parent_id
                );
                None
            }
        },
    }
}
