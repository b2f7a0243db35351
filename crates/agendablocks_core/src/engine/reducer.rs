//! Tree state machine.
//!
//! # Responsibility
//! - Express every structural transition as one total reducer function.
//! - Keep the caller contract single-writer: each dispatch consumes the
//!   current state value and returns the next one.
//!
//! # Invariants
//! - Transitions are synchronous and side-effect-free; there is no hidden
//!   shared state.
//! - Invalid operations are silent no-ops, never faults; only codec-level
//!   corruption surfaces as an error elsewhere.
//! - Descendant collection for delete is an explicit stack traversal.

use crate::engine::reparent::reparent;
use crate::index::{BlockIndex, ParentKey};
use crate::model::block::{Block, BlockId, BlockKind, ItemId};
use crate::serialize::diff::{apply_diff, BlockDiff};
use log::debug;

/// One structural transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockAction {
    /// Append a new block to its parent group, or place it at its declared
    /// `order` when that slot is in range.
    Add(Block),
    /// Insert a new block at an explicit position among `parent_id`'s
    /// children (clamped). Used when a block must sit adjacent to a
    /// specific reference block rather than at the end.
    Insert {
        block: Block,
        parent_id: ParentKey,
        position: usize,
    },
    /// Remove a block and every transitive descendant.
    Delete { id: BlockId },
    /// Discard state and rebuild from a flat list.
    SetAll(Vec<Block>),
    /// Apply one drop gesture.
    Move {
        active_id: BlockId,
        hover_zone: String,
    },
    /// Replay a structural diff computed elsewhere.
    ApplyDiff(BlockDiff),
    /// Reassign a leaf's kind and content key. Sections take no part in
    /// conversion, in either direction.
    Convert {
        id: BlockId,
        kind: BlockKind,
        item_id: ItemId,
    },
}

/// Advances the tree by one action.
///
/// Total over all inputs: anything that cannot be honored returns the
/// input state content-equal. The caller owns the state value and must
/// feed the returned value into the next dispatch.
pub fn reduce(index: BlockIndex, action: BlockAction) -> BlockIndex {
    match action {
        BlockAction::Add(block) => {
            let position = block.order as usize;
            add_block(index, block, position)
        }
        BlockAction::Insert {
            mut block,
            parent_id,
            position,
        } => {
            block.parent_id = parent_id;
            add_block(index, block, position)
        }
        BlockAction::Delete { id } => delete_cascade(index, &id),
        BlockAction::SetAll(flat) => BlockIndex::normalize(flat),
        BlockAction::Move {
            active_id,
            hover_zone,
        } => reparent(index, &active_id, &hover_zone),
        BlockAction::ApplyDiff(diff) => apply_diff(index, &diff),
        BlockAction::Convert { id, kind, item_id } => convert_leaf(index, &id, kind, item_id),
    }
}

/// Shared placement path for `Add` and `Insert`.
fn add_block(index: BlockIndex, block: Block, position: usize) -> BlockIndex {
    if index.contains(&block.id) {
        debug!(
            "event=block_add module=engine status=noop reason=duplicate_id id={}",
            block.id
        );
        return index;
    }
    if block.is_container() && block.parent_id.is_some() {
        debug!(
            "event=block_add module=engine status=noop reason=section_nesting id={}",
            block.id
        );
        return index;
    }
    if let Some(parent_id) = &block.parent_id {
        match index.get(parent_id) {
            Some(parent) if parent.is_container() => {}
            _ => {
                debug!(
                    "event=block_add module=engine status=noop reason=invalid_parent id={} parent={parent_id}",
                    block.id
                );
                return index;
            }
        }
    }

    let parent = block.parent_id.clone();
    let mut next = index;
    next.insert_block(block, position);
    next.renumber(&parent);
    next
}

/// Removes `id` plus its transitive descendants from both maps.
fn delete_cascade(index: BlockIndex, id: &str) -> BlockIndex {
    if !index.contains(id) {
        debug!("event=block_delete module=engine status=noop reason=unknown_id id={id}");
        return index;
    }
    let surviving_parent = index.get(id).and_then(|block| block.parent_id.clone());
    let doomed = index.descendants(id);

    let mut next = index;
    for member in &doomed {
        next.remove_block(member);
    }
    next.renumber(&surviving_parent);
    debug!(
        "event=block_delete module=engine status=ok id={id} removed={}",
        doomed.len()
    );
    next
}

/// Kind/content reassignment for leaves.
fn convert_leaf(index: BlockIndex, id: &str, kind: BlockKind, item_id: ItemId) -> BlockIndex {
    let Some(block) = index.get(id) else {
        debug!("event=block_convert module=engine status=noop reason=unknown_id id={id}");
        return index;
    };
    if block.is_container() || kind.is_container() {
        debug!("event=block_convert module=engine status=noop reason=section_conversion id={id}");
        return index;
    }
    if block.kind == kind && block.item_id == item_id {
        return index;
    }
    let mut next = index;
    next.set_kind_and_item(id, kind, item_id);
    next
}
