//! Drop-gesture reparenting.
//!
//! # Responsibility
//! - Resolve `(active_id, hoverZone)` into a new parent and position.
//! - Apply the move while renumbering only the two affected sibling groups.
//!
//! # Invariants
//! - Pure and total: invalid or invariant-violating gestures return the
//!   input index content-equal, never a fault.
//! - Sections never acquire a parent; only sections accept `into` drops.
//! - Re-dispatching a completed move leaves the state content-equal.

use crate::engine::hover::{HoverZone, Relation};
use crate::index::{BlockIndex, ParentKey};
use log::debug;

/// Applies one drop gesture to the index.
///
/// `hover_zone` follows the `<relation>-<targetId>` grammar. Anything that
/// cannot be honored is a silent no-op: malformed zone, unknown dragged
/// id, self-target, `into` a non-section, a section gaining a parent.
/// Drop targets can legitimately vanish mid-gesture.
pub fn reparent(index: BlockIndex, active_id: &str, hover_zone: &str) -> BlockIndex {
    let Some(zone) = HoverZone::parse(hover_zone) else {
        debug!(
            "event=block_move module=engine status=noop reason=malformed_zone zone={hover_zone}"
        );
        return index;
    };

    let Some(dragged) = index.get(active_id) else {
        debug!("event=block_move module=engine status=noop reason=unknown_active id={active_id}");
        return index;
    };
    if zone.target_id == active_id {
        debug!("event=block_move module=engine status=noop reason=self_target id={active_id}");
        return index;
    }

    let target = index.get(&zone.target_id);
    let new_parent: ParentKey = match zone.relation {
        Relation::Into => match target {
            Some(block) if block.is_container() => Some(zone.target_id.clone()),
            Some(_) => {
                debug!(
                    "event=block_move module=engine status=noop reason=into_leaf target={}",
                    zone.target_id
                );
                return index;
            }
            None => {
                debug!(
                    "event=block_move module=engine status=noop reason=unknown_target target={}",
                    zone.target_id
                );
                return index;
            }
        },
        // A vanished before/after target degrades to a root append.
        Relation::Before | Relation::After => target.and_then(|block| block.parent_id.clone()),
    };

    if dragged.is_container() && new_parent.is_some() {
        debug!(
            "event=block_move module=engine status=noop reason=section_nesting id={active_id}"
        );
        return index;
    }

    let position = insertion_position(&index, active_id, &zone, &new_parent);
    move_to(index, active_id, new_parent, position)
}

/// Computes the insertion slot in the new parent group, expressed against
/// the child list with the dragged block already removed.
fn insertion_position(
    index: &BlockIndex,
    active_id: &str,
    zone: &HoverZone,
    new_parent: &ParentKey,
) -> usize {
    let siblings = index.children(new_parent.as_ref());
    let without_dragged = siblings.iter().filter(|id| *id != active_id).count();

    match zone.relation {
        Relation::Into => without_dragged,
        Relation::Before | Relation::After => {
            let target_at = siblings
                .iter()
                .filter(|id| *id != active_id)
                .position(|id| *id == zone.target_id);
            match target_at {
                Some(at) if zone.relation == Relation::After => at + 1,
                Some(at) => at,
                // Target left this group between hover and drop: append.
                None => without_dragged,
            }
        }
    }
}

/// Positional core shared by gesture handling and diff replay.
///
/// Moves `id` under `new_parent` at `position` (counted with `id` removed,
/// clamped to the group length), renumbering only the old and the new
/// sibling groups. No-ops mirror [`reparent`]: unknown id, section gaining
/// a parent, unknown or non-section parent, self-parenting.
pub(crate) fn move_to(
    index: BlockIndex,
    id: &str,
    new_parent: ParentKey,
    position: usize,
) -> BlockIndex {
    let Some(block) = index.get(id) else {
        return index;
    };
    if block.is_container() && new_parent.is_some() {
        return index;
    }
    if let Some(parent_id) = &new_parent {
        if parent_id == id {
            return index;
        }
        match index.get(parent_id) {
            Some(parent) if parent.is_container() => {}
            _ => return index,
        }
    }

    let old_parent = block.parent_id.clone();
    // Completed moves must not churn state: compare against the current
    // slot counted the same way (list without the moved block).
    if old_parent == new_parent {
        if let Some(current) = index.position(id) {
            let group_len = index.children(new_parent.as_ref()).len();
            if current == position.min(group_len.saturating_sub(1)) {
                return index;
            }
        }
    }

    let mut next = index;
    next.detach(id);
    next.attach(id, new_parent.clone(), position);
    next.renumber(&old_parent);
    if new_parent != old_parent {
        next.renumber(&new_parent);
    }
    debug!(
        "event=block_move module=engine status=ok id={id} parent={} position={position}",
        new_parent.as_deref().unwrap_or("root")
    );
    next
}
