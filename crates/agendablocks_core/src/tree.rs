//! Nested tree materialization for visualization.
//!
//! # Responsibility
//! - Build a depth-annotated nested tree from a flat working set, plus an
//!   optional extra set (e.g. recently removed blocks for a before/after
//!   pending-changes view).
//!
//! # Invariants
//! - First occurrence of an id wins when the sets overlap.
//! - A block whose parent is absent from the merged set becomes a root.
//! - Children are sorted by `order` at every level; `depth` is 0 for roots.

use crate::model::block::Block;
use std::collections::HashMap;

/// One node of the nested view tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub block: Block,
    /// Nesting level; 0 for roots.
    pub depth: u32,
    /// Child nodes sorted by `order`.
    pub children: Vec<TreeNode>,
}

/// Builds the nested tree from `blocks` merged with `extra`.
///
/// Pure helper: inputs are read only. Blocks unreachable from any root
/// (mutually-parented cycles in raw input) are dropped, matching the
/// flat-walk semantics of the index.
pub fn build_tree(blocks: &[Block], extra: &[Block]) -> Vec<TreeNode> {
    let mut merged: Vec<&Block> = Vec::with_capacity(blocks.len() + extra.len());
    let mut seen: HashMap<&str, ()> = HashMap::with_capacity(blocks.len() + extra.len());
    for block in blocks.iter().chain(extra) {
        if seen.insert(block.id.as_str(), ()).is_none() {
            merged.push(block);
        }
    }

    let mut child_ids: HashMap<&str, Vec<&Block>> = HashMap::new();
    let mut roots: Vec<&Block> = Vec::new();
    for block in &merged {
        match block.parent_id.as_deref() {
            Some(parent) if seen.contains_key(parent) => {
                child_ids.entry(parent).or_default().push(block);
            }
            _ => roots.push(block),
        }
    }
    for children in child_ids.values_mut() {
        children.sort_by_key(|block| block.order);
    }
    roots.sort_by_key(|block| block.order);

    // Iterative assembly: attach deepest levels first so each parent's
    // children are complete before the parent itself is consumed.
    let mut depth_of: HashMap<&str, u32> = HashMap::new();
    let mut levels: Vec<Vec<&Block>> = vec![roots.clone()];
    for block in &roots {
        depth_of.insert(block.id.as_str(), 0);
    }
    let mut level = 0;
    while level < levels.len() {
        let mut next_level: Vec<&Block> = Vec::new();
        for parent in &levels[level] {
            if let Some(children) = child_ids.get(parent.id.as_str()) {
                for child in children {
                    if depth_of.contains_key(child.id.as_str()) {
                        continue;
                    }
                    depth_of.insert(child.id.as_str(), level as u32 + 1);
                    next_level.push(child);
                }
            }
        }
        if next_level.is_empty() {
            break;
        }
        levels.push(next_level);
        level += 1;
    }

    let mut nodes: HashMap<&str, TreeNode> = HashMap::new();
    for level_blocks in &levels {
        for block in level_blocks {
            nodes.insert(
                block.id.as_str(),
                TreeNode {
                    block: (*block).clone(),
                    depth: depth_of[block.id.as_str()],
                    children: Vec::new(),
                },
            );
        }
    }
    for level_blocks in levels.iter().rev() {
        for parent in level_blocks {
            let Some(children) = child_ids.get(parent.id.as_str()) else {
                continue;
            };
            let mut attached = Vec::with_capacity(children.len());
            for child in children {
                if let Some(node) = nodes.remove(child.id.as_str()) {
                    attached.push(node);
                }
            }
            if let Some(parent_node) = nodes.get_mut(parent.id.as_str()) {
                parent_node.children = attached;
            }
        }
    }

    roots
        .iter()
        .filter_map(|block| nodes.remove(block.id.as_str()))
        .collect()
}
