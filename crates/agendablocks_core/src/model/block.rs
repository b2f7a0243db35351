//! Block domain model.
//!
//! # Responsibility
//! - Define the canonical record for every node in the agenda tree.
//! - Provide constructors that assign fresh stable identity.
//!
//! # Invariants
//! - `id` is stable and never reused for another block.
//! - A `Section` block never carries a non-null `parent_id`.
//! - `item_id` is reassigned only by the explicit convert operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every block in the tree.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
/// Ids are opaque strings: fresh blocks get UUIDv4 text, imported blocks
/// keep whatever identity the wire payload carried.
pub type BlockId = String;

/// Indirection key linking a block to its externally-owned content payload.
///
/// Content (titles, descriptions) lives behind the [`crate::content::ContentStore`]
/// boundary; the engine only moves this key around.
pub type ItemId = String;

/// Closed set of block categories.
///
/// `Section` is the single container kind; the other three are leaves.
/// Any extension of this enum must keep "containers never have a parent"
/// true, because acyclicity of the tree rests on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    /// Grouping container. The only kind that may have children.
    Section,
    /// Discussion topic leaf.
    Topic,
    /// Objective leaf.
    Objective,
    /// Action item leaf.
    ActionItem,
}

impl BlockKind {
    /// Returns whether this kind may contain children.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Section)
    }

    /// Returns the wire tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Topic => "topic",
            Self::Objective => "objective",
            Self::ActionItem => "action-item",
        }
    }
}

/// Canonical structural record for one node in the agenda tree.
///
/// The record intentionally holds placement only; content is reached
/// through `item_id`, so text can be authored independently of where the
/// block sits in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Stable global ID used for lookups, diffing and replay.
    pub id: BlockId,
    /// Serialized as `type` to match the wire schema naming.
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Parent section ID. `None` means root-level block.
    #[serde(rename = "parentId")]
    pub parent_id: Option<BlockId>,
    /// Rank among siblings. A cache of list position; the per-parent child
    /// list is authoritative and `order` is rewritten from it on read.
    pub order: u32,
    /// Key into the external content store.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
}

impl Block {
    /// Creates a block with fresh `id` and `item_id`.
    ///
    /// # Invariants
    /// - Generated ids are UUIDv4 text and globally unique.
    /// - `order` starts at 0; placement assigns the real rank.
    pub fn new(kind: BlockKind, parent_id: Option<BlockId>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            parent_id,
            order: 0,
            item_id: Uuid::new_v4().to_string(),
        }
    }

    /// Creates a block with caller-provided identity.
    ///
    /// Used by import/replay paths where identity already exists externally.
    pub fn with_ids(
        id: impl Into<BlockId>,
        kind: BlockKind,
        parent_id: Option<BlockId>,
        order: u32,
        item_id: impl Into<ItemId>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id,
            order,
            item_id: item_id.into(),
        }
    }

    /// Returns whether this block may contain children.
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, BlockKind};

    #[test]
    fn kind_tags_match_wire_schema() {
        assert_eq!(BlockKind::Section.as_str(), "section");
        assert_eq!(BlockKind::ActionItem.as_str(), "action-item");
        let json = serde_json::to_string(&BlockKind::ActionItem).unwrap();
        assert_eq!(json, "\"action-item\"");
    }

    #[test]
    fn only_section_is_container() {
        assert!(BlockKind::Section.is_container());
        assert!(!BlockKind::Topic.is_container());
        assert!(!BlockKind::Objective.is_container());
        assert!(!BlockKind::ActionItem.is_container());
    }

    #[test]
    fn new_blocks_get_distinct_identity() {
        let a = Block::new(BlockKind::Topic, None);
        let b = Block::new(BlockKind::Topic, None);
        assert_ne!(a.id, b.id);
        assert_ne!(a.item_id, b.item_id);
    }

    #[test]
    fn block_serializes_with_external_field_names() {
        let block = Block::with_ids("b1", BlockKind::Topic, Some("s1".to_string()), 2, "i1");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "topic");
        assert_eq!(json["parentId"], "s1");
        assert_eq!(json["itemId"], "i1");
        assert_eq!(json["order"], 2);
    }
}
