//! Core engine for the agenda block tree.
//! This crate is the single source of truth for block-tree invariants.

pub mod content;
pub mod engine;
pub mod index;
pub mod logging;
pub mod model;
pub mod serialize;
pub mod service;
pub mod tree;

pub use content::{ContentPayload, ContentStore, InMemoryContentStore};
pub use engine::hover::{HoverZone, Relation};
pub use engine::reducer::{reduce, BlockAction};
pub use engine::reparent::reparent;
pub use index::{BlockIndex, ParentKey};
pub use logging::{default_log_level, init_logging, log_dir};
pub use model::block::{Block, BlockId, BlockKind, ItemId};
pub use serialize::diff::{apply_diff, diff, BlockDiff};
pub use serialize::{
    canonical_tuples, decode, decode_verified, encode, CodecError, CodecResult, SerializedBlocks,
    WireBlock,
};
pub use service::{AgendaService, AgendaServiceError};
pub use tree::{build_tree, TreeNode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
