//! Agenda block use-case service.
//!
//! # Responsibility
//! - Validate caller input above the engine layer.
//! - Keep block structure and item payloads in lockstep across create,
//!   delete, and convert.
//! - Track the committed baseline for pending-change diffs.
//!
//! # Invariants
//! - Titles must not be blank after trim.
//! - Parent must exist and be a section when provided.
//! - Payloads are removed for every block a cascade deletes.
//! - Gesture moves keep the engine's no-op semantics: a rejected drop is
//!   not a service error.

use crate::content::{ContentPayload, ContentStore};
use crate::engine::reducer::{reduce, BlockAction};
use crate::index::BlockIndex;
use crate::model::block::{Block, BlockId, BlockKind, ItemId};
use crate::serialize::diff::{diff, BlockDiff};
use crate::serialize::{decode_verified, encode, CodecError, SerializedBlocks};
use crate::tree::{build_tree, TreeNode};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from agenda service operations.
#[derive(Debug)]
pub enum AgendaServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Target block does not exist.
    BlockNotFound(BlockId),
    /// Parent block does not exist.
    ParentNotFound(BlockId),
    /// Parent exists but is not section kind.
    ParentMustBeSection(BlockId),
    /// Operation requires a leaf kind but got `section`.
    LeafKindRequired,
    /// Payload or diff failed to decode or verify.
    Codec(CodecError),
}

impl Display for AgendaServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::BlockNotFound(id) => write!(f, "block not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent block not found: {id}"),
            Self::ParentMustBeSection(id) => write!(f, "parent must be a section: {id}"),
            Self::LeafKindRequired => write!(f, "operation requires a leaf kind"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AgendaServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for AgendaServiceError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Agenda service facade over one block tree and one content store.
pub struct AgendaService<S: ContentStore> {
    index: BlockIndex,
    baseline: Vec<Block>,
    store: S,
}

impl<S: ContentStore> AgendaService<S> {
    /// Creates an empty service from a content store implementation.
    pub fn new(store: S) -> Self {
        Self {
            index: BlockIndex::default(),
            baseline: Vec::new(),
            store,
        }
    }

    /// Replaces the working tree from a flat snapshot and resets the
    /// committed baseline to it.
    pub fn load(&mut self, blocks: Vec<Block>) {
        self.index = reduce(self.index.clone(), BlockAction::SetAll(blocks));
        self.baseline = self.index.materialize();
        info!(
            "event=agenda_load module=service status=ok blocks={}",
            self.index.len()
        );
    }

    /// Loads a verified wire payload, replacing tree and baseline.
    pub fn load_serialized(&mut self, payload: &SerializedBlocks) -> Result<(), AgendaServiceError> {
        let blocks = decode_verified(payload)?;
        self.load(blocks);
        Ok(())
    }

    /// Creates one section at the end of the root group.
    pub fn create_section(
        &mut self,
        title: impl Into<String>,
    ) -> Result<BlockId, AgendaServiceError> {
        let normalized = normalize_title(title.into())?;
        let block = Block::new(BlockKind::Section, None);
        let id = block.id.clone();
        let position = self.index.children(None).len();
        self.store
            .put(block.item_id.clone(), ContentPayload::new(normalized));
        self.index = reduce(
            self.index.clone(),
            BlockAction::Insert {
                block,
                parent_id: None,
                position,
            },
        );
        info!("event=block_create module=service status=ok kind=section id={id}");
        Ok(id)
    }

    /// Creates one leaf block at the end of `parent_id`'s group (root when
    /// `None`).
    pub fn create_item(
        &mut self,
        kind: BlockKind,
        parent_id: Option<BlockId>,
        title: impl Into<String>,
    ) -> Result<BlockId, AgendaServiceError> {
        let position = self.index.children(parent_id.as_ref()).len();
        self.insert_item(kind, parent_id, position, title)
    }

    /// Creates one leaf block at an explicit position among its siblings.
    pub fn insert_item(
        &mut self,
        kind: BlockKind,
        parent_id: Option<BlockId>,
        position: usize,
        title: impl Into<String>,
    ) -> Result<BlockId, AgendaServiceError> {
        let normalized = normalize_title(title.into())?;
        if kind.is_container() {
            return Err(AgendaServiceError::LeafKindRequired);
        }
        if let Some(parent_id) = &parent_id {
            self.ensure_parent_is_section(parent_id)?;
        }

        let block = Block::new(kind, parent_id.clone());
        let id = block.id.clone();
        self.store
            .put(block.item_id.clone(), ContentPayload::new(normalized));
        self.index = reduce(
            self.index.clone(),
            BlockAction::Insert {
                block,
                parent_id,
                position,
            },
        );
        info!(
            "event=block_create module=service status=ok kind={} id={id}",
            kind.as_str()
        );
        Ok(id)
    }

    /// Deletes one block, its transitive descendants, and their payloads.
    pub fn delete_block(&mut self, id: &str) -> Result<(), AgendaServiceError> {
        if !self.index.contains(id) {
            return Err(AgendaServiceError::BlockNotFound(id.to_string()));
        }
        let doomed = self.index.descendants(id);
        for member in &doomed {
            if let Some(block) = self.index.get(member) {
                self.store.remove(&block.item_id);
            }
        }
        self.index = reduce(
            self.index.clone(),
            BlockAction::Delete { id: id.to_string() },
        );
        info!(
            "event=block_delete module=service status=ok id={id} removed={}",
            doomed.len()
        );
        Ok(())
    }

    /// Applies one drop gesture. Invalid gestures leave the tree untouched.
    pub fn move_block(&mut self, active_id: &str, hover_zone: &str) {
        self.index = reduce(
            self.index.clone(),
            BlockAction::Move {
                active_id: active_id.to_string(),
                hover_zone: hover_zone.to_string(),
            },
        );
    }

    /// Converts a leaf to another leaf kind under a fresh content key,
    /// migrating its payload. Returns the new `itemId`.
    pub fn convert_item(
        &mut self,
        id: &str,
        kind: BlockKind,
    ) -> Result<ItemId, AgendaServiceError> {
        let block = self
            .index
            .get(id)
            .ok_or_else(|| AgendaServiceError::BlockNotFound(id.to_string()))?;
        if block.is_container() || kind.is_container() {
            return Err(AgendaServiceError::LeafKindRequired);
        }

        let payload = self.store.remove(&block.item_id).unwrap_or_default();
        let new_item_id: ItemId = uuid::Uuid::new_v4().to_string();
        self.store.put(new_item_id.clone(), payload);
        self.index = reduce(
            self.index.clone(),
            BlockAction::Convert {
                id: id.to_string(),
                kind,
                item_id: new_item_id.clone(),
            },
        );
        info!(
            "event=block_convert module=service status=ok id={id} kind={}",
            kind.as_str()
        );
        Ok(new_item_id)
    }

    /// Computes the structural delta between the committed baseline and the
    /// working tree.
    pub fn pending_changes(&self) -> Result<BlockDiff, AgendaServiceError> {
        Ok(diff(&self.baseline, &self.index.materialize())?)
    }

    /// Encodes the working tree and advances the baseline to it.
    pub fn commit(&mut self) -> Result<SerializedBlocks, AgendaServiceError> {
        let payload = encode(&self.index)?;
        self.baseline = self.index.materialize();
        info!(
            "event=agenda_commit module=service status=ok blocks={} hash={}",
            self.index.len(),
            payload.hash
        );
        Ok(payload)
    }

    /// Replays a remote delta onto the working tree and folds it into the
    /// baseline. The diff's carried hash is verified before anything runs.
    pub fn apply_remote(&mut self, delta: &BlockDiff) -> Result<(), AgendaServiceError> {
        let actual = delta.computed_hash()?;
        if actual != delta.hash {
            return Err(AgendaServiceError::Codec(CodecError::HashMismatch {
                expected: delta.hash.clone(),
                actual,
            }));
        }
        self.index = reduce(self.index.clone(), BlockAction::ApplyDiff(delta.clone()));
        self.baseline = self.index.materialize();
        info!(
            "event=agenda_apply_remote module=service status=ok added={} removed={} changed={}",
            delta.added.len(),
            delta.removed.len(),
            delta.changed.len()
        );
        Ok(())
    }

    /// Flat snapshot of the working tree in canonical walk order.
    pub fn blocks(&self) -> Vec<Block> {
        self.index.materialize()
    }

    /// Nested view of the working tree.
    pub fn tree(&self) -> Vec<TreeNode> {
        build_tree(&self.index.materialize(), &[])
    }

    /// Payload lookup for one block.
    pub fn content(&self, id: &str) -> Option<&ContentPayload> {
        let block = self.index.get(id)?;
        self.store.get(&block.item_id)
    }

    fn ensure_parent_is_section(&self, parent_id: &str) -> Result<(), AgendaServiceError> {
        let parent = self
            .index
            .get(parent_id)
            .ok_or_else(|| AgendaServiceError::ParentNotFound(parent_id.to_string()))?;
        if !parent.is_container() {
            return Err(AgendaServiceError::ParentMustBeSection(
                parent_id.to_string(),
            ));
        }
        Ok(())
    }
}

fn normalize_title(value: String) -> Result<String, AgendaServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AgendaServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
