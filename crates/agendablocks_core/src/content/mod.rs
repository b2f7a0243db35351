//! Content payload boundary.
//!
//! # Responsibility
//! - Keep block structure and block content in separate stores, joined
//!   only by `itemId`.
//! - Give the service layer one seam to swap the backing store in tests.
//!
//! # Invariants
//! - The tree engine never reads or writes payloads; only the service
//!   layer crosses this boundary.
//! - Payload lifetime follows the referencing block: created with it,
//!   removed when the block (or an ancestor) is deleted.

use crate::model::block::ItemId;
use std::collections::HashMap;

/// Content carried by one agenda item, keyed by `itemId`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentPayload {
    pub title: String,
    pub description: Option<String>,
}

impl ContentPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
        }
    }
}

/// Storage seam for item payloads.
pub trait ContentStore {
    /// Stores `payload` under `item_id`, replacing any previous value.
    fn put(&mut self, item_id: ItemId, payload: ContentPayload);

    /// Looks up the payload for `item_id`.
    fn get(&self, item_id: &str) -> Option<&ContentPayload>;

    /// Removes and returns the payload for `item_id`, if present.
    fn remove(&mut self, item_id: &str) -> Option<ContentPayload>;
}

/// Map-backed store used by default and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    payloads: HashMap<ItemId, ContentPayload>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&mut self, item_id: ItemId, payload: ContentPayload) {
        self.payloads.insert(item_id, payload);
    }

    fn get(&self, item_id: &str) -> Option<&ContentPayload> {
        self.payloads.get(item_id)
    }

    fn remove(&mut self, item_id: &str) -> Option<ContentPayload> {
        self.payloads.remove(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentPayload, ContentStore, InMemoryContentStore};

    #[test]
    fn put_get_remove_round_trip() {
        let mut store = InMemoryContentStore::new();
        store.put(
            "item-1".to_string(),
            ContentPayload::with_description("Budget review", "Q3 numbers"),
        );

        let payload = store.get("item-1").unwrap();
        assert_eq!(payload.title, "Budget review");
        assert_eq!(payload.description.as_deref(), Some("Q3 numbers"));

        let removed = store.remove("item-1").unwrap();
        assert_eq!(removed.title, "Budget review");
        assert!(store.is_empty());
        assert!(store.remove("item-1").is_none());
    }

    #[test]
    fn put_replaces_existing_payload() {
        let mut store = InMemoryContentStore::new();
        store.put("item-1".to_string(), ContentPayload::new("first"));
        store.put("item-1".to_string(), ContentPayload::new("second"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("item-1").unwrap().title, "second");
    }
}
