//! Drop-zone descriptor grammar.
//!
//! # Responsibility
//! - Parse the `<relation>-<targetId>` strings supplied by the drag source.
//!
//! # Invariants
//! - Grammar is exactly `^(before|after|into)-[A-Za-z0-9-]+$`.
//! - Parsing never panics; malformed input is `None` and callers treat it
//!   as a no-op gesture.

use crate::model::block::BlockId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static HOVER_ZONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(before|after|into)-([A-Za-z0-9-]+)$").expect("valid hover zone regex")
});

/// Placement of a dragged block relative to the zone's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Adopt the target's parent, immediately before the target.
    Before,
    /// Adopt the target's parent, immediately after the target.
    After,
    /// Become the target container's last child.
    Into,
}

impl Relation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Into => "into",
        }
    }
}

/// Parsed drop-zone descriptor: a relation plus the target block id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverZone {
    pub relation: Relation,
    pub target_id: BlockId,
}

impl HoverZone {
    /// Parses a raw zone string. Returns `None` on anything outside the
    /// grammar, including an empty target id.
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = HOVER_ZONE_RE.captures(raw)?;
        let relation = match &captures[1] {
            "before" => Relation::Before,
            "after" => Relation::After,
            "into" => Relation::Into,
            _ => return None,
        };
        Some(Self {
            relation,
            target_id: captures[2].to_string(),
        })
    }

    /// Builds a `before-<id>` zone.
    pub fn before(target_id: impl Into<BlockId>) -> Self {
        Self {
            relation: Relation::Before,
            target_id: target_id.into(),
        }
    }

    /// Builds an `after-<id>` zone.
    pub fn after(target_id: impl Into<BlockId>) -> Self {
        Self {
            relation: Relation::After,
            target_id: target_id.into(),
        }
    }

    /// Builds an `into-<id>` zone.
    pub fn into_container(target_id: impl Into<BlockId>) -> Self {
        Self {
            relation: Relation::Into,
            target_id: target_id.into(),
        }
    }
}

impl Display for HoverZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.relation.as_str(), self.target_id)
    }
}
