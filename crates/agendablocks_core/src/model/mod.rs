//! Domain model for the agenda block tree.
//!
//! # Responsibility
//! - Define the canonical block record shared by every engine layer.
//! - Keep one structural shape for all four block projections.
//!
//! # Invariants
//! - Every block is identified by a stable `BlockId`.
//! - Structural placement (`parent_id`, `order`) is decoupled from content
//!   via the `item_id` indirection key.

pub mod block;
