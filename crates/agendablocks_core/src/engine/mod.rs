//! Structural transition engine.
//!
//! # Responsibility
//! - Interpret drop gestures into reparent/reorder edits (`reparent`).
//! - Provide the full set of structural transitions as a total reducer
//!   (`reducer`).
//!
//! # Invariants
//! - Every transition is a pure value-to-value function; invalid requests
//!   are no-ops that return the input state content-equal.
//! - Container blocks never acquire a parent, on any code path.

pub mod hover;
pub mod reducer;
pub mod reparent;
