//! Service layer.
//!
//! # Responsibility
//! - Coordinate the tree engine and the content store behind one facade.
//! - Validate caller input before anything reaches the engine; the engine
//!   itself stays total and silent.

pub mod agenda_service;

pub use agenda_service::{AgendaService, AgendaServiceError};
