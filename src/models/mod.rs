//! Data models for colors, family definitions, and variant state.
//!
//! This module contains the core data structures used throughout the engine.
//! Models are designed to be independent of the service layer and to make
//! invalid states (malformed colors, a manual source with no override)
//! unrepresentable by construction.

pub mod color;
pub mod family;
pub mod variant;

// Re-export all model types
pub use color::ColorValue;
pub use family::{FamilyCatalog, FamilyDefinition, FamilyId, SpecialCase};
pub use variant::{ColorSource, FamilyChanged, VariantColorState, VariantId};
