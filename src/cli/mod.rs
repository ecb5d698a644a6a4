//! CLI command handlers for colorfacet.
//!
//! This module provides headless, scriptable access to the engine's core
//! functionality for automation, testing, and batch catalog maintenance.

pub mod apply;
pub mod classify;
pub mod common;
pub mod facets;
pub mod pin;

// Re-export types used by main.rs and tests
pub use apply::ApplyArgs;
pub use classify::{ClassifyArgs, FamiliesArgs};
pub use common::{CliError, CliResult, ExitCode};
pub use facets::{FacetsArgs, ShowArgs};
pub use pin::{PinArgs, UnpinArgs};
