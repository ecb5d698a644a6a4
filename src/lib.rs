//! Color classification and override engine.
//!
//! This library maps arbitrary hex color values recorded on product
//! variants to a small fixed vocabulary of color families, supports manual
//! overrides that take precedence over automatic detection, and keeps
//! catalog-wide facet counts consistent as colors and overrides change.

// Module declarations
pub mod classifier;
pub mod cli;
pub mod color_space;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
