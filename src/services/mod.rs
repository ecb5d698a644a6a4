//! Service layer for business logic.
//!
//! This module contains the services that coordinate classification,
//! override handling, and facet aggregation over the stores.

pub mod classification;
pub mod facets;

// Re-export commonly used types and functions
pub use classification::ClassificationService;
pub use facets::{CountablePredicate, FacetAggregator};
