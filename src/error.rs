//! Error taxonomy for the classification engine.
//!
//! All engine operations return [`EngineError`] so callers (CLI, admin
//! tooling, storefront adapters) can branch on the failure class instead
//! of matching on message strings.

use thiserror::Error;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error types surfaced by the classification engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed hex color, rejected at the validation boundary.
    /// Variant state is never touched when this is returned.
    #[error("invalid color format '{value}': expected 6 hex digits (#RRGGBB)")]
    InvalidColorFormat {
        /// The rejected input, as received.
        value: String,
    },

    /// An override or classification referenced a family id that is not
    /// in the active catalog.
    #[error("unknown color family '{family}'")]
    UnknownFamily {
        /// The unrecognized family id.
        family: String,
    },

    /// The variant has no color state recorded.
    #[error("unknown variant '{variant}'")]
    UnknownVariant {
        /// The unrecognized variant id.
        variant: String,
    },

    /// The backing store rejected a write. The transition was not applied;
    /// the caller owns the retry.
    #[error("persistence failed: {reason}")]
    PersistenceFailed {
        /// Store-provided failure detail.
        reason: String,
    },

    /// A stored family id no longer exists in the current catalog.
    /// Surfaced by effective-family reads; a rebuild resolves the record
    /// by reclassifying as Auto.
    #[error("stored family '{family}' is not in the active catalog")]
    CatalogMismatch {
        /// The stale family id.
        family: String,
    },

    /// The family catalog itself failed validation at construction time.
    #[error("invalid family catalog: {reason}")]
    CatalogInvalid {
        /// What made the catalog unusable.
        reason: String,
    },
}

impl EngineError {
    /// Shorthand constructor for [`EngineError::UnknownFamily`].
    pub fn unknown_family(family: impl Into<String>) -> Self {
        Self::UnknownFamily {
            family: family.into(),
        }
    }

    /// Shorthand constructor for [`EngineError::PersistenceFailed`].
    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::PersistenceFailed {
            reason: reason.into(),
        }
    }
}
