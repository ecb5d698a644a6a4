//! Per-variant color state: the color, its classification source, and the
//! effective family shown in facets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{ColorValue, FamilyId};

/// Identifier of a product variant. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// Wraps a raw id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VariantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Where a variant's effective family comes from.
///
/// The manual override family lives inside the `Manual` arm, so "manual
/// with no override" cannot be represented at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSource {
    /// Classified automatically from the variant's color.
    Auto,
    /// Pinned by an operator; survives color edits until explicitly cleared.
    Manual(FamilyId),
}

/// Color state of one catalog variant.
///
/// Construction goes through [`VariantColorState::auto`] and
/// [`VariantColorState::manual`], which keep `effective_family` consistent
/// with the source by construction. The struct is immutable; transitions
/// produce a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredVariant", into = "StoredVariant")]
pub struct VariantColorState {
    variant_id: VariantId,
    color: ColorValue,
    source: ColorSource,
    effective_family: FamilyId,
}

impl VariantColorState {
    /// State for an automatically classified variant.
    #[must_use]
    pub fn auto(variant_id: VariantId, color: ColorValue, classified: FamilyId) -> Self {
        Self {
            variant_id,
            color,
            source: ColorSource::Auto,
            effective_family: classified,
        }
    }

    /// State for a manually pinned variant. The effective family is the
    /// pinned family, always.
    #[must_use]
    pub fn manual(variant_id: VariantId, color: ColorValue, pinned: FamilyId) -> Self {
        Self {
            variant_id,
            color,
            source: ColorSource::Manual(pinned.clone()),
            effective_family: pinned,
        }
    }

    /// The variant this state belongs to.
    #[must_use]
    pub fn variant_id(&self) -> &VariantId {
        &self.variant_id
    }

    /// The variant's recorded color.
    #[must_use]
    pub fn color(&self) -> ColorValue {
        self.color
    }

    /// Auto or Manual source.
    #[must_use]
    pub fn source(&self) -> &ColorSource {
        &self.source
    }

    /// The family used for display and facet counting.
    #[must_use]
    pub fn effective_family(&self) -> &FamilyId {
        &self.effective_family
    }

    /// The pinned family, if the variant is manually overridden.
    #[must_use]
    pub fn override_family(&self) -> Option<&FamilyId> {
        match &self.source {
            ColorSource::Auto => None,
            ColorSource::Manual(family) => Some(family),
        }
    }

    /// True when an operator override is in force.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self.source, ColorSource::Manual(_))
    }
}

/// Change notification emitted whenever a transition alters a variant's
/// effective family. `old_family` is `None` on first classification;
/// `new_family` is `None` when the variant is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyChanged {
    /// The variant whose family changed.
    pub variant_id: VariantId,
    /// Family counted before the transition, if any.
    pub old_family: Option<FamilyId>,
    /// Family counted after the transition, if any.
    pub new_family: Option<FamilyId>,
}

/// Persisted record layout: `color` as a hex string, `colorFamilySource`
/// as `auto`/`manual`, and `colorFamily` always carrying the effective id.
/// This shape is fixed for store compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredVariant {
    variant_id: VariantId,
    color: ColorValue,
    color_family_source: StoredSource,
    color_family: FamilyId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoredSource {
    Auto,
    Manual,
}

impl From<VariantColorState> for StoredVariant {
    fn from(state: VariantColorState) -> Self {
        let source = if state.is_manual() {
            StoredSource::Manual
        } else {
            StoredSource::Auto
        };
        Self {
            variant_id: state.variant_id,
            color: state.color,
            color_family_source: source,
            color_family: state.effective_family,
        }
    }
}

impl TryFrom<StoredVariant> for VariantColorState {
    type Error = EngineError;

    fn try_from(stored: StoredVariant) -> Result<Self, Self::Error> {
        let state = match stored.color_family_source {
            StoredSource::Auto => {
                Self::auto(stored.variant_id, stored.color, stored.color_family)
            }
            StoredSource::Manual => {
                Self::manual(stored.variant_id, stored.color, stored.color_family)
            }
        };
        Ok(state)
    }
}
