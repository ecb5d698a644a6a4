//! Color family definitions and the family catalog.
//!
//! The catalog ships with a curated default vocabulary (black, white, gray
//! plus eight hue families) embedded as JSON, and can be replaced from a
//! file for deployments with a different vocabulary. Reference colors are
//! the classic CSS named colors, which sit close to what shoppers mean by
//! the plain color words and put the pure primaries exactly on their
//! families.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color_space::{to_perceptual, Perceptual};
use crate::error::EngineError;
use crate::models::ColorValue;

/// Identifier of a color family (e.g. "blue", "gray").
///
/// Ids are opaque lowercase strings; equality is exact. The id vocabulary
/// is deployment configuration, identical across all engine instances so
/// classifications stay reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(String);

impl FamilyId {
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

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FamilyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Near-neutral special cases claimed ahead of hue matching.
///
/// Pure hue-nearest-neighbor search misclassifies near-neutral colors: a
/// very dark desaturated navy reads as "black" to a shopper even though
/// its hue angle points at blue. Families tagged with a special case get
/// first claim on those regions of the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialCase {
    /// High lightness, low chroma.
    White,
    /// Low lightness, low chroma.
    Black,
    /// Mid lightness, low-but-nonzero chroma.
    Gray,
}

/// One entry in the family vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDefinition {
    /// Stable id used in persistence and facet keys.
    pub id: FamilyId,
    /// Display label (e.g. "Blue").
    pub label: String,
    /// Centroid for nearest-neighbor matching.
    pub reference_color: ColorValue,
    /// Near-neutral region this family claims, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_case: Option<SpecialCase>,
}

/// Raw JSON shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    families: Vec<FamilyDefinition>,
}

/// The ordered, immutable set of family definitions active for a
/// classification run.
///
/// Order matters only for tie-breaking (earliest wins), never for
/// correctness of the nearest match. Reference colors are converted to
/// perceptual coordinates once at construction and cached for the
/// catalog's lifetime.
#[derive(Debug, Clone)]
pub struct FamilyCatalog {
    families: Vec<FamilyDefinition>,
    coordinates: Vec<Perceptual>,
    by_id: HashMap<FamilyId, usize>,
}

impl FamilyCatalog {
    /// Builds a catalog from an ordered list of definitions.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CatalogInvalid`] if the list is empty or
    /// contains duplicate ids.
    pub fn new(families: Vec<FamilyDefinition>) -> Result<Self, EngineError> {
        if families.is_empty() {
            return Err(EngineError::CatalogInvalid {
                reason: "catalog must contain at least one family".to_string(),
            });
        }

        let mut by_id = HashMap::with_capacity(families.len());
        for (index, family) in families.iter().enumerate() {
            if by_id.insert(family.id.clone(), index).is_some() {
                return Err(EngineError::CatalogInvalid {
                    reason: format!("duplicate family id '{}'", family.id),
                });
            }
        }

        let coordinates = families
            .iter()
            .map(|family| to_perceptual(family.reference_color))
            .collect();

        Ok(Self {
            families,
            coordinates,
            by_id,
        })
    }

    /// Loads the built-in default vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON fails to parse, which would
    /// indicate a packaging defect.
    pub fn load_default() -> Result<Self> {
        let json_data = include_str!("../data/families.json");
        Self::from_json(json_data).context("Failed to load embedded family catalog")
    }

    /// Parses a catalog from a JSON document of the embedded format.
    pub fn from_json(json_data: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(json_data).context("Failed to parse family catalog JSON")?;
        Ok(Self::new(file.families)?)
    }

    /// Loads a catalog from a JSON file on disk.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json_data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read family catalog from {}", path.display()))?;
        Self::from_json(&json_data)
            .with_context(|| format!("Invalid family catalog in {}", path.display()))
    }

    /// Returns true if the id exists in this catalog.
    #[must_use]
    pub fn contains(&self, id: &FamilyId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn get(&self, id: &FamilyId) -> Option<&FamilyDefinition> {
        self.by_id.get(id).map(|&index| &self.families[index])
    }

    /// Iterates definitions in catalog order, paired with their cached
    /// perceptual coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (&FamilyDefinition, Perceptual)> {
        self.families
            .iter()
            .zip(self.coordinates.iter().copied())
    }

    /// Number of families in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Returns true if the catalog has no families (never true for a
    /// successfully constructed catalog).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// All family ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &FamilyId> {
        self.families.iter().map(|family| &family.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_catalog() {
        let catalog = FamilyCatalog::load_default().expect("Failed to load catalog");
        assert_eq!(catalog.len(), 11);

        // The minimum vocabulary is present.
        for id in [
            "black", "white", "gray", "red", "orange", "yellow", "green", "blue", "purple",
            "pink", "brown",
        ] {
            assert!(catalog.contains(&FamilyId::from(id)), "missing family {id}");
        }
    }

    #[test]
    fn test_default_catalog_order() {
        let catalog = FamilyCatalog::load_default().unwrap();
        let ids: Vec<&str> = catalog.ids().map(FamilyId::as_str).collect();
        assert_eq!(ids[0], "black");
        assert_eq!(ids[1], "white");
        assert_eq!(ids[2], "gray");
    }

    #[test]
    fn test_special_cases_tagged() {
        let catalog = FamilyCatalog::load_default().unwrap();
        let black = catalog.get(&FamilyId::from("black")).unwrap();
        assert_eq!(black.special_case, Some(SpecialCase::Black));

        let blue = catalog.get(&FamilyId::from("blue")).unwrap();
        assert_eq!(blue.special_case, None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let def = |id: &str| FamilyDefinition {
            id: FamilyId::from(id),
            label: id.to_string(),
            reference_color: ColorValue::from_rgb(10, 20, 30),
            special_case: None,
        };
        let result = FamilyCatalog::new(vec![def("blue"), def("blue")]);
        assert!(matches!(result, Err(EngineError::CatalogInvalid { .. })));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let result = FamilyCatalog::new(Vec::new());
        assert!(matches!(result, Err(EngineError::CatalogInvalid { .. })));
    }

    #[test]
    fn test_coordinates_cached_in_order() {
        let catalog = FamilyCatalog::load_default().unwrap();
        let (first, coords) = catalog.iter().next().unwrap();
        assert_eq!(first.id.as_str(), "black");
        assert!(coords.lightness.abs() < 0.01);
    }
}
