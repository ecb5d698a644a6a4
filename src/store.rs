//! Variant state persistence: the store interface, the in-memory store,
//! and override bookkeeping layered on top of it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{EngineError, Result};
use crate::models::{FamilyCatalog, FamilyId, VariantColorState, VariantId};

/// Read/write interface over persisted variant color records.
///
/// Writes are all-or-nothing per variant: a failed `put` must leave the
/// previously stored record intact. The engine never retries failed
/// writes; retry policy belongs to the storage collaborator.
pub trait VariantStore: Send + Sync {
    /// Reads one variant's record, if present.
    fn get(&self, variant: &VariantId) -> Result<Option<VariantColorState>>;

    /// Inserts or replaces one variant's record.
    fn put(&self, state: VariantColorState) -> Result<()>;

    /// Removes one variant's record, returning what was stored.
    fn remove(&self, variant: &VariantId) -> Result<Option<VariantColorState>>;

    /// Point-in-time copy of every record, used by facet rebuilds. The
    /// snapshot is taken at the moment of invocation; concurrent writes
    /// after that moment are not reflected.
    fn snapshot(&self) -> Result<Vec<VariantColorState>>;
}

/// In-memory variant store backed by a hash map.
///
/// Reads take the shared lock and never block behind other readers;
/// individual record writes hold the exclusive lock only for the map
/// operation itself, never across a classification.
#[derive(Debug, Default)]
pub struct InMemoryVariantStore {
    records: RwLock<HashMap<VariantId, VariantColorState>>,
}

impl InMemoryVariantStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given records.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = VariantColorState>) -> Self {
        let records = records
            .into_iter()
            .map(|state| (state.variant_id().clone(), state))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VariantStore for InMemoryVariantStore {
    fn get(&self, variant: &VariantId) -> Result<Option<VariantColorState>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(variant).cloned())
    }

    fn put(&self, state: VariantColorState) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(state.variant_id().clone(), state);
        Ok(())
    }

    fn remove(&self, variant: &VariantId) -> Result<Option<VariantColorState>> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Ok(records.remove(variant))
    }

    fn snapshot(&self) -> Result<Vec<VariantColorState>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.values().cloned().collect())
    }
}

/// Override bookkeeping over a variant store.
///
/// The variant record itself is the single source of truth for the pin
/// (`colorFamilySource` / `colorFamily`); this type owns the record
/// rewrites that pin and unpin, and validates family ids against the
/// active catalog before any write.
pub struct OverrideStore {
    store: Arc<dyn VariantStore>,
    catalog: Arc<FamilyCatalog>,
}

impl OverrideStore {
    /// Creates override bookkeeping over the given store and catalog.
    pub fn new(store: Arc<dyn VariantStore>, catalog: Arc<FamilyCatalog>) -> Self {
        Self { store, catalog }
    }

    /// The pinned family for a variant, or `None` when the variant is
    /// auto-classified or unknown.
    pub fn get_override(&self, variant: &VariantId) -> Result<Option<FamilyId>> {
        Ok(self
            .store
            .get(variant)?
            .and_then(|state| state.override_family().cloned()))
    }

    /// Pins a variant to a family, rewriting its record as `manual`.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownFamily`] if the family is not in the active
    /// catalog; [`EngineError::UnknownVariant`] if the variant has no
    /// color state yet.
    pub fn set_override(&self, variant: &VariantId, family: &FamilyId) -> Result<VariantColorState> {
        if !self.catalog.contains(family) {
            return Err(EngineError::unknown_family(family.as_str()));
        }
        let current = self.store.get(variant)?.ok_or(EngineError::UnknownVariant {
            variant: variant.to_string(),
        })?;

        let pinned =
            VariantColorState::manual(variant.clone(), current.color(), family.clone());
        self.store.put(pinned.clone())?;
        Ok(pinned)
    }

    /// Unpins a variant, rewriting its record as `auto` with the supplied
    /// reclassified family. Idempotent: unpinning an auto variant writes
    /// nothing and returns the current record.
    pub fn clear_override(
        &self,
        variant: &VariantId,
        reclassified: FamilyId,
    ) -> Result<VariantColorState> {
        let current = self.store.get(variant)?.ok_or(EngineError::UnknownVariant {
            variant: variant.to_string(),
        })?;

        if !current.is_manual() {
            return Ok(current);
        }

        let reverted = VariantColorState::auto(variant.clone(), current.color(), reclassified);
        self.store.put(reverted.clone())?;
        Ok(reverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColorValue;

    fn auto_state(id: &str, hex: &str, family: &str) -> VariantColorState {
        VariantColorState::auto(
            VariantId::from(id),
            ColorValue::parse(hex).unwrap(),
            FamilyId::from(family),
        )
    }

    fn override_store(store: Arc<InMemoryVariantStore>) -> OverrideStore {
        let catalog = Arc::new(FamilyCatalog::load_default().unwrap());
        OverrideStore::new(store, catalog)
    }

    #[test]
    fn test_put_get_remove() {
        let store = InMemoryVariantStore::new();
        let state = auto_state("v-1", "#0000FF", "blue");

        store.put(state.clone()).unwrap();
        assert_eq!(store.get(&VariantId::from("v-1")).unwrap(), Some(state.clone()));

        let removed = store.remove(&VariantId::from("v-1")).unwrap();
        assert_eq!(removed, Some(state));
        assert!(store.get(&VariantId::from("v-1")).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let store = InMemoryVariantStore::with_records(vec![
            auto_state("v-1", "#FF0000", "red"),
            auto_state("v-2", "#0000FF", "blue"),
        ]);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);

        // Later writes do not leak into the earlier snapshot.
        store.put(auto_state("v-3", "#00FF00", "green")).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_set_override_unknown_family_rejected() {
        let store = Arc::new(InMemoryVariantStore::new());
        store.put(auto_state("v-1", "#0000FF", "blue")).unwrap();
        let overrides = override_store(store.clone());

        let result =
            overrides.set_override(&VariantId::from("v-1"), &FamilyId::from("chartreuse"));
        assert!(matches!(result, Err(EngineError::UnknownFamily { .. })));

        // Record untouched by the rejected write.
        let state = store.get(&VariantId::from("v-1")).unwrap().unwrap();
        assert!(!state.is_manual());
    }

    #[test]
    fn test_set_override_unknown_variant_rejected() {
        let overrides = override_store(Arc::new(InMemoryVariantStore::new()));
        let result = overrides.set_override(&VariantId::from("ghost"), &FamilyId::from("blue"));
        assert!(matches!(result, Err(EngineError::UnknownVariant { .. })));
    }

    #[test]
    fn test_override_set_and_clear() {
        let store = Arc::new(InMemoryVariantStore::new());
        store.put(auto_state("v-1", "#00FF00", "green")).unwrap();
        let overrides = override_store(store);

        let variant = VariantId::from("v-1");
        let pinned = overrides.set_override(&variant, &FamilyId::from("gray")).unwrap();
        assert!(pinned.is_manual());
        assert_eq!(
            overrides.get_override(&variant).unwrap(),
            Some(FamilyId::from("gray"))
        );

        let reverted = overrides.clear_override(&variant, FamilyId::from("green")).unwrap();
        assert!(!reverted.is_manual());
        assert_eq!(overrides.get_override(&variant).unwrap(), None);
    }

    #[test]
    fn test_clear_override_idempotent() {
        let store = Arc::new(InMemoryVariantStore::new());
        store.put(auto_state("v-1", "#00FF00", "green")).unwrap();
        let overrides = override_store(store);

        let variant = VariantId::from("v-1");
        let first = overrides.clear_override(&variant, FamilyId::from("green")).unwrap();
        let second = overrides.clear_override(&variant, FamilyId::from("green")).unwrap();
        assert_eq!(first, second);
        assert!(!second.is_manual());
    }
}
