//! Per-family facet counts for storefront filter navigation.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::models::{FamilyChanged, FamilyId, VariantColorState, VariantId};

/// Predicate deciding whether a variant participates in facet counts
/// (typically "active and in stock" per the external catalog).
pub type CountablePredicate = Box<dyn Fn(&VariantId) -> bool + Send + Sync>;

/// Maintains per-family variant counts incrementally from change events,
/// with a full rebuild path for repair.
///
/// Counts are advisory UI aggregates: a read may trail a concurrent
/// transition, but the decrement/increment pair of a single event is
/// applied in one critical section and is never observed half-applied.
pub struct FacetAggregator {
    counts: Mutex<BTreeMap<FamilyId, u64>>,
    countable: CountablePredicate,
}

impl FacetAggregator {
    /// Aggregator counting every variant.
    #[must_use]
    pub fn new() -> Self {
        Self::with_countable(Box::new(|_| true))
    }

    /// Aggregator counting only variants accepted by the predicate.
    #[must_use]
    pub fn with_countable(countable: CountablePredicate) -> Self {
        Self {
            counts: Mutex::new(BTreeMap::new()),
            countable,
        }
    }

    /// Applies one effective-family change: decrement the old family,
    /// increment the new one, both inside a single critical section.
    pub fn apply(&self, event: &FamilyChanged) {
        if !(self.countable)(&event.variant_id) {
            debug!(variant = %event.variant_id, "skipping facet update for non-countable variant");
            return;
        }

        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(old_family) = &event.old_family {
            match counts.get_mut(old_family) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    counts.remove(old_family);
                }
                None => {
                    // Stale event relative to the last rebuild; counts are
                    // advisory, so log and move on rather than underflow.
                    warn!(
                        variant = %event.variant_id,
                        family = %old_family,
                        "facet decrement for family with no recorded count"
                    );
                }
            }
        }

        if let Some(new_family) = &event.new_family {
            *counts.entry(new_family.clone()).or_insert(0) += 1;
        }

        debug!(
            variant = %event.variant_id,
            old = event.old_family.as_ref().map(FamilyId::as_str),
            new = event.new_family.as_ref().map(FamilyId::as_str),
            "facet counts updated"
        );
    }

    /// Current counts per family. Families with zero variants are absent.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<FamilyId, u64> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recomputes all counts from a store snapshot and installs the
    /// result, returning it.
    ///
    /// Idempotent: rebuilding twice from the same snapshot yields the
    /// same counts, and a rebuild interrupted before the final install
    /// leaves the previous counts in place.
    pub fn rebuild_all(&self, snapshot: &[VariantColorState]) -> BTreeMap<FamilyId, u64> {
        let mut rebuilt: BTreeMap<FamilyId, u64> = BTreeMap::new();
        for state in snapshot {
            if (self.countable)(state.variant_id()) {
                *rebuilt.entry(state.effective_family().clone()).or_insert(0) += 1;
            }
        }

        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts = rebuilt.clone();
        info!(
            families = rebuilt.len(),
            variants = snapshot.len(),
            "facet counts rebuilt"
        );
        rebuilt
    }
}

impl Default for FacetAggregator {
    fn default() -> Self {
        Self::new()
    }
}
