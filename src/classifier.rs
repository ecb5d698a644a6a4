//! Nearest-family classification over perceptual coordinates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::color_space::{to_perceptual, Perceptual};
use crate::models::{ColorValue, FamilyCatalog, FamilyDefinition, FamilyId, SpecialCase};

/// Tunable thresholds and weights for classification.
///
/// The defaults were validated against a labeled swatch set (see the
/// classifier tests); treat them as product tuning, not physical constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierTuning {
    /// Lightness at or above which a low-chroma color reads as white.
    pub white_min_lightness: f32,
    /// Lightness at or below which a low-chroma color reads as black.
    pub black_max_lightness: f32,
    /// Chroma below which the white/black special cases apply.
    pub neutral_max_chroma: f32,
    /// Chroma below which a mid-lightness color reads as gray. Slightly
    /// wider than `neutral_max_chroma` so washed-out mid tones land on
    /// gray instead of a noisy hue match.
    pub gray_max_chroma: f32,
    /// Weight applied to the lightness difference.
    pub lightness_weight: f32,
    /// Weight applied to the chroma difference. Kept low: shoppers group
    /// a pale blue and a vivid blue under the same family.
    pub chroma_weight: f32,
    /// Weight applied to the circular hue difference (in degrees). Hue
    /// carries most of the family signal.
    pub hue_weight: f32,
    /// Distances within this epsilon are considered tied; the family
    /// earliest in catalog order wins.
    pub tie_epsilon: f32,
}

impl Default for ClassifierTuning {
    fn default() -> Self {
        Self {
            white_min_lightness: 90.0,
            black_max_lightness: 22.0,
            neutral_max_chroma: 9.0,
            gray_max_chroma: 12.0,
            lightness_weight: 1.0,
            chroma_weight: 0.45,
            hue_weight: 2.0,
            tie_epsilon: 0.001,
        }
    }
}

/// Outcome of classifying one color. Produced fresh per call and never
/// persisted by the classifier itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// The winning family id.
    pub family: FamilyId,
    /// Weighted perceptual distance to the winning family's reference.
    /// Zero for special-case matches.
    pub distance: f32,
    /// True when the near-neutral special-case pass decided the match.
    pub matched_by_special_case: bool,
}

/// Pure nearest-family classifier over an immutable catalog.
///
/// Identical input always yields an identical result: the catalog is fixed
/// for the classifier's lifetime, ties resolve by catalog order, and the
/// color math has no ambient inputs.
#[derive(Debug, Clone)]
pub struct Classifier {
    catalog: Arc<FamilyCatalog>,
    tuning: ClassifierTuning,
}

impl Classifier {
    /// Creates a classifier over the given catalog with the given tuning.
    #[must_use]
    pub fn new(catalog: Arc<FamilyCatalog>, tuning: ClassifierTuning) -> Self {
        Self { catalog, tuning }
    }

    /// Creates a classifier with default tuning.
    #[must_use]
    pub fn with_defaults(catalog: Arc<FamilyCatalog>) -> Self {
        Self::new(catalog, ClassifierTuning::default())
    }

    /// The catalog this classifier matches against.
    #[must_use]
    pub fn catalog(&self) -> &FamilyCatalog {
        &self.catalog
    }

    /// Classifies a color to its nearest family.
    ///
    /// Near-neutral colors are claimed by the white/black/gray special
    /// cases first; everything else goes to the minimum weighted distance
    /// over the hue families, ties broken by catalog order.
    #[must_use]
    pub fn classify(&self, color: ColorValue) -> ClassificationResult {
        let point = to_perceptual(color);

        if let Some(family) = self.match_special_case(point) {
            return ClassificationResult {
                family: family.id.clone(),
                distance: 0.0,
                matched_by_special_case: true,
            };
        }

        self.nearest_by_distance(point)
    }

    /// First special-case family (in catalog order) whose near-neutral
    /// region contains the point, if any.
    fn match_special_case(&self, point: Perceptual) -> Option<&FamilyDefinition> {
        let t = &self.tuning;
        self.catalog.iter().map(|(family, _)| family).find(|family| {
            match family.special_case {
                Some(SpecialCase::White) => {
                    point.lightness >= t.white_min_lightness
                        && point.chroma <= t.neutral_max_chroma
                }
                Some(SpecialCase::Black) => {
                    point.lightness <= t.black_max_lightness
                        && point.chroma <= t.neutral_max_chroma
                }
                Some(SpecialCase::Gray) => {
                    point.chroma <= t.gray_max_chroma
                        && point.lightness > t.black_max_lightness
                        && point.lightness < t.white_min_lightness
                }
                None => false,
            }
        })
    }

    /// Minimum weighted distance over the hue families (special-case
    /// families are excluded unless the catalog has nothing else).
    fn nearest_by_distance(&self, point: Perceptual) -> ClassificationResult {
        let hue_families = || {
            self.catalog
                .iter()
                .filter(|(family, _)| family.special_case.is_none())
        };

        // A catalog of only special-case families still has to produce an
        // answer for chromatic inputs.
        let candidates: Vec<_> = if hue_families().count() > 0 {
            hue_families().collect()
        } else {
            self.catalog.iter().collect()
        };

        let mut best: Option<(&FamilyDefinition, f32)> = None;
        for (family, reference) in candidates {
            let distance = self.weighted_distance(point, reference);
            match best {
                // Strict improvement only: on a tie within epsilon the
                // earlier catalog entry stays, which keeps results
                // reproducible across runs.
                Some((_, best_distance)) if distance < best_distance - self.tuning.tie_epsilon => {
                    best = Some((family, distance));
                }
                None => best = Some((family, distance)),
                Some(_) => {}
            }
        }

        // Catalog construction guarantees at least one family.
        let (family, distance) = best.expect("catalog is never empty");
        ClassificationResult {
            family: family.id.clone(),
            distance,
            matched_by_special_case: false,
        }
    }

    /// Weighted Euclidean distance in LCh with circular hue treatment:
    /// the distance between hue 350 and hue 10 is 20 degrees, not 340.
    fn weighted_distance(&self, a: Perceptual, b: Perceptual) -> f32 {
        let t = &self.tuning;
        let dl = (a.lightness - b.lightness) * t.lightness_weight;
        let dc = (a.chroma - b.chroma) * t.chroma_weight;
        let raw_dh = (a.hue_degrees - b.hue_degrees).abs();
        let dh = raw_dh.min(360.0 - raw_dh) * t.hue_weight;
        (dl * dl + dc * dc + dh * dh).sqrt()
    }
}
