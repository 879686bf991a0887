// src/matching/scorer.rs - Weighted disambiguation features
use std::sync::Arc;

use crate::gazetteer::ancestry::{admin1_of, walk_ancestors, AncestryWalk};
use crate::gazetteer::index::PlaceIndex;
use crate::matching::candidates::{tie_break, Candidate};
use crate::matching::context::ContextSnapshot;
use crate::models::{FeatureClass, LatLon, Place, PlaceId, ScoreBreakdown};
use crate::utils::resolver_config::ScoringWeights;

/// Containment facts about a candidate, computed once per run and reused by
/// every pass.
#[derive(Debug, Clone, Default)]
pub struct CandidateProfile {
    pub walk: AncestryWalk,
    pub admin1: Option<PlaceId>,
}

impl CandidateProfile {
    pub fn build<I: PlaceIndex + ?Sized>(index: &I, place: &Place, max_hops: usize) -> Self {
        let walk = walk_ancestors(index, place.id, max_hops);
        let admin1 = admin1_of(index, place, &walk);
        Self { walk, admin1 }
    }

    /// The place itself or one of its administrative ancestors is `id`.
    fn within(&self, place: &Place, id: PlaceId) -> bool {
        place.id == id || self.walk.contains(id)
    }
}

/// Static prior by feature class/code. Populated places and administrative
/// divisions outrank natural features and infrastructure.
pub fn feature_class_prior(place: &Place, names_country: bool) -> f64 {
    let code = place.feature_code.as_str();
    if place.is_country() {
        return if names_country { 1.0 } else { 0.7 };
    }
    match place.feature_class {
        FeatureClass::P if code == "PPLC" => 1.0,
        FeatureClass::P if code.starts_with("PPLA") => 0.95,
        FeatureClass::P => 0.9,
        FeatureClass::A if code == "ADM1" || code == "ADM2" => 0.8,
        FeatureClass::A => 0.7,
        FeatureClass::L => 0.5,
        FeatureClass::H | FeatureClass::T | FeatureClass::V => 0.3,
        FeatureClass::S | FeatureClass::R | FeatureClass::U => 0.2,
        FeatureClass::Null => 0.1,
    }
}

/// ln(1 + population) relative to the most populous candidate. Zero when
/// the population is unknown.
pub fn population_prior(population: u64, max_population: u64) -> f64 {
    if population == 0 || max_population == 0 {
        return 0.0;
    }
    ((population as f64).ln_1p() / (max_population as f64).ln_1p()).min(1.0)
}

/// Country agreement scaled by the dominant country's share, plus region
/// agreement scaled by the dominant admin-1's share.
pub fn context_agreement(place: &Place, profile: &CandidateProfile, snapshot: &ContextSnapshot) -> f64 {
    let country = snapshot
        .country
        .as_ref()
        .filter(|dominant| place.in_country(&dominant.code))
        .map(|dominant| dominant.share)
        .unwrap_or(0.0);
    let region = snapshot
        .region
        .as_ref()
        .filter(|dominant| profile.within(place, dominant.id))
        .map(|dominant| dominant.share)
        .unwrap_or(0.0);
    0.6 * country + 0.4 * region
}

/// Best `1 - d/R` over the document's valid coordinates; 0 beyond `R` or
/// for places without a center.
pub fn coordinate_proximity(place: &Place, positions: &[LatLon], radius_km: f64) -> f64 {
    let Some(center) = &place.center else {
        return 0.0;
    };
    positions
        .iter()
        .map(|position| center.distance_km(position))
        .filter(|&distance| distance <= radius_km)
        .map(|distance| 1.0 - distance / radius_km)
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub breakdown: ScoreBreakdown,
}

/// Scores for one occurrence's candidates, best first. Ties on the total
/// fall back to population, feature rank and id.
pub struct Scorer<'a> {
    pub weights: &'a ScoringWeights,
    pub radius_km: f64,
    pub positions: &'a [LatLon],
}

impl<'a> Scorer<'a> {
    pub fn score(
        &self,
        candidates: &[Candidate],
        profiles: &[Arc<CandidateProfile>],
        snapshot: &ContextSnapshot,
    ) -> Vec<ScoredCandidate> {
        let max_population = candidates
            .iter()
            .map(|candidate| candidate.place.population)
            .max()
            .unwrap_or(0);

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .zip(profiles)
            .map(|(candidate, profile)| {
                let place = &candidate.place;
                let mut breakdown = ScoreBreakdown {
                    lexical: candidate.base_score,
                    population_prior: population_prior(place.population, max_population),
                    feature_class_prior: feature_class_prior(place, candidate.names_country),
                    context_agreement: context_agreement(place, profile, snapshot),
                    coordinate_proximity: coordinate_proximity(place, self.positions, self.radius_km),
                    total: 0.0,
                };
                breakdown.total = self.weights.lexical * breakdown.lexical
                    + self.weights.population * breakdown.population_prior
                    + self.weights.feature_class * breakdown.feature_class_prior
                    + self.weights.context * breakdown.context_agreement
                    + self.weights.proximity * breakdown.coordinate_proximity;
                ScoredCandidate {
                    candidate: candidate.clone(),
                    breakdown,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.breakdown
                .total
                .total_cmp(&a.breakdown.total)
                .then_with(|| tie_break(&a.candidate.place, &b.candidate.place))
        });
        scored
    }
}

/// Gap between the two best totals; infinite with fewer than two candidates.
pub fn top_two_margin(scored: &[ScoredCandidate]) -> f64 {
    match scored {
        [first, second, ..] => first.breakdown.total - second.breakdown.total,
        _ => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::candidates::generate_candidates;
    use crate::matching::context::{DominantCountry, DominantRegion};
    use crate::test_support::{
        place, world_index, IDF_ID, PARIS_FR_ID, PARIS_TX_ID, TEXAS_ID,
    };
    use crate::utils::resolver_config::ResolverConfig;

    fn profiles_for<I: PlaceIndex>(index: &I, candidates: &[Candidate]) -> Vec<Arc<CandidateProfile>> {
        candidates
            .iter()
            .map(|c| Arc::new(CandidateProfile::build(index, &c.place, 10)))
            .collect()
    }

    #[test]
    fn test_population_prior() {
        assert_eq!(population_prior(0, 1000), 0.0);
        assert_eq!(population_prior(1000, 1000), 1.0);
        let small = population_prior(10, 1_000_000);
        assert!(small > 0.0 && small < 0.2);
    }

    #[test]
    fn test_feature_class_prior_table() {
        assert_eq!(feature_class_prior(&place(1, "A", "FR", "PPLC", 0), false), 1.0);
        assert_eq!(feature_class_prior(&place(1, "A", "FR", "PPLA2", 0), false), 0.95);
        assert_eq!(feature_class_prior(&place(1, "A", "FR", "ADM1", 0), false), 0.8);
        assert_eq!(feature_class_prior(&place(1, "A", "FR", "PCLI", 0), false), 0.7);
        assert_eq!(feature_class_prior(&place(1, "A", "FR", "PCLI", 0), true), 1.0);
        assert_eq!(feature_class_prior(&place(1, "A", "FR", "MT", 0), false), 0.3);
        assert!(
            feature_class_prior(&place(1, "A", "FR", "PPL", 0), false)
                > feature_class_prior(&place(1, "A", "FR", "MT", 0), false)
        );
    }

    #[test]
    fn test_coordinate_proximity_is_linear_within_radius() {
        let mut p = place(1, "A", "FR", "PPL", 0);
        assert_eq!(coordinate_proximity(&p, &[LatLon::new(0.0, 0.0)], 50.0), 0.0);
        p.center = Some(LatLon::new(0.0, 0.0));
        assert_eq!(coordinate_proximity(&p, &[LatLon::new(0.0, 0.0)], 50.0), 1.0);
        let half = coordinate_proximity(&p, &[LatLon::new(0.0, 0.2248)], 50.0);
        assert!((half - 0.5).abs() < 0.01, "got {}", half);
        assert_eq!(coordinate_proximity(&p, &[LatLon::new(10.0, 10.0)], 50.0), 0.0);
    }

    #[test]
    fn test_context_agreement_country_and_region() {
        let index = world_index();
        let paris = index.place(PARIS_FR_ID).unwrap();
        let profile = CandidateProfile::build(&index, paris, 10);
        assert_eq!(profile.admin1, Some(IDF_ID));

        assert_eq!(context_agreement(paris, &profile, &ContextSnapshot::default()), 0.0);

        let snapshot = ContextSnapshot {
            country: Some(DominantCountry {
                code: "FR".to_string(),
                share: 0.75,
            }),
            region: Some(DominantRegion { id: IDF_ID, share: 0.5 }),
        };
        let agreement = context_agreement(paris, &profile, &snapshot);
        assert!((agreement - (0.6 * 0.75 + 0.4 * 0.5)).abs() < 1e-9);

        let texas_snapshot = ContextSnapshot {
            country: Some(DominantCountry {
                code: "US".to_string(),
                share: 1.0,
            }),
            region: Some(DominantRegion { id: TEXAS_ID, share: 1.0 }),
        };
        assert_eq!(context_agreement(paris, &profile, &texas_snapshot), 0.0);
    }

    #[test]
    fn test_context_can_flip_the_winner() {
        let index = world_index();
        let config = ResolverConfig::default();
        let candidates = generate_candidates(&index, "Paris", &config);
        let profiles = profiles_for(&index, &candidates);
        let scorer = Scorer {
            weights: &config.weights,
            radius_km: config.proximity_radius_km,
            positions: &[],
        };

        let cold = scorer.score(&candidates, &profiles, &ContextSnapshot::default());
        assert_eq!(cold[0].candidate.place.id, PARIS_FR_ID);
        assert!(top_two_margin(&cold) > 0.0);

        let texas = ContextSnapshot {
            country: Some(DominantCountry {
                code: "US".to_string(),
                share: 1.0,
            }),
            region: Some(DominantRegion { id: TEXAS_ID, share: 1.0 }),
        };
        let warm = scorer.score(&candidates, &profiles, &texas);
        assert_eq!(warm[0].candidate.place.id, PARIS_TX_ID);
        assert_eq!(warm[0].breakdown.context_agreement, 1.0);
    }

    #[test]
    fn test_margin_single_candidate_is_infinite() {
        assert_eq!(top_two_margin(&[]), f64::INFINITY);
    }
}
