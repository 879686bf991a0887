// src/matching/assembler.rs
use crate::matching::scorer::ScoredCandidate;
use crate::models::{
    ExtractionContext, LocationOccurrence, ResolutionContext, ResolvedCoordinate,
    ResolvedLocation,
};

/// Final answer for one location occurrence from its ranked candidates.
/// The top candidate wins if it clears `min_acceptance_score`; otherwise the
/// occurrence is unresolved but keeps the best rejected breakdown.
pub fn resolved_location(
    occurrence: &LocationOccurrence,
    scored: &[ScoredCandidate],
    min_acceptance_score: f64,
) -> ResolvedLocation {
    let mut resolved = ResolvedLocation::unresolved(occurrence.clone());
    resolved.candidates_considered = scored.len();
    let Some(best) = scored.first() else {
        return resolved;
    };
    resolved.justification = Some(best.breakdown);
    resolved.confidence = best.breakdown.total;
    if best.breakdown.total >= min_acceptance_score {
        resolved.matched_place = Some(best.candidate.place.clone());
        resolved.match_kind = best.candidate.match_kind;
    }
    resolved
}

/// Composes a run's output. Both lists are already in input order.
pub fn assemble(
    extraction: &ExtractionContext,
    locations: Vec<ResolvedLocation>,
    coordinates: Vec<ResolvedCoordinate>,
    passes: usize,
    stopped_early: bool,
) -> ResolutionContext {
    debug_assert_eq!(locations.len(), extraction.locations.len());
    debug_assert_eq!(coordinates.len(), extraction.coordinates.len());
    ResolutionContext {
        extraction: extraction.clone(),
        locations,
        coordinates,
        passes,
        stopped_early,
    }
}
