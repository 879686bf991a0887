// src/matching/resolver.rs - Multi-pass, context-aware resolution of one document
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ResolutionError;
use crate::gazetteer::handle::GazetteerHandle;
use crate::gazetteer::index::PlaceIndex;
use crate::matching::assembler::{assemble, resolved_location};
use crate::matching::candidates::{Candidate, CandidateCache};
use crate::matching::context::{Contribution, ContributionSource, ContextSnapshot, DocumentContext};
use crate::matching::coordinates::{coordinate_contribution, resolve_coordinate};
use crate::matching::scorer::{top_two_margin, CandidateProfile, ScoredCandidate, Scorer};
use crate::models::{
    CoordinateOutcome, ExtractionContext, LatLon, PlaceId, ResolutionContext, ResolvedCoordinate,
};
use crate::utils::logging::ResolutionLogger;
use crate::utils::resolver_config::ResolverConfig;

/// Consulted between passes. Returning `false` stops refinement; the last
/// complete pass is assembled.
pub trait PassControl {
    fn continue_after(&self, completed_passes: usize) -> bool;
}

/// Never stops refinement early.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl PassControl for Unbounded {
    fn continue_after(&self, _completed_passes: usize) -> bool {
        true
    }
}

/// Stops refinement once a wall-clock instant has passed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }
}

impl PassControl for Deadline {
    fn continue_after(&self, _completed_passes: usize) -> bool {
        Instant::now() < self.at
    }
}

impl<F> PassControl for F
where
    F: Fn(usize) -> bool,
{
    fn continue_after(&self, completed_passes: usize) -> bool {
        self(completed_passes)
    }
}

/// Resolves extraction contexts against whatever gazetteer the handle holds
/// when a run starts.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    handle: GazetteerHandle,
    config: ResolverConfig,
}

impl LocationResolver {
    pub fn new(handle: GazetteerHandle, config: ResolverConfig) -> Self {
        Self { handle, config }
    }

    pub fn handle(&self) -> &GazetteerHandle {
        &self.handle
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve_locations(
        &self,
        extraction: &ExtractionContext,
    ) -> Result<ResolutionContext, ResolutionError> {
        self.resolve_locations_with(extraction, &Unbounded)
    }

    pub fn resolve_locations_with<C: PassControl + ?Sized>(
        &self,
        extraction: &ExtractionContext,
        control: &C,
    ) -> Result<ResolutionContext, ResolutionError> {
        let index = self.handle.snapshot()?;
        let logger = ResolutionLogger::new();
        logger.log_start(
            extraction.locations.len(),
            extraction.coordinates.len(),
            index.fingerprint(),
        );
        Ok(resolve_with_index(
            index.as_ref(),
            &self.config,
            extraction,
            control,
            &logger,
        ))
    }
}

struct OccurrenceState {
    candidates: Arc<Vec<Candidate>>,
    profiles: Vec<Arc<CandidateProfile>>,
    scored: Vec<ScoredCandidate>,
    margin: f64,
}

impl OccurrenceState {
    fn winner(&self) -> Option<PlaceId> {
        self.scored.first().map(|best| best.candidate.place.id)
    }
}

/// Whole run against one pinned index. Pass 1 scores every occurrence with a
/// cold context; each later pass re-scores only occurrences whose top-two
/// margin was within `ambiguity_margin`, against the previous pass's frozen
/// context with their own vote removed.
pub fn resolve_with_index<I: PlaceIndex + ?Sized, C: PassControl + ?Sized>(
    index: &I,
    config: &ResolverConfig,
    extraction: &ExtractionContext,
    control: &C,
    logger: &ResolutionLogger,
) -> ResolutionContext {
    let coordinates: Vec<ResolvedCoordinate> = extraction
        .coordinates
        .iter()
        .map(|occurrence| {
            let resolved = resolve_coordinate(index, occurrence, config.proximity_radius_km);
            if let CoordinateOutcome::Invalid { error } = &resolved.outcome {
                logger.log_invalid_coordinate(occurrence.start, error);
            }
            resolved
        })
        .collect();
    let positions: Vec<LatLon> = coordinates.iter().filter_map(|c| c.position()).collect();
    let coordinate_votes: Vec<(ContributionSource, Contribution)> = coordinates
        .iter()
        .enumerate()
        .filter_map(|(i, resolved)| {
            coordinate_contribution(
                index,
                resolved,
                config.coordinate_context_weight,
                config.max_ancestry_hops,
            )
            .map(|vote| (ContributionSource::Coordinate(i), vote))
        })
        .collect();

    let scorer = Scorer {
        weights: &config.weights,
        radius_km: config.proximity_radius_km,
        positions: &positions,
    };
    let order = extraction.location_processing_order();
    let mut cache = CandidateCache::new(config.candidate_cache_size);
    let mut profiles: HashMap<PlaceId, Arc<CandidateProfile>> = HashMap::new();
    let cold = ContextSnapshot::default();

    // Pass 1
    let mut states: Vec<Option<OccurrenceState>> = (0..extraction.locations.len()).map(|_| None).collect();
    let mut ambiguous = 0;
    for &i in &order {
        let occurrence = &extraction.locations[i];
        let (candidates, cached) = cache.get_or_generate(index, &occurrence.text, config);
        logger.log_candidates(
            &occurrence.text,
            occurrence.start,
            candidates.len(),
            candidates.first().map(|candidate| candidate.match_kind),
            cached,
        );
        let candidate_profiles: Vec<Arc<CandidateProfile>> = candidates
            .iter()
            .map(|candidate| {
                Arc::clone(profiles.entry(candidate.place.id).or_insert_with(|| {
                    Arc::new(CandidateProfile::build(
                        index,
                        &candidate.place,
                        config.max_ancestry_hops,
                    ))
                }))
            })
            .collect();
        let scored = scorer.score(&candidates, &candidate_profiles, &cold);
        let margin = top_two_margin(&scored);
        if margin <= config.ambiguity_margin {
            ambiguous += 1;
        }
        states[i] = Some(OccurrenceState {
            candidates,
            profiles: candidate_profiles,
            scored,
            margin,
        });
    }
    let mut states: Vec<OccurrenceState> = states.into_iter().flatten().collect();
    logger.log_pass(1, order.len(), ambiguous, 0);

    let mut passes = 1;
    let mut stopped_early = false;
    while passes < config.max_passes {
        let revisit: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| states[i].margin <= config.ambiguity_margin)
            .collect();
        if revisit.is_empty() {
            break;
        }
        if !control.continue_after(passes) {
            stopped_early = true;
            logger.log_stopped_early(passes);
            break;
        }

        let context = document_context(config, &states, &coordinate_votes);
        let rescored: Vec<(usize, Vec<ScoredCandidate>)> = revisit
            .iter()
            .map(|&i| {
                let snapshot = context.snapshot_excluding(ContributionSource::Location(i));
                let state = &states[i];
                (i, scorer.score(&state.candidates, &state.profiles, &snapshot))
            })
            .collect();

        let mut changed = 0;
        let mut still_ambiguous = 0;
        for (i, scored) in rescored {
            let state = &mut states[i];
            let previous = state.winner();
            state.margin = top_two_margin(&scored);
            state.scored = scored;
            if state.winner() != previous {
                changed += 1;
            }
            if state.margin <= config.ambiguity_margin {
                still_ambiguous += 1;
            }
        }
        passes += 1;
        logger.log_pass(passes, revisit.len(), still_ambiguous, changed);
        if changed == 0 {
            break;
        }
    }

    let locations = extraction
        .locations
        .iter()
        .zip(&states)
        .map(|(occurrence, state)| {
            resolved_location(occurrence, &state.scored, config.min_acceptance_score)
        })
        .collect::<Vec<_>>();
    let resolved = locations.iter().filter(|l| l.is_resolved()).count();
    let invalid = coordinates.iter().filter(|c| c.is_invalid()).count();
    logger.log_completion(resolved, locations.len() - resolved, invalid, passes);

    assemble(extraction, locations, coordinates, passes, stopped_early)
}

/// Frozen votes of the pass just completed: every accepted winner at its
/// score, plus the located coordinates.
fn document_context(
    config: &ResolverConfig,
    states: &[OccurrenceState],
    coordinate_votes: &[(ContributionSource, Contribution)],
) -> DocumentContext {
    let mut context = DocumentContext::new();
    for (source, vote) in coordinate_votes {
        context.contribute(*source, vote.clone());
    }
    for (i, state) in states.iter().enumerate() {
        let Some(best) = state.scored.first() else {
            continue;
        };
        if best.breakdown.total < config.min_acceptance_score {
            continue;
        }
        let Some(position) = state
            .candidates
            .iter()
            .position(|candidate| candidate.place.id == best.candidate.place.id)
        else {
            continue;
        };
        context.contribute(
            ContributionSource::Location(i),
            Contribution {
                country: best.candidate.place.primary_country_code.clone(),
                admin1: state.profiles[position].admin1,
                weight: best.breakdown.total,
            },
        );
    }
    context
}
