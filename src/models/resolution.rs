// src/models/resolution.rs
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::InvalidCoordinate;
use crate::models::occurrence::{CoordinateOccurrence, ExtractionContext, LocationOccurrence};
use crate::models::place::{LatLon, Place};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    Exact,
    AlternateName,
    AsciiNormalized,
    Fuzzy,
    Unresolved,
}

impl MatchKind {
    /// Strength used when one place matched a mention through several fields.
    pub fn strength(self) -> u8 {
        match self {
            MatchKind::Exact => 4,
            MatchKind::AsciiNormalized => 3,
            MatchKind::AlternateName => 2,
            MatchKind::Fuzzy => 1,
            MatchKind::Unresolved => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::AlternateName => "alternate_name",
            MatchKind::AsciiNormalized => "ascii_normalized",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::Unresolved => "unresolved",
        }
    }
}

/// Feature values and weighted total behind one candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub lexical: f64,
    pub population_prior: f64,
    pub feature_class_prior: f64,
    pub context_agreement: f64,
    pub coordinate_proximity: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub occurrence: LocationOccurrence,
    pub matched_place: Option<Arc<Place>>,
    pub confidence: f64,
    pub match_kind: MatchKind,
    /// Breakdown for the winner, or for the best rejected candidate when
    /// unresolved. `None` means the gazetteer had no candidate at all.
    pub justification: Option<ScoreBreakdown>,
    pub candidates_considered: usize,
}

impl ResolvedLocation {
    pub fn unresolved(occurrence: LocationOccurrence) -> Self {
        Self {
            occurrence,
            matched_place: None,
            confidence: 0.0,
            match_kind: MatchKind::Unresolved,
            justification: None,
            candidates_considered: 0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.matched_place.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMatch {
    pub position: LatLon,
    pub nearest_place: Option<Arc<Place>>,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoordinateOutcome {
    Located(CoordinateMatch),
    Invalid { error: InvalidCoordinate },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCoordinate {
    pub occurrence: CoordinateOccurrence,
    pub outcome: CoordinateOutcome,
}

impl ResolvedCoordinate {
    pub fn position(&self) -> Option<LatLon> {
        match &self.outcome {
            CoordinateOutcome::Located(located) => Some(located.position),
            CoordinateOutcome::Invalid { .. } => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.outcome, CoordinateOutcome::Invalid { .. })
    }
}

/// Terminal output of one resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionContext {
    pub extraction: ExtractionContext,
    pub locations: Vec<ResolvedLocation>,
    pub coordinates: Vec<ResolvedCoordinate>,
    pub passes: usize,
    /// Set when a caller deadline stopped refinement before convergence.
    pub stopped_early: bool,
}
