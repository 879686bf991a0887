// src/errors.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PlaceId;

/// Failures that abort a whole resolution run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("gazetteer index is not loaded or not queryable")]
    IndexUnavailable,
}

/// Why a single coordinate occurrence was rejected. Recorded against that
/// occurrence only; sibling occurrences keep resolving.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidCoordinate {
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange { value: f64 },
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange { value: f64 },
    #[error("coordinate component is not a finite number")]
    NotFinite,
    #[error("malformed coordinate: {detail}")]
    Malformed { detail: String },
}

/// A containment cycle met while walking administrative parents. The walk is
/// truncated at the back edge.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("containment cycle: place {from} points back to ancestor {to}")]
pub struct AmbiguousCycle {
    pub from: PlaceId,
    pub to: PlaceId,
}
