// src/models/mod.rs
pub mod occurrence;
pub mod place;
pub mod resolution;

pub use occurrence::{
    CoordinateOccurrence, CoordinateValue, Dms, ExtractionContext, GeoCoordinate, Hemisphere,
    LocationOccurrence,
};
pub use place::{FeatureClass, LatLon, Place, PlaceId, PlaceReference};
pub use resolution::{
    CoordinateMatch, CoordinateOutcome, MatchKind, ResolutionContext, ResolvedCoordinate,
    ResolvedLocation, ScoreBreakdown,
};
