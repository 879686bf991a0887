// src/lib.rs
pub mod errors;
pub mod gazetteer;
pub mod geoparser;
pub mod matching;
pub mod models;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{AmbiguousCycle, InvalidCoordinate, ResolutionError};
pub use gazetteer::{GazetteerHandle, GazetteerIndex, PlaceIndex};
pub use geoparser::{CoordinateExtractor, GeoParser, LocationExtractor};
pub use matching::{Deadline, LocationResolver, PassControl};
