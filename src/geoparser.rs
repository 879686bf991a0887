// src/geoparser.rs - Extraction followed by resolution
use anyhow::{Context, Result};
use log::info;

use crate::matching::resolver::LocationResolver;
use crate::models::{CoordinateOccurrence, ExtractionContext, LocationOccurrence, ResolutionContext};

/// Finds place-name mentions in text.
pub trait LocationExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<LocationOccurrence>>;
}

/// Finds coordinates in text and parses them into structured values.
pub trait CoordinateExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<CoordinateOccurrence>>;
}

pub struct GeoParser<L, C> {
    location_extractor: L,
    coordinate_extractor: C,
    resolver: LocationResolver,
}

impl<L: LocationExtractor, C: CoordinateExtractor> GeoParser<L, C> {
    pub fn new(location_extractor: L, coordinate_extractor: C, resolver: LocationResolver) -> Self {
        Self {
            location_extractor,
            coordinate_extractor,
            resolver,
        }
    }

    /// Extracts mentions and coordinates from `text` and resolves them.
    pub fn parse(&self, text: &str) -> Result<ResolutionContext> {
        info!("Input size: {}", text.len());

        let locations = self
            .location_extractor
            .extract(text)
            .context("Location extraction failed")?;
        info!("Extracted location count: {}", locations.len());

        let coordinates = self
            .coordinate_extractor
            .extract(text)
            .context("Coordinate extraction failed")?;
        info!("Extracted coordinate count: {}", coordinates.len());

        let extraction = ExtractionContext::new(text, locations, coordinates);
        let resolved = self
            .resolver
            .resolve_locations(&extraction)
            .context("Resolution failed")?;

        info!(
            "Resolved {} locations and {} coordinates",
            resolved.locations.iter().filter(|l| l.is_resolved()).count(),
            resolved.coordinates.iter().filter(|c| !c.is_invalid()).count()
        );
        Ok(resolved)
    }

    pub fn location_extractor(&self) -> &L {
        &self.location_extractor
    }

    pub fn coordinate_extractor(&self) -> &C {
        &self.coordinate_extractor
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }
}
