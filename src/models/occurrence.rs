// src/models/occurrence.rs
use serde::{Deserialize, Serialize};

use crate::errors::InvalidCoordinate;
use crate::models::place::LatLon;

/// One extracted place-name mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOccurrence {
    pub text: String,
    pub start: usize,
}

impl LocationOccurrence {
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        Self {
            text: text.into(),
            start,
        }
    }
}

/// A structured coordinate value, already parsed from text by an extractor.
pub trait GeoCoordinate {
    /// Decimal degrees for this value. Range checks happen later in the
    /// coordinate resolver; this only fails for values that cannot be
    /// expressed as degrees at all.
    fn to_lat_lon(&self) -> Result<LatLon, InvalidCoordinate>;
}

impl GeoCoordinate for LatLon {
    fn to_lat_lon(&self) -> Result<LatLon, InvalidCoordinate> {
        Ok(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    N,
    S,
    E,
    W,
}

impl Hemisphere {
    fn sign(self) -> f64 {
        match self {
            Hemisphere::N | Hemisphere::E => 1.0,
            Hemisphere::S | Hemisphere::W => -1.0,
        }
    }

    fn is_latitude(self) -> bool {
        matches!(self, Hemisphere::N | Hemisphere::S)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmsAngle {
    pub degrees: f64,
    #[serde(default)]
    pub minutes: f64,
    #[serde(default)]
    pub seconds: f64,
    pub hemisphere: Hemisphere,
}

impl DmsAngle {
    pub fn new(degrees: f64, minutes: f64, seconds: f64, hemisphere: Hemisphere) -> Self {
        Self {
            degrees,
            minutes,
            seconds,
            hemisphere,
        }
    }

    fn to_decimal(self) -> Result<f64, InvalidCoordinate> {
        if !(self.degrees.is_finite() && self.minutes.is_finite() && self.seconds.is_finite()) {
            return Err(InvalidCoordinate::NotFinite);
        }
        if self.degrees < 0.0 {
            return Err(InvalidCoordinate::Malformed {
                detail: format!(
                    "negative degrees {} with hemisphere {:?}",
                    self.degrees, self.hemisphere
                ),
            });
        }
        if !(0.0..60.0).contains(&self.minutes) || !(0.0..60.0).contains(&self.seconds) {
            return Err(InvalidCoordinate::Malformed {
                detail: format!(
                    "minutes/seconds out of range: {}' {}\"",
                    self.minutes, self.seconds
                ),
            });
        }
        let magnitude = self.degrees + self.minutes / 60.0 + self.seconds / 3600.0;
        Ok(self.hemisphere.sign() * magnitude)
    }
}

/// Degrees/minutes/seconds position with hemisphere letters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dms {
    pub latitude: DmsAngle,
    pub longitude: DmsAngle,
}

impl GeoCoordinate for Dms {
    fn to_lat_lon(&self) -> Result<LatLon, InvalidCoordinate> {
        if !self.latitude.hemisphere.is_latitude() || self.longitude.hemisphere.is_latitude() {
            return Err(InvalidCoordinate::Malformed {
                detail: format!(
                    "hemispheres {:?}/{:?} do not describe latitude/longitude",
                    self.latitude.hemisphere, self.longitude.hemisphere
                ),
            });
        }
        Ok(LatLon::new(
            self.latitude.to_decimal()?,
            self.longitude.to_decimal()?,
        ))
    }
}

/// The coordinate notations an extractor may hand over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinateValue {
    Decimal(LatLon),
    Dms(Dms),
}

impl GeoCoordinate for CoordinateValue {
    fn to_lat_lon(&self) -> Result<LatLon, InvalidCoordinate> {
        match self {
            CoordinateValue::Decimal(position) => position.to_lat_lon(),
            CoordinateValue::Dms(dms) => dms.to_lat_lon(),
        }
    }
}

impl From<LatLon> for CoordinateValue {
    fn from(position: LatLon) -> Self {
        CoordinateValue::Decimal(position)
    }
}

impl From<Dms> for CoordinateValue {
    fn from(dms: Dms) -> Self {
        CoordinateValue::Dms(dms)
    }
}

/// One extracted coordinate with its position in the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateOccurrence<T = CoordinateValue> {
    pub value: T,
    pub start: usize,
}

impl<T> CoordinateOccurrence<T> {
    pub fn new(value: T, start: usize) -> Self {
        Self { value, start }
    }
}

/// Per-document input handed over by the extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionContext {
    pub source_text: String,
    #[serde(default)]
    pub locations: Vec<LocationOccurrence>,
    #[serde(default)]
    pub coordinates: Vec<CoordinateOccurrence>,
}

impl ExtractionContext {
    pub fn new(
        source_text: impl Into<String>,
        locations: Vec<LocationOccurrence>,
        coordinates: Vec<CoordinateOccurrence>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            locations,
            coordinates,
        }
    }

    /// Indices of `locations` in ascending start offset. Stable, so equal
    /// offsets keep their input order.
    pub fn location_processing_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.locations.len()).collect();
        order.sort_by_key(|&i| self.locations[i].start);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dms_to_decimal() {
        let dms = Dms {
            latitude: DmsAngle::new(48.0, 51.0, 24.0, Hemisphere::N),
            longitude: DmsAngle::new(2.0, 21.0, 3.0, Hemisphere::E),
        };
        let position = dms.to_lat_lon().unwrap();
        assert!((position.latitude - 48.856_666).abs() < 1e-4);
        assert!((position.longitude - 2.350_833).abs() < 1e-4);
    }

    #[test]
    fn test_dms_southern_western_hemispheres_are_negative() {
        let dms = Dms {
            latitude: DmsAngle::new(33.0, 52.0, 0.0, Hemisphere::S),
            longitude: DmsAngle::new(151.0, 12.0, 0.0, Hemisphere::E),
        };
        let position = dms.to_lat_lon().unwrap();
        assert!(position.latitude < 0.0);
        assert!(position.longitude > 0.0);
    }

    #[test]
    fn test_dms_rejects_swapped_hemispheres() {
        let dms = Dms {
            latitude: DmsAngle::new(10.0, 0.0, 0.0, Hemisphere::E),
            longitude: DmsAngle::new(10.0, 0.0, 0.0, Hemisphere::N),
        };
        assert!(matches!(
            dms.to_lat_lon(),
            Err(InvalidCoordinate::Malformed { .. })
        ));
    }

    #[test]
    fn test_dms_rejects_bad_minutes() {
        let dms = Dms {
            latitude: DmsAngle::new(10.0, 75.0, 0.0, Hemisphere::N),
            longitude: DmsAngle::new(10.0, 0.0, 0.0, Hemisphere::E),
        };
        assert!(dms.to_lat_lon().is_err());
    }

    #[test]
    fn test_processing_order_is_stable_by_offset() {
        let ctx = ExtractionContext::new(
            "text",
            vec![
                LocationOccurrence::new("b", 10),
                LocationOccurrence::new("a", 2),
                LocationOccurrence::new("c", 10),
            ],
            vec![],
        );
        assert_eq!(ctx.location_processing_order(), vec![1, 0, 2]);
    }

    #[test]
    fn test_coordinate_value_json_shape() {
        let value: CoordinateValue =
            serde_json::from_str(r#"{"kind":"decimal","latitude":1.5,"longitude":-2.0}"#)
                .unwrap();
        assert_eq!(value, CoordinateValue::Decimal(LatLon::new(1.5, -2.0)));
    }
}
