// src/models/place.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gazetteer record id. Unique within one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub i64);

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometers (haversine).
    pub fn distance_km(&self, other: &LatLon) -> f64 {
        const R: f64 = 6371.0;
        let (phi1, phi2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let (delta_phi, delta_lambda) = (
            (other.latitude - self.latitude).to_radians(),
            (other.longitude - self.longitude).to_radians(),
        );
        let a = (delta_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
        2.0 * R * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// GeoNames major feature category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeatureClass {
    /// Country, state, region
    A,
    /// Stream, lake
    H,
    /// Parks, area
    L,
    /// City, village
    P,
    /// Road, railroad
    R,
    /// Spot, building, farm
    S,
    /// Mountain, hill, rock
    T,
    /// Undersea
    U,
    /// Forest, heath
    V,
    #[default]
    #[serde(other)]
    Null,
}

impl FeatureClass {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => FeatureClass::A,
            "H" => FeatureClass::H,
            "L" => FeatureClass::L,
            "P" => FeatureClass::P,
            "R" => FeatureClass::R,
            "S" => FeatureClass::S,
            "T" => FeatureClass::T,
            "U" => FeatureClass::U,
            "V" => FeatureClass::V,
            _ => FeatureClass::Null,
        }
    }
}

/// Reference from a place to a place that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceReference {
    pub target: PlaceId,
    pub is_administrative_parent: bool,
}

impl PlaceReference {
    pub fn admin(target: PlaceId) -> Self {
        Self {
            target,
            is_administrative_parent: true,
        }
    }
}

/// A gazetteer record. Immutable once loaded into an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub ascii_name: String,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    pub center: Option<LatLon>,
    #[serde(default)]
    pub feature_class: FeatureClass,
    #[serde(default)]
    pub feature_code: String,
    pub primary_country_code: Option<String>,
    #[serde(default)]
    pub alternate_country_codes: Vec<String>,
    #[serde(default)]
    pub super_places: Vec<PlaceReference>,
    #[serde(default)]
    pub population: u64,
    pub elevation: Option<f64>,
    pub timezone: Option<String>,
    pub modification_date: Option<NaiveDate>,
    pub context: Option<String>,
}

impl Place {
    /// The administrative-parent subset of `super_places`, in declared order.
    pub fn administrative_parents(&self) -> impl Iterator<Item = &PlaceReference> + '_ {
        self.super_places
            .iter()
            .filter(|reference| reference.is_administrative_parent)
    }

    /// Independent or dependent political entity (GeoNames `PCL*`).
    pub fn is_country(&self) -> bool {
        self.feature_code.starts_with("PCL")
    }

    pub fn is_admin1(&self) -> bool {
        self.feature_code == "ADM1"
    }

    /// Ordering used to break ties between equally scored candidates:
    /// country < administrative division < populated place < everything else.
    pub fn feature_rank(&self) -> u8 {
        if self.is_country() {
            0
        } else if self.feature_class == FeatureClass::A || self.feature_code.starts_with("ADM") {
            1
        } else if self.feature_class == FeatureClass::P {
            2
        } else {
            3
        }
    }

    pub fn in_country(&self, country_code: &str) -> bool {
        self.primary_country_code.as_deref() == Some(country_code)
            || self
                .alternate_country_codes
                .iter()
                .any(|code| code == country_code)
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Place [name: {}, country: {}, center: ",
            self.name,
            self.primary_country_code.as_deref().unwrap_or("NULL")
        )?;
        match &self.center {
            Some(center) => write!(f, "{}]", center),
            None => write!(f, "none]"),
        }
    }
}
