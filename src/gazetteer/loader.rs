// src/gazetteer/loader.rs - JSON Lines gazetteer loading
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::gazetteer::index::{GazetteerBuilder, GazetteerIndex};
use crate::models::{FeatureClass, LatLon, Place, PlaceId, PlaceReference};

/// Marker GeoNames-style dumps use for a missing numeric value.
pub const OUT_OF_BOUNDS: f64 = -9_999_999.0;

/// One line of a gazetteer dump.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub ascii_name: Option<String>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default = "out_of_bounds")]
    pub latitude: f64,
    #[serde(default = "out_of_bounds")]
    pub longitude: f64,
    #[serde(default)]
    pub feature_class: Option<String>,
    #[serde(default)]
    pub feature_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub alternate_country_codes: Vec<String>,
    #[serde(default)]
    pub super_places: Vec<PlaceReference>,
    #[serde(default = "out_of_bounds")]
    pub population: f64,
    #[serde(default = "out_of_bounds")]
    pub elevation: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

fn out_of_bounds() -> f64 {
    OUT_OF_BOUNDS
}

fn present(value: f64) -> Option<f64> {
    (value.is_finite() && value != OUT_OF_BOUNDS).then_some(value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl PlaceRecord {
    pub fn into_place(self) -> Result<Place> {
        let center = match (present(self.latitude), present(self.longitude)) {
            (Some(latitude), Some(longitude)) => Some(LatLon::new(latitude, longitude)),
            _ => None,
        };
        let modification_date = match non_blank(self.modification_date) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("place {}: bad modification_date '{}'", self.id, raw))?,
            ),
            None => None,
        };
        let ascii_name = non_blank(self.ascii_name).unwrap_or_else(|| self.name.clone());

        Ok(Place {
            id: PlaceId(self.id),
            name: self.name,
            ascii_name,
            alternate_names: self.alternate_names,
            center,
            feature_class: self
                .feature_class
                .as_deref()
                .map(FeatureClass::from_code)
                .unwrap_or_default(),
            feature_code: non_blank(self.feature_code)
                .map(|code| code.to_ascii_uppercase())
                .unwrap_or_default(),
            primary_country_code: non_blank(self.country_code),
            alternate_country_codes: self.alternate_country_codes,
            super_places: self.super_places,
            population: present(self.population)
                .filter(|p| *p > 0.0)
                .map(|p| p as u64)
                .unwrap_or(0),
            elevation: present(self.elevation),
            timezone: non_blank(self.timezone),
            modification_date,
            context: self.context,
        })
    }
}

/// Reads place records, one JSON object per line. Blank lines are skipped;
/// any malformed line fails the whole load.
pub fn from_reader<R: BufRead>(reader: R) -> Result<GazetteerIndex> {
    let mut builder = GazetteerBuilder::new();
    for (number, line) in reader.lines().enumerate() {
        let line_no = number + 1;
        let line = line.with_context(|| format!("Failed to read gazetteer line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PlaceRecord = serde_json::from_str(&line)
            .with_context(|| format!("Malformed place record on line {}", line_no))?;
        let place = record
            .into_place()
            .with_context(|| format!("Invalid place record on line {}", line_no))?;
        builder
            .add(place)
            .with_context(|| format!("Rejected place record on line {}", line_no))?;
    }
    debug!("Parsed {} place records", builder.len());
    Ok(builder.build())
}

pub fn load_gazetteer(path: impl AsRef<Path>) -> Result<GazetteerIndex> {
    let path = path.as_ref();
    let start = Instant::now();
    let file = File::open(path)
        .with_context(|| format!("Failed to open gazetteer file {}", path.display()))?;
    let index = from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load gazetteer from {}", path.display()))?;
    info!(
        "📂 Loaded gazetteer {} ({} places) in {:.2?}",
        path.display(),
        index.len(),
        start.elapsed()
    );
    Ok(index)
}
