// src/test_support.rs - Small gazetteers shared by unit tests
use crate::gazetteer::index::{GazetteerBuilder, GazetteerIndex};
use crate::models::{FeatureClass, LatLon, Place, PlaceId, PlaceReference};

pub const FRANCE_ID: PlaceId = PlaceId(3017382);
pub const IDF_ID: PlaceId = PlaceId(3012874);
pub const PARIS_FR_ID: PlaceId = PlaceId(2988507);
pub const VERSAILLES_ID: PlaceId = PlaceId(2969679);
pub const ARA_ID: PlaceId = PlaceId(11071625);
pub const LYON_ID: PlaceId = PlaceId(2996944);
pub const PACA_ID: PlaceId = PlaceId(2985244);
pub const MARSEILLE_ID: PlaceId = PlaceId(2995469);
pub const US_ID: PlaceId = PlaceId(6252001);
pub const TEXAS_ID: PlaceId = PlaceId(4736286);
pub const PARIS_TX_ID: PlaceId = PlaceId(4717560);
pub const NEW_MEXICO_ID: PlaceId = PlaceId(5481136);
pub const TEXICO_ID: PlaceId = PlaceId(5530022);
pub const MEXICO_ID: PlaceId = PlaceId(3996063);

/// Bare record: no center, no parents, class derived from the code.
pub fn place(id: i64, name: &str, country: &str, feature_code: &str, population: u64) -> Place {
    let feature_class = if feature_code.starts_with("PCL") || feature_code.starts_with("ADM") {
        FeatureClass::A
    } else if feature_code.starts_with("PPL") {
        FeatureClass::P
    } else if feature_code.is_empty() {
        FeatureClass::Null
    } else {
        FeatureClass::T
    };
    Place {
        id: PlaceId(id),
        name: name.to_string(),
        ascii_name: name.to_string(),
        alternate_names: vec![],
        center: None,
        feature_class,
        feature_code: feature_code.to_string(),
        primary_country_code: Some(country.to_string()),
        alternate_country_codes: vec![],
        super_places: vec![],
        population,
        elevation: None,
        timezone: None,
        modification_date: None,
        context: None,
    }
}

fn located(mut place: Place, latitude: f64, longitude: f64, parents: &[PlaceId]) -> Place {
    place.center = Some(LatLon::new(latitude, longitude));
    place.super_places = parents.iter().map(|&id| PlaceReference::admin(id)).collect();
    place
}

fn within(mut place: Place, parents: &[PlaceId]) -> Place {
    place.super_places = parents.iter().map(|&id| PlaceReference::admin(id)).collect();
    place
}

/// France, the US and Mexico with a handful of cities, including both
/// Paris, France and Paris, Texas.
pub fn world_index() -> GazetteerIndex {
    world_index_with_paris_populations(2_138_551, 24_782)
}

/// Same world with the two Parises' populations chosen by the caller.
pub fn world_index_with_paris_populations(paris_fr: u64, paris_tx: u64) -> GazetteerIndex {
    let mut mexico = located(place(MEXICO_ID.0, "Mexico", "MX", "PCLI", 126_014_024), 23.0, -102.0, &[]);
    mexico.alternate_names = vec!["México".to_string(), "Mexique".to_string()];

    let mut versailles = located(
        place(VERSAILLES_ID.0, "Versailles", "FR", "PPLA2", 85_416),
        48.8049,
        2.1204,
        &[IDF_ID],
    );
    versailles.timezone = Some("Europe/Paris".to_string());

    let records = vec![
        located(place(FRANCE_ID.0, "France", "FR", "PCLI", 66_987_244), 46.0, 2.0, &[]),
        within(place(IDF_ID.0, "Île-de-France", "FR", "ADM1", 12_278_210), &[FRANCE_ID]),
        located(
            place(PARIS_FR_ID.0, "Paris", "FR", "PPLC", paris_fr),
            48.8566,
            2.3522,
            &[IDF_ID],
        ),
        versailles,
        within(place(ARA_ID.0, "Auvergne-Rhône-Alpes", "FR", "ADM1", 7_994_459), &[FRANCE_ID]),
        located(place(LYON_ID.0, "Lyon", "FR", "PPLA", 522_969), 45.7640, 4.8357, &[ARA_ID]),
        within(
            place(PACA_ID.0, "Provence-Alpes-Côte d'Azur", "FR", "ADM1", 5_098_666),
            &[FRANCE_ID],
        ),
        located(
            place(MARSEILLE_ID.0, "Marseille", "FR", "PPLA", 870_731),
            43.2965,
            5.3698,
            &[PACA_ID],
        ),
        located(place(US_ID.0, "United States", "US", "PCLI", 327_167_434), 39.76, -98.5, &[]),
        within(place(TEXAS_ID.0, "Texas", "US", "ADM1", 29_145_505), &[US_ID]),
        located(
            place(PARIS_TX_ID.0, "Paris", "US", "PPLA2", paris_tx),
            33.6609,
            -95.5555,
            &[TEXAS_ID],
        ),
        within(place(NEW_MEXICO_ID.0, "New Mexico", "US", "ADM1", 2_096_829), &[US_ID]),
        located(
            place(TEXICO_ID.0, "Texico", "US", "PPL", 1_130),
            34.389,
            -103.051,
            &[NEW_MEXICO_ID],
        ),
        mexico,
    ];

    let mut builder = GazetteerBuilder::new();
    for record in records {
        builder
            .add(record)
            .expect("fixture ids are unique");
    }
    builder.build()
}
