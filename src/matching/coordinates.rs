// src/matching/coordinates.rs - Coordinate validation and nearby-place annotation
use crate::errors::InvalidCoordinate;
use crate::gazetteer::ancestry::{admin1_of, walk_ancestors};
use crate::gazetteer::index::PlaceIndex;
use crate::matching::context::Contribution;
use crate::models::{
    CoordinateMatch, CoordinateOccurrence, CoordinateOutcome, GeoCoordinate, LatLon,
    ResolvedCoordinate,
};

/// Range check without clamping.
pub fn validate(position: LatLon) -> Result<LatLon, InvalidCoordinate> {
    if !position.latitude.is_finite() || !position.longitude.is_finite() {
        return Err(InvalidCoordinate::NotFinite);
    }
    if !(-90.0..=90.0).contains(&position.latitude) {
        return Err(InvalidCoordinate::LatitudeOutOfRange {
            value: position.latitude,
        });
    }
    if !(-180.0..=180.0).contains(&position.longitude) {
        return Err(InvalidCoordinate::LongitudeOutOfRange {
            value: position.longitude,
        });
    }
    Ok(position)
}

/// Validates one occurrence and attaches the nearest gazetteer place within
/// `radius_km`, if any.
pub fn resolve_coordinate<I: PlaceIndex + ?Sized>(
    index: &I,
    occurrence: &CoordinateOccurrence,
    radius_km: f64,
) -> ResolvedCoordinate {
    let outcome = match occurrence.value.to_lat_lon().and_then(validate) {
        Ok(position) => {
            let nearest = index.nearby(&position, radius_km).into_iter().next();
            CoordinateOutcome::Located(CoordinateMatch {
                position,
                distance_km: nearest.as_ref().map(|hit| hit.distance_km),
                nearest_place: nearest.map(|hit| hit.place),
            })
        }
        Err(error) => CoordinateOutcome::Invalid { error },
    };
    ResolvedCoordinate {
        occurrence: occurrence.clone(),
        outcome,
    }
}

/// Aggregator vote of a located coordinate: its nearest place's country and
/// admin-1 region at the fixed coordinate weight.
pub fn coordinate_contribution<I: PlaceIndex + ?Sized>(
    index: &I,
    resolved: &ResolvedCoordinate,
    weight: f64,
    max_hops: usize,
) -> Option<Contribution> {
    let CoordinateOutcome::Located(located) = &resolved.outcome else {
        return None;
    };
    let place = located.nearest_place.as_ref()?;
    let walk = walk_ancestors(index, place.id, max_hops);
    Some(Contribution {
        country: place.primary_country_code.clone(),
        admin1: admin1_of(index, place, &walk),
        weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoordinateValue;
    use crate::test_support::{world_index, IDF_ID, VERSAILLES_ID};

    fn occurrence(latitude: f64, longitude: f64) -> CoordinateOccurrence {
        CoordinateOccurrence::new(CoordinateValue::Decimal(LatLon::new(latitude, longitude)), 0)
    }

    #[test]
    fn test_validate_ranges() {
        assert!(validate(LatLon::new(90.0, -180.0)).is_ok());
        assert_eq!(
            validate(LatLon::new(95.0, 0.0)),
            Err(InvalidCoordinate::LatitudeOutOfRange { value: 95.0 })
        );
        assert_eq!(
            validate(LatLon::new(0.0, 180.5)),
            Err(InvalidCoordinate::LongitudeOutOfRange { value: 180.5 })
        );
        assert_eq!(
            validate(LatLon::new(f64::NAN, 0.0)),
            Err(InvalidCoordinate::NotFinite)
        );
    }

    #[test]
    fn test_located_coordinate_gets_nearest_place() {
        let index = world_index();
        let resolved = resolve_coordinate(&index, &occurrence(48.80, 2.13), 50.0);
        let CoordinateOutcome::Located(located) = &resolved.outcome else {
            panic!("expected a located coordinate");
        };
        assert_eq!(located.nearest_place.as_ref().unwrap().id, VERSAILLES_ID);
        assert!(located.distance_km.unwrap() < 2.0);

        let vote = coordinate_contribution(&index, &resolved, 0.3, 10).unwrap();
        assert_eq!(vote.country.as_deref(), Some("FR"));
        assert_eq!(vote.admin1, Some(IDF_ID));
        assert_eq!(vote.weight, 0.3);
    }

    #[test]
    fn test_open_ocean_is_located_without_place() {
        let index = world_index();
        let resolved = resolve_coordinate(&index, &occurrence(0.0, -140.0), 50.0);
        assert_eq!(resolved.position(), Some(LatLon::new(0.0, -140.0)));
        assert!(coordinate_contribution(&index, &resolved, 0.3, 10).is_none());
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        let index = world_index();
        let resolved = resolve_coordinate(&index, &occurrence(95.0, 10.0), 50.0);
        assert!(resolved.is_invalid());
        assert!(coordinate_contribution(&index, &resolved, 0.3, 10).is_none());
    }
}
