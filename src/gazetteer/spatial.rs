// src/gazetteer/spatial.rs - R-tree over place centers on the unit sphere
//!
//! Centers are stored as 3-D unit vectors so straight-line (chord) distance
//! is monotonic in great-circle distance. That keeps radius queries correct
//! across the antimeridian and at the poles without special cases.
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::models::LatLon;

/// Mean Earth radius used by [`LatLon::distance_km`].
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Relative slack on the chord bound; callers apply the exact haversine cut.
const CHORD_SLACK: f64 = 1e-9;

/// A place center with the arena slot it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacePoint {
    position: [f64; 3],
    slot: usize,
}

impl PlacePoint {
    pub fn new(center: &LatLon, slot: usize) -> Self {
        Self {
            position: unit_vector(center),
            slot,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl RTreeObject for PlacePoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for PlacePoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = point[0] - self.position[0];
        let dy = point[1] - self.position[1];
        let dz = point[2] - self.position[2];
        dx * dx + dy * dy + dz * dz
    }
}

fn unit_vector(position: &LatLon) -> [f64; 3] {
    let (phi, lambda) = (position.latitude.to_radians(), position.longitude.to_radians());
    [phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin()]
}

/// Squared chord length subtending a surface distance of `radius_km`.
fn squared_chord(radius_km: f64) -> f64 {
    let angle = (radius_km.max(0.0) / EARTH_RADIUS_KM).min(std::f64::consts::PI);
    let chord = 2.0 * (angle / 2.0).sin();
    chord * chord * (1.0 + CHORD_SLACK) + CHORD_SLACK
}

/// Spatial index over positioned places. Bulk loaded once at build time.
#[derive(Clone)]
pub struct SpatialIndex {
    tree: RTree<PlacePoint>,
    count: usize,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::from_points(std::iter::empty())
    }
}

impl SpatialIndex {
    pub fn from_points(points: impl Iterator<Item = PlacePoint>) -> Self {
        let points: Vec<_> = points.collect();
        let count = points.len();
        Self {
            tree: RTree::bulk_load(points),
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Slots whose centers may lie within `radius_km` of `center`. The bound
    /// is slightly generous; callers still filter by haversine distance.
    pub fn slots_within(&self, center: &LatLon, radius_km: f64) -> Vec<usize> {
        self.tree
            .locate_within_distance(unit_vector(center), squared_chord(radius_km))
            .map(PlacePoint::slot)
            .collect()
    }
}
