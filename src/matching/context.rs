// src/matching/context.rs - Document-level country/region statistics
use std::collections::BTreeMap;

use crate::models::PlaceId;

/// Who contributed a vote to the document context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContributionSource {
    Location(usize),
    Coordinate(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub country: Option<String>,
    pub admin1: Option<PlaceId>,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DominantCountry {
    pub code: String,
    /// Fraction of country-bearing weight behind `code`.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DominantRegion {
    pub id: PlaceId,
    pub share: f64,
}

/// Immutable view of the weighted-plurality country and admin-1 region.
/// The default snapshot is the cold-start context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    pub country: Option<DominantCountry>,
    pub region: Option<DominantRegion>,
}

impl ContextSnapshot {
    pub fn is_cold(&self) -> bool {
        self.country.is_none() && self.region.is_none()
    }
}

/// Confidence-weighted frequency table over one document. Rebuilt after
/// every pass from that pass's accepted resolutions and located coordinates.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    contributions: BTreeMap<ContributionSource, Contribution>,
}

/// Heaviest key, smallest key on equal weight. BTreeMap iteration is
/// ascending, so only a strictly greater weight replaces the leader.
fn plurality<K: Ord + Clone>(tally: &BTreeMap<K, f64>) -> Option<(K, f64)> {
    let total: f64 = tally.values().sum();
    if total <= 0.0 {
        return None;
    }
    let mut best: Option<(&K, f64)> = None;
    for (key, &weight) in tally {
        if best.map_or(true, |(_, leader)| weight > leader) {
            best = Some((key, weight));
        }
    }
    best.map(|(key, weight)| (key.clone(), weight / total))
}

impl DocumentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contribute(&mut self, source: ContributionSource, contribution: Contribution) {
        if contribution.weight > 0.0
            && (contribution.country.is_some() || contribution.admin1.is_some())
        {
            self.contributions.insert(source, contribution);
        }
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        self.tally(None)
    }

    /// Snapshot without `source`'s own vote, so an occurrence is never
    /// scored against its previous resolution.
    pub fn snapshot_excluding(&self, source: ContributionSource) -> ContextSnapshot {
        self.tally(Some(source))
    }

    fn tally(&self, excluded: Option<ContributionSource>) -> ContextSnapshot {
        let mut countries: BTreeMap<String, f64> = BTreeMap::new();
        let mut regions: BTreeMap<PlaceId, f64> = BTreeMap::new();
        for (source, contribution) in &self.contributions {
            if Some(*source) == excluded {
                continue;
            }
            if let Some(code) = &contribution.country {
                *countries.entry(code.clone()).or_insert(0.0) += contribution.weight;
            }
            if let Some(id) = contribution.admin1 {
                *regions.entry(id).or_insert(0.0) += contribution.weight;
            }
        }
        ContextSnapshot {
            country: plurality(&countries).map(|(code, share)| DominantCountry { code, share }),
            region: plurality(&regions).map(|(id, share)| DominantRegion { id, share }),
        }
    }
}
