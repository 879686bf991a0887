// src/gazetteer/index.rs - Immutable, arena-backed gazetteer index
use anyhow::{bail, Result};
use log::{debug, info, warn};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::gazetteer::spatial::{PlacePoint, SpatialIndex};
use crate::matching::normalize::{fold_name, name_similarity, trigrams};
use crate::models::{LatLon, MatchKind, Place, PlaceId};

/// A place whose name matched a lookup key.
#[derive(Debug, Clone)]
pub struct NameHit {
    pub place: Arc<Place>,
    pub match_kind: MatchKind,
    /// 1.0 for exact-style hits, the similarity for fuzzy hits.
    pub similarity: f64,
    /// The gazetteer name that produced the hit.
    pub matched_name: String,
}

#[derive(Debug, Clone)]
pub struct SpatialHit {
    pub place: Arc<Place>,
    pub distance_km: f64,
}

/// Query contract the resolution core relies on. Every lookup is read-only;
/// an empty result means "no match", never an error.
pub trait PlaceIndex: Send + Sync {
    fn place(&self, id: PlaceId) -> Option<&Arc<Place>>;

    /// Diacritic- and case-normalized exact match on name, ascii name and
    /// alternate names. `folded` must already be folded.
    fn lookup_exact(&self, folded: &str) -> Vec<NameHit>;

    /// Similarity search over the name corpus, dropping anything below
    /// `min_similarity`. Sorted by similarity, then id.
    fn lookup_fuzzy(&self, folded: &str, min_similarity: f64) -> Vec<NameHit>;

    /// Places with a center within `radius_km`, nearest first, ties by id.
    fn nearby(&self, position: &LatLon, radius_km: f64) -> Vec<SpatialHit>;

    /// Country-level records for an ISO-3166 alpha-2 code.
    fn countries(&self, country_code: &str) -> Vec<Arc<Place>>;
}

#[derive(Debug, Clone)]
struct NameEntry {
    slot: usize,
    kind: MatchKind,
    name: String,
}

/// Read-only gazetteer. Built once by [`GazetteerBuilder`], then shared
/// behind an `Arc` by any number of concurrent resolution runs.
#[derive(Debug)]
pub struct GazetteerIndex {
    places: Vec<Arc<Place>>,
    slots: HashMap<PlaceId, usize>,
    names: HashMap<String, Vec<NameEntry>>,
    keys: Vec<String>,
    trigram_postings: HashMap<String, Vec<u32>>,
    countries: HashMap<String, Vec<usize>>,
    spatial: SpatialIndex,
    fingerprint: String,
    containment_cycles: usize,
}

impl GazetteerIndex {
    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// SHA-256 over the loaded records, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of administrative containment cycles found at build time.
    pub fn containment_cycles(&self) -> usize {
        self.containment_cycles
    }
}

impl PlaceIndex for GazetteerIndex {
    fn place(&self, id: PlaceId) -> Option<&Arc<Place>> {
        self.slots.get(&id).map(|&slot| &self.places[slot])
    }

    fn lookup_exact(&self, folded: &str) -> Vec<NameHit> {
        self.names
            .get(folded)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| NameHit {
                        place: Arc::clone(&self.places[entry.slot]),
                        match_kind: entry.kind,
                        similarity: 1.0,
                        matched_name: entry.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lookup_fuzzy(&self, folded: &str, min_similarity: f64) -> Vec<NameHit> {
        if folded.is_empty() {
            return Vec::new();
        }

        let mut candidate_keys: HashSet<u32> = HashSet::new();
        for gram in trigrams(folded) {
            if let Some(postings) = self.trigram_postings.get(&gram) {
                candidate_keys.extend(postings.iter().copied());
            }
        }

        // slot -> (similarity, matched name)
        let mut best: HashMap<usize, (f64, &str)> = HashMap::new();
        for key_id in candidate_keys {
            let key = &self.keys[key_id as usize];
            let similarity = name_similarity(folded, key);
            if similarity < min_similarity {
                continue;
            }
            if let Some(entries) = self.names.get(key) {
                for entry in entries {
                    let slot_best = best.entry(entry.slot).or_insert((similarity, entry.name.as_str()));
                    if similarity > slot_best.0
                        || (similarity == slot_best.0 && entry.name.as_str() < slot_best.1)
                    {
                        *slot_best = (similarity, entry.name.as_str());
                    }
                }
            }
        }

        let mut hits: Vec<NameHit> = best
            .into_iter()
            .map(|(slot, (similarity, name))| NameHit {
                place: Arc::clone(&self.places[slot]),
                match_kind: MatchKind::Fuzzy,
                similarity,
                matched_name: name.to_string(),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.place.id.cmp(&b.place.id))
        });
        debug!(
            "Fuzzy lookup '{}' -> {} hits at >= {:.2}",
            folded,
            hits.len(),
            min_similarity
        );
        hits
    }

    fn nearby(&self, position: &LatLon, radius_km: f64) -> Vec<SpatialHit> {
        let mut hits: Vec<SpatialHit> = self
            .spatial
            .slots_within(position, radius_km)
            .into_iter()
            .filter_map(|slot| {
                let place = &self.places[slot];
                let distance_km = place.center.as_ref()?.distance_km(position);
                (distance_km <= radius_km).then(|| SpatialHit {
                    place: Arc::clone(place),
                    distance_km,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.place.id.cmp(&b.place.id))
        });
        hits
    }

    fn countries(&self, country_code: &str) -> Vec<Arc<Place>> {
        self.countries
            .get(&country_code.to_ascii_uppercase())
            .map(|slots| slots.iter().map(|&slot| Arc::clone(&self.places[slot])).collect())
            .unwrap_or_default()
    }
}

/// Collects place records and freezes them into a [`GazetteerIndex`].
#[derive(Debug, Default)]
pub struct GazetteerBuilder {
    places: Vec<Place>,
    ids: HashSet<PlaceId>,
}

impl GazetteerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut place: Place) -> Result<()> {
        if !self.ids.insert(place.id) {
            bail!("duplicate place id {} ({})", place.id, place.name);
        }
        let mut seen = HashSet::new();
        place
            .alternate_names
            .retain(|name| !name.trim().is_empty() && seen.insert(name.clone()));
        place.primary_country_code = place
            .primary_country_code
            .map(|code| code.trim().to_ascii_uppercase())
            .filter(|code| !code.is_empty());
        for code in place.alternate_country_codes.iter_mut() {
            *code = code.trim().to_ascii_uppercase();
        }
        self.places.push(place);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn build(mut self) -> GazetteerIndex {
        let start = Instant::now();
        self.places.sort_by_key(|place| place.id);

        let places: Vec<Arc<Place>> = self.places.into_iter().map(Arc::new).collect();
        let mut slots = HashMap::with_capacity(places.len());
        let mut names: HashMap<String, Vec<NameEntry>> = HashMap::new();
        let mut countries: HashMap<String, Vec<usize>> = HashMap::new();
        let mut points = Vec::new();
        let mut hasher = Sha256::new();

        for (slot, place) in places.iter().enumerate() {
            slots.insert(place.id, slot);

            register_name(&mut names, &place.name, slot, MatchKind::Exact);
            register_name(&mut names, &place.ascii_name, slot, MatchKind::AsciiNormalized);
            for alternate in &place.alternate_names {
                register_name(&mut names, alternate, slot, MatchKind::AlternateName);
            }

            if place.is_country() {
                if let Some(code) = &place.primary_country_code {
                    countries.entry(code.clone()).or_default().push(slot);
                }
            }
            if let Some(center) = &place.center {
                points.push(PlacePoint::new(center, slot));
            }

            hasher.update(place.id.0.to_le_bytes());
            hasher.update(place.name.as_bytes());
            hasher.update(place.ascii_name.as_bytes());
            if let Some(date) = place.modification_date {
                hasher.update(date.to_string().as_bytes());
            }
        }

        let mut keys: Vec<String> = names.keys().cloned().collect();
        keys.sort();
        let mut trigram_postings: HashMap<String, Vec<u32>> = HashMap::new();
        for (key_id, key) in keys.iter().enumerate() {
            for gram in trigrams(key) {
                trigram_postings.entry(gram).or_default().push(key_id as u32);
            }
        }

        let spatial = SpatialIndex::from_points(points.into_iter());

        let containment_cycles = count_containment_cycles(&places, &slots);
        if containment_cycles > 0 {
            warn!(
                "⚠️ Gazetteer contains {} administrative containment cycle(s); ancestry walks will truncate at them",
                containment_cycles
            );
        }

        let index = GazetteerIndex {
            places,
            slots,
            names,
            keys,
            trigram_postings,
            countries,
            spatial,
            fingerprint: hex::encode(hasher.finalize()),
            containment_cycles,
        };
        info!(
            "🌍 Gazetteer index built in {:.2?}: {} places, {} name keys, {} trigrams, {} positioned",
            start.elapsed(),
            index.places.len(),
            index.keys.len(),
            index.trigram_postings.len(),
            index.spatial.len()
        );
        index
    }
}

fn register_name(
    names: &mut HashMap<String, Vec<NameEntry>>,
    name: &str,
    slot: usize,
    kind: MatchKind,
) {
    let key = fold_name(name);
    if key.is_empty() {
        return;
    }
    let entries = names.entry(key).or_default();
    match entries.iter_mut().find(|entry| entry.slot == slot) {
        Some(existing) => {
            if kind.strength() > existing.kind.strength() {
                existing.kind = kind;
                existing.name = name.to_string();
            }
        }
        None => entries.push(NameEntry {
            slot,
            kind,
            name: name.to_string(),
        }),
    }
}

/// Strongly connected components of the administrative-parent graph that
/// form a cycle (size > 1, or a self reference).
fn count_containment_cycles(places: &[Arc<Place>], slots: &HashMap<PlaceId, usize>) -> usize {
    let mut graph: DiGraph<PlaceId, ()> = DiGraph::with_capacity(places.len(), places.len());
    let nodes: Vec<NodeIndex> = places.iter().map(|place| graph.add_node(place.id)).collect();
    for (slot, place) in places.iter().enumerate() {
        for reference in place.administrative_parents() {
            if let Some(&target) = slots.get(&reference.target) {
                graph.add_edge(nodes[slot], nodes[target], ());
            }
        }
    }
    tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.find_edge(component[0], component[0]).is_some()
        })
        .inspect(|component| {
            let ids: Vec<PlaceId> = component.iter().map(|&node| graph[node]).collect();
            debug!("Containment cycle among places {:?}", ids);
        })
        .count()
}
