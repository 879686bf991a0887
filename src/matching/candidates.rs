// src/matching/candidates.rs - Mention -> ranked gazetteer candidates
use log::debug;
use lru::LruCache;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::gazetteer::index::{NameHit, PlaceIndex};
use crate::matching::normalize::{demonym_country, fold_name, mention_variants};
use crate::models::{MatchKind, Place, PlaceId};
use crate::utils::resolver_config::ResolverConfig;

/// One gazetteer record a mention may refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub place: Arc<Place>,
    pub match_kind: MatchKind,
    /// Lexical score: fixed per kind, or the similarity for fuzzy hits.
    pub base_score: f64,
    pub matched_name: String,
    /// The mention names this candidate's country, either directly through a
    /// non-fuzzy match on a country record or as a demonym.
    pub names_country: bool,
}

pub fn base_score(kind: MatchKind, similarity: f64) -> f64 {
    match kind {
        MatchKind::Exact => 1.0,
        MatchKind::AsciiNormalized => 0.97,
        MatchKind::AlternateName => 0.95,
        MatchKind::Fuzzy => similarity,
        MatchKind::Unresolved => 0.0,
    }
}

/// Ordering for candidates with equal scores: larger population, then lower
/// feature rank, then smaller id.
pub fn tie_break(a: &Place, b: &Place) -> Ordering {
    b.population
        .cmp(&a.population)
        .then_with(|| a.feature_rank().cmp(&b.feature_rank()))
        .then_with(|| a.id.cmp(&b.id))
}

fn merge_hits(merged: &mut HashMap<PlaceId, NameHit>, hits: Vec<NameHit>) {
    for hit in hits {
        match merged.get_mut(&hit.place.id) {
            Some(existing) => {
                let stronger = hit.match_kind.strength() > existing.match_kind.strength()
                    || (hit.match_kind == existing.match_kind && hit.similarity > existing.similarity);
                if stronger {
                    *existing = hit;
                }
            }
            None => {
                merged.insert(hit.place.id, hit);
            }
        }
    }
}

/// Candidates for one mention, best first, at most `max_candidates`.
/// Exact/alternate lookup runs first; fuzzy lookup only when it finds nothing;
/// demonym country records only when both find nothing.
pub fn generate_candidates<I: PlaceIndex + ?Sized>(
    index: &I,
    mention: &str,
    config: &ResolverConfig,
) -> Vec<Candidate> {
    let variants = mention_variants(mention);
    let Some(folded) = variants.first().filter(|v| !v.is_empty()).cloned() else {
        return Vec::new();
    };
    let demonym = demonym_country(&folded);

    let mut merged: HashMap<PlaceId, NameHit> = HashMap::new();
    for variant in &variants {
        merge_hits(&mut merged, index.lookup_exact(variant));
    }
    if merged.is_empty() {
        for variant in &variants {
            merge_hits(
                &mut merged,
                index.lookup_fuzzy(variant, config.min_fuzzy_similarity),
            );
        }
    }
    if merged.is_empty() {
        if let Some(code) = demonym {
            debug!("'{}' is a demonym for {}", mention, code);
            for country in index.countries(code) {
                merged.insert(
                    country.id,
                    NameHit {
                        matched_name: country.name.clone(),
                        place: country,
                        match_kind: MatchKind::AlternateName,
                        similarity: 1.0,
                    },
                );
            }
        }
    }

    let mut candidates: Vec<Candidate> = merged
        .into_values()
        .map(|hit| {
            let names_country = (hit.place.is_country() && hit.match_kind != MatchKind::Fuzzy)
                || demonym.is_some_and(|code| hit.place.in_country(code) && hit.place.is_country());
            Candidate {
                base_score: base_score(hit.match_kind, hit.similarity),
                match_kind: hit.match_kind,
                matched_name: hit.matched_name,
                names_country,
                place: hit.place,
            }
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.base_score
            .total_cmp(&a.base_score)
            .then_with(|| tie_break(&a.place, &b.place))
    });
    candidates.truncate(config.max_candidates);
    candidates
}

/// Per-run memo of candidate lists keyed by folded mention, so a name
/// repeated through a document hits the index once.
pub struct CandidateCache {
    cache: LruCache<String, Arc<Vec<Candidate>>>,
    pub hits: usize,
    pub misses: usize,
}

impl CandidateCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached candidates for `mention`, generating them on a miss. The flag
    /// reports whether the list came from the cache.
    pub fn get_or_generate<I: PlaceIndex + ?Sized>(
        &mut self,
        index: &I,
        mention: &str,
        config: &ResolverConfig,
    ) -> (Arc<Vec<Candidate>>, bool) {
        let key = fold_name(mention);
        if let Some(candidates) = self.cache.get(&key) {
            self.hits += 1;
            return (Arc::clone(candidates), true);
        }
        self.misses += 1;
        let candidates = Arc::new(generate_candidates(index, mention, config));
        self.cache.put(key, Arc::clone(&candidates));
        (candidates, false)
    }
}
