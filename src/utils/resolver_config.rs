// src/utils/resolver_config.rs
//! Resolution thresholds and scoring weights, read from the environment.

use log::{info, warn};
use std::env;
use std::str::FromStr;

/// Feature weights of the disambiguation score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub lexical: f64,
    pub population: f64,
    pub feature_class: f64,
    pub context: f64,
    pub proximity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            lexical: 0.40,
            population: 0.15,
            feature_class: 0.15,
            context: 0.20,
            proximity: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lexical: env_or("GEO_WEIGHT_LEXICAL", defaults.lexical),
            population: env_or("GEO_WEIGHT_POPULATION", defaults.population),
            feature_class: env_or("GEO_WEIGHT_FEATURE", defaults.feature_class),
            context: env_or("GEO_WEIGHT_CONTEXT", defaults.context),
            proximity: env_or("GEO_WEIGHT_PROXIMITY", defaults.proximity),
        }
    }

    pub fn sum(&self) -> f64 {
        self.lexical + self.population + self.feature_class + self.context + self.proximity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Fuzzy hits below this similarity are dropped.
    pub min_fuzzy_similarity: f64,
    /// Candidates kept per mention (K).
    pub max_candidates: usize,
    /// Winners scoring below this are reported as unresolved.
    pub min_acceptance_score: f64,
    /// Top-two margin at or below which an occurrence is re-scored.
    pub ambiguity_margin: f64,
    pub max_passes: usize,
    pub max_ancestry_hops: usize,
    pub proximity_radius_km: f64,
    /// Aggregator weight of a located coordinate.
    pub coordinate_context_weight: f64,
    pub candidate_cache_size: usize,
    pub weights: ScoringWeights,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_fuzzy_similarity: 0.65,
            max_candidates: 10,
            min_acceptance_score: 0.40,
            ambiguity_margin: 0.10,
            max_passes: 3,
            max_ancestry_hops: 10,
            proximity_radius_km: 50.0,
            coordinate_context_weight: 0.30,
            candidate_cache_size: 1024,
            weights: ScoringWeights::default(),
        }
    }
}

fn env_or<T: FromStr + ToString>(key: &str, default: T) -> T {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

impl ResolverConfig {
    /// Create configuration from environment variables. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            min_fuzzy_similarity: env_or("GEO_MIN_FUZZY_SIMILARITY", defaults.min_fuzzy_similarity),
            max_candidates: env_or("GEO_MAX_CANDIDATES", defaults.max_candidates),
            min_acceptance_score: env_or("GEO_MIN_ACCEPTANCE_SCORE", defaults.min_acceptance_score),
            ambiguity_margin: env_or("GEO_AMBIGUITY_MARGIN", defaults.ambiguity_margin),
            max_passes: env_or("GEO_MAX_PASSES", defaults.max_passes),
            max_ancestry_hops: env_or("GEO_MAX_ANCESTRY_HOPS", defaults.max_ancestry_hops),
            proximity_radius_km: env_or("GEO_PROXIMITY_RADIUS_KM", defaults.proximity_radius_km),
            coordinate_context_weight: env_or(
                "GEO_COORDINATE_CONTEXT_WEIGHT",
                defaults.coordinate_context_weight,
            ),
            candidate_cache_size: env_or("GEO_CANDIDATE_CACHE_SIZE", defaults.candidate_cache_size),
            weights: ScoringWeights::from_env(),
        };
        config.sanitized()
    }

    /// Clamps values that would break the resolver loop.
    pub fn sanitized(mut self) -> Self {
        if self.max_passes == 0 {
            warn!("GEO_MAX_PASSES=0 is not usable; running a single pass");
            self.max_passes = 1;
        }
        if self.max_candidates == 0 {
            warn!("GEO_MAX_CANDIDATES=0 is not usable; keeping 1 candidate");
            self.max_candidates = 1;
        }
        if self.candidate_cache_size == 0 {
            self.candidate_cache_size = 1;
        }
        if !(self.proximity_radius_km > 0.0) {
            warn!(
                "Proximity radius {} km is not positive; using 50 km",
                self.proximity_radius_km
            );
            self.proximity_radius_km = 50.0;
        }
        self.min_fuzzy_similarity = self.min_fuzzy_similarity.clamp(0.0, 1.0);
        self
    }

    /// Log the effective configuration
    pub fn log_config(&self) {
        info!("🧭 Resolver configuration:");
        info!(
            "   Candidates: top {} per mention, fuzzy similarity >= {:.2}",
            self.max_candidates, self.min_fuzzy_similarity
        );
        info!(
            "   Acceptance >= {:.2}, ambiguity margin {:.2}, at most {} passes",
            self.min_acceptance_score, self.ambiguity_margin, self.max_passes
        );
        info!(
            "   Ancestry hops <= {}, proximity radius {:.0} km, coordinate weight {:.2}",
            self.max_ancestry_hops, self.proximity_radius_km, self.coordinate_context_weight
        );
        info!(
            "   Weights: lexical {:.2}, population {:.2}, feature {:.2}, context {:.2}, proximity {:.2}",
            self.weights.lexical,
            self.weights.population,
            self.weights.feature_class,
            self.weights.context,
            self.weights.proximity
        );
        if (self.weights.sum() - 1.0).abs() > 1e-6 {
            warn!(
                "⚠️ Scoring weights sum to {:.3}, not 1.0; acceptance threshold keeps its absolute meaning",
                self.weights.sum()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.min_fuzzy_similarity, 0.65);
        assert_eq!(config.max_candidates, 10);
        assert_eq!(config.max_passes, 3);
        assert_eq!(config.max_ancestry_hops, 10);
        assert_eq!(config.proximity_radius_km, 50.0);
        assert!((config.weights.sum() - 1.0).abs() < 1e-9);
        assert!(config.coordinate_context_weight < config.min_acceptance_score);
    }

    #[test]
    fn test_env_config() {
        env::set_var("GEO_MAX_PASSES", "5");
        env::set_var("GEO_AMBIGUITY_MARGIN", "0.25");
        env::set_var("GEO_WEIGHT_CONTEXT", "0.5");
        env::set_var("GEO_MAX_CANDIDATES", "not-a-number");

        let config = ResolverConfig::from_env();
        assert_eq!(config.max_passes, 5);
        assert_eq!(config.ambiguity_margin, 0.25);
        assert_eq!(config.weights.context, 0.5);
        assert_eq!(config.max_candidates, 10);

        env::remove_var("GEO_MAX_PASSES");
        env::remove_var("GEO_AMBIGUITY_MARGIN");
        env::remove_var("GEO_WEIGHT_CONTEXT");
        env::remove_var("GEO_MAX_CANDIDATES");
    }

    #[test]
    fn test_sanitized_fixes_unusable_values() {
        let config = ResolverConfig {
            max_passes: 0,
            max_candidates: 0,
            proximity_radius_km: -1.0,
            min_fuzzy_similarity: 1.5,
            ..ResolverConfig::default()
        }
        .sanitized();
        assert_eq!(config.max_passes, 1);
        assert_eq!(config.max_candidates, 1);
        assert_eq!(config.proximity_radius_km, 50.0);
        assert_eq!(config.min_fuzzy_similarity, 1.0);
    }
}
