// src/utils/logging.rs - Logging helpers for one resolution run
use log::{debug, info, warn};
use std::time::Instant;
use uuid::Uuid;

use crate::errors::InvalidCoordinate;
use crate::models::MatchKind;

#[derive(Debug, Clone)]
pub struct ResolutionLogger {
    run_id: String,
    start_time: Instant,
}

impl Default for ResolutionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionLogger {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn tag(&self) -> &str {
        &self.run_id[..8]
    }

    pub fn log_start(&self, locations: usize, coordinates: usize, fingerprint: &str) {
        info!(
            "[{}] 🚀 Resolving {} location mentions and {} coordinates (gazetteer {})",
            self.tag(),
            locations,
            coordinates,
            fingerprint.chars().take(12).collect::<String>()
        );
    }

    pub fn log_candidates(
        &self,
        mention: &str,
        start: usize,
        candidates: usize,
        best_kind: Option<MatchKind>,
        cached: bool,
    ) {
        debug!(
            "[{}] 🔍 '{}' @{}: {} candidates, best {}{}",
            self.tag(),
            mention,
            start,
            candidates,
            best_kind.unwrap_or(MatchKind::Unresolved).as_str(),
            if cached { " (cached)" } else { "" }
        );
    }

    pub fn log_invalid_coordinate(&self, start: usize, error: &InvalidCoordinate) {
        warn!(
            "[{}] ⚠️  Coordinate @{} rejected: {}",
            self.tag(),
            start,
            error
        );
    }

    pub fn log_pass(&self, pass: usize, scored: usize, ambiguous: usize, changed: usize) {
        let elapsed = self.start_time.elapsed();
        info!(
            "[{}] 🔄 Pass {}: scored {} occurrences, {} ambiguous, {} winners changed [+{:.3}s]",
            self.tag(),
            pass,
            scored,
            ambiguous,
            changed,
            elapsed.as_secs_f32()
        );
    }

    pub fn log_stopped_early(&self, completed_passes: usize) {
        warn!(
            "[{}] ⏱️  Refinement stopped by caller after {} complete pass(es)",
            self.tag(),
            completed_passes
        );
    }

    pub fn log_completion(&self, resolved: usize, unresolved: usize, invalid: usize, passes: usize) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] ✅ Resolution complete in {:.2?}: {} resolved, {} unresolved, {} invalid coordinates, {} pass(es)",
            self.tag(),
            duration,
            resolved,
            unresolved,
            invalid,
            passes
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        let a = ResolutionLogger::new();
        let b = ResolutionLogger::new();
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.tag().len(), 8);
    }
}
