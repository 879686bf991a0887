// src/gazetteer/handle.rs
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::errors::ResolutionError;
use crate::gazetteer::index::GazetteerIndex;

/// Process-wide holder of the current gazetteer. Runs pin an `Arc` snapshot
/// at start and query it without locks; updates replace the whole index.
#[derive(Debug, Clone, Default)]
pub struct GazetteerHandle {
    current: Arc<RwLock<Option<Arc<GazetteerIndex>>>>,
}

impl GazetteerHandle {
    /// A handle with nothing loaded. Resolution against it fails with
    /// `IndexUnavailable` until an index is swapped in.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(index: GazetteerIndex) -> Self {
        let handle = Self::empty();
        handle.swap(index);
        handle
    }

    pub fn snapshot(&self) -> Result<Arc<GazetteerIndex>, ResolutionError> {
        let current = self.current.read();
        current.clone().ok_or(ResolutionError::IndexUnavailable)
    }

    /// Installs a freshly built index and returns the previous one. Runs that
    /// already pinned the old index finish against it.
    pub fn swap(&self, index: GazetteerIndex) -> Option<Arc<GazetteerIndex>> {
        let fingerprint = short_fingerprint(index.fingerprint());
        let places = index.len();
        let previous = self.current.write().replace(Arc::new(index));
        info!(
            "🔁 Gazetteer swapped in: {} places, fingerprint {} (previous: {})",
            places,
            fingerprint,
            previous
                .as_ref()
                .map(|old| short_fingerprint(old.fingerprint()))
                .unwrap_or_else(|| "none".to_string())
        );
        previous
    }

    pub fn unload(&self) -> Option<Arc<GazetteerIndex>> {
        self.current.write().take()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

fn short_fingerprint(fingerprint: &str) -> String {
    fingerprint.chars().take(12).collect()
}
