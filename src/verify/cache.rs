//! Process-lifetime cache of verification results.
//!
//! Entries are only written once a job reaches a terminal classification and
//! are never evicted or invalidated; a later result for the same identifier
//! simply replaces the earlier one.

use crate::verify::types::VerificationResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared result cache keyed by product identifier.
#[derive(Clone, Default)]
pub struct ResultCache {
    inner: Arc<Mutex<HashMap<String, VerificationResult>>>,
    stats: Arc<Mutex<CacheStats>>,
}

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of results stored.
    pub insertions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl ResultCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously stored result.
    pub fn get(&self, product_id: &str) -> Option<VerificationResult> {
        let found = self.inner.lock().get(product_id).cloned();

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        found
    }

    /// Store a terminal result under its product identifier.
    pub fn insert(&self, result: VerificationResult) {
        self.inner.lock().insert(result.product_id.clone(), result);
        self.stats.lock().insertions += 1;
    }

    /// Whether a result is stored for `product_id`, without touching stats.
    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.inner.lock().contains_key(product_id)
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Get the current number of entries in the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
