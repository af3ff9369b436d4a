//! Lookup counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running lookup counters for a keystore.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    resolutions: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn resolved(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> KeystoreStats {
        KeystoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.resolutions, &self.failures] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of the lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeystoreStats {
    /// Lookups served from the store.
    pub hits: u64,
    /// Lookups that missed the store.
    pub misses: u64,
    /// Misses the retriever resolved and cached.
    pub resolutions: u64,
    /// Misses that ended in an error.
    pub failures: u64,
}
