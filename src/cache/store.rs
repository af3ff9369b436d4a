//! Expiring key-value store backed by Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use tracing::trace;

use super::CacheConfig;
use crate::error::StoreError;

/// A stored value together with the instant it was written.
#[derive(Debug, Clone)]
struct Entry {
    value: Arc<str>,
    inserted_at: Instant,
}

impl Entry {
    fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            inserted_at: Instant::now(),
        }
    }

    /// Time left before this entry expires under `ttl`, `None` once expired.
    fn remaining(&self, ttl: Duration, now: Instant) -> Option<Duration> {
        ttl.checked_sub(now.saturating_duration_since(self.inserted_at))
            .filter(|left| !left.is_zero())
    }
}

/// A concurrency-safe string store with a uniform time-to-live.
///
/// This store is:
/// - Thread-safe: `get`/`set` may be called from any number of threads
/// - TTL-based: every write is stamped and expires after the configured TTL
/// - Clone-friendly (cloning is cheap, shares the same underlying map)
///
/// Expired entries are never returned. Moka evicts them lazily during
/// normal operations; `sweep` forces pending evictions to run. The store
/// is unbounded, so a write is never evicted to make room for another.
#[derive(Clone)]
pub struct ExpiringStore {
    inner: Arc<Cache<String, Entry>>,
    ttl: Option<Duration>,
}

impl ExpiringStore {
    /// Create a new empty store from the given config.
    pub fn new(config: &CacheConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let mut builder = Cache::builder();

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Ok(Self {
            inner: Arc::new(builder.build()),
            ttl: config.ttl,
        })
    }

    /// The TTL applied to writes, `None` if entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Insert or overwrite a value, stamped now.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Arc<str>>) {
        self.inner.insert(key.into(), Entry::new(value));
    }

    /// Get a live value from the store.
    ///
    /// Returns `None` if the key is absent or its entry has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        self.live_entry(key).map(|entry| entry.value.to_string())
    }

    /// Time left for a live entry.
    ///
    /// Returns `None` if the key is absent or expired, `Some(None)` if the
    /// entry never expires.
    pub fn remaining_ttl(&self, key: &str) -> Option<Option<Duration>> {
        let entry = self.live_entry(key)?;
        match self.ttl {
            None => Some(None),
            Some(ttl) => entry.remaining(ttl, Instant::now()).map(Some),
        }
    }

    /// Remove a single key.
    pub fn invalidate(&self, key: &str) {
        self.inner.invalidate(key);
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
    }

    /// Run pending maintenance, evicting expired entries now.
    pub fn sweep(&self) {
        self.inner.run_pending_tasks();
    }

    /// Get the number of entries in the store.
    ///
    /// Note: This may not be perfectly accurate due to concurrent operations.
    /// Call `sweep` first for an up-to-date count.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    fn live_entry(&self, key: &str) -> Option<Entry> {
        let entry = self.inner.get(key)?;

        // Moka removes the entry itself; invalidating here could drop a
        // value written concurrently under the same key.
        if let Some(ttl) = self.ttl
            && entry.remaining(ttl, Instant::now()).is_none()
        {
            trace!("Skipping expired entry on read");
            return None;
        }

        Some(entry)
    }
}

impl std::fmt::Debug for ExpiringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("ttl", &self.ttl)
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn store(ttl: Duration) -> ExpiringStore {
        ExpiringStore::new(&CacheConfig::with_ttl(ttl)).unwrap()
    }

    #[test]
    fn test_set_then_get() {
        let store = store(Duration::ZERO);
        assert_eq!(store.get("k"), None);

        store.set("k", "v1");
        assert_eq!(store.get("k").as_deref(), Some("v1"));

        store.set("k", "v2");
        assert_eq!(store.get("k").as_deref(), Some("v2"));
        assert_eq!(store.remaining_ttl("k"), Some(None));
    }

    #[test]
    fn test_expired_entry_is_never_found() {
        let store = store(Duration::from_millis(100));
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));

        let left = store.remaining_ttl("k").flatten().unwrap();
        assert!(left <= Duration::from_millis(100));

        thread::sleep(Duration::from_millis(200));
        assert_eq!(store.get("k"), None);
        assert_eq!(store.remaining_ttl("k"), None);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let store = store(Duration::from_secs(60));
        store.set("a", "1");
        store.set("b", "2");

        store.invalidate("a");
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b").as_deref(), Some("2"));

        store.clear();
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_clones_share_entries() {
        let store = store(Duration::ZERO);
        let other = store.clone();
        store.set("k", "v");
        assert_eq!(other.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_concurrent_set_and_get() {
        let store = store(Duration::from_secs(60));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("{t}-{i}");
                        store.set(key.clone(), format!("value-{i}"));
                        assert_eq!(store.get(&key), Some(format!("value-{i}")));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        store.sweep();
        assert_eq!(store.entry_count(), 8 * 50);
    }

    #[test]
    fn test_unbounded_store_keeps_every_write() {
        let store = store(Duration::from_secs(3600));

        for i in 0..2_000 {
            store.set(format!("key-{i}"), format!("value-{i}"));
        }
        store.sweep();

        assert_eq!(store.entry_count(), 2_000);
        for i in 0..2_000 {
            assert_eq!(store.get(&format!("key-{i}")), Some(format!("value-{i}")));
        }
    }

    #[test]
    fn test_expired_reads_do_not_drop_fresh_writes() {
        let ttl = Duration::from_millis(20);
        let store = store(ttl);
        let deadline = Instant::now() + Duration::from_millis(300);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    while Instant::now() < deadline {
                        let _ = store.get("k");
                    }
                })
            })
            .collect();

        let mut i = 0u64;
        while Instant::now() < deadline {
            let written = Instant::now();
            store.set("k", format!("v{i}"));
            let read = store.get("k");

            // Only a write still well inside its TTL must be visible.
            if written.elapsed() < ttl / 2 {
                assert_eq!(read, Some(format!("v{i}")));
            }

            thread::sleep(ttl);
            i += 1;
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
