//! Keystore - cache-first key lookup with retriever fallback.
//!
//! Keys are looked up by channel name and access mode. A lookup first
//! consults the expiring store; on a miss the bound [`Retriever`] is asked
//! for the key, and a non-empty result is cached with the store's TTL.
//! Failed or empty resolutions are never cached, so a later lookup retries.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use keystore::{CacheConfig, Keystore};
//!
//! let keystore = Keystore::new(CacheConfig::with_ttl(Duration::from_secs(3600))).unwrap();
//! keystore.set("telemetry", "r", "key");
//!
//! assert_eq!(keystore.must("telemetry", "r").unwrap(), "key");
//! assert!(keystore.must("telemetry", "w").is_err());
//! assert_eq!(keystore.get("telemetry", "w"), "");
//! ```

mod codec;
mod retriever;
mod stats;

pub use codec::LookupKey;
pub use retriever::{Retriever, StaticRetriever};
pub use stats::KeystoreStats;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheConfig, ExpiringStore};
use crate::error::{KeystoreError, StoreError};
use stats::Counters;

/// Store and retriever binding, swapped together by `init`.
struct State {
    store: ExpiringStore,
    retriever: Option<Arc<dyn Retriever>>,
}

/// Cache-first key store.
///
/// Each instance owns its store and retriever; instances never share
/// entries. `must`/`get`/`set` are safe to call from many threads at once.
/// `init` and `clear` are administrative and should not race with lookups.
pub struct Keystore {
    state: RwLock<State>,
    /// Per-key resolution locks, present when single-flight is enabled.
    in_flight: Option<DashMap<String, Arc<Mutex<()>>>>,
    counters: Counters,
}

impl Keystore {
    /// Create a keystore without a retriever. Only keys added with `set`
    /// can be found.
    pub fn new(config: CacheConfig) -> Result<Self, StoreError> {
        Self::build(None, config)
    }

    /// Create a keystore that resolves misses with `retriever`.
    pub fn with_retriever(
        retriever: impl Retriever + 'static,
        config: CacheConfig,
    ) -> Result<Self, StoreError> {
        Self::build(Some(Arc::new(retriever)), config)
    }

    fn build(
        retriever: Option<Arc<dyn Retriever>>,
        config: CacheConfig,
    ) -> Result<Self, StoreError> {
        let store = ExpiringStore::new(&config)?;
        info!(
            "Keystore initialized (ttl: {:?}, retriever: {})",
            config.ttl,
            retriever.is_some()
        );

        Ok(Self {
            state: RwLock::new(State { store, retriever }),
            in_flight: None,
            counters: Counters::default(),
        })
    }

    /// Serialize concurrent misses on the same key so the retriever runs
    /// once per key at a time (builder pattern).
    #[must_use]
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(DashMap::new);
        self
    }

    /// Start over with an empty store and no retriever.
    ///
    /// On error the keystore is left unchanged.
    pub fn init(&self, config: CacheConfig) -> Result<(), StoreError> {
        self.rebind(None, config)
    }

    /// Start over with an empty store, resolving misses with `retriever`.
    ///
    /// On error the keystore is left unchanged.
    pub fn init_with_retriever(
        &self,
        retriever: impl Retriever + 'static,
        config: CacheConfig,
    ) -> Result<(), StoreError> {
        self.rebind(Some(Arc::new(retriever)), config)
    }

    fn rebind(
        &self,
        retriever: Option<Arc<dyn Retriever>>,
        config: CacheConfig,
    ) -> Result<(), StoreError> {
        let store = ExpiringStore::new(&config)?;
        info!(
            "Keystore reinitialized (ttl: {:?}, retriever: {})",
            config.ttl,
            retriever.is_some()
        );

        *self.state.write() = State { store, retriever };
        self.counters.reset();
        Ok(())
    }

    /// Store a key, replacing any cached one. Visible to lookups at once.
    pub fn set(&self, channel: &str, access: &str, key: &str) {
        self.state
            .read()
            .store
            .set(LookupKey::encode(channel, access), key);
    }

    /// Look up a key, resolving it with the retriever on a miss.
    pub fn must(&self, channel: &str, access: &str) -> Result<String, KeystoreError> {
        let key = LookupKey::encode(channel, access);
        let (store, retriever) = {
            let state = self.state.read();
            (state.store.clone(), state.retriever.clone())
        };

        if let Some(value) = store.get(key.as_str()) {
            self.counters.hit();
            debug!("Key cache hit for channel {} access {}", channel, access);
            return Ok(value);
        }

        self.counters.miss();
        debug!("Key cache miss for channel {} access {}", channel, access);

        let Some(retriever) = retriever else {
            self.counters.failed();
            return Err(KeystoreError::NoRetrieverBound {
                channel: channel.to_string(),
                access: access.to_string(),
            });
        };

        let lookup = Lookup {
            store: &store,
            retriever: retriever.as_ref(),
            key: &key,
            channel,
            access,
        };

        match &self.in_flight {
            Some(in_flight) => self.resolve_once(in_flight, lookup),
            None => self.resolve(lookup),
        }
    }

    /// Best-effort lookup: the key, or an empty string on any error.
    pub fn get(&self, channel: &str, access: &str) -> String {
        self.must(channel, access).unwrap_or_default()
    }

    /// Look up a key and parse it as `T`.
    ///
    /// A key that does not parse is a `TypeMismatch`, never a miss.
    pub fn must_as<T>(&self, channel: &str, access: &str) -> Result<T, KeystoreError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.must(channel, access)?;

        value.parse::<T>().map_err(|err| {
            let expected = std::any::type_name::<T>();
            error!(
                "Key for channel {} access {} is not a valid {}: {}",
                channel, access, expected, err
            );
            KeystoreError::TypeMismatch {
                channel: channel.to_string(),
                access: access.to_string(),
                expected,
                reason: err.to_string(),
            }
        })
    }

    /// Drop a single cached key.
    pub fn invalidate(&self, channel: &str, access: &str) {
        self.state
            .read()
            .store
            .invalidate(LookupKey::encode(channel, access).as_str());
    }

    /// Drop every cached key. The retriever stays bound.
    pub fn clear(&self) {
        self.state.read().store.clear();
        info!("Keystore cleared");
    }

    /// Time left for a cached key: `None` if not cached, `Some(None)` if it
    /// never expires.
    pub fn remaining_ttl(&self, channel: &str, access: &str) -> Option<Option<Duration>> {
        self.state
            .read()
            .store
            .remaining_ttl(LookupKey::encode(channel, access).as_str())
    }

    /// TTL applied to newly cached keys.
    pub fn ttl(&self) -> Option<Duration> {
        self.state.read().store.ttl()
    }

    pub fn has_retriever(&self) -> bool {
        self.state.read().retriever.is_some()
    }

    /// Number of live cached keys.
    pub fn len(&self) -> u64 {
        let state = self.state.read();
        state.store.sweep();
        state.store.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup counters since the last `init`.
    pub fn stats(&self) -> KeystoreStats {
        self.counters.snapshot()
    }

    /// Resolve under the per-key lock. Callers that waited on another
    /// resolution find its result in the store and skip the retriever.
    fn resolve_once(
        &self,
        in_flight: &DashMap<String, Arc<Mutex<()>>>,
        lookup: Lookup<'_>,
    ) -> Result<String, KeystoreError> {
        let lock = Arc::clone(&in_flight.entry(lookup.key.to_string()).or_default());

        let result = {
            let _guard = lock.lock();
            match lookup.store.get(lookup.key.as_str()) {
                Some(value) => {
                    debug!(
                        "Key for channel {} access {} resolved by a concurrent lookup",
                        lookup.channel, lookup.access
                    );
                    Ok(value)
                }
                None => self.resolve(lookup),
            }
        };

        drop(lock);
        in_flight.remove_if(lookup.key.as_str(), |_, pending| {
            Arc::strong_count(pending) == 1
        });

        result
    }

    fn resolve(&self, lookup: Lookup<'_>) -> Result<String, KeystoreError> {
        let Lookup {
            store,
            retriever,
            key,
            channel,
            access,
        } = lookup;

        let value = match retriever.retrieve(channel, access) {
            Ok(value) => value,
            Err(source) => {
                self.counters.failed();
                warn!(
                    "Retriever failed for channel {} access {}: {}",
                    channel, access, source
                );
                return Err(KeystoreError::RetrieverFailed {
                    channel: channel.to_string(),
                    access: access.to_string(),
                    source,
                });
            }
        };

        if value.trim().is_empty() {
            self.counters.failed();
            warn!(
                "Retriever returned an empty key for channel {} access {}",
                channel, access
            );
            return Err(KeystoreError::ResolvedEmpty {
                channel: channel.to_string(),
                access: access.to_string(),
            });
        }

        store.set(key.as_str(), value.as_str());
        self.counters.resolved();
        debug!("Cached resolved key for channel {} access {}", channel, access);

        Ok(value)
    }
}

/// One miss being resolved.
#[derive(Clone, Copy)]
struct Lookup<'a> {
    store: &'a ExpiringStore,
    retriever: &'a dyn Retriever,
    key: &'a LookupKey,
    channel: &'a str,
    access: &'a str,
}

impl fmt::Debug for Keystore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Keystore")
            .field("store", &state.store)
            .field("has_retriever", &state.retriever.is_some())
            .field("single_flight", &self.in_flight.is_some())
            .finish()
    }
}
