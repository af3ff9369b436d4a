//! Keystore - lazily populated, expiring credential cache.
//!
//! Resolves access keys for a (channel, access mode) pair, serving cached
//! keys instantly and falling back to a pluggable retriever on a miss.
//!
//! ## Architecture
//!
//! - `cache` - Expiring in-memory store with Moka
//! - `keystore` - Key encoding, retrievers and the cache-first `Keystore`
//! - `config` - Environment configuration
//! - `error` - Error types

pub mod cache;
pub mod config;
pub mod error;
pub mod keystore;

pub use cache::{CacheConfig, ExpiringStore};
pub use config::Config;
pub use error::{BoxError, ConfigError, KeystoreError, LoadError, StoreError};
pub use keystore::{Keystore, KeystoreStats, LookupKey, Retriever, StaticRetriever};
