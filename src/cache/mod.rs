//! Cache module - expiring in-memory storage using Moka.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use keystore::cache::{CacheConfig, ExpiringStore};
//!
//! let store = ExpiringStore::new(&CacheConfig::with_ttl(Duration::from_secs(60))).unwrap();
//! store.set("key", "value");
//! assert_eq!(store.get("key").as_deref(), Some("value"));
//! ```

mod config;
mod store;

pub use config::{CacheConfig, MAX_TTL};
pub use store::ExpiringStore;
