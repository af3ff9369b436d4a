//! Configuration module for the keystore.
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::error::ConfigError;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// TTL for cached keys. Zero means keys never expire.
    pub ttl: Duration,

    /// Serialize concurrent misses on the same key.
    pub single_flight: bool,

    /// JSON key table served by a `StaticRetriever`.
    /// Without it, only keys set at runtime can be found.
    pub keys_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Callers wanting `.env` support load it with `dotenvy` beforehand.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_secs: u64 = parse_var(&lookup, "KEYSTORE_TTL_SECS")?.unwrap_or(0);

        let single_flight = match lookup("KEYSTORE_SINGLE_FLIGHT") {
            None => false,
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "" | "0" | "false" | "no" | "off" => false,
                "1" | "true" | "yes" | "on" => true,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "KEYSTORE_SINGLE_FLIGHT",
                        value: raw,
                        reason: "expected a boolean".to_string(),
                    });
                }
            },
        };

        let keys_file = lookup("KEYSTORE_KEYS_FILE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            ttl: Duration::from_secs(ttl_secs),
            single_flight,
            keys_file,
        })
    }

    /// Store configuration derived from this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::with_ttl(self.ttl)
    }
}

/// Parse an optional variable; blank counts as unset.
fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var).filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigError::InvalidValue {
            var,
            reason: err.to_string(),
            value: raw,
        })
}
