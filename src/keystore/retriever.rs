//! Key retrievers invoked on cache misses.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{BoxError, LoadError};

/// Resolves the key for a channel and access mode.
///
/// A retriever may block (broker request, web API call). It owns its own
/// timeout and cancellation; the keystore reports whatever error it
/// returns as the failure reason.
///
/// Any `Fn(&str, &str) -> Result<String, E>` closure is a retriever:
///
/// ```rust
/// use keystore::{CacheConfig, Keystore};
///
/// let keystore = Keystore::with_retriever(
///     |channel: &str, access: &str| Ok::<_, std::io::Error>(format!("secret-{channel}-{access}")),
///     CacheConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(keystore.get("telemetry", "r"), "secret-telemetry-r");
/// ```
pub trait Retriever: Send + Sync {
    fn retrieve(&self, channel: &str, access: &str) -> Result<String, BoxError>;
}

impl<F, E> Retriever for F
where
    F: Fn(&str, &str) -> Result<String, E> + Send + Sync,
    E: Into<BoxError>,
{
    fn retrieve(&self, channel: &str, access: &str) -> Result<String, BoxError> {
        self(channel, access).map_err(Into::into)
    }
}

/// Retriever serving keys from a fixed table.
///
/// The table maps channel -> access -> key, and loads from JSON of the
/// same shape:
///
/// ```json
/// { "telemetry": { "r": "key-r", "w": "key-w" } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StaticRetriever {
    keys: HashMap<String, HashMap<String, String>>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to the table (builder pattern).
    #[must_use]
    pub fn with_key(
        mut self,
        channel: impl Into<String>,
        access: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.keys
            .entry(channel.into())
            .or_default()
            .insert(access.into(), key.into());
        self
    }

    /// Parse a table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let retriever = Self::from_json(&json)?;
        debug!("Loaded {} channels from {}", retriever.keys.len(), path.display());
        Ok(retriever)
    }
}

impl Retriever for StaticRetriever {
    fn retrieve(&self, channel: &str, access: &str) -> Result<String, BoxError> {
        self.keys
            .get(channel)
            .and_then(|modes| modes.get(access))
            .cloned()
            .ok_or_else(|| format!("no key in table for channel {channel} and access {access}").into())
    }
}
