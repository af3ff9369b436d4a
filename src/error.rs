//! Error types for the keystore.

use thiserror::Error;

/// Boxed failure reason returned by a retriever.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to construct the backing store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Moka cannot schedule expiry this far out.
    #[error("ttl of {ttl:?} exceeds the supported maximum")]
    TtlTooLong { ttl: std::time::Duration },
}

/// Lookup errors surfaced by [`Keystore::must`](crate::Keystore::must).
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Miss, and no retriever was bound at init.
    #[error("no key found for channel {channel} and access {access}: key not cached and no retriever is set")]
    NoRetrieverBound { channel: String, access: String },

    /// The retriever failed; nothing was cached.
    #[error("no key found for channel {channel} and access {access}: retriever failed")]
    RetrieverFailed {
        channel: String,
        access: String,
        #[source]
        source: BoxError,
    },

    /// The retriever succeeded with a blank key; nothing was cached.
    #[error("no key found for channel {channel} and access {access}: retriever returned an empty key")]
    ResolvedEmpty { channel: String, access: String },

    /// A cached key could not be read as the requested type.
    #[error("key for channel {channel} and access {access} is not a valid {expected}: {reason}")]
    TypeMismatch {
        channel: String,
        access: String,
        expected: &'static str,
        reason: String,
    },
}

impl KeystoreError {
    /// True for every kind meaning "no usable key", as opposed to a
    /// shape defect.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, Self::TypeMismatch { .. })
    }
}

/// Malformed configuration value.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure loading a key table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read key table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse key table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = KeystoreError::NoRetrieverBound {
            channel: "c".into(),
            access: "r".into(),
        };
        assert!(err.is_not_found());

        let err = KeystoreError::TypeMismatch {
            channel: "c".into(),
            access: "r".into(),
            expected: "u32",
            reason: "invalid digit found in string".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_retriever_failure_keeps_source() {
        let err = KeystoreError::RetrieverFailed {
            channel: "c".into(),
            access: "w".into(),
            source: "broker unreachable".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.source().unwrap().to_string(), "broker unreachable");
        assert!(err.to_string().contains("channel c and access w"));
    }
}
