//! Cache configuration.

use std::time::Duration;

use crate::error::StoreError;

/// Longest TTL Moka accepts (1000 years).
pub const MAX_TTL: Duration = Duration::from_secs(1000 * 365 * 24 * 3600);

/// Configuration for an expiring store.
///
/// There is no capacity bound: entries only leave the store through
/// expiry, invalidation or clearing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live applied uniformly to every entry written.
    /// `None` means entries never expire.
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    /// Create a config with the given TTL. A zero duration means no expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::default().ttl(ttl)
    }

    /// Set time-to-live for entries. A zero duration disables expiry.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = (!duration.is_zero()).then_some(duration);
        self
    }

    /// Disable TTL (entries never expire based on time).
    #[must_use]
    pub fn no_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Check the config can back a store.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self.ttl {
            Some(ttl) if ttl > MAX_TTL => Err(StoreError::TtlTooLong { ttl }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        let config = CacheConfig::with_ttl(Duration::ZERO);
        assert_eq!(config.ttl, None);

        let config = CacheConfig::with_ttl(Duration::from_secs(5));
        assert_eq!(config.ttl, Some(Duration::from_secs(5)));
        assert_eq!(config.no_ttl().ttl, None);
    }

    #[test]
    fn test_ttl_beyond_limit_rejected() {
        assert!(CacheConfig::default().validate().is_ok());
        assert!(CacheConfig::with_ttl(MAX_TTL).validate().is_ok());

        let ttl = MAX_TTL + Duration::from_secs(1);
        assert_eq!(
            CacheConfig::with_ttl(ttl).validate(),
            Err(StoreError::TtlTooLong { ttl })
        );
    }
}
