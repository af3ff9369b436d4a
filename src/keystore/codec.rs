//! Lookup key encoding.

use std::fmt;

/// Store key derived from a (channel, access) pair.
///
/// Encoded as `len(channel):channel len(access):access`, so `("ab", "c")`
/// and `("a", "bc")` never collide. The `:` ends each length, which keeps
/// the encoding unambiguous for channels that start with digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Encode a (channel, access) pair.
    pub fn encode(channel: &str, access: &str) -> Self {
        Self(format!(
            "{}:{}{}:{}",
            channel.len(),
            channel,
            access.len(),
            access
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<LookupKey> for String {
    fn from(key: LookupKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_encode_is_length_prefixed() {
        assert_eq!(LookupKey::encode("channel", "r").as_str(), "7:channel1:r");
        assert_eq!(LookupKey::encode("", "").as_str(), "0:0:");
    }

    #[test]
    fn test_split_point_matters() {
        assert_ne!(LookupKey::encode("ab", "c"), LookupKey::encode("a", "bc"));
        assert_ne!(LookupKey::encode("a1", "b"), LookupKey::encode("a", "1b"));
    }

    #[test]
    fn test_distinct_pairs_distinct_keys() {
        let parts = ["", "a", "b", "ab", "ba", "1", "a1", "11", "1a", "telemetry", "r", "w", "rw"];
        let mut seen = HashSet::new();

        for channel in parts {
            for access in parts {
                assert!(
                    seen.insert(LookupKey::encode(channel, access)),
                    "collision for ({channel:?}, {access:?})"
                );
            }
        }
    }
}
