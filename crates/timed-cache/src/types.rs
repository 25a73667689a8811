//! Cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored payload together with the moment it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T, stored_at: DateTime<Utc>) -> Self {
        Self { payload, stored_at }
    }

    /// Whether the entry is still within `ttl` at `now`.
    ///
    /// An entry stored "in the future" (clock skew) counts as fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.stored_at < ttl
    }
}

/// Observable state of a cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Result of a cache read.
///
/// A miss carries the invalidation generation seen at read time; handing it
/// back to a conditional store keeps an in-flight fetch from repopulating a
/// cache that was invalidated while it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    Miss { generation: u64 },
}

impl<T> Lookup<T> {
    pub fn hit(self) -> Option<T> {
        match self {
            Self::Hit(payload) => Some(payload),
            Self::Miss { .. } => None,
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub invalidations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.stores, 0);
        assert_eq!(stats.invalidations, 0);
    }

    #[test]
    fn test_entry_freshness_boundary() {
        let stored_at = Utc::now();
        let entry = CacheEntry::new("payload", stored_at);
        let ttl = chrono::Duration::milliseconds(300_000);

        assert!(entry.is_fresh_at(stored_at, ttl));
        assert!(entry.is_fresh_at(stored_at + chrono::Duration::milliseconds(299_999), ttl));
        // Exactly TTL old is already stale
        assert!(!entry.is_fresh_at(stored_at + ttl, ttl));
    }

    #[test]
    fn test_lookup_hit() {
        assert_eq!(Lookup::Hit(7).hit(), Some(7));
        assert_eq!(Lookup::<u8>::Miss { generation: 3 }.hit(), None);
    }

    #[test]
    fn test_cache_state_serialization() {
        assert_eq!(serde_json::to_string(&CacheState::Fresh).unwrap(), "\"fresh\"");
        let state: CacheState = serde_json::from_str("\"stale\"").unwrap();
        assert_eq!(state, CacheState::Stale);
    }
}
