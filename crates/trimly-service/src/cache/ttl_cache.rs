//! Time-bounded in-process cache.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use trimly_core::Clock;

/// Map whose entries expire `ttl` after insertion.
///
/// Expiry is read from the injected [`Clock`], so a zero TTL disables caching
/// and tests can move time forward.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (V, DateTime<Utc>)>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(60)),
            clock,
        }
    }

    /// Returns the cached value if it has not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone())
    }

    /// Stores `value` for `key`, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.write().insert(key, (value, expires_at));
    }

    /// Drops the entry for `key`. Returns true if one was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trimly_core::FixedClock;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()))
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = clock();
        let cache = TtlCache::new(std::time::Duration::from_secs(60), clock.clone());
        cache.insert("tenant", 1);
        assert_eq!(cache.get(&"tenant"), Some(1));

        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get(&"tenant"), Some(1));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(&"tenant"), None);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let cache = TtlCache::new(std::time::Duration::ZERO, clock());
        cache.insert(1, "value");
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_invalidate() {
        let cache = TtlCache::new(std::time::Duration::from_secs(60), clock());
        cache.insert(1, "a");
        cache.insert(2, "b");
        assert!(cache.invalidate(&1));
        assert!(!cache.invalidate(&1));
        assert_eq!(cache.get(&2), Some("b"));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
