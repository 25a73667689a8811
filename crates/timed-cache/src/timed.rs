//! Single-entry cache with a freshness window

use crate::types::{CacheEntry, CacheState, CacheStats, Lookup};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

struct Slot<T> {
    entry: Option<CacheEntry<T>>,
    /// Bumped by every invalidation
    generation: u64,
}

/// Holds at most one payload and serves it while it is younger than the TTL.
///
/// Payload and timestamp are replaced together under one write lock, so a
/// reader never sees a payload paired with another store's timestamp.
/// Concurrent stores resolve as last-store-wins.
pub struct TimedCache<T> {
    slot: RwLock<Slot<T>>,
    ttl: Duration,
    ttl_chrono: chrono::Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    invalidations: AtomicU64,
}

impl<T: Clone> TimedCache<T> {
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(Slot {
                entry: None,
                generation: 0,
            }),
            ttl,
            ttl_chrono: to_chrono(ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the payload if it is still fresh
    pub async fn get(&self) -> Option<T> {
        self.get_at(Utc::now()).await
    }

    /// Returns the payload if it is fresh at `now`. A stale entry stays in
    /// place until the next store or invalidation.
    pub async fn get_at(&self, now: DateTime<Utc>) -> Option<T> {
        self.lookup_at(now).await.hit()
    }

    /// Like [`get`](Self::get), but a miss reports the current generation
    /// for use with [`store_if_generation`](Self::store_if_generation)
    pub async fn lookup(&self) -> Lookup<T> {
        self.lookup_at(Utc::now()).await
    }

    pub async fn lookup_at(&self, now: DateTime<Utc>) -> Lookup<T> {
        let lookup = {
            let slot = self.slot.read().await;
            match slot
                .entry
                .as_ref()
                .filter(|e| e.is_fresh_at(now, self.ttl_chrono))
            {
                Some(e) => Lookup::Hit(e.payload.clone()),
                None => Lookup::Miss {
                    generation: slot.generation,
                },
            }
        };

        match lookup {
            Lookup::Hit(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit");
            }
            Lookup::Miss { .. } => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss");
            }
        }
        lookup
    }

    /// Replace the entry with `payload`, stamped now
    pub async fn store(&self, payload: T) {
        self.store_at(payload, Utc::now()).await
    }

    pub async fn store_at(&self, payload: T, now: DateTime<Utc>) {
        {
            let mut slot = self.slot.write().await;
            slot.entry = Some(CacheEntry::new(payload, now));
        }
        self.stores.fetch_add(1, Ordering::Relaxed);
        debug!(stored_at = %now, "Cached payload");
    }

    /// Store `payload` only if no invalidation happened since the miss that
    /// returned `generation`. Returns whether the payload was stored.
    pub async fn store_if_generation(&self, payload: T, generation: u64) -> bool {
        self.store_if_generation_at(payload, generation, Utc::now())
            .await
    }

    pub async fn store_if_generation_at(
        &self,
        payload: T,
        generation: u64,
        now: DateTime<Utc>,
    ) -> bool {
        {
            let mut slot = self.slot.write().await;
            if slot.generation != generation {
                debug!(
                    generation,
                    current = slot.generation,
                    "Discarding payload fetched before invalidation"
                );
                return false;
            }
            slot.entry = Some(CacheEntry::new(payload, now));
        }
        self.stores.fetch_add(1, Ordering::Relaxed);
        debug!(stored_at = %now, "Cached payload");
        true
    }

    /// Drop the entry whatever its freshness. Invalidating an empty cache
    /// leaves it empty.
    pub async fn invalidate(&self) {
        let had_entry = {
            let mut slot = self.slot.write().await;
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry.take().is_some()
        };
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(had_entry, "Cache invalidated");
    }

    pub async fn state(&self) -> CacheState {
        self.state_at(Utc::now()).await
    }

    pub async fn state_at(&self, now: DateTime<Utc>) -> CacheState {
        let slot = self.slot.read().await;
        match slot.entry.as_ref() {
            None => CacheState::Empty,
            Some(e) if e.is_fresh_at(now, self.ttl_chrono) => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// When the current payload was stored, if there is one
    pub async fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().await.entry.as_ref().map(|e| e.stored_at)
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = usize::from(self.slot.read().await.entry.is_some());
        CacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

fn to_chrono(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    const TTL_MS: i64 = 300_000;

    fn ms(n: i64) -> chrono::Duration {
        chrono::Duration::milliseconds(n)
    }

    fn cache() -> TimedCache<serde_json::Value> {
        TimedCache::new(Duration::from_millis(TTL_MS as u64))
    }

    fn miss_generation(lookup: Lookup<serde_json::Value>) -> u64 {
        match lookup {
            Lookup::Miss { generation } => generation,
            Lookup::Hit(payload) => panic!("expected a miss, got {}", payload),
        }
    }

    #[tokio::test]
    async fn test_new_cache_is_empty() {
        let cache = cache();
        assert!(cache.get().await.is_none());
        assert_eq!(cache.state().await, CacheState::Empty);
        assert!(cache.stored_at().await.is_none());
    }

    #[tokio::test]
    async fn test_store_then_get_until_ttl() {
        let cache = cache();
        let t0 = Utc::now();
        let payload = json!({"records": [1, 2, 3]});

        cache.store_at(payload.clone(), t0).await;

        assert_eq!(cache.get_at(t0).await, Some(payload.clone()));
        assert_eq!(cache.get_at(t0 + ms(100_000)).await, Some(payload.clone()));
        assert_eq!(cache.get_at(t0 + ms(TTL_MS - 1)).await, Some(payload));
        assert_eq!(cache.get_at(t0 + ms(TTL_MS)).await, None);
        assert_eq!(cache.get_at(t0 + ms(400_000)).await, None);
    }

    #[tokio::test]
    async fn test_stale_read_does_not_clear_entry() {
        let cache = cache();
        let t0 = Utc::now();
        cache.store_at(json!(1), t0).await;

        assert!(cache.get_at(t0 + ms(TTL_MS * 2)).await.is_none());
        assert_eq!(cache.state_at(t0 + ms(TTL_MS * 2)).await, CacheState::Stale);
        assert_eq!(cache.stored_at().await, Some(t0));
    }

    #[tokio::test]
    async fn test_invalidate_then_get_is_empty() {
        let cache = cache();
        let t0 = Utc::now();
        cache.store_at(json!({"records": [1, 2, 3]}), t0).await;

        cache.invalidate().await;

        assert!(cache.get_at(t0 + ms(100_001)).await.is_none());
        assert_eq!(cache.state_at(t0 + ms(100_001)).await, CacheState::Empty);
        assert!(cache.stored_at().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = cache();
        cache.invalidate().await;
        cache.invalidate().await;

        assert_eq!(cache.state().await, CacheState::Empty);
        assert!(cache.get().await.is_none());
        assert_eq!(cache.stats().await.invalidations, 2);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let cache = cache();
        let t0 = Utc::now();
        assert_eq!(cache.state_at(t0).await, CacheState::Empty);

        cache.store_at(json!("a"), t0).await;
        assert_eq!(cache.state_at(t0).await, CacheState::Fresh);
        assert_eq!(cache.state_at(t0 + ms(TTL_MS)).await, CacheState::Stale);

        // stale -> fresh
        let t1 = t0 + ms(TTL_MS + 10);
        cache.store_at(json!("b"), t1).await;
        assert_eq!(cache.state_at(t1).await, CacheState::Fresh);
        assert_eq!(cache.get_at(t1).await, Some(json!("b")));

        cache.invalidate().await;
        assert_eq!(cache.state_at(t1).await, CacheState::Empty);
    }

    #[tokio::test]
    async fn test_store_overwrites_previous_payload() {
        let cache = cache();
        let t0 = Utc::now();
        cache.store_at(json!("old"), t0).await;
        cache.store_at(json!("new"), t0 + ms(10)).await;

        assert_eq!(cache.get_at(t0 + ms(20)).await, Some(json!("new")));
        assert_eq!(cache.stored_at().await, Some(t0 + ms(10)));
    }

    #[tokio::test]
    async fn test_conditional_store_after_miss() {
        let cache = cache();
        let t0 = Utc::now();

        let generation = miss_generation(cache.lookup_at(t0).await);
        assert!(cache.store_if_generation_at(json!("v1"), generation, t0).await);
        assert_eq!(cache.lookup_at(t0).await, Lookup::Hit(json!("v1")));
    }

    #[tokio::test]
    async fn test_fetch_started_before_invalidation_is_discarded() {
        let cache = cache();
        let t0 = Utc::now();

        // A reader misses and starts its upstream fetch
        let generation = miss_generation(cache.lookup_at(t0).await);

        // A writer invalidates while that fetch is in flight
        cache.invalidate().await;

        // The old fetch completes and must not repopulate the cache
        assert!(!cache.store_if_generation_at(json!("v1"), generation, t0 + ms(5)).await);
        assert!(cache.get_at(t0 + ms(6)).await.is_none());
        assert_eq!(cache.stats().await.stores, 0);

        // A fetch started after the invalidation stores normally
        let generation = miss_generation(cache.lookup_at(t0 + ms(7)).await);
        assert!(cache.store_if_generation_at(json!("v2"), generation, t0 + ms(8)).await);
        assert_eq!(cache.get_at(t0 + ms(9)).await, Some(json!("v2")));
    }

    #[tokio::test]
    async fn test_hit_miss_counters() {
        let cache = cache();

        cache.get().await;
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.entries, 0);

        cache.store(json!("data")).await;
        cache.get().await;

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.stores, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_never_mix_payload_and_timestamp() {
        let cache = Arc::new(cache());
        let t0 = Utc::now();
        let ta = t0 + ms(1);
        let tb = t0 + ms(2);

        for _ in 0..50 {
            let a = {
                let cache = cache.clone();
                tokio::spawn(async move { cache.store_at(json!("A"), ta).await })
            };
            let b = {
                let cache = cache.clone();
                tokio::spawn(async move { cache.store_at(json!("B"), tb).await })
            };
            a.await.unwrap();
            b.await.unwrap();

            let entry = cache.slot.read().await.entry.clone().unwrap();
            match entry.payload.as_str() {
                Some("A") => assert_eq!(entry.stored_at, ta),
                Some("B") => assert_eq!(entry.stored_at, tb),
                other => panic!("unexpected payload {:?}", other),
            }
        }
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let cache: TimedCache<u8> = TimedCache::new(Duration::from_secs(u64::MAX));
        assert_eq!(cache.ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(cache.ttl_chrono, chrono::Duration::MAX);
    }
}
