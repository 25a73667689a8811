//! Record-set cache shared by all request handlers

use crate::config::CacheMode;
use crate::query::RecordQuery;
use airtable_api::Record;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use timed_cache::{CacheStats, Lookup, TimedCache};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub type RecordSet = Arc<Vec<Record>>;

/// Either one slot for everything, or one slot per normalized request
pub enum RecordCache {
    Single(TimedCache<RecordSet>),
    PerRequest(RequestCache),
}

impl RecordCache {
    pub fn new(mode: CacheMode, ttl: Duration, max_entries: usize) -> Self {
        match mode {
            CacheMode::Single => Self::Single(TimedCache::new(ttl)),
            CacheMode::Request => Self::PerRequest(RequestCache::new(ttl, max_entries)),
        }
    }

    pub fn mode(&self) -> CacheMode {
        match self {
            Self::Single(_) => CacheMode::Single,
            Self::PerRequest(_) => CacheMode::Request,
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Self::Single(cache) => cache.ttl(),
            Self::PerRequest(cache) => cache.ttl,
        }
    }

    pub async fn lookup(&self, query: &RecordQuery) -> Lookup<RecordSet> {
        match self {
            Self::Single(cache) => cache.lookup().await,
            Self::PerRequest(cache) => cache.lookup(&query.cache_key()).await,
        }
    }

    /// Store a fetched record set unless the cache was invalidated after the
    /// miss that reported `generation`
    pub async fn store_if_generation(
        &self,
        query: &RecordQuery,
        records: RecordSet,
        generation: u64,
    ) -> bool {
        match self {
            Self::Single(cache) => cache.store_if_generation(records, generation).await,
            Self::PerRequest(cache) => {
                cache
                    .store_if_generation(query.cache_key(), records, generation)
                    .await
            }
        }
    }

    /// Clear every cached record set
    pub async fn invalidate(&self) {
        match self {
            Self::Single(cache) => cache.invalidate().await,
            Self::PerRequest(cache) => cache.invalidate().await,
        }
        info!(mode = %self.mode(), "Record cache invalidated");
    }

    pub async fn stats(&self) -> CacheStats {
        match self {
            Self::Single(cache) => cache.stats().await,
            Self::PerRequest(cache) => cache.stats().await,
        }
    }
}

/// Record sets keyed by request, with TTL and capacity handled by moka
pub struct RequestCache {
    entries: Cache<String, RecordSet>,
    /// Invalidation generation; stores hold the read lock while inserting
    generation: RwLock<u64>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    invalidations: AtomicU64,
}

impl RequestCache {
    /// moka rejects TTLs beyond 1000 years
    const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries.max(1) as u64)
            .time_to_live(ttl.min(Self::MAX_TTL))
            .build();

        Self {
            entries,
            generation: RwLock::new(0),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub async fn lookup(&self, key: &str) -> Lookup<RecordSet> {
        let generation = self.generation.read().await;
        match self.entries.get(key).await {
            Some(records) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit");
                Lookup::Hit(records)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache miss");
                Lookup::Miss {
                    generation: *generation,
                }
            }
        }
    }

    pub async fn store_if_generation(
        &self,
        key: String,
        records: RecordSet,
        generation: u64,
    ) -> bool {
        let current = self.generation.read().await;
        if *current != generation {
            debug!(
                key = %key,
                generation,
                current = *current,
                "Discarding records fetched before invalidation"
            );
            return false;
        }
        self.entries.insert(key, records).await;
        self.stores.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub async fn invalidate(&self) {
        let mut generation = self.generation.write().await;
        *generation = generation.wrapping_add(1);
        self.entries.invalidate_all();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks().await;
        CacheStats {
            entries: self.entries.entry_count() as usize,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FetchRequest;

    fn query(table: &str, fields: &[&str]) -> RecordQuery {
        RecordQuery::from_request(
            FetchRequest {
                table_name: Some(table.to_string()),
                fields: Some(fields.iter().map(|f| f.to_string()).collect()),
                ..Default::default()
            },
            None,
        )
        .unwrap()
    }

    fn records(id: &str) -> RecordSet {
        Arc::new(vec![Record {
            id: id.to_string(),
            created_time: None,
            fields: Default::default(),
        }])
    }

    async fn fill(cache: &RecordCache, query: &RecordQuery, id: &str) {
        match cache.lookup(query).await {
            Lookup::Miss { generation } => {
                assert!(cache.store_if_generation(query, records(id), generation).await);
            }
            Lookup::Hit(_) => panic!("expected a miss"),
        }
    }

    fn hit_id(lookup: Lookup<RecordSet>) -> Option<String> {
        lookup.hit().map(|r| r[0].id.clone())
    }

    #[tokio::test]
    async fn test_single_mode_shares_one_entry() {
        let cache = RecordCache::new(CacheMode::Single, Duration::from_secs(300), 16);
        fill(&cache, &query("Quotes", &["content"]), "recQ").await;

        // A different request is served the same payload
        let hit = cache.lookup(&query("Episodes", &["title"])).await;
        assert_eq!(hit_id(hit).as_deref(), Some("recQ"));
        assert_eq!(cache.mode(), CacheMode::Single);
    }

    #[tokio::test]
    async fn test_request_mode_separates_entries() {
        let cache = RecordCache::new(CacheMode::Request, Duration::from_secs(300), 16);
        fill(&cache, &query("Quotes", &["content"]), "recQ").await;

        assert!(hit_id(cache.lookup(&query("Episodes", &["title"])).await).is_none());
        let hit = cache.lookup(&query("Quotes", &["content"])).await;
        assert_eq!(hit_id(hit).as_deref(), Some("recQ"));
        assert_eq!(cache.stats().await.stores, 1);
    }

    #[tokio::test]
    async fn test_invalidate_clears_all_requests() {
        for mode in [CacheMode::Single, CacheMode::Request] {
            let cache = RecordCache::new(mode, Duration::from_secs(300), 16);
            fill(&cache, &query("Quotes", &["content"]), "a").await;
            if mode == CacheMode::Request {
                fill(&cache, &query("Episodes", &["title"]), "b").await;
            }

            cache.invalidate().await;

            assert!(hit_id(cache.lookup(&query("Quotes", &["content"])).await).is_none());
            assert!(hit_id(cache.lookup(&query("Episodes", &["title"])).await).is_none());
            assert_eq!(cache.stats().await.invalidations, 1);
        }
    }

    #[tokio::test]
    async fn test_store_after_invalidation_is_discarded() {
        for mode in [CacheMode::Single, CacheMode::Request] {
            let cache = RecordCache::new(mode, Duration::from_secs(300), 16);
            let quotes = query("Quotes", &["content"]);

            let generation = match cache.lookup(&quotes).await {
                Lookup::Miss { generation } => generation,
                Lookup::Hit(_) => panic!("expected a miss"),
            };
            cache.invalidate().await;

            assert!(!cache.store_if_generation(&quotes, records("old"), generation).await);
            assert!(hit_id(cache.lookup(&quotes).await).is_none());

            fill(&cache, &quotes, "new").await;
            assert_eq!(hit_id(cache.lookup(&quotes).await).as_deref(), Some("new"));
        }
    }

    #[tokio::test]
    async fn test_ttl_is_reported() {
        let cache = RecordCache::new(CacheMode::Request, Duration::from_secs(60), 16);
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
