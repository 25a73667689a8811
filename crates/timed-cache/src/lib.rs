//! Single-entry in-memory TTL cache with explicit invalidation
//!
//! [`TimedCache`] holds one payload and serves it while it is younger than a
//! fixed TTL.
//!
//! The cache never fetches anything itself. Callers check the cache, perform
//! the upstream fetch on a miss, and store the result only if the fetch
//! succeeded. [`TimedCache::lookup`] and [`TimedCache::store_if_generation`]
//! let that store be skipped when an invalidation happened while the fetch
//! was running.
//!
//! ```
//! use std::time::Duration;
//! use timed_cache::{CacheState, Lookup, TimedCache};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let cache = TimedCache::new(Duration::from_secs(300));
//!
//! if let Lookup::Miss { generation } = cache.lookup().await {
//!     let fetched = vec![1, 2, 3];
//!     cache.store_if_generation(fetched, generation).await;
//! }
//! assert_eq!(cache.get().await, Some(vec![1, 2, 3]));
//!
//! cache.invalidate().await;
//! assert_eq!(cache.state().await, CacheState::Empty);
//! # });
//! ```

mod timed;
mod types;

pub use timed::TimedCache;
pub use types::{CacheEntry, CacheState, CacheStats, Lookup};
