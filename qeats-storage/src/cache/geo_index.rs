//! Geo index cache: cache-aside partitioning of the restaurant list by
//! geohash bucket.
//!
//! On a miss the full restaurant list is read from the store and cached under
//! the bucket key as-is, unfiltered. Filtering by distance and opening hours
//! happens downstream on every call, so an entry stays correct for any
//! instant and any point in the same bucket.
//!
//! Cache trouble of any kind is logged and absorbed. Only store failures
//! reach the caller.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use qeats_core::{
    CacheError, CacheResult, CacheSettings, GeoBucketKey, QeatsResult, RestaurantRecord,
    StoreSettings,
};
use tracing::{debug, warn};

use super::traits::{CacheBackend, CacheStats};
use crate::{bounded_store_read, RestaurantStore};

#[derive(Debug, Default)]
struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
    store_reads: AtomicU64,
    write_failures: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
            store_reads: self.store_reads.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Cache-aside lookup of the restaurant list keyed by [`GeoBucketKey`].
pub struct GeoIndexCache {
    backend: Arc<dyn CacheBackend>,
    store: Arc<dyn RestaurantStore>,
    settings: CacheSettings,
    store_settings: StoreSettings,
    counters: StatsCounters,
}

impl GeoIndexCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        store: Arc<dyn RestaurantStore>,
        settings: CacheSettings,
        store_settings: StoreSettings,
    ) -> Self {
        Self {
            backend,
            store,
            settings,
            store_settings,
            counters: StatsCounters::default(),
        }
    }

    /// Create a geo index with the production TTL and timeouts.
    pub fn with_defaults(backend: Arc<dyn CacheBackend>, store: Arc<dyn RestaurantStore>) -> Self {
        Self::new(
            backend,
            store,
            CacheSettings::default(),
            StoreSettings::default(),
        )
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Restaurant list for the bucket, from cache when possible.
    ///
    /// Fails only when the store has to be read and cannot be.
    pub async fn lookup(&self, bucket: &GeoBucketKey) -> QeatsResult<Vec<RestaurantRecord>> {
        let key = bucket.as_str();

        if !self.is_reachable().await {
            StatsCounters::bump(&self.counters.bypasses);
            debug!(bucket = %bucket, "Cache unreachable, reading restaurants from store");
            return self.load_from_store().await;
        }

        match self.read_entry(key).await {
            Ok(Some(records)) => {
                StatsCounters::bump(&self.counters.hits);
                debug!(bucket = %bucket, count = records.len(), "Geo index cache hit");
                return Ok(records);
            }
            Ok(None) => {
                StatsCounters::bump(&self.counters.misses);
                debug!(bucket = %bucket, "Geo index cache miss");
            }
            Err(err) => {
                StatsCounters::bump(&self.counters.bypasses);
                warn!(bucket = %bucket, error = %err, "Cache read failed, reading restaurants from store");
                return self.load_from_store().await;
            }
        }

        let records = self.load_from_store().await?;
        if let Err(err) = self.write_entry(key, &records).await {
            StatsCounters::bump(&self.counters.write_failures);
            warn!(bucket = %bucket, error = %err, "Failed to populate geo index cache");
        }
        Ok(records)
    }

    /// Remove every cached bucket.
    pub async fn flush(&self) -> CacheResult<()> {
        self.bounded("FLUSHALL", self.backend.flush_all()).await?;
        debug!("Geo index cache flushed");
        Ok(())
    }

    /// PING the backend, treating a reply slower than the operation timeout
    /// as unreachable.
    pub async fn is_reachable(&self) -> bool {
        let probe = async { Ok(self.backend.is_reachable().await) };
        match self.bounded("PING", probe).await {
            Ok(reachable) => reachable,
            Err(err) => {
                warn!(error = %err, "Cache reachability probe failed");
                false
            }
        }
    }

    /// `Ok(None)` for an absent entry and for one that no longer decodes; the
    /// latter is overwritten by the caller after the store read.
    async fn read_entry(&self, key: &str) -> CacheResult<Option<Vec<RestaurantRecord>>> {
        let Some(bytes) = self.bounded("GET", self.backend.get(key)).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(Some(records)),
            Err(e) => {
                let err = CacheError::Deserialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "Discarding undecodable geo index entry");
                Ok(None)
            }
        }
    }

    async fn write_entry(&self, key: &str, records: &[RestaurantRecord]) -> CacheResult<()> {
        let value = serde_json::to_vec(records).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let ttl_secs = self.settings.entry_ttl.as_secs();
        self.bounded("SETEX", self.backend.set_with_expiry(key, value, ttl_secs))
            .await
    }

    async fn load_from_store(&self) -> QeatsResult<Vec<RestaurantRecord>> {
        StatsCounters::bump(&self.counters.store_reads);
        bounded_store_read(
            "list_all_restaurants",
            self.store_settings.read_timeout,
            self.store.list_all_restaurants(),
        )
        .await
    }

    async fn bounded<T, F>(&self, operation: &str, op: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        let timeout = self.settings.operation_timeout;
        match tokio::time::timeout(timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                operation: operation.to_string(),
                elapsed: timeout,
            }),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheBackend;
    use crate::MockStore;
    use qeats_core::{QeatsError, StoreError};
    use std::time::Duration;

    fn restaurant(id: &str, lat: f64, lon: f64) -> RestaurantRecord {
        RestaurantRecord {
            restaurant_id: id.to_string(),
            name: format!("Restaurant {}", id),
            city: "Bengaluru".to_string(),
            image_url: "www.google.com".to_string(),
            latitude: lat,
            longitude: lon,
            opens_at: "08:00".to_string(),
            closes_at: "22:00".to_string(),
            attributes: vec!["South Indian".to_string()],
        }
    }

    struct Fixture {
        backend: Arc<InMemoryCacheBackend>,
        store: Arc<MockStore>,
        index: GeoIndexCache,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let store = Arc::new(MockStore::with_data(
            vec![
                restaurant("1", 12.9716, 77.5946),
                restaurant("2", 28.6139, 77.2090),
            ],
            vec![],
        ));
        let index = GeoIndexCache::with_defaults(backend.clone(), store.clone());
        Fixture {
            backend,
            store,
            index,
        }
    }

    fn bucket() -> GeoBucketKey {
        GeoBucketKey::from_coordinates(12.95, 77.60).unwrap()
    }

    #[tokio::test]
    async fn test_miss_reads_store_and_populates_entry() {
        let f = fixture();

        let records = f.index.lookup(&bucket()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(f.store.restaurant_reads(), 1);
        assert!(f.backend.contains(bucket().as_str()));
        let stats = f.index.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_hit_skips_store() {
        let f = fixture();
        let first = f.index.lookup(&bucket()).await.unwrap();
        let second = f.index.lookup(&bucket()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.store.restaurant_reads(), 1);
        assert_eq!(f.index.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_entry_holds_unfiltered_store_order() {
        let f = fixture();
        f.index.lookup(&bucket()).await.unwrap();

        let bytes = f.backend.get(bucket().as_str()).await.unwrap().unwrap();
        let cached: Vec<RestaurantRecord> = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<_> = cached.iter().map(|r| r.restaurant_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_unreachable_cache_reads_store_every_time() {
        let f = fixture();
        f.backend.set_reachable(false);

        f.index.lookup(&bucket()).await.unwrap();
        f.index.lookup(&bucket()).await.unwrap();

        assert_eq!(f.store.restaurant_reads(), 2);
        assert_eq!(f.index.stats().bypasses, 2);
        assert!(f.backend.is_empty());
    }

    #[tokio::test]
    async fn test_cache_recovery_resumes_caching() {
        let f = fixture();
        f.backend.set_reachable(false);
        f.index.lookup(&bucket()).await.unwrap();

        f.backend.set_reachable(true);
        f.index.lookup(&bucket()).await.unwrap();
        f.index.lookup(&bucket()).await.unwrap();

        assert_eq!(f.store.restaurant_reads(), 2);
        assert_eq!(f.index.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let f = fixture();
        f.backend
            .set_with_expiry(bucket().as_str(), b"{not json".to_vec(), 3600)
            .await
            .unwrap();

        let records = f.index.lookup(&bucket()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(f.store.restaurant_reads(), 1);

        f.index.lookup(&bucket()).await.unwrap();
        assert_eq!(f.store.restaurant_reads(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_still_returns_store_data() {
        let f = fixture();
        f.backend.set_reject_writes(true);

        let records = f.index.lookup(&bucket()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(f.index.stats().write_failures, 1);
        assert!(f.backend.is_empty());

        f.index.lookup(&bucket()).await.unwrap();
        assert_eq!(f.store.restaurant_reads(), 2);
        assert_eq!(f.index.stats().misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reachability_bounded_by_operation_timeout() {
        let f = fixture();
        assert!(f.index.is_reachable().await);

        f.backend.set_latency(Some(Duration::from_secs(30)));
        assert!(!f.index.is_reachable().await);
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal() {
        let f = fixture();
        f.store.set_unavailable(true);

        let err = f.index.lookup(&bucket()).await.unwrap_err();
        assert!(matches!(err, QeatsError::Store(StoreError::Unavailable { .. })));
        assert!(f.backend.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_with_cache_down_is_fatal() {
        let f = fixture();
        f.backend.set_reachable(false);
        f.store.set_unavailable(true);

        assert!(f.index.lookup(&bucket()).await.unwrap_err().is_store_unavailable());
    }

    #[tokio::test]
    async fn test_cached_entry_served_while_store_down() {
        let f = fixture();
        f.index.lookup(&bucket()).await.unwrap();
        f.store.set_unavailable(true);

        assert_eq!(f.index.lookup(&bucket()).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cache_falls_back_to_store() {
        let f = fixture();
        f.backend.set_latency(Some(Duration::from_secs(5)));

        let records = f.index.lookup(&bucket()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(f.store.restaurant_reads(), 1);
        assert_eq!(f.index.stats().bypasses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let f = fixture();
        f.store.set_read_delay(Some(Duration::from_secs(60)));

        let err = f.index.lookup(&bucket()).await.unwrap_err();
        assert!(matches!(err, QeatsError::Store(StoreError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let f = fixture();
        f.index.lookup(&bucket()).await.unwrap();

        tokio::time::advance(Duration::from_secs(3601)).await;
        f.index.lookup(&bucket()).await.unwrap();

        assert_eq!(f.store.restaurant_reads(), 2);
    }

    #[tokio::test]
    async fn test_store_changes_invisible_until_flush() {
        let f = fixture();
        f.index.lookup(&bucket()).await.unwrap();
        f.store.insert_restaurant(restaurant("3", 12.96, 77.60));

        assert_eq!(f.index.lookup(&bucket()).await.unwrap().len(), 2);

        f.index.flush().await.unwrap();
        assert_eq!(f.index.lookup(&bucket()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_flush_reports_unreachable_cache() {
        let f = fixture();
        f.backend.set_reachable(false);
        assert!(f.index.flush().await.is_err());
    }

    #[tokio::test]
    async fn test_distinct_buckets_cached_separately() {
        let f = fixture();
        let other = GeoBucketKey::from_coordinates(28.6139, 77.2090).unwrap();

        f.index.lookup(&bucket()).await.unwrap();
        f.index.lookup(&other).await.unwrap();

        assert_eq!(f.store.restaurant_reads(), 2);
        assert_eq!(f.backend.len(), 2);
    }
}
