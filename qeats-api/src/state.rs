//! Shared application state: the wired-up geo index, proximity filter and
//! search aggregator.

use std::sync::Arc;

use chrono::Local;
use qeats_core::{Instant, QeatsConfig, ServingPolicy};
use qeats_search::{ProximityFilter, SearchAggregator};
use qeats_storage::{
    CacheBackend, DocumentStore, GeoIndexCache, InMemoryCacheBackend, RedisCacheBackend,
    RestaurantStore,
};
use tracing::info;

use crate::config::ApiConfig;
use crate::error::ApiResult;

/// Source of the wall-clock instant used for each request.
pub type Clock = fn() -> Instant;

/// Local time of day.
pub fn local_clock() -> Instant {
    Local::now().time()
}

/// Which cache backend the server is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Redis,
    InMemory,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Redis => "redis",
            CacheKind::InMemory => "in-memory",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<GeoIndexCache>,
    pub proximity: ProximityFilter,
    pub search: SearchAggregator,
    pub cache_kind: CacheKind,
    pub clock: Clock,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire the components from explicit parts.
    pub fn from_parts(
        store: Arc<dyn RestaurantStore>,
        backend: Arc<dyn CacheBackend>,
        cache_kind: CacheKind,
        config: &QeatsConfig,
    ) -> Self {
        let index = Arc::new(GeoIndexCache::new(
            backend,
            store.clone(),
            config.cache.clone(),
            config.store.clone(),
        ));
        let proximity = ProximityFilter::new(index.clone(), ServingPolicy::new(config.serving.clone()));
        let search = SearchAggregator::new(
            proximity.clone(),
            store,
            config.search,
            config.store.clone(),
        );
        Self {
            index,
            proximity,
            search,
            cache_kind,
            clock: local_clock,
            start_time: std::time::Instant::now(),
        }
    }

    /// Use a fixed clock instead of local time.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load the store and connect the cache described by `config`.
    pub async fn build(config: &ApiConfig) -> ApiResult<Self> {
        let store: Arc<dyn RestaurantStore> = match &config.seed_path {
            Some(path) => Arc::new(
                DocumentStore::from_path(path).map_err(qeats_core::QeatsError::from)?,
            ),
            None => {
                info!("No seed document configured, starting with an empty store");
                Arc::new(DocumentStore::default())
            }
        };

        let (backend, cache_kind): (Arc<dyn CacheBackend>, CacheKind) = match &config.redis_url {
            Some(url) => (
                Arc::new(RedisCacheBackend::connect(url, config.pool.clone()).await?),
                CacheKind::Redis,
            ),
            None => {
                info!("No Redis URL configured, using the in-memory cache");
                (Arc::new(InMemoryCacheBackend::new()), CacheKind::InMemory)
            }
        };

        Ok(Self::from_parts(store, backend, cache_kind, &config.core))
    }

    pub fn now(&self) -> Instant {
        (self.clock)()
    }
}
