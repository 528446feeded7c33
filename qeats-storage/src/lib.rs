//! QEats Storage - Store Trait, Cache Backends and the Geo Index Cache
//!
//! The persistent store is the source of truth; the cache only partitions
//! the full restaurant list by geohash bucket so repeated nearby lookups skip
//! the bulk read.

pub mod cache;
pub mod document;

pub use cache::{
    CacheBackend, CacheStats, GeoIndexCache, InMemoryCacheBackend, PoolConfig, PoolUsage,
    RedisCacheBackend,
};
pub use document::{DocumentStore, ItemDocument, MenuDocument, RestaurantDocument, SeedDocument};

use async_trait::async_trait;
use qeats_core::{MenuRecord, QeatsResult, RestaurantRecord, StoreError};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Read-only bulk access to the persistent restaurant store.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Every restaurant, in store order.
    async fn list_all_restaurants(&self) -> QeatsResult<Vec<RestaurantRecord>>;

    /// Every menu, in store order.
    async fn list_all_menus(&self) -> QeatsResult<Vec<MenuRecord>>;
}

/// Run a store read under `timeout`. Exceeding it is a store failure.
pub async fn bounded_store_read<T, F>(
    operation: &str,
    timeout: Duration,
    read: F,
) -> QeatsResult<T>
where
    F: Future<Output = QeatsResult<T>>,
{
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation: operation.to_string(),
            elapsed: timeout,
        }
        .into()),
    }
}

// ============================================================================
// MOCK STORE
// ============================================================================

/// In-memory store for testing, with read counters and failure injection.
#[derive(Debug, Default)]
pub struct MockStore {
    restaurants: Arc<RwLock<Vec<RestaurantRecord>>>,
    menus: Arc<RwLock<Vec<MenuRecord>>>,
    restaurant_reads: AtomicU64,
    menu_reads: AtomicU64,
    unavailable: AtomicBool,
    read_delay: RwLock<Option<Duration>>,
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store preloaded with data.
    pub fn with_data(restaurants: Vec<RestaurantRecord>, menus: Vec<MenuRecord>) -> Self {
        let store = Self::new();
        *store.restaurants.write().unwrap_or_else(|e| e.into_inner()) = restaurants;
        *store.menus.write().unwrap_or_else(|e| e.into_inner()) = menus;
        store
    }

    pub fn insert_restaurant(&self, restaurant: RestaurantRecord) {
        self.restaurants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(restaurant);
    }

    pub fn insert_menu(&self, menu: MenuRecord) {
        self.menus.write().unwrap_or_else(|e| e.into_inner()).push(menu);
    }

    /// Clear all stored data. Counters are kept.
    pub fn clear(&self) {
        self.restaurants.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.menus.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn restaurant_count(&self) -> usize {
        self.restaurants.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of `list_all_restaurants` calls, including failed ones.
    pub fn restaurant_reads(&self) -> u64 {
        self.restaurant_reads.load(Ordering::SeqCst)
    }

    /// Number of `list_all_menus` calls, including failed ones.
    pub fn menu_reads(&self) -> u64 {
        self.menu_reads.load(Ordering::SeqCst)
    }

    /// Total bulk reads of either kind.
    pub fn total_reads(&self) -> u64 {
        self.restaurant_reads() + self.menu_reads()
    }

    /// Make every subsequent read fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent read.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.write().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    async fn before_read(&self, operation: &str) -> QeatsResult<()> {
        let delay = *self.read_delay.read().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                operation: operation.to_string(),
                reason: "mock store marked unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl RestaurantStore for MockStore {
    async fn list_all_restaurants(&self) -> QeatsResult<Vec<RestaurantRecord>> {
        self.restaurant_reads.fetch_add(1, Ordering::SeqCst);
        self.before_read("list_all_restaurants").await?;
        let restaurants = self.restaurants.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(restaurants.clone())
    }

    async fn list_all_menus(&self) -> QeatsResult<Vec<MenuRecord>> {
        self.menu_reads.fetch_add(1, Ordering::SeqCst);
        self.before_read("list_all_menus").await?;
        let menus = self.menus.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(menus.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================
