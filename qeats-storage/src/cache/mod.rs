//! Cache layer for the geo index.
//!
//! [`GeoIndexCache`] sits in front of a [`RestaurantStore`](crate::RestaurantStore)
//! and talks to any [`CacheBackend`]: Redis in production, the in-memory
//! backend when no Redis is configured and in tests.
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(RedisCacheBackend::connect(url, PoolConfig::default()).await?);
//! let index = GeoIndexCache::with_defaults(backend, store);
//!
//! let bucket = GeoBucketKey::from_coordinates(12.95, 77.60)?;
//! let restaurants = index.lookup(&bucket).await?;
//! ```

pub mod geo_index;
pub mod memory_backend;
pub mod redis_backend;
pub mod traits;

pub use geo_index::GeoIndexCache;
pub use memory_backend::InMemoryCacheBackend;
pub use redis_backend::{PoolConfig, PoolUsage, RedisCacheBackend};
pub use traits::{CacheBackend, CacheStats};
