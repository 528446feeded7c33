//! Cache backend trait and usage statistics.

use async_trait::async_trait;
use qeats_core::CacheResult;

/// Key-value cache with per-entry expiry.
///
/// Values are opaque bytes; the geo index owns the encoding. Implementations
/// must be safe to share across tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value, expiring
    /// after `ttl_secs` seconds.
    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> CacheResult<()>;

    /// Cheap liveness probe. Never errors; an unreachable backend is `false`.
    async fn is_reachable(&self) -> bool;

    /// Remove every entry.
    async fn flush_all(&self) -> CacheResult<()>;
}

/// Counters describing how the geo index used its cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a decodable cache entry.
    pub hits: u64,
    /// Lookups that found no entry, or an entry that failed to decode.
    pub misses: u64,
    /// Lookups that skipped the cache because it was unreachable or failed.
    pub bypasses: u64,
    /// Bulk restaurant reads issued against the store.
    pub store_reads: u64,
    /// Entry writes that failed after a successful store read.
    pub write_failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0) over lookups that reached the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
