//! Redis cache backend over a deadpool connection pool.
//!
//! The pool is sized and tuned once at construction. A background task
//! periodically evicts connections that sat idle too long and tops the pool
//! back up to its idle floor. Connections are optionally PINGed before use
//! so a dead socket surfaces as an unreachable cache instead of a failed
//! command halfway through a lookup.

use std::cell::Cell;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::{self, RedisError};
use deadpool_redis::{Config, Connection, Pool, PoolError, Runtime, Timeouts};
use qeats_core::{CacheError, CacheResult, ConfigError, QeatsResult};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::traits::CacheBackend;

// ============================================================================
// POOL CONFIGURATION
// ============================================================================

/// Connection pool tuning. Immutable after the backend is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on simultaneously open connections.
    pub max_connections: usize,
    /// Idle connections kept open between bursts.
    pub min_idle: usize,
    /// How often idle connections are examined for eviction.
    pub eviction_interval: Duration,
    /// Idle time after which a connection may be evicted.
    pub min_evictable_idle: Duration,
    /// PING each connection as it leaves the pool.
    pub test_on_borrow: bool,
    /// How long a caller blocks waiting for a free connection. Every cache
    /// call is also bounded by the geo index operation timeout, so this only
    /// governs when it is the shorter of the two.
    pub acquire_timeout: Duration,
    /// Connect and recycle timeout for individual connections.
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 128,
            min_idle: 16,
            eviction_interval: Duration::from_secs(30),
            min_evictable_idle: Duration::from_secs(60),
            test_on_borrow: true,
            acquire_timeout: Duration::from_millis(400),
            connect_timeout: Duration::from_millis(250),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.max_connections".to_string(),
                value: "0".to_string(),
                reason: "pool needs at least one connection".to_string(),
            });
        }
        if self.min_idle > self.max_connections {
            return Err(ConfigError::InvalidValue {
                field: "pool.min_idle".to_string(),
                value: self.min_idle.to_string(),
                reason: format!("exceeds max_connections ({})", self.max_connections),
            });
        }
        for (field, value) in [
            ("pool.eviction_interval", self.eviction_interval),
            ("pool.acquire_timeout", self.acquire_timeout),
            ("pool.connect_timeout", self.connect_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: format!("{:?}", value),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Point-in-time pool occupancy, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolUsage {
    /// Connections currently open.
    pub size: usize,
    /// Configured ceiling.
    pub max_size: usize,
}

// ============================================================================
// BACKEND
// ============================================================================

/// Redis-backed [`CacheBackend`].
pub struct RedisCacheBackend {
    pool: Pool,
    config: PoolConfig,
    reaper: JoinHandle<()>,
}

impl RedisCacheBackend {
    /// Build the pool for `url` and start idle maintenance.
    ///
    /// Does not require Redis to be up: connections are opened lazily and a
    /// failed warm-up only logs. Must be called inside a tokio runtime.
    pub async fn connect(url: &str, config: PoolConfig) -> QeatsResult<Self> {
        config.validate()?;

        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(config.acquire_timeout);
        timeouts.create = Some(config.connect_timeout);
        timeouts.recycle = Some(config.connect_timeout);

        let mut pool_config = deadpool_redis::PoolConfig::new(config.max_connections);
        pool_config.timeouts = timeouts;

        let mut cfg = Config::from_url(url);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConfigError::InvalidValue {
                field: "redis_url".to_string(),
                value: url.to_string(),
                reason: e.to_string(),
            })?;

        let warmed = prewarm(&pool, config.min_idle).await;
        info!(
            max_connections = config.max_connections,
            min_idle = config.min_idle,
            warmed,
            "Redis cache pool created"
        );

        let reaper = tokio::spawn(maintain_idle(pool.clone(), config.clone()));

        Ok(Self {
            pool,
            config,
            reaper,
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn usage(&self) -> PoolUsage {
        let status = self.pool.status();
        PoolUsage {
            size: status.size,
            max_size: status.max_size,
        }
    }

    /// Take a connection, blocking up to the acquire timeout when the pool is
    /// exhausted.
    async fn acquire(&self) -> CacheResult<Connection> {
        let mut conn = self.pool.get().await.map_err(unreachable)?;
        if self.config.test_on_borrow {
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Unreachable {
                    reason: format!("PING on borrow failed: {}", e),
                })?;
        }
        Ok(conn)
    }
}

impl Drop for RedisCacheBackend {
    fn drop(&mut self) {
        self.reaper.abort();
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.acquire().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| command("GET", e))
    }

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> CacheResult<()> {
        let mut conn = self.acquire().await?;
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(|e| command("SETEX", e))?;
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                debug!(error = %e, "Redis connection unavailable");
                return false;
            }
        };
        let pong: Result<String, RedisError> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut conn = self.acquire().await?;
        let _: () = redis::cmd("FLUSHALL")
            .query_async(&mut conn)
            .await
            .map_err(|e| command("FLUSHALL", e))?;
        Ok(())
    }
}

fn unreachable(err: PoolError) -> CacheError {
    CacheError::Unreachable {
        reason: err.to_string(),
    }
}

fn command(operation: &str, err: RedisError) -> CacheError {
    CacheError::Command {
        operation: operation.to_string(),
        reason: err.to_string(),
    }
}

// ============================================================================
// IDLE MAINTENANCE
// ============================================================================

/// Open up to `min_idle` connections and release them back to the pool.
/// Returns how many were opened.
async fn prewarm(pool: &Pool, min_idle: usize) -> usize {
    let mut held = Vec::with_capacity(min_idle);
    while held.len() < min_idle {
        match pool.get().await {
            Ok(conn) => held.push(conn),
            Err(e) => {
                debug!(error = %e, opened = held.len(), "Pool warm-up stopped early");
                break;
            }
        }
    }
    held.len()
}

/// Drop idle connections older than `min_evictable_idle`, sparing enough to
/// keep `min_idle` open. Returns how many were evicted.
fn evict_idle(pool: &Pool, config: &PoolConfig) -> usize {
    let kept = Cell::new(0usize);
    let evicted = Cell::new(0usize);
    pool.retain(|_, metrics| {
        if metrics.last_used() < config.min_evictable_idle || kept.get() < config.min_idle {
            kept.set(kept.get() + 1);
            true
        } else {
            evicted.set(evicted.get() + 1);
            false
        }
    });
    evicted.get()
}

async fn maintain_idle(pool: Pool, config: PoolConfig) {
    let mut ticker = tokio::time::interval(config.eviction_interval);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let evicted = evict_idle(&pool, &config);
        if evicted > 0 {
            debug!(evicted, "Evicted idle Redis connections");
        }
        let status = pool.status();
        if status.size < config.min_idle {
            let opened = prewarm(&pool, config.min_idle).await;
            if opened < config.min_idle {
                warn!(opened, min_idle = config.min_idle, "Redis pool below idle floor");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> PoolConfig {
        PoolConfig {
            min_idle: 0,
            acquire_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(200),
            ..PoolConfig::default()
        }
    }

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 128);
        assert_eq!(config.min_idle, 16);
        assert_eq!(config.eviction_interval, Duration::from_secs(30));
        assert_eq!(config.min_evictable_idle, Duration::from_secs(60));
        assert!(config.test_on_borrow);
        assert_eq!(config.acquire_timeout, Duration::from_millis(400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_idle_above_max_rejected() {
        let config = PoolConfig {
            max_connections: 4,
            min_idle: 8,
            ..PoolConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pool.min_idle"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PoolConfig {
            eviction_interval: Duration::ZERO,
            ..PoolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let result = RedisCacheBackend::connect("not a url", fast_config()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_unreachable() {
        // Port 1 is reserved; nothing listens there.
        let backend = RedisCacheBackend::connect("redis://127.0.0.1:1", fast_config())
            .await
            .unwrap();

        assert!(!backend.is_reachable().await);
        assert!(matches!(
            backend.get("tdr1wxy").await,
            Err(CacheError::Unreachable { .. })
        ));
        assert!(backend.set_with_expiry("tdr1wxy", vec![], 60).await.is_err());
        assert_eq!(backend.usage().max_size, 128);
    }
}
