//! Process-local cache backend.
//!
//! Used when no Redis URL is configured, and by tests that need to make the
//! cache slow or unreachable on demand. Expiry follows the tokio clock so
//! paused-time tests can step past a TTL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use qeats_core::{CacheError, CacheResult};
use tokio::time::Instant;

use super::traits::CacheBackend;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory [`CacheBackend`] with per-entry expiry.
#[derive(Debug)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, Entry>>,
    reachable: AtomicBool,
    reject_writes: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            reject_writes: AtomicBool::new(false),
            latency: RwLock::new(None),
        }
    }
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend going down or coming back.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Fail SETEX while reads and PING keep working.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Delay every subsequent operation.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when a live entry exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .is_some_and(|entry| entry.expires_at > now)
    }

    async fn simulate(&self, operation: &str) -> CacheResult<()> {
        let latency = *self.latency.read().map_err(|_| CacheError::LockPoisoned)?;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(CacheError::Unreachable {
                reason: format!("in-memory cache marked unreachable during {}", operation),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.simulate("GET").await?;
        let now = Instant::now();

        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> CacheResult<()> {
        self.simulate("SETEX").await?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Command {
                operation: "SETEX".to_string(),
                reason: "in-memory cache rejecting writes".to_string(),
            });
        }
        let entry = Entry {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        self.simulate("PING").await.is_ok()
    }

    async fn flush_all(&self) -> CacheResult<()> {
        self.simulate("FLUSHALL").await?;
        self.entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .clear();
        Ok(())
    }
}
