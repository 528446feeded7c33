//! API Configuration Module
//!
//! Loaded from `QEATS_*` environment variables with defaults suitable for
//! development: no Redis (in-memory cache), no seed file (empty store).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use qeats_core::{ConfigError, MatchMode, QeatsConfig};
use qeats_storage::PoolConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// JSON seed document with restaurants and menus.
    pub seed_path: Option<PathBuf>,
    /// Redis URL. Unset means the in-memory cache backend.
    pub redis_url: Option<String>,
    /// Redis connection pool tuning.
    pub pool: PoolConfig,
    /// Cache, store, serving and search settings.
    pub core: QeatsConfig,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            seed_path: None,
            redis_url: None,
            pool: PoolConfig::default(),
            core: QeatsConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `QEATS_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` or `QEATS_API_PORT`: Bind port (default: 8081)
    /// - `QEATS_SEED_PATH`: Seed document path (default: none, empty store)
    /// - `QEATS_REDIS_URL`: Redis URL (default: none, in-memory cache)
    /// - `QEATS_REDIS_MAX_CONNECTIONS`, `QEATS_REDIS_MIN_IDLE`: Pool sizing
    /// - `QEATS_CACHE_TTL_SECS`: Bucket entry lifetime (default: 3600)
    /// - `QEATS_CACHE_TIMEOUT_MS`: Per cache call timeout (default: 500)
    /// - `QEATS_STORE_TIMEOUT_MS`: Per store read timeout (default: 5000)
    /// - `QEATS_PEAK_RADIUS_KM`, `QEATS_NORMAL_RADIUS_KM`: Serving radii
    /// - `QEATS_SEARCH_CASE_INSENSITIVE`: "true" or "false" (default: false)
    /// - `QEATS_LOG_FORMAT`: "json" or "pretty" (default: pretty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let host = lookup("QEATS_API_BIND").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT").or_else(|| lookup("QEATS_API_PORT")) {
            Some(raw) => parse_value::<u16>("QEATS_API_PORT", &raw)?,
            None => config.bind_addr.port(),
        };
        let addr = format!("{}:{}", host, port);
        config.bind_addr = parse_value("QEATS_API_BIND", &addr)?;

        config.seed_path = lookup("QEATS_SEED_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        config.redis_url = lookup("QEATS_REDIS_URL").filter(|u| !u.is_empty());

        if let Some(raw) = lookup("QEATS_REDIS_MAX_CONNECTIONS") {
            config.pool.max_connections = parse_value("QEATS_REDIS_MAX_CONNECTIONS", &raw)?;
        }
        if let Some(raw) = lookup("QEATS_REDIS_MIN_IDLE") {
            config.pool.min_idle = parse_value("QEATS_REDIS_MIN_IDLE", &raw)?;
        }
        if let Some(raw) = lookup("QEATS_CACHE_TTL_SECS") {
            config.core.cache.entry_ttl =
                Duration::from_secs(parse_value("QEATS_CACHE_TTL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("QEATS_CACHE_TIMEOUT_MS") {
            config.core.cache.operation_timeout =
                Duration::from_millis(parse_value("QEATS_CACHE_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("QEATS_STORE_TIMEOUT_MS") {
            config.core.store.read_timeout =
                Duration::from_millis(parse_value("QEATS_STORE_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("QEATS_PEAK_RADIUS_KM") {
            config.core.serving.peak_radius_km = parse_value("QEATS_PEAK_RADIUS_KM", &raw)?;
        }
        if let Some(raw) = lookup("QEATS_NORMAL_RADIUS_KM") {
            config.core.serving.normal_radius_km = parse_value("QEATS_NORMAL_RADIUS_KM", &raw)?;
        }
        if let Some(raw) = lookup("QEATS_SEARCH_CASE_INSENSITIVE") {
            if parse_value::<bool>("QEATS_SEARCH_CASE_INSENSITIVE", &raw)? {
                config.core.search.match_mode = MatchMode::CaseInsensitive;
            }
        }
        if let Some(raw) = lookup("QEATS_LOG_FORMAT") {
            config.log_format = match raw.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "QEATS_LOG_FORMAT".to_string(),
                        value: raw,
                        reason: "expected json or pretty".to_string(),
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.core.validate()?;
        self.pool.validate()?;

        // The pool wait has to fit inside the per-call cache bound.
        let operation_timeout = self.core.cache.operation_timeout;
        if self.pool.acquire_timeout > operation_timeout {
            return Err(ConfigError::InvalidValue {
                field: "pool.acquire_timeout".to_string(),
                value: format!("{:?}", self.pool.acquire_timeout),
                reason: format!("exceeds cache operation timeout ({:?})", operation_timeout),
            });
        }
        Ok(())
    }
}

fn parse_value<T>(field: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
