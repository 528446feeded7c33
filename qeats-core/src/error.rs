//! Error types for QEats operations

use std::time::Duration;
use thiserror::Error;

/// Persistent store errors. Always fatal to the current call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable during {operation}: {reason}")]
    Unavailable { operation: String, reason: String },

    #[error("Store {operation} timed out after {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },

    #[error("Malformed store document: {reason}")]
    MalformedDocument { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Cache backend errors. Absorbed by the geo index; never reach the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Cache {operation} timed out after {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },

    #[error("Cache command {operation} failed: {reason}")]
    Command { operation: String, reason: String },

    #[error("Failed to serialize cache entry for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Failed to deserialize cache entry for {key}: {reason}")]
    Deserialization { key: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// A restaurant whose opening hours cannot be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Malformed {field} for restaurant {restaurant_id}: {value:?}")]
    Malformed {
        restaurant_id: String,
        field: String,
        value: String,
    },
}

/// Points that cannot be placed in a geohash cell.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeoError {
    #[error("Coordinates out of range: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Geohash encoding failed: {reason}")]
    Encoding { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all QEats errors.
#[derive(Debug, Clone, Error)]
pub enum QeatsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Geo error: {0}")]
    Geo(#[from] GeoError),
}

impl QeatsError {
    /// True when the persistent store could not serve the call.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, QeatsError::Store(_))
    }
}

/// Result type alias for QEats operations.
pub type QeatsResult<T> = Result<T, QeatsError>;

/// Result type alias for cache backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================
