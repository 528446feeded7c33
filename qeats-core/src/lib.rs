//! QEats Core - Records, Geo Math and Serving Policy
//!
//! Pure data structures and pure functions. Every other crate depends on
//! this one; nothing here performs I/O.

pub mod config;
pub mod entities;
pub mod error;
pub mod geo;
pub mod serving;

pub use config::{
    default_peak_windows, CacheSettings, MatchMode, QeatsConfig, SearchConfig, ServingConfig,
    StoreSettings, DEFAULT_CACHE_TTL, NORMAL_RADIUS_KM, PEAK_RADIUS_KM,
};
pub use entities::{ItemRecord, MenuRecord, RestaurantId, RestaurantRecord};
pub use error::{
    CacheError, CacheResult, ConfigError, GeoError, QeatsError, QeatsResult, ScheduleError,
    StoreError,
};
pub use geo::{
    decode_geohash, encode_geohash, haversine_km, CellBounds, GeoBucketKey, BUCKET_PRECISION,
    EARTH_RADIUS_KM,
};
pub use serving::{PeakWindow, Schedule, ServingPolicy};

/// Wall-clock time of day used for every openness and radius decision.
pub type Instant = chrono::NaiveTime;
