//! Configuration types
//!
//! All values are immutable once handed to a component. Defaults reproduce
//! the production constants.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::serving::PeakWindow;

/// Lifetime of a geo bucket cache entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Serving radius inside a peak window.
pub const PEAK_RADIUS_KM: f64 = 3.0;

/// Serving radius outside peak windows.
pub const NORMAL_RADIUS_KM: f64 = 5.0;

fn wall_clock(hour: u32, minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, second).expect("peak window constants are valid times")
}

/// The three daily peak windows: breakfast, lunch and dinner.
pub fn default_peak_windows() -> Vec<PeakWindow> {
    vec![
        PeakWindow::new(wall_clock(7, 59, 59), wall_clock(10, 0, 1)),
        PeakWindow::new(wall_clock(12, 59, 59), wall_clock(14, 0, 1)),
        PeakWindow::new(wall_clock(18, 59, 59), wall_clock(21, 0, 1)),
    ]
}

/// Radius and peak window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingConfig {
    pub peak_radius_km: f64,
    pub normal_radius_km: f64,
    pub peak_windows: Vec<PeakWindow>,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            peak_radius_km: PEAK_RADIUS_KM,
            normal_radius_km: NORMAL_RADIUS_KM,
            peak_windows: default_peak_windows(),
        }
    }
}

impl ServingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, radius) in [
            ("peak_radius_km", self.peak_radius_km),
            ("normal_radius_km", self.normal_radius_km),
        ] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: radius.to_string(),
                    reason: "must be a positive number of kilometers".to_string(),
                });
            }
        }

        for (i, window) in self.peak_windows.iter().enumerate() {
            if window.start >= window.end {
                return Err(ConfigError::InvalidValue {
                    field: format!("peak_windows[{}]", i),
                    value: format!("{}-{}", window.start, window.end),
                    reason: "windows may not wrap midnight".to_string(),
                });
            }
            if self.peak_windows[..i].iter().any(|prev| prev.overlaps(window)) {
                return Err(ConfigError::InvalidValue {
                    field: format!("peak_windows[{}]", i),
                    value: format!("{}-{}", window.start, window.end),
                    reason: "windows may not overlap".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// How search text is compared against names and attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Byte-for-byte comparison.
    #[default]
    CaseSensitive,
    /// Both sides lowercased before comparison. No Unicode normalization.
    CaseInsensitive,
}

/// Search settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub match_mode: MatchMode,
}

/// Geo index cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Expiry applied to every bucket entry.
    pub entry_ttl: Duration,
    /// Upper bound for any single cache round trip, after which the call
    /// falls back to the store.
    pub operation_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            entry_ttl: DEFAULT_CACHE_TTL,
            operation_timeout: Duration::from_millis(500),
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QeatsConfig {
    pub cache: CacheSettings,
    pub store: StoreSettings,
    pub serving: ServingConfig,
    pub search: SearchConfig,
}

/// Persistent store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Upper bound for a bulk read; exceeding it fails the call.
    pub read_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
        }
    }
}

impl QeatsConfig {
    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.entry_ttl.as_secs() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.entry_ttl".to_string(),
                value: format!("{:?}", self.cache.entry_ttl),
                reason: "cache entries need at least one second to live".to_string(),
            });
        }
        if self.cache.operation_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache.operation_timeout".to_string(),
                value: format!("{:?}", self.cache.operation_timeout),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.store.read_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "store.read_timeout".to_string(),
                value: format!("{:?}", self.store.read_timeout),
                reason: "must be greater than zero".to_string(),
            });
        }
        self.serving.validate()
    }
}
