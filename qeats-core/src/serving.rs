//! Serving policy: how far a restaurant delivers at a given instant, and
//! whether it is open.
//!
//! Both rules are pure. Peak windows and opening hours are open intervals:
//! an instant equal to a boundary is outside.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::config::ServingConfig;
use crate::error::ScheduleError;

/// Accepted wall-clock formats for opening hours.
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// A daily interval during which the serving radius shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl PeakWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Strictly after `start` and strictly before `end`.
    pub fn contains(&self, instant: NaiveTime) -> bool {
        instant > self.start && instant < self.end
    }

    /// True when the two open intervals share at least one instant.
    pub fn overlaps(&self, other: &PeakWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Parsed opening hours of one restaurant. Same-day only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl Schedule {
    /// Parse `opensAt`/`closesAt` strings for the given restaurant.
    pub fn parse(restaurant_id: &str, opens_at: &str, closes_at: &str) -> Result<Self, ScheduleError> {
        let malformed = |field: &str, value: &str| ScheduleError::Malformed {
            restaurant_id: restaurant_id.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        };

        let opens = parse_time_of_day(opens_at).ok_or_else(|| malformed("opensAt", opens_at))?;
        let closes = parse_time_of_day(closes_at).ok_or_else(|| malformed("closesAt", closes_at))?;

        Ok(Self {
            opens_at: opens,
            closes_at: closes,
        })
    }

    /// Open strictly between opening and closing time. Hours that would wrap
    /// past midnight are never open.
    pub fn is_open_at(&self, instant: NaiveTime) -> bool {
        instant > self.opens_at && instant < self.closes_at
    }
}

/// Serving radius and openness rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServingPolicy {
    config: ServingConfig,
}

impl ServingPolicy {
    pub fn new(config: ServingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServingConfig {
        &self.config
    }

    /// True when `instant` falls strictly inside any peak window.
    pub fn is_peak(&self, instant: NaiveTime) -> bool {
        self.config
            .peak_windows
            .iter()
            .any(|window| window.contains(instant))
    }

    /// Serving radius in kilometers.
    pub fn radius_for(&self, instant: NaiveTime) -> f64 {
        if self.is_peak(instant) {
            self.config.peak_radius_km
        } else {
            self.config.normal_radius_km
        }
    }

    pub fn is_open(&self, instant: NaiveTime, schedule: &Schedule) -> bool {
        schedule.is_open_at(instant)
    }
}
