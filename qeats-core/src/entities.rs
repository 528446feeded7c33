//! Restaurant and menu records as the rest of the workspace sees them.
//!
//! Field names serialize in camelCase, matching the JSON payloads produced by
//! the request layer and stored in cache entries.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::serving::Schedule;

/// Restaurant identifier issued by the persistent store.
pub type RestaurantId = String;

/// A restaurant as loaded for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRecord {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub city: String,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Local time of day, `HH:MM` or `HH:MM:SS`.
    pub opens_at: String,
    /// Local time of day, `HH:MM` or `HH:MM:SS`.
    pub closes_at: String,
    /// Cuisines and other tags, in store order.
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl RestaurantRecord {
    /// Parse the opening hours.
    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        Schedule::parse(&self.restaurant_id, &self.opens_at, &self.closes_at)
    }
}

/// A single dish on a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ItemRecord {
    pub fn new(name: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            attributes,
            item_id: None,
            image_url: None,
            price: None,
        }
    }
}

/// The menu of one restaurant. `restaurant_id` is not enforced and may dangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecord {
    pub restaurant_id: RestaurantId,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}
