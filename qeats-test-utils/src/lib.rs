//! QEats Test Utilities
//!
//! Centralized test infrastructure for the QEats workspace:
//! - Builders and fixtures for restaurants and menus around Bengaluru
//! - Proptest generators for records and instants
//! - Custom assertions for QEats-specific results

// Re-export test doubles from their source crate
pub use qeats_storage::{InMemoryCacheBackend, MockStore};

// Re-export core types for convenience
pub use qeats_core::{
    haversine_km, GeoBucketKey, Instant, ItemRecord, MenuRecord, QeatsError, QeatsResult,
    RestaurantRecord, ServingConfig, StoreError,
};

use chrono::NaiveTime;

/// Wall-clock instant for tests. Panics on an invalid time.
pub fn at(hour: u32, minute: u32) -> Instant {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time")
}

// ============================================================================
// BUILDERS
// ============================================================================

/// Builder for [`RestaurantRecord`] with open-all-day defaults.
#[derive(Debug, Clone)]
pub struct RestaurantBuilder {
    record: RestaurantRecord,
}

impl RestaurantBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            record: RestaurantRecord {
                name: format!("Restaurant {}", id),
                restaurant_id: id,
                city: "Bengaluru".to_string(),
                image_url: "www.google.com".to_string(),
                latitude: fixtures::MG_ROAD.0,
                longitude: fixtures::MG_ROAD.1,
                opens_at: "00:00:01".to_string(),
                closes_at: "23:59:59".to_string(),
                attributes: vec![],
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.record.name = name.into();
        self
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.record.latitude = latitude;
        self.record.longitude = longitude;
        self
    }

    pub fn hours(mut self, opens_at: impl Into<String>, closes_at: impl Into<String>) -> Self {
        self.record.opens_at = opens_at.into();
        self.record.closes_at = closes_at.into();
        self
    }

    pub fn attributes(mut self, attributes: &[&str]) -> Self {
        self.record.attributes = attributes.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn build(self) -> RestaurantRecord {
        self.record
    }
}

/// Menu for `restaurant_id` with `(name, attributes)` items.
pub fn menu(restaurant_id: &str, items: Vec<(&str, Vec<&str>)>) -> MenuRecord {
    MenuRecord {
        restaurant_id: restaurant_id.to_string(),
        items: items
            .into_iter()
            .map(|(name, attributes)| {
                ItemRecord::new(name, attributes.into_iter().map(String::from).collect())
            })
            .collect(),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating QEats records.

    use super::*;
    use proptest::prelude::*;

    /// Any second of the day.
    pub fn arb_instant() -> impl Strategy<Value = Instant> {
        (0u32..86_400).prop_map(|secs| {
            NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).expect("seconds within a day")
        })
    }

    /// A point within roughly 0.1 degrees of `center`.
    pub fn arb_point_near(center: (f64, f64)) -> impl Strategy<Value = (f64, f64)> {
        (-0.1f64..0.1, -0.1f64..0.1).prop_map(move |(dlat, dlon)| (center.0 + dlat, center.1 + dlon))
    }

    /// Opening hours as `HH:MM:SS` strings, sometimes wrapping midnight.
    pub fn arb_hours() -> impl Strategy<Value = (String, String)> {
        (arb_instant(), arb_instant()).prop_map(|(opens, closes)| {
            (
                opens.format("%H:%M:%S").to_string(),
                closes.format("%H:%M:%S").to_string(),
            )
        })
    }

    pub fn arb_attributes() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::sample::select(vec![
                "Tamil",
                "South Indian",
                "North Indian",
                "Chinese",
                "Bakery",
                "Cafe",
            ]),
            0..4,
        )
        .prop_map(|attrs| attrs.into_iter().map(String::from).collect())
    }

    /// A restaurant near `center` with a numeric id.
    pub fn arb_restaurant(center: (f64, f64)) -> impl Strategy<Value = RestaurantRecord> {
        (
            0u32..10_000,
            "[A-Z][a-z]{2,8}( [A-Z][a-z]{2,8})?",
            arb_point_near(center),
            arb_hours(),
            arb_attributes(),
        )
            .prop_map(|(id, name, (lat, lon), (opens, closes), attributes)| RestaurantRecord {
                restaurant_id: id.to_string(),
                name,
                city: "Bengaluru".to_string(),
                image_url: String::new(),
                latitude: lat,
                longitude: lon,
                opens_at: opens,
                closes_at: closes,
                attributes,
            })
    }

    /// Up to `max` restaurants near `center` with unique ids.
    pub fn arb_restaurants(
        center: (f64, f64),
        max: usize,
    ) -> impl Strategy<Value = Vec<RestaurantRecord>> {
        prop::collection::vec(arb_restaurant(center), 0..max).prop_map(|restaurants| {
            let mut seen = std::collections::HashSet::new();
            restaurants
                .into_iter()
                .filter(|r| seen.insert(r.restaurant_id.clone()))
                .collect()
        })
    }

    pub fn arb_menu(restaurant_id: String) -> impl Strategy<Value = MenuRecord> {
        prop::collection::vec(("[A-Z][a-z]{2,8}", arb_attributes()), 0..5).prop_map(
            move |items| MenuRecord {
                restaurant_id: restaurant_id.clone(),
                items: items
                    .into_iter()
                    .map(|(name, attributes)| ItemRecord::new(name, attributes))
                    .collect(),
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common scenarios around Bengaluru.

    use super::*;

    /// Restaurant location used by most scenarios.
    pub const MG_ROAD: (f64, f64) = (12.9716, 77.5946);

    /// Query point roughly 2.5 km south-east of [`MG_ROAD`].
    pub const RICHMOND_TOWN: (f64, f64) = (12.95, 77.60);

    /// Query point roughly 4 km due south of [`MG_ROAD`]: inside the
    /// off-peak radius, outside the peak radius.
    pub const JAYANAGAR: (f64, f64) = (12.9356, 77.5946);

    /// Far outside any serving radius.
    pub const NEW_DELHI: (f64, f64) = (28.6139, 77.2090);

    /// Open 08:00-22:00 at MG Road, tagged Tamil and South Indian.
    pub fn a2b() -> RestaurantRecord {
        RestaurantBuilder::new("10")
            .name("A2B")
            .at(MG_ROAD.0, MG_ROAD.1)
            .hours("08:00", "22:00")
            .attributes(&["Tamil", "South Indian"])
            .build()
    }

    /// Open 07:00-23:00 next to MG Road.
    pub fn udupi_park() -> RestaurantRecord {
        RestaurantBuilder::new("11")
            .name("Udupi Park")
            .at(12.9721, 77.5950)
            .hours("07:00", "23:00")
            .attributes(&["South Indian", "Tamil"])
            .build()
    }

    /// Open 11:00-23:30 near MG Road, serves Chinese.
    pub fn dragon_house() -> RestaurantRecord {
        RestaurantBuilder::new("12")
            .name("Dragon House")
            .at(12.9700, 77.5960)
            .hours("11:00", "23:30")
            .attributes(&["Chinese"])
            .build()
    }

    /// In New Delhi, never nearby.
    pub fn delhi_darbar() -> RestaurantRecord {
        RestaurantBuilder::new("20")
            .name("Delhi Darbar")
            .at(NEW_DELHI.0, NEW_DELHI.1)
            .hours("08:00", "22:00")
            .attributes(&["North Indian"])
            .build()
    }

    /// Nearby but with unreadable hours.
    pub fn broken_hours() -> RestaurantRecord {
        RestaurantBuilder::new("99")
            .name("Broken Clock")
            .at(MG_ROAD.0, MG_ROAD.1)
            .hours("8am", "late")
            .attributes(&["Tamil"])
            .build()
    }

    pub fn restaurants() -> Vec<RestaurantRecord> {
        vec![a2b(), udupi_park(), dragon_house(), delhi_darbar(), broken_hours()]
    }

    pub fn menus() -> Vec<MenuRecord> {
        vec![
            menu("10", vec![("Idly", vec!["South Indian"]), ("Masala Dosa", vec!["South Indian"])]),
            menu("11", vec![("Rava Idly", vec!["Breakfast"])]),
            menu("12", vec![("Hakka Noodles", vec!["Chinese"]), ("Spring Roll", vec!["Snack"])]),
            menu("20", vec![("Idly", vec!["South Indian"])]),
            menu("404", vec![("Idly", vec!["Orphan"])]),
        ]
    }

    /// Mock store loaded with [`restaurants`] and [`menus`].
    pub fn bengaluru_store() -> MockStore {
        MockStore::with_data(restaurants(), menus())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for QEats-specific validation.

    use super::*;

    /// Assert that a QeatsResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &QeatsResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a QeatsResult is a store failure.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &QeatsResult<T>) {
        match result {
            Err(QeatsError::Store(_)) => {}
            other => panic!("Expected Store error, got: {:?}", other),
        }
    }

    /// Assert the exact restaurant ids, in order.
    #[track_caller]
    pub fn assert_ids(restaurants: &[RestaurantRecord], expected: &[&str]) {
        let ids: Vec<&str> = restaurants.iter().map(|r| r.restaurant_id.as_str()).collect();
        assert_eq!(ids, expected, "Unexpected restaurant ids");
    }

    /// Assert that no restaurant id appears twice.
    #[track_caller]
    pub fn assert_unique_ids(restaurants: &[RestaurantRecord]) {
        let mut seen = std::collections::HashSet::new();
        for r in restaurants {
            assert!(
                seen.insert(r.restaurant_id.as_str()),
                "Duplicate restaurant id {}",
                r.restaurant_id
            );
        }
    }
}
