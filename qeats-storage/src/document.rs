//! Document-backed restaurant store.
//!
//! Restaurants and menus are held as store-native documents and converted
//! into records field by field on every read. A restaurant document with an
//! empty `restaurantId` or non-finite coordinates is skipped with a warning.
//! The seed file format is:
//!
//! ```json
//! {
//!   "restaurants": [{ "_id": "...", "restaurantId": "10", "name": "A2B", ... }],
//!   "menus": [{ "_id": "...", "restaurantId": "10", "items": [...] }]
//! }
//! ```

use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use qeats_core::{ItemRecord, MenuRecord, QeatsResult, RestaurantRecord, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::RestaurantStore;

// ============================================================================
// DOCUMENTS
// ============================================================================

/// Restaurant as persisted. `_id` is the store's own key and is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub opens_at: String,
    pub closes_at: String,
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    #[serde(default)]
    pub item_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub restaurant_id: String,
    #[serde(default)]
    pub items: Vec<ItemDocument>,
}

/// Top-level shape of a seed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub restaurants: Vec<RestaurantDocument>,
    #[serde(default)]
    pub menus: Vec<MenuDocument>,
}

// ============================================================================
// MAPPING
// ============================================================================

impl RestaurantDocument {
    pub fn to_record(&self) -> Result<RestaurantRecord, StoreError> {
        if self.restaurant_id.trim().is_empty() {
            return Err(StoreError::MalformedDocument {
                reason: format!("restaurant {:?} has an empty restaurantId", self.name),
            });
        }
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(StoreError::MalformedDocument {
                reason: format!(
                    "restaurant {} has non-finite coordinates",
                    self.restaurant_id
                ),
            });
        }

        Ok(RestaurantRecord {
            restaurant_id: self.restaurant_id.clone(),
            name: self.name.clone(),
            city: self.city.clone().unwrap_or_default(),
            image_url: self.image_url.clone().unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            opens_at: self.opens_at.clone(),
            closes_at: self.closes_at.clone(),
            attributes: self.attributes.clone().unwrap_or_default(),
        })
    }
}

impl ItemDocument {
    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            name: self.name.clone(),
            attributes: self.attributes.clone().unwrap_or_default(),
            item_id: self.item_id.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
        }
    }
}

impl MenuDocument {
    pub fn to_record(&self) -> MenuRecord {
        MenuRecord {
            restaurant_id: self.restaurant_id.clone(),
            items: self.items.iter().map(ItemDocument::to_record).collect(),
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// [`RestaurantStore`] over an in-process document collection.
#[derive(Debug, Default)]
pub struct DocumentStore {
    seed: RwLock<SeedDocument>,
}

impl DocumentStore {
    pub fn new(seed: SeedDocument) -> Self {
        Self {
            seed: RwLock::new(seed),
        }
    }

    /// Parse a seed document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let seed: SeedDocument =
            serde_json::from_str(json).map_err(|e| StoreError::MalformedDocument {
                reason: e.to_string(),
            })?;
        Ok(Self::new(seed))
    }

    /// Load a seed document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| StoreError::Unavailable {
            operation: "load_seed".to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        let store = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            restaurants = store.restaurant_count(),
            "Loaded restaurant seed"
        );
        Ok(store)
    }

    pub fn restaurant_count(&self) -> usize {
        self.seed
            .read()
            .map(|seed| seed.restaurants.len())
            .unwrap_or_default()
    }

    /// Replace the whole collection.
    pub fn replace(&self, seed: SeedDocument) -> Result<(), StoreError> {
        *self.seed.write().map_err(|_| StoreError::LockPoisoned)? = seed;
        Ok(())
    }
}

#[async_trait]
impl RestaurantStore for DocumentStore {
    async fn list_all_restaurants(&self) -> QeatsResult<Vec<RestaurantRecord>> {
        let seed = self.seed.read().map_err(|_| StoreError::LockPoisoned)?;
        let records = seed
            .restaurants
            .iter()
            .filter_map(|doc| match doc.to_record() {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(name = %doc.name, error = %err, "Skipping malformed restaurant document");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    async fn list_all_menus(&self) -> QeatsResult<Vec<MenuRecord>> {
        let seed = self.seed.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(seed.menus.iter().map(MenuDocument::to_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "restaurants": [
            {
                "_id": "5c8b8f1e9b1e8a0001a0b001",
                "restaurantId": "10",
                "name": "A2B",
                "city": "Hsr Layout",
                "imageUrl": "www.google.com",
                "latitude": 20.027,
                "longitude": 30.0,
                "opensAt": "18:00",
                "closesAt": "23:00",
                "attributes": ["Tamil", "South Indian"]
            },
            {
                "restaurantId": "11",
                "name": "Udupi Park",
                "latitude": 12.97,
                "longitude": 77.59,
                "opensAt": "07:00",
                "closesAt": "22:00",
                "attributes": null
            }
        ],
        "menus": [
            {
                "restaurantId": "10",
                "items": [
                    { "itemId": "1", "name": "Idly", "price": 40.0, "attributes": ["South Indian"] },
                    { "name": "Vada" }
                ]
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_restaurant_documents_map_to_records() {
        let store = DocumentStore::from_json(SEED).unwrap();
        let restaurants = store.list_all_restaurants().await.unwrap();

        assert_eq!(restaurants.len(), 2);
        assert_eq!(restaurants[0].restaurant_id, "10");
        assert_eq!(restaurants[0].attributes, vec!["Tamil", "South Indian"]);
        assert_eq!(restaurants[1].city, "");
        assert_eq!(restaurants[1].image_url, "");
        assert!(restaurants[1].attributes.is_empty());
    }

    #[tokio::test]
    async fn test_menu_documents_map_to_records() {
        let store = DocumentStore::from_json(SEED).unwrap();
        let menus = store.list_all_menus().await.unwrap();

        assert_eq!(menus.len(), 1);
        let items = &menus[0].items;
        assert_eq!(items[0].item_id.as_deref(), Some("1"));
        assert_eq!(items[0].price, Some(40.0));
        assert_eq!(items[1].name, "Vada");
        assert!(items[1].attributes.is_empty());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = DocumentStore::from_json("{ restaurants: ").unwrap_err();
        assert!(matches!(err, StoreError::MalformedDocument { .. }));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = DocumentStore::from_path("/nonexistent/qeats-seed.json").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_documents_skipped() {
        let store = DocumentStore::from_json(SEED).unwrap();
        let mut seed: SeedDocument = serde_json::from_str(SEED).unwrap();
        seed.restaurants.push(RestaurantDocument {
            id: None,
            restaurant_id: " ".to_string(),
            name: "Ghost".to_string(),
            city: None,
            image_url: None,
            latitude: 0.0,
            longitude: 0.0,
            opens_at: "08:00".to_string(),
            closes_at: "22:00".to_string(),
            attributes: None,
        });
        seed.restaurants.push(RestaurantDocument {
            id: None,
            restaurant_id: "13".to_string(),
            name: "Nowhere".to_string(),
            city: None,
            image_url: None,
            latitude: f64::NAN,
            longitude: 77.59,
            opens_at: "08:00".to_string(),
            closes_at: "22:00".to_string(),
            attributes: None,
        });
        store.replace(seed).unwrap();

        let restaurants = store.list_all_restaurants().await.unwrap();
        let ids: Vec<&str> = restaurants.iter().map(|r| r.restaurant_id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
    }

    #[test]
    fn test_empty_restaurant_id_rejected_by_mapping() {
        let mut seed: SeedDocument = serde_json::from_str(SEED).unwrap();
        seed.restaurants[0].restaurant_id = String::new();
        assert!(matches!(
            seed.restaurants[0].to_record(),
            Err(StoreError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_store_id_not_exposed() {
        let seed: SeedDocument = serde_json::from_str(SEED).unwrap();
        let record = seed.restaurants[0].to_record().unwrap();
        let json = serde_json::to_value(record).unwrap();
        assert!(json.get("_id").is_none());
    }
}
