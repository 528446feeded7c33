//! Geographic primitives: great-circle distance and geohash bucket keys.

use geohash::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GeoError;

/// Mean Earth radius used by the spherical approximation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geohash characters per bucket key (roughly 150 m x 150 m cells).
///
/// Changing this invalidates every existing cache entry.
pub const BUCKET_PRECISION: usize = 7;

/// Haversine distance in kilometers between two (latitude, longitude) points
/// given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Encode a point as a base32 geohash of `precision` characters.
pub fn encode_geohash(
    latitude: f64,
    longitude: f64,
    precision: usize,
) -> Result<String, GeoError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::InvalidCoordinates {
            latitude,
            longitude,
        });
    }
    geohash::encode(
        Coord {
            x: longitude,
            y: latitude,
        },
        precision,
    )
    .map_err(|e| GeoError::Encoding {
        reason: e.to_string(),
    })
}

/// Latitude/longitude bounds of a geohash cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl CellBounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

/// Decode a geohash into the bounds of its cell.
///
/// Returns `None` for characters outside the geohash alphabet.
pub fn decode_geohash(hash: &str) -> Option<CellBounds> {
    let rect = geohash::decode_bbox(hash).ok()?;
    Some(CellBounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lon: rect.min().x,
        max_lon: rect.max().x,
    })
}

/// Cache partition label for a spatial cell at [`BUCKET_PRECISION`].
///
/// Two points map to the same key iff they fall in the same cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoBucketKey(String);

impl GeoBucketKey {
    /// Fails for non-finite or out-of-range coordinates.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        encode_geohash(latitude, longitude, BUCKET_PRECISION).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bounds(&self) -> Option<CellBounds> {
        decode_geohash(&self.0)
    }
}

impl fmt::Display for GeoBucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_geohash() {
        // Reference point from the geohash.org documentation.
        assert_eq!(encode_geohash(57.64911, 10.40744, 11).unwrap(), "u4pruydqqvj");
        assert_eq!(
            GeoBucketKey::from_coordinates(57.64911, 10.40744).unwrap().as_str(),
            "u4pruyd"
        );
    }

    #[test]
    fn test_bucket_key_length_is_precision() {
        let key = GeoBucketKey::from_coordinates(12.9716, 77.5946).unwrap();
        assert_eq!(key.as_str().len(), BUCKET_PRECISION);
    }

    #[test]
    fn test_nearby_points_share_bucket() {
        let a = GeoBucketKey::from_coordinates(12.97160, 77.59460).unwrap();
        let b = GeoBucketKey::from_coordinates(12.97161, 77.59461).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_distant_points_differ() {
        let a = GeoBucketKey::from_coordinates(12.9716, 77.5946).unwrap();
        let b = GeoBucketKey::from_coordinates(12.95, 77.60).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert!(matches!(
            GeoBucketKey::from_coordinates(91.0, 0.0),
            Err(GeoError::InvalidCoordinates { .. })
        ));
        assert!(GeoBucketKey::from_coordinates(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_alphabet() {
        assert!(decode_geohash("tdr1a").is_none());
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_km(12.9716, 77.5946, 12.9716, 77.5946), 0.0);
    }

    #[test]
    fn test_haversine_bangalore_pair() {
        let d = haversine_km(12.95, 77.60, 12.9716, 77.5946);
        assert!((2.3..2.6).contains(&d), "distance was {}", d);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "distance was {}", d);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Property: a point lies inside the cell of its own bucket key.
        #[test]
        fn prop_point_inside_own_cell(
            lat in -89.9f64..89.9,
            lon in -179.9f64..179.9,
        ) {
            let key = GeoBucketKey::from_coordinates(lat, lon).unwrap();
            let bounds = key.bounds().expect("encoded keys decode");
            prop_assert!(bounds.contains(lat, lon));
        }

        /// Property: haversine distance is symmetric and non-negative.
        #[test]
        fn prop_haversine_symmetric(
            lat1 in -90f64..90.0, lon1 in -180f64..180.0,
            lat2 in -90f64..90.0, lon2 in -180f64..180.0,
        ) {
            let ab = haversine_km(lat1, lon1, lat2, lon2);
            let ba = haversine_km(lat2, lon2, lat1, lon1);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-9);
        }
    }
}
