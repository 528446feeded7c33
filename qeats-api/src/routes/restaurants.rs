//! Restaurant discovery routes.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use qeats_core::RestaurantRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for GET /qeats/v1/restaurants.
///
/// Coordinates arrive as raw strings so a missing or garbled value yields a
/// structured 400 instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct GetRestaurantsQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "searchFor")]
    pub search_for: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetRestaurantsResponse {
    pub restaurants: Vec<RestaurantRecord>,
}

/// GET /qeats/v1/restaurants
///
/// Without `searchFor` (or with it empty) this lists every restaurant open
/// and in range; otherwise it runs the free-text search.
pub async fn get_restaurants(
    State(state): State<AppState>,
    Query(params): Query<GetRestaurantsQuery>,
) -> ApiResult<Json<GetRestaurantsResponse>> {
    let latitude = parse_coordinate("latitude", params.latitude.as_deref(), 90.0)?;
    let longitude = parse_coordinate("longitude", params.longitude.as_deref(), 180.0)?;
    let instant = state.now();

    let query = params.search_for.unwrap_or_default();
    let restaurants = if query.is_empty() {
        state.proximity.find_close_by(latitude, longitude, instant).await?
    } else {
        state.search.search(latitude, longitude, &query, instant).await?
    };

    info!(
        latitude,
        longitude,
        search_for = %query,
        count = restaurants.len(),
        "Served restaurants"
    );

    Ok(Json(GetRestaurantsResponse {
        restaurants: restaurants.into_iter().map(fold_display_name).collect(),
    }))
}

fn parse_coordinate(field: &str, raw: Option<&str>, bound: f64) -> ApiResult<f64> {
    let raw = raw.ok_or_else(|| ApiError::missing_field(field))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid_format(field, "a decimal number"))?;
    if !value.is_finite() || value < -bound || value > bound {
        return Err(ApiError::invalid_range(field, -bound, bound));
    }
    Ok(value)
}

/// Names are served with `é` folded to `e`.
fn fold_display_name(mut record: RestaurantRecord) -> RestaurantRecord {
    if record.name.contains('é') {
        record.name = record.name.replace('é', "e");
    }
    record
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/restaurants", get(get_restaurants))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate_accepts_bounds() {
        assert_eq!(parse_coordinate("latitude", Some("90"), 90.0).unwrap(), 90.0);
        assert_eq!(parse_coordinate("longitude", Some(" -180 "), 180.0).unwrap(), -180.0);
    }

    #[test]
    fn test_parse_coordinate_rejections() {
        let missing = parse_coordinate("latitude", None, 90.0).unwrap_err();
        assert_eq!(missing.code, crate::error::ErrorCode::MissingField);

        let garbled = parse_coordinate("latitude", Some("north"), 90.0).unwrap_err();
        assert_eq!(garbled.code, crate::error::ErrorCode::InvalidFormat);

        let nan = parse_coordinate("latitude", Some("NaN"), 90.0).unwrap_err();
        assert_eq!(nan.code, crate::error::ErrorCode::InvalidRange);

        let out = parse_coordinate("longitude", Some("180.5"), 180.0).unwrap_err();
        assert_eq!(out.code, crate::error::ErrorCode::InvalidRange);
    }

    #[test]
    fn test_fold_display_name() {
        let record = RestaurantRecord {
            restaurant_id: "1".to_string(),
            name: "Café Mocha".to_string(),
            city: "Bengaluru".to_string(),
            image_url: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            opens_at: "08:00".to_string(),
            closes_at: "22:00".to_string(),
            attributes: vec![],
        };
        assert_eq!(fold_display_name(record).name, "Cafe Mocha");
    }
}
