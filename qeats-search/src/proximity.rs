//! Proximity filter: restaurants that are open and within serving radius.

use std::sync::Arc;

use qeats_core::{
    haversine_km, GeoBucketKey, Instant, QeatsResult, RestaurantRecord, ServingPolicy,
};
use qeats_storage::GeoIndexCache;
use tracing::{debug, warn};

/// Finds restaurants serving a point at an instant.
#[derive(Clone)]
pub struct ProximityFilter {
    index: Arc<GeoIndexCache>,
    policy: ServingPolicy,
}

impl ProximityFilter {
    pub fn new(index: Arc<GeoIndexCache>, policy: ServingPolicy) -> Self {
        Self { index, policy }
    }

    pub fn policy(&self) -> &ServingPolicy {
        &self.policy
    }

    pub fn index(&self) -> &Arc<GeoIndexCache> {
        &self.index
    }

    /// Restaurants open at `instant` and strictly closer than the serving
    /// radius for `instant`, in store order.
    ///
    /// Out-of-range coordinates fail with a geo error before any I/O.
    pub async fn find_close_by(
        &self,
        latitude: f64,
        longitude: f64,
        instant: Instant,
    ) -> QeatsResult<Vec<RestaurantRecord>> {
        let bucket = GeoBucketKey::from_coordinates(latitude, longitude)?;
        let candidates = self.index.lookup(&bucket).await?;
        let total = candidates.len();

        let close = select_close_by(candidates, latitude, longitude, instant, &self.policy);
        debug!(
            bucket = %bucket,
            radius_km = self.policy.radius_for(instant),
            candidates = total,
            close = close.len(),
            "Filtered restaurants by proximity"
        );
        Ok(close)
    }
}

/// Keep the candidates serving (`latitude`, `longitude`) at `instant`.
///
/// Restaurants with unreadable hours are dropped with a warning.
pub fn select_close_by(
    candidates: Vec<RestaurantRecord>,
    latitude: f64,
    longitude: f64,
    instant: Instant,
    policy: &ServingPolicy,
) -> Vec<RestaurantRecord> {
    let radius_km = policy.radius_for(instant);
    candidates
        .into_iter()
        .filter(|restaurant| {
            let schedule = match restaurant.schedule() {
                Ok(schedule) => schedule,
                Err(err) => {
                    warn!(error = %err, "Excluding restaurant with malformed schedule");
                    return false;
                }
            };
            policy.is_open(instant, &schedule)
                && haversine_km(latitude, longitude, restaurant.latitude, restaurant.longitude)
                    < radius_km
        })
        .collect()
}
