//! Search aggregation: run every strategy over the nearby restaurants and
//! merge the results.

use std::collections::HashSet;
use std::sync::Arc;

use qeats_core::{Instant, QeatsResult, RestaurantRecord, SearchConfig, StoreSettings};
use qeats_storage::{bounded_store_read, RestaurantStore};
use tracing::debug;

use crate::proximity::ProximityFilter;
use crate::strategy::{MatchStrategy, SearchCorpus, TextMatcher};

/// Free-text restaurant search restricted to the proximity set.
#[derive(Clone)]
pub struct SearchAggregator {
    proximity: ProximityFilter,
    store: Arc<dyn RestaurantStore>,
    config: SearchConfig,
    store_settings: StoreSettings,
}

impl SearchAggregator {
    pub fn new(
        proximity: ProximityFilter,
        store: Arc<dyn RestaurantStore>,
        config: SearchConfig,
        store_settings: StoreSettings,
    ) -> Self {
        Self {
            proximity,
            store,
            config,
            store_settings,
        }
    }

    pub fn proximity(&self) -> &ProximityFilter {
        &self.proximity
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Nearby restaurants matching `query`, deduplicated by restaurant id.
    ///
    /// Results are ordered by strategy (name exact, name substring,
    /// attribute, item name, item attribute), each restaurant appearing at
    /// its first match. An empty query returns nothing and touches neither
    /// cache nor store.
    pub async fn search(
        &self,
        latitude: f64,
        longitude: f64,
        query: &str,
        instant: Instant,
    ) -> QeatsResult<Vec<RestaurantRecord>> {
        if query.is_empty() {
            debug!("Empty search query, skipping search");
            return Ok(Vec::new());
        }

        let candidates = self
            .proximity
            .find_close_by(latitude, longitude, instant)
            .await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let menus = bounded_store_read(
            "list_all_menus",
            self.store_settings.read_timeout,
            self.store.list_all_menus(),
        )
        .await?;

        let corpus = SearchCorpus::new(&candidates, &menus);
        let matcher = TextMatcher::new(query, self.config.match_mode);

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for strategy in MatchStrategy::ALL {
            let hits = corpus.matches(strategy, &matcher);
            let before = results.len();
            for restaurant in hits {
                if seen.insert(restaurant.restaurant_id.as_str()) {
                    results.push(restaurant.clone());
                }
            }
            debug!(
                strategy = %strategy,
                added = results.len() - before,
                "Merged search strategy"
            );
        }

        debug!(
            candidates = candidates.len(),
            matched = results.len(),
            "Search complete"
        );
        Ok(results)
    }
}
