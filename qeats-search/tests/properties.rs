//! Property tests for proximity membership and search deduplication.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use qeats_core::{haversine_km, ServingPolicy};
use qeats_search::{ProximityFilter, SearchAggregator};
use qeats_storage::GeoIndexCache;
use qeats_test_utils::generators::{arb_instant, arb_menu, arb_point_near, arb_restaurants};
use qeats_test_utils::{fixtures, InMemoryCacheBackend, MenuRecord, MockStore, RestaurantRecord};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn build(restaurants: Vec<RestaurantRecord>, menus: Vec<MenuRecord>) -> (Arc<MockStore>, SearchAggregator) {
    let store = Arc::new(MockStore::with_data(restaurants, menus));
    let index = Arc::new(GeoIndexCache::with_defaults(
        Arc::new(InMemoryCacheBackend::new()),
        store.clone(),
    ));
    let proximity = ProximityFilter::new(index, ServingPolicy::default());
    let search = SearchAggregator::new(
        proximity,
        store.clone(),
        Default::default(),
        Default::default(),
    );
    (store, search)
}

fn arb_world() -> impl Strategy<Value = (Vec<RestaurantRecord>, Vec<MenuRecord>)> {
    arb_restaurants(fixtures::MG_ROAD, 12).prop_flat_map(|restaurants| {
        let menus = restaurants
            .iter()
            .map(|r| arb_menu(r.restaurant_id.clone()))
            .collect::<Vec<_>>();
        (Just(restaurants), menus)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a restaurant is returned iff its hours parse, it is open,
    /// and it is strictly inside the serving radius.
    #[test]
    fn prop_find_close_by_membership(
        restaurants in arb_restaurants(fixtures::MG_ROAD, 20),
        (lat, lon) in arb_point_near(fixtures::MG_ROAD),
        instant in arb_instant(),
    ) {
        let (_, search) = build(restaurants.clone(), vec![]);
        let close = runtime()
            .block_on(search.proximity().find_close_by(lat, lon, instant))
            .unwrap();

        let policy = ServingPolicy::default();
        let radius = policy.radius_for(instant);
        let expected: Vec<String> = restaurants
            .iter()
            .filter(|r| {
                r.schedule().map(|s| s.is_open_at(instant)).unwrap_or(false)
                    && haversine_km(lat, lon, r.latitude, r.longitude) < radius
            })
            .map(|r| r.restaurant_id.clone())
            .collect();
        let actual: Vec<String> = close.iter().map(|r| r.restaurant_id.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: search results are unique and drawn from the proximity set.
    #[test]
    fn prop_search_results_unique_and_nearby(
        (restaurants, menus) in arb_world(),
        query in prop::sample::select(vec!["Tamil", "South", "Cafe", "a", "e", "Chinese"]),
        instant in arb_instant(),
    ) {
        let (lat, lon) = fixtures::RICHMOND_TOWN;
        let (_, search) = build(restaurants, menus);
        let rt = runtime();

        let results = rt.block_on(search.search(lat, lon, query, instant)).unwrap();
        let nearby: HashSet<String> = rt
            .block_on(search.proximity().find_close_by(lat, lon, instant))
            .unwrap()
            .into_iter()
            .map(|r| r.restaurant_id)
            .collect();

        let mut seen = HashSet::new();
        for r in &results {
            prop_assert!(seen.insert(r.restaurant_id.clone()), "duplicate {}", r.restaurant_id);
            prop_assert!(nearby.contains(&r.restaurant_id));
        }
    }

    /// Property: an empty query never reads the store.
    #[test]
    fn prop_empty_query_reads_nothing(
        restaurants in arb_restaurants(fixtures::MG_ROAD, 8),
        instant in arb_instant(),
    ) {
        let (store, search) = build(restaurants, vec![]);
        let (lat, lon) = fixtures::MG_ROAD;

        let results = runtime().block_on(search.search(lat, lon, "", instant)).unwrap();
        prop_assert!(results.is_empty());
        prop_assert_eq!(store.total_reads(), 0);
    }
}
