//! The five match strategies and the text comparison they share.
//!
//! Each strategy is computed independently over the same candidate set.
//! Attribute and item strategies run an exact pass, then a substring pass,
//! so exact hits come first within a strategy.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use qeats_core::{MatchMode, MenuRecord, RestaurantRecord};

/// One way a restaurant can match a query, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    NameExact,
    NameSubstring,
    Attribute,
    ItemName,
    ItemAttribute,
}

impl MatchStrategy {
    /// Every strategy, in the order results are merged.
    pub const ALL: [MatchStrategy; 5] = [
        MatchStrategy::NameExact,
        MatchStrategy::NameSubstring,
        MatchStrategy::Attribute,
        MatchStrategy::ItemName,
        MatchStrategy::ItemAttribute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::NameExact => "name_exact",
            MatchStrategy::NameSubstring => "name_substring",
            MatchStrategy::Attribute => "attribute",
            MatchStrategy::ItemName => "item_name",
            MatchStrategy::ItemAttribute => "item_attribute",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TEXT MATCHING
// ============================================================================

/// Compares candidate strings against a fixed query under a [`MatchMode`].
#[derive(Debug, Clone)]
pub struct TextMatcher {
    mode: MatchMode,
    query: String,
}

impl TextMatcher {
    pub fn new(query: &str, mode: MatchMode) -> Self {
        Self {
            mode,
            query: normalize(query, mode).into_owned(),
        }
    }

    pub fn is_exact(&self, candidate: &str) -> bool {
        normalize(candidate, self.mode) == self.query
    }

    /// Substring containment. An exact match is also a substring match.
    pub fn is_substring(&self, candidate: &str) -> bool {
        normalize(candidate, self.mode).contains(self.query.as_str())
    }

    fn any_exact(&self, candidates: &[String]) -> bool {
        candidates.iter().any(|c| self.is_exact(c))
    }

    fn any_substring(&self, candidates: &[String]) -> bool {
        candidates.iter().any(|c| self.is_substring(c))
    }
}

fn normalize(text: &str, mode: MatchMode) -> Cow<'_, str> {
    match mode {
        MatchMode::CaseSensitive => Cow::Borrowed(text),
        MatchMode::CaseInsensitive => Cow::Owned(text.to_lowercase()),
    }
}

// ============================================================================
// CORPUS
// ============================================================================

/// Candidate restaurants plus the menus that may refer to them.
///
/// Menus are tied to candidates by restaurant id only. Menus whose
/// restaurant is not a candidate, or does not exist, never match.
pub struct SearchCorpus<'a> {
    candidates: &'a [RestaurantRecord],
    menus: &'a [MenuRecord],
    by_id: HashMap<&'a str, &'a RestaurantRecord>,
}

impl<'a> SearchCorpus<'a> {
    pub fn new(candidates: &'a [RestaurantRecord], menus: &'a [MenuRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(candidates.len());
        for restaurant in candidates {
            by_id.entry(restaurant.restaurant_id.as_str()).or_insert(restaurant);
        }
        Self {
            candidates,
            menus,
            by_id,
        }
    }

    /// Restaurants matched by `strategy`, without repeats.
    pub fn matches(
        &self,
        strategy: MatchStrategy,
        matcher: &TextMatcher,
    ) -> Vec<&'a RestaurantRecord> {
        let hits: Vec<&'a RestaurantRecord> = match strategy {
            MatchStrategy::NameExact => self.restaurants_where(|r| matcher.is_exact(&r.name)),
            MatchStrategy::NameSubstring => {
                self.restaurants_where(|r| matcher.is_substring(&r.name))
            }
            MatchStrategy::Attribute => {
                let mut hits = self.restaurants_where(|r| matcher.any_exact(&r.attributes));
                hits.extend(self.restaurants_where(|r| matcher.any_substring(&r.attributes)));
                hits
            }
            MatchStrategy::ItemName => {
                let mut hits = self.menus_where(|m| m.items.iter().any(|i| matcher.is_exact(&i.name)));
                hits.extend(self.menus_where(|m| {
                    m.items.iter().any(|i| matcher.is_substring(&i.name))
                }));
                hits
            }
            MatchStrategy::ItemAttribute => {
                let mut hits = self.menus_where(|m| {
                    m.items.iter().any(|i| matcher.any_exact(&i.attributes))
                });
                hits.extend(self.menus_where(|m| {
                    m.items.iter().any(|i| matcher.any_substring(&i.attributes))
                }));
                hits
            }
        };
        dedup_by_id(hits)
    }

    fn restaurants_where<F>(&self, predicate: F) -> Vec<&'a RestaurantRecord>
    where
        F: Fn(&RestaurantRecord) -> bool,
    {
        self.candidates.iter().filter(|r| predicate(r)).collect()
    }

    /// Candidate restaurants owning a menu that satisfies `predicate`, in
    /// menu order.
    fn menus_where<F>(&self, predicate: F) -> Vec<&'a RestaurantRecord>
    where
        F: Fn(&MenuRecord) -> bool,
    {
        self.menus
            .iter()
            .filter(|menu| predicate(menu))
            .filter_map(|menu| self.by_id.get(menu.restaurant_id.as_str()).copied())
            .collect()
    }
}

fn dedup_by_id(hits: Vec<&RestaurantRecord>) -> Vec<&RestaurantRecord> {
    let mut seen = HashSet::with_capacity(hits.len());
    hits.into_iter()
        .filter(|r| seen.insert(r.restaurant_id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qeats_test_utils::{fixtures, menu, RestaurantBuilder};

    fn ids(hits: &[&RestaurantRecord]) -> Vec<String> {
        hits.iter().map(|r| r.restaurant_id.clone()).collect()
    }

    #[test]
    fn test_case_sensitive_matcher() {
        let m = TextMatcher::new("Dosa", MatchMode::CaseSensitive);
        assert!(m.is_exact("Dosa"));
        assert!(!m.is_exact("dosa"));
        assert!(m.is_substring("Masala Dosa"));
        assert!(!m.is_substring("masala dosa"));
    }

    #[test]
    fn test_case_insensitive_matcher() {
        let m = TextMatcher::new("DOSA", MatchMode::CaseInsensitive);
        assert!(m.is_exact("dosa"));
        assert!(m.is_substring("Masala Dosa"));
    }

    #[test]
    fn test_name_exact_and_substring() {
        let restaurants = vec![
            RestaurantBuilder::new("1").name("A2B Express").build(),
            RestaurantBuilder::new("2").name("A2B").build(),
        ];
        let corpus = SearchCorpus::new(&restaurants, &[]);
        let matcher = TextMatcher::new("A2B", MatchMode::CaseSensitive);

        assert_eq!(ids(&corpus.matches(MatchStrategy::NameExact, &matcher)), vec!["2"]);
        assert_eq!(
            ids(&corpus.matches(MatchStrategy::NameSubstring, &matcher)),
            vec!["1", "2"]
        );
    }

    #[test]
    fn test_attribute_exact_hits_come_first() {
        let restaurants = vec![
            RestaurantBuilder::new("1").attributes(&["Tamil Nadu Meals"]).build(),
            RestaurantBuilder::new("2").attributes(&["Tamil"]).build(),
        ];
        let corpus = SearchCorpus::new(&restaurants, &[]);
        let matcher = TextMatcher::new("Tamil", MatchMode::CaseSensitive);

        assert_eq!(
            ids(&corpus.matches(MatchStrategy::Attribute, &matcher)),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_item_matches_follow_menu_restaurant_id() {
        let restaurants = vec![
            RestaurantBuilder::new("1").name("First").build(),
            RestaurantBuilder::new("2").name("Second").build(),
        ];
        // Menu order deliberately differs from restaurant order.
        let menus = vec![
            menu("2", vec![("Idly", vec!["Steamed"])]),
            menu("1", vec![("Plain Dosa", vec![])]),
        ];
        let corpus = SearchCorpus::new(&restaurants, &menus);

        let idly = TextMatcher::new("Idly", MatchMode::CaseSensitive);
        assert_eq!(ids(&corpus.matches(MatchStrategy::ItemName, &idly)), vec!["2"]);

        let steamed = TextMatcher::new("Steam", MatchMode::CaseSensitive);
        assert_eq!(
            ids(&corpus.matches(MatchStrategy::ItemAttribute, &steamed)),
            vec!["2"]
        );
    }

    #[test]
    fn test_dangling_and_out_of_set_menus_ignored() {
        let restaurants = vec![fixtures::a2b()];
        let menus = fixtures::menus();
        let corpus = SearchCorpus::new(&restaurants, &menus);
        let matcher = TextMatcher::new("Idly", MatchMode::CaseSensitive);

        // Menus "20" and "404" also sell Idly but are not candidates.
        assert_eq!(ids(&corpus.matches(MatchStrategy::ItemName, &matcher)), vec!["10"]);
    }

    #[test]
    fn test_strategy_results_have_no_repeats() {
        let restaurants = vec![RestaurantBuilder::new("1").build()];
        let menus = vec![
            menu("1", vec![("Idly", vec![]), ("Rava Idly", vec![])]),
            menu("1", vec![("Idly", vec![])]),
        ];
        let corpus = SearchCorpus::new(&restaurants, &menus);
        let matcher = TextMatcher::new("Idly", MatchMode::CaseSensitive);

        assert_eq!(ids(&corpus.matches(MatchStrategy::ItemName, &matcher)), vec!["1"]);
    }

    #[test]
    fn test_merge_order_constant() {
        assert_eq!(MatchStrategy::ALL[0], MatchStrategy::NameExact);
        assert_eq!(MatchStrategy::ALL[4], MatchStrategy::ItemAttribute);
        assert_eq!(MatchStrategy::ItemName.to_string(), "item_name");
    }
}
