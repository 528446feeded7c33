//! QEats Search - Proximity Filtering and Restaurant Search
//!
//! [`ProximityFilter`] answers "what is open and close to me right now";
//! [`SearchAggregator`] narrows that set by free-text query across restaurant
//! names, attributes and menu items.

pub mod aggregator;
pub mod proximity;
pub mod strategy;

pub use aggregator::SearchAggregator;
pub use proximity::{select_close_by, ProximityFilter};
pub use strategy::{MatchStrategy, SearchCorpus, TextMatcher};
