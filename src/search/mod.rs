pub mod aggregator;
pub mod filter;
pub mod types;

pub use aggregator::SearchAggregator;
pub use filter::{is_within_radius, matches_text};
pub use types::{
    Dashboard, DashboardEntry, ListingDetails, ResultEntry, SearchCriteria, SearchOutcome,
    SearchResultSet, ALL_CATEGORIES,
};
