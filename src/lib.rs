//! Proximity search over a rental marketplace's listings.
//!
//! Listings and user profiles live in an external document store reached
//! through [`store::DocumentStore`]. [`search::SearchAggregator`] queries
//! candidate listings, resolves their owners, keeps those within the search
//! radius and publishes one de-duplicated, name-sorted result set per search
//! generation.

pub mod config;
pub mod error;
pub mod geo;
pub mod images;
pub mod models;
pub mod rental;
pub mod search;
pub mod store;

pub use config::{AppConfig, OwnerFailurePolicy};
pub use error::{SearchError, StoreError};
pub use geo::GeoPoint;
pub use search::{SearchAggregator, SearchCriteria, SearchOutcome, SearchResultSet};
pub use store::{ListingRepository, MemoryStore};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber filtered by `RUST_LOG`, or `level` when unset.
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logging(level: impl Into<LevelFilter>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.into().to_string()))?;

    // Err only means a global subscriber already exists
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}
