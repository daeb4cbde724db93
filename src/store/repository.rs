use crate::config::AppConfig;
use crate::error::StoreError;
use crate::models::{Category, Listing, Rental, UserProfile};
use crate::search::filter;
use crate::search::SearchCriteria;
use crate::store::record::{listing_from_document, profile_from_document, rental_from_document};
use crate::store::traits::{Document, DocumentStore, EqualityFilter};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const LISTINGS: &str = "RentOutPosts";
pub const USERS: &str = "users";
pub const RENTALS: &str = "RentedItems";

/// Owner lookups keyed by owner id; each failure is kept per owner
pub type OwnerMap = HashMap<String, Result<UserProfile, StoreError>>;

/// Typed read access to listings, profiles and rentals
#[derive(Clone)]
pub struct ListingRepository {
    store: Arc<dyn DocumentStore>,
    lookup_timeout: Duration,
    max_concurrent_lookups: usize,
    max_candidates: usize,
}

impl ListingRepository {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            store,
            lookup_timeout: config.lookup_timeout(),
            max_concurrent_lookups: config.max_concurrent_lookups.max(1),
            max_candidates: config.max_candidates,
        }
    }

    /// One query on the listings collection; only the category is pushed down
    ///
    /// `Other` is matched client-side: unrecognised category names coerce to it,
    /// so an equality filter on its display name would miss them.
    pub async fn fetch_candidates(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Listing>, StoreError> {
        let filters: Vec<EqualityFilter> = criteria
            .category
            .filter(|c| *c != Category::Other)
            .map(|c| EqualityFilter::new("category", c.display_name()))
            .into_iter()
            .collect();
        let docs = self.store.query(LISTINGS, &filters).await?;
        Ok(coerce_listings(&docs))
    }

    /// Point lookup bounded by the lookup timeout
    async fn timed_get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        match tokio::time::timeout(self.lookup_timeout, self.store.get(collection, id)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.lookup_timeout)),
        }
    }

    /// Point lookup of one owner profile
    pub async fn resolve_owner(&self, owner_id: &str) -> Result<UserProfile, StoreError> {
        match self.timed_get(USERS, owner_id).await? {
            Some(doc) => Ok(profile_from_document(&doc)),
            None => Err(StoreError::NotFound {
                collection: USERS.to_string(),
                id: owner_id.to_string(),
            }),
        }
    }

    /// Resolve every distinct owner once, with bounded concurrency
    pub async fn resolve_owners<'a, I>(&self, owner_ids: I) -> OwnerMap
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = owner_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        debug!("resolving {} distinct owners", distinct.len());

        stream::iter(distinct)
            .map(|id| async move { (id.to_string(), self.resolve_owner(id).await) })
            .buffer_unordered(self.max_concurrent_lookups)
            .inspect(|(id, result)| {
                if let Err(e) = result {
                    warn!(owner = %id, error = %e, "owner lookup failed");
                }
            })
            .collect()
            .await
    }

    /// Candidates that pass the client-side filters, joined with their owners
    #[instrument(level = "debug", skip(self), fields(text = %criteria.text))]
    pub async fn fetch_candidates_with_owners(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<Listing>, OwnerMap), StoreError> {
        let mut candidates: Vec<Listing> = self
            .fetch_candidates(criteria)
            .await?
            .into_iter()
            .filter(|l| filter::matches_criteria(l, criteria))
            .collect();

        if candidates.len() > self.max_candidates {
            warn!(
                "{} candidates exceed the cap of {}, truncating",
                candidates.len(),
                self.max_candidates
            );
            candidates.truncate(self.max_candidates);
        }

        let owners = self
            .resolve_owners(candidates.iter().map(|l| l.owner_id.as_str()))
            .await;
        Ok((candidates, owners))
    }

    pub async fn listing(&self, listing_id: &str) -> Result<Listing, StoreError> {
        match self.timed_get(LISTINGS, listing_id).await? {
            Some(doc) => listing_from_document(&doc),
            None => Err(StoreError::NotFound {
                collection: LISTINGS.to_string(),
                id: listing_id.to_string(),
            }),
        }
    }

    /// Profile of any user; `Ok(None)` if the user never completed registration
    pub async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .timed_get(USERS, user_id)
            .await?
            .map(|doc| profile_from_document(&doc)))
    }

    pub async fn listings_owned_by(&self, user_id: &str) -> Result<Vec<Listing>, StoreError> {
        let docs = self
            .store
            .query(LISTINGS, &[EqualityFilter::new("userId", user_id)])
            .await?;
        Ok(coerce_listings(&docs))
    }

    pub async fn rentals_for_renter(&self, user_id: &str) -> Result<Vec<Rental>, StoreError> {
        let docs = self
            .store
            .query(RENTALS, &[EqualityFilter::new("renterId", user_id)])
            .await?;
        Ok(coerce_rentals(&docs))
    }

    pub async fn rentals_for_listing(&self, listing_id: &str) -> Result<Vec<Rental>, StoreError> {
        let docs = self
            .store
            .query(RENTALS, &[EqualityFilter::new("itemId", listing_id)])
            .await?;
        Ok(coerce_rentals(&docs))
    }

    /// Whether any rental of the listing ends after `now`; lookup failures
    /// count as not rented
    pub async fn is_currently_rented(&self, listing_id: &str, now: DateTime<Utc>) -> bool {
        match self.rentals_for_listing(listing_id).await {
            Ok(rentals) => rentals.iter().any(|r| r.is_active_at(now)),
            Err(e) => {
                warn!(
                    listing = %listing_id,
                    error = %e,
                    "rental lookup failed, assuming not rented"
                );
                false
            }
        }
    }
}

fn coerce_listings(docs: &[Document]) -> Vec<Listing> {
    docs.iter()
        .filter_map(|doc| match listing_from_document(doc) {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!("skipping listing: {}", e);
                None
            }
        })
        .collect()
}

fn coerce_rentals(docs: &[Document]) -> Vec<Rental> {
    docs.iter()
        .filter_map(|doc| match rental_from_document(doc) {
            Ok(rental) => Some(rental),
            Err(e) => {
                warn!("skipping rental: {}", e);
                None
            }
        })
        .collect()
}
