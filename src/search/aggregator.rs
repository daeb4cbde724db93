use crate::config::{AppConfig, OwnerFailurePolicy};
use crate::error::{Result, SearchError, StoreError};
use crate::geo::GeoPoint;
use crate::models::{Listing, UserProfile};
use crate::search::filter;
use crate::search::types::{
    Dashboard, DashboardEntry, ListingDetails, ResultEntry, SearchCriteria, SearchOutcome,
    SearchResultSet,
};
use crate::store::{AuthService, ListingRepository, OwnerMap};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Runs proximity searches and publishes the newest generation's results
///
/// Every call to [`search`](Self::search) takes a fresh generation number.
/// A search that finishes after a newer one has started is reported as
/// [`SearchOutcome::Stale`] and never touches the published set, so a slow
/// old search cannot overwrite a newer one.
pub struct SearchAggregator {
    repo: ListingRepository,
    auth: Arc<dyn AuthService>,
    config: AppConfig,
    generation: AtomicU64,
    published: watch::Sender<SearchResultSet>,
}

impl SearchAggregator {
    pub fn new(repo: ListingRepository, auth: Arc<dyn AuthService>, config: AppConfig) -> Self {
        let (published, _) = watch::channel(SearchResultSet::default());
        Self {
            repo,
            auth,
            config,
            generation: AtomicU64::new(0),
            published,
        }
    }

    /// Receiver that observes every published result set
    pub fn subscribe(&self) -> watch::Receiver<SearchResultSet> {
        self.published.subscribe()
    }

    pub fn current(&self) -> SearchResultSet {
        self.published.borrow().clone()
    }

    /// Generation of the most recently started search
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Radius a search with `criteria` actually uses, after clamping
    pub fn effective_radius(&self, criteria: &SearchCriteria) -> f64 {
        self.config.radius.clamp(criteria.radius_m)
    }

    /// Search origin: the geocoded address of the signed-in user
    pub async fn resolve_origin(&self) -> Result<GeoPoint> {
        let profile = self.current_profile().await?;
        profile
            .coordinates()
            .ok_or(SearchError::OriginUnavailable(profile.id))
    }

    pub async fn current_profile(&self) -> Result<UserProfile> {
        let user_id = self.auth.current_user_id().ok_or(SearchError::NotSignedIn)?;
        self.repo
            .profile(&user_id)
            .await?
            .ok_or(SearchError::ProfileMissing(user_id))
    }

    /// Search around the signed-in user's own address
    pub async fn search_near_me(&self, criteria: SearchCriteria) -> Result<SearchOutcome> {
        let origin = self.resolve_origin().await?;
        self.search(origin, criteria).await
    }

    /// Run one search generation from `origin`
    ///
    /// A failed candidate query publishes an empty set for this generation
    /// and returns the error so the caller can show a notice.
    #[instrument(
        name = "search",
        level = "info",
        skip(self, criteria),
        fields(generation = tracing::field::Empty)
    )]
    pub async fn search(
        &self,
        origin: GeoPoint,
        mut criteria: SearchCriteria,
    ) -> Result<SearchOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("generation", generation);

        let radius = self.effective_radius(&criteria);
        if radius != criteria.radius_m {
            debug!("radius {} clamped to {}", criteria.radius_m, radius);
            criteria.radius_m = radius;
        }

        let (candidates, owners) = match self.repo.fetch_candidates_with_owners(&criteria).await {
            Ok(joined) => joined,
            Err(e) => {
                warn!(error = %e, "candidate query failed");
                self.publish(SearchResultSet {
                    generation,
                    entries: Vec::new(),
                });
                return Err(e.into());
            }
        };
        debug!("{} candidates, {} owners", candidates.len(), owners.len());

        let mut aggregation = Aggregation::new(generation, origin, radius, &self.config);
        for listing in candidates {
            aggregation.push(listing, &owners);
        }
        Ok(self.publish(aggregation.finish()))
    }

    /// Apply `set` unless a newer generation has started or been published
    fn publish(&self, set: SearchResultSet) -> SearchOutcome {
        let generation = set.generation;
        let snapshot = set.clone();
        let latest = &self.generation;
        let applied = self.published.send_if_modified(move |current| {
            if generation == latest.load(Ordering::SeqCst) && generation > current.generation {
                *current = set;
                true
            } else {
                false
            }
        });

        if applied {
            info!("published {} results for generation {}", snapshot.len(), generation);
            SearchOutcome::Published(snapshot)
        } else {
            debug!(
                "dropping stale generation {} (latest {})",
                generation,
                self.latest_generation()
            );
            SearchOutcome::Stale { generation }
        }
    }

    /// Listings the signed-in user is renting and renting out
    #[instrument(level = "info", skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let user_id = self.auth.current_user_id().ok_or(SearchError::NotSignedIn)?;
        let (rentals, owned) = tokio::try_join!(
            self.repo.rentals_for_renter(&user_id),
            self.repo.listings_owned_by(&user_id),
        )?;

        let fetched = join_all(rentals.iter().map(|r| self.repo.listing(&r.listing_id))).await;
        let rented: Vec<_> = rentals
            .into_iter()
            .zip(fetched)
            .filter_map(|(rental, listing)| match listing {
                Ok(listing) => Some((rental, listing)),
                Err(e) => {
                    warn!(rental = %rental.id, error = %e, "rented listing unavailable");
                    None
                }
            })
            .collect();

        let owners = self
            .repo
            .resolve_owners(
                rented
                    .iter()
                    .map(|(_, l)| l.owner_id.as_str())
                    .chain(owned.iter().map(|l| l.owner_id.as_str())),
            )
            .await;

        let renting = rented
            .into_iter()
            .filter_map(|(rental, listing)| {
                let owner_name = self.owner_label(&listing, &owners)?;
                Some(DashboardEntry {
                    listing,
                    owner_name,
                    rental: Some(rental),
                })
            })
            .collect();
        let renting_out = owned
            .into_iter()
            .filter_map(|listing| {
                let owner_name = self.owner_label(&listing, &owners)?;
                Some(DashboardEntry {
                    listing,
                    owner_name,
                    rental: None,
                })
            })
            .collect();

        Ok(Dashboard {
            renting: dedupe_sorted(renting),
            renting_out: dedupe_sorted(renting_out),
        })
    }

    /// Details screen state for one listing as seen by the signed-in user
    pub async fn details(&self, listing_id: &str, now: DateTime<Utc>) -> Result<ListingDetails> {
        let listing = self.repo.listing(listing_id).await?;
        let (owner, currently_rented) = tokio::join!(
            self.repo.resolve_owner(&listing.owner_id),
            self.repo.is_currently_rented(listing_id, now),
        );
        let owner_name = match owner {
            Ok(profile) => profile.display_name(),
            Err(e) => {
                debug!(error = %e, "owner lookup failed for details");
                self.config.unknown_owner_label.clone()
            }
        };
        let is_owner = self
            .auth
            .current_user_id()
            .is_some_and(|id| crate::rental::is_owner(&listing, &id));

        Ok(ListingDetails {
            listing,
            owner_name,
            is_owner,
            currently_rented,
        })
    }

    /// Owner display name, or the failure policy's answer when the lookup failed
    fn owner_label(&self, listing: &Listing, owners: &OwnerMap) -> Option<String> {
        match owners.get(&listing.owner_id) {
            Some(Ok(profile)) => Some(profile.display_name()),
            _ => match self.config.owner_failure_policy {
                OwnerFailurePolicy::Drop => None,
                OwnerFailurePolicy::UnknownOwner => Some(self.config.unknown_owner_label.clone()),
            },
        }
    }
}

/// Accumulator owned by a single search invocation
struct Aggregation<'a> {
    generation: u64,
    origin: GeoPoint,
    radius_m: f64,
    config: &'a AppConfig,
    entries: Vec<ResultEntry>,
}

impl<'a> Aggregation<'a> {
    fn new(generation: u64, origin: GeoPoint, radius_m: f64, config: &'a AppConfig) -> Self {
        Self {
            generation,
            origin,
            radius_m,
            config,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, listing: Listing, owners: &OwnerMap) {
        let owner: Option<&std::result::Result<UserProfile, StoreError>> =
            owners.get(&listing.owner_id);
        match owner {
            Some(Ok(profile)) => {
                let (distance_m, within_radius) =
                    filter::proximity(self.origin, profile.coordinates(), self.radius_m);
                if within_radius {
                    self.entries.push(ResultEntry {
                        listing,
                        owner_name: profile.display_name(),
                        distance_m,
                        within_radius,
                    });
                }
            }
            _ => {
                if self.config.owner_failure_policy == OwnerFailurePolicy::UnknownOwner {
                    self.entries.push(ResultEntry {
                        listing,
                        owner_name: self.config.unknown_owner_label.clone(),
                        distance_m: None,
                        within_radius: false,
                    });
                }
            }
        }
    }

    /// Dedupe by listing id keeping the first occurrence, then sort by name
    fn finish(self) -> SearchResultSet {
        let mut seen = HashSet::new();
        let mut entries: Vec<ResultEntry> = self
            .entries
            .into_iter()
            .filter(|e| seen.insert(e.listing.id.clone()))
            .collect();
        entries.sort_by(|a, b| a.listing.name.cmp(&b.listing.name));
        SearchResultSet {
            generation: self.generation,
            entries,
        }
    }
}

fn dedupe_sorted(entries: Vec<DashboardEntry>) -> Vec<DashboardEntry> {
    let mut seen = HashSet::new();
    let mut entries: Vec<DashboardEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.listing.id.clone()))
        .collect();
    entries.sort_by(|a, b| a.listing.name.cmp(&b.listing.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn listing(id: &str, name: &str, owner: &str) -> Listing {
        Listing {
            id: id.into(),
            name: name.into(),
            daily_rate: 1.0,
            category: Category::Tools,
            condition: None,
            description: String::new(),
            available: true,
            image: None,
            created_at: None,
            owner_id: owner.into(),
        }
    }

    fn owner_at(id: &str, point: GeoPoint) -> UserProfile {
        UserProfile {
            id: id.into(),
            first_name: "Owner".into(),
            last_name: id.into(),
            email: String::new(),
            phone: String::new(),
            address: Some(crate::models::Address {
                coordinates: Some(point),
                ..Default::default()
            }),
            profile_image: None,
        }
    }

    #[test]
    fn finish_dedupes_and_sorts_case_sensitively() {
        let config = AppConfig::default();
        let origin = GeoPoint::new(0.0, 0.0);
        let mut owners = OwnerMap::new();
        owners.insert("u1".into(), Ok(owner_at("u1", origin)));

        let mut agg = Aggregation::new(3, origin, 200.0, &config);
        agg.push(listing("b", "saw", "u1"), &owners);
        agg.push(listing("a", "Drill", "u1"), &owners);
        agg.push(listing("b", "saw", "u1"), &owners);
        agg.push(listing("c", "Tent", "u1"), &owners);

        let set = agg.finish();
        assert_eq!(set.generation, 3);
        assert_eq!(set.listing_ids(), vec!["a", "c", "b"]);
    }

    #[test]
    fn missing_owner_follows_policy() {
        let origin = GeoPoint::new(0.0, 0.0);
        let mut owners = OwnerMap::new();
        owners.insert("u1".into(), Err(StoreError::Transient("down".into())));

        let drop = AppConfig::default();
        let mut agg = Aggregation::new(1, origin, 200.0, &drop);
        agg.push(listing("a", "Drill", "u1"), &owners);
        assert!(agg.finish().is_empty());

        let keep = AppConfig {
            owner_failure_policy: OwnerFailurePolicy::UnknownOwner,
            ..AppConfig::default()
        };
        let mut agg = Aggregation::new(1, origin, 200.0, &keep);
        agg.push(listing("a", "Drill", "u1"), &owners);
        let set = agg.finish();
        assert_eq!(set.entries[0].owner_name, "Unknown");
        assert!(!set.entries[0].within_radius);
        assert_eq!(set.entries[0].distance_m, None);
    }
}
