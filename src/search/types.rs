use crate::models::{Category, Listing, Rental};
use serde::{Deserialize, Serialize};

/// Category selector value that disables the category filter
pub const ALL_CATEGORIES: &str = "All Categories";

/// Search parameters for one search invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchCriteria {
    /// Case-insensitive substring of name or description; empty matches all
    pub text: String,
    /// `None` searches all categories
    pub category: Option<Category>,
    pub radius_m: f64,
    pub include_unavailable: bool,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            text: String::new(),
            category: None,
            radius_m: 1_000.0,
            include_unavailable: false,
        }
    }
}

impl SearchCriteria {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Select a category by its display name; the "All Categories" sentinel,
    /// empty and unknown names select all
    pub fn category_name(self, name: &str) -> Self {
        let category = if name == ALL_CATEGORIES {
            None
        } else {
            Category::from_display_name(name)
        };
        self.category(category)
    }

    pub fn radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn radius_km(self, radius_km: f64) -> Self {
        self.radius_m(radius_km * 1_000.0)
    }

    pub fn include_unavailable(mut self, include: bool) -> Self {
        self.include_unavailable = include;
        self
    }
}

/// One published listing with its owner resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultEntry {
    pub listing: Listing,
    pub owner_name: String,
    /// Distance from the search origin; `None` when the owner has no coordinates
    pub distance_m: Option<f64>,
    pub within_radius: bool,
}

/// The visible result set of one search generation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResultSet {
    pub generation: u64,
    pub entries: Vec<ResultEntry>,
}

impl SearchResultSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn listing_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.listing.id.as_str()).collect()
    }
}

/// Result of running one search generation
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Published(SearchResultSet),
    /// A newer search started before this one finished; its results were dropped
    Stale { generation: u64 },
}

impl SearchOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, SearchOutcome::Stale { .. })
    }

    pub fn published(self) -> Option<SearchResultSet> {
        match self {
            SearchOutcome::Published(set) => Some(set),
            SearchOutcome::Stale { .. } => None,
        }
    }
}

/// Home screen: what the signed-in user rents and rents out
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub renting: Vec<DashboardEntry>,
    pub renting_out: Vec<DashboardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardEntry {
    pub listing: Listing,
    pub owner_name: String,
    /// The rental period, for listings the user is renting
    pub rental: Option<Rental>,
}

/// Everything the details screen shows about a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDetails {
    pub listing: Listing,
    pub owner_name: String,
    pub is_owner: bool,
    pub currently_rented: bool,
}

impl ListingDetails {
    /// Only non-owners can rent, and only while the item is free
    pub fn can_rent(&self) -> bool {
        !self.is_owner && !self.currently_rented && self.listing.available
    }

    /// Owners may toggle availability or remove the listing while it is not rented
    pub fn can_manage(&self) -> bool {
        self.is_owner && !self.currently_rented
    }
}
