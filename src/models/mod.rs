use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Listing category, stored in the listings collection by display name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Electronics,
    Tools,
    Sports,
    Camping,
    Party,
    Garden,
    Vehicles,
    Clothing,
    Books,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Electronics,
        Category::Tools,
        Category::Sports,
        Category::Camping,
        Category::Party,
        Category::Garden,
        Category::Vehicles,
        Category::Clothing,
        Category::Books,
        Category::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Tools => "Tools",
            Category::Sports => "Sports Equipment",
            Category::Camping => "Camping Gear",
            Category::Party => "Party & Events",
            Category::Garden => "Garden Equipment",
            Category::Vehicles => "Vehicles",
            Category::Clothing => "Clothing",
            Category::Books => "Books",
            Category::Other => "Other",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.display_name() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Condition of a listed item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Condition {
    New,
    LikeNew,
    VeryGood,
    Good,
    Acceptable,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::New,
        Condition::LikeNew,
        Condition::VeryGood,
        Condition::Good,
        Condition::Acceptable,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::LikeNew => "Like New",
            Condition::VeryGood => "Very Good",
            Condition::Good => "Good",
            Condition::Acceptable => "Acceptable",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.display_name() == name)
    }
}

/// Postal address of a user, optionally geocoded
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub coordinates: Option<GeoPoint>,
}

/// Profile of a registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<Address>,
    pub profile_image: Option<String>,
}

impl UserProfile {
    /// "First Last", trimmed when either half is missing
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.address.as_ref().and_then(|a| a.coordinates)
    }
}

/// A rentable item posted by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub daily_rate: f64,
    pub category: Category,
    pub condition: Option<Condition>,
    pub description: String,
    /// Advisory only; not enforced against concurrent rentals
    pub available: bool,
    /// Embedded image payload, kept opaque
    pub image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub owner_id: String,
}

/// One rental of a listing by a renter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rental {
    pub id: String,
    pub listing_id: String,
    pub renter_id: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Rental {
    /// A rental is active while its end date lies in the future
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end > now)
    }
}
