//! Rental period pricing and ownership checks for the details screen.

use crate::models::{Listing, Rental};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("rental ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Price of renting an item over a date range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RentalQuote {
    pub days: i64,
    pub daily_rate: f64,
    pub total: f64,
}

impl RentalQuote {
    /// Both the start and the end day are charged
    pub fn for_dates(
        daily_rate: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, QuoteError> {
        if end < start {
            return Err(QuoteError::EndBeforeStart { start, end });
        }
        let days = (end - start).num_days() + 1;
        Ok(Self {
            days,
            daily_rate,
            total: days as f64 * daily_rate,
        })
    }
}

pub fn is_owner(listing: &Listing, user_id: &str) -> bool {
    listing.owner_id == user_id
}

/// Whole days left before an active rental ends; `None` once it has ended
pub fn days_remaining(rental: &Rental, now: DateTime<Utc>) -> Option<i64> {
    rental
        .end_date
        .filter(|end| *end > now)
        .map(|end| (end - now).num_days())
}
