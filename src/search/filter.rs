use crate::geo::{self, GeoPoint};
use crate::models::Listing;
use crate::search::types::SearchCriteria;

/// `distance(origin, target) <= radius_m`; the boundary is inside
pub fn is_within_radius(origin: GeoPoint, target: GeoPoint, radius_m: f64) -> bool {
    geo::distance(origin, target) <= radius_m
}

/// Case-insensitive substring match against name or description; the query
/// is used verbatim, surrounding whitespace included
pub fn matches_text(listing: &Listing, text: &str) -> bool {
    let needle = text.to_lowercase();
    needle.is_empty()
        || listing.name.to_lowercase().contains(&needle)
        || listing.description.to_lowercase().contains(&needle)
}

/// Client-side filters that need no owner information
pub fn matches_criteria(listing: &Listing, criteria: &SearchCriteria) -> bool {
    (listing.available || criteria.include_unavailable)
        && criteria.category.is_none_or(|c| c == listing.category)
        && matches_text(listing, &criteria.text)
}

/// Distance from the origin and radius membership; no coordinates means
/// membership cannot be evaluated and the listing is not eligible
pub fn proximity(
    origin: GeoPoint,
    target: Option<GeoPoint>,
    radius_m: f64,
) -> (Option<f64>, bool) {
    match target {
        Some(target) => {
            let d = geo::distance(origin, target);
            (Some(d), d <= radius_m)
        }
        None => (None, false),
    }
}
