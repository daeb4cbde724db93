//! Typed coercion from untyped store records to domain structs.
//!
//! Missing or mistyped fields fall back to defaults (rate 0.0, strings empty,
//! availability true). Only identity fields are mandatory; without them the
//! record is rejected as [`StoreError::MalformedRecord`].

use crate::error::StoreError;
use crate::geo::GeoPoint;
use crate::models::{Address, Category, Condition, Listing, Rental, UserProfile};
use crate::store::traits::Document;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

pub fn listing_from_document(doc: &Document) -> Result<Listing, StoreError> {
    let f = &doc.fields;
    let owner_id = non_empty_str(f, "userId").ok_or(StoreError::MalformedRecord {
        id: doc.id.clone(),
        field: "userId",
    })?;

    let category = match str_field(f, "category") {
        Some(name) => Category::from_display_name(name).unwrap_or_else(|| {
            debug!(listing = %doc.id, category = name, "unknown category, using Other");
            Category::Other
        }),
        None => Category::Other,
    };

    Ok(Listing {
        id: doc.id.clone(),
        name: string_or_default(f, "name"),
        daily_rate: f.get("price").and_then(Value::as_f64).unwrap_or(0.0).max(0.0),
        category,
        condition: str_field(f, "condition").and_then(Condition::from_display_name),
        description: string_or_default(f, "description"),
        available: f.get("available").and_then(Value::as_bool).unwrap_or(true),
        image: first_image(f.get("images")),
        created_at: f.get("createdAt").and_then(timestamp),
        owner_id: owner_id.to_string(),
    })
}

pub fn profile_from_document(doc: &Document) -> UserProfile {
    let f = &doc.fields;
    UserProfile {
        id: doc.id.clone(),
        first_name: string_or_default(f, "firstName"),
        last_name: string_or_default(f, "lastName"),
        email: string_or_default(f, "email"),
        phone: string_or_default(f, "phone"),
        address: f.get("address").and_then(Value::as_object).map(address),
        profile_image: str_field(f, "profileImage").map(str::to_string),
    }
}

pub fn rental_from_document(doc: &Document) -> Result<Rental, StoreError> {
    let f = &doc.fields;
    let listing_id = non_empty_str(f, "itemId").ok_or(StoreError::MalformedRecord {
        id: doc.id.clone(),
        field: "itemId",
    })?;
    let renter_id = non_empty_str(f, "renterId").ok_or(StoreError::MalformedRecord {
        id: doc.id.clone(),
        field: "renterId",
    })?;

    Ok(Rental {
        id: doc.id.clone(),
        listing_id: listing_id.to_string(),
        renter_id: renter_id.to_string(),
        start_date: f.get("startDate").and_then(timestamp),
        end_date: f.get("endDate").and_then(timestamp),
    })
}

fn address(map: &Map<String, Value>) -> Address {
    let latitude = map.get("latitude").and_then(Value::as_f64);
    let longitude = map.get("longitude").and_then(Value::as_f64);
    Address {
        street: string_or_default(map, "street"),
        // house numbers were written both as strings and as integers
        number: match map.get("number") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        },
        city: string_or_default(map, "city"),
        zip_code: string_or_default(map, "zipCode"),
        country: string_or_default(map, "country"),
        coordinates: latitude
            .zip(longitude)
            .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
            .map(|(lat, lon)| GeoPoint::new(lat, lon)),
    }
}

/// First entry of the `images` map in key order
fn first_image(images: Option<&Value>) -> Option<String> {
    match images? {
        Value::Object(map) => map.values().find_map(|v| v.as_str().map(str::to_string)),
        Value::Array(list) => list.iter().find_map(|v| v.as_str().map(str::to_string)),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// RFC 3339 strings or epoch seconds
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    str_field(map, key).filter(|s| !s.is_empty())
}

fn string_or_default(map: &Map<String, Value>, key: &str) -> String {
    str_field(map, key).unwrap_or_default().to_string()
}
