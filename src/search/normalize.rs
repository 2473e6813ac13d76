//! Maps raw backend listing objects onto the canonical [`Listing`].
//!
//! The backend renamed most listing fields over time. Each canonical field
//! has a fixed key list, canonical name first and legacy names after; the
//! first key holding a usable value wins, and a field with no usable key
//! falls back to its empty default. Nothing here can fail.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::models::{Coordinates, Listing};

const ID_KEYS: &[&str] = &["id", "_id", "listing_id", "external_id"];
const SOURCE_KEYS: &[&str] = &["source", "source_site", "site"];
const TITLE_KEYS: &[&str] = &["title", "name", "headline"];
const PRICE_KEYS: &[&str] = &["price", "price_value", "rent"];
const CURRENCY_KEYS: &[&str] = &["currency", "price_currency"];
const ADDRESS_KEYS: &[&str] = &["address", "address_text", "full_address", "location"];
const AREA_KEYS: &[&str] = &["area", "area_sqm", "surface", "sqm"];
const ROOMS_KEYS: &[&str] = &["rooms", "room_count", "rooms_count"];
const BATHROOMS_KEYS: &[&str] = &["bathrooms", "bathroom_count", "baths"];
const PROPERTY_TYPE_KEYS: &[&str] = &["property_type", "type", "category"];
const PHOTOS_KEYS: &[&str] = &["photos", "images", "photo_urls", "image_urls"];
const FEATURES_KEYS: &[&str] = &["features", "amenities", "tags"];
const URL_KEYS: &[&str] = &["url", "source_url", "link"];
const CREATED_KEYS: &[&str] = &["created_at", "published_at", "first_seen_at"];
const UPDATED_KEYS: &[&str] = &["updated_at", "last_seen_at", "scraped_at"];
const AVAILABLE_KEYS: &[&str] = &["is_available", "available", "is_active"];

/// Normalize one raw listing. Non-object input yields a default listing.
pub fn normalize_listing(raw: &Value) -> Listing {
    let Some(obj) = raw.as_object() else {
        return Listing::default();
    };

    Listing {
        id: first(obj, ID_KEYS, as_text).unwrap_or_default(),
        source: first(obj, SOURCE_KEYS, as_text).unwrap_or_default(),
        title: first(obj, TITLE_KEYS, as_text).unwrap_or_default(),
        price: first(obj, PRICE_KEYS, as_number).unwrap_or(0.0),
        currency: first(obj, CURRENCY_KEYS, as_text).unwrap_or_default(),
        address: first(obj, ADDRESS_KEYS, as_text).unwrap_or_default(),
        coordinates: coordinates(obj),
        area: first(obj, AREA_KEYS, as_number).unwrap_or(0.0),
        rooms: first(obj, ROOMS_KEYS, as_count).unwrap_or(0),
        bathrooms: first(obj, BATHROOMS_KEYS, as_count).unwrap_or(0),
        property_type: first(obj, PROPERTY_TYPE_KEYS, as_text).unwrap_or_default(),
        photos: first(obj, PHOTOS_KEYS, as_photo_list).unwrap_or_default(),
        features: first(obj, FEATURES_KEYS, as_text_list).unwrap_or_default(),
        url: first(obj, URL_KEYS, as_text).unwrap_or_default(),
        created_at: first(obj, CREATED_KEYS, as_timestamp),
        updated_at: first(obj, UPDATED_KEYS, as_timestamp),
        is_available: first(obj, AVAILABLE_KEYS, as_flag).unwrap_or(true),
    }
}

/// Normalize every element of a raw listings array.
pub fn normalize_listings(raw: &[Value]) -> Vec<Listing> {
    raw.iter().map(normalize_listing).collect()
}

/// First key in `keys` whose value `extract` accepts
fn first<T>(
    obj: &Map<String, Value>,
    keys: &[&str],
    extract: fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter().filter_map(|key| obj.get(*key)).find_map(extract)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            // "2.5 rooms" style counts are truncated
            .or_else(|| as_number(value).map(|f| f as u32)),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_text_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(as_text)
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Photos come as plain URLs or as `{ "url": ... }` objects.
fn as_photo_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::Object(photo) => photo.get("url").and_then(as_text),
                other => as_text(other),
            })
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// RFC 3339 strings or unix seconds
fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn coordinates(obj: &Map<String, Value>) -> Option<Coordinates> {
    if let Some(c) = obj.get("coordinates").and_then(coordinates_value) {
        return Some(c);
    }
    [("latitude", "longitude"), ("lat", "lng"), ("lat", "lon")]
        .iter()
        .find_map(|(lat_key, lng_key)| {
            let lat = obj.get(*lat_key).and_then(as_coordinate)?;
            let lng = obj.get(*lng_key).and_then(as_coordinate)?;
            valid_coordinates(lat, lng)
        })
}

/// `{lat, lng}` / `{lat, lon}` objects or GeoJSON-ordered `[lng, lat]` pairs
fn coordinates_value(value: &Value) -> Option<Coordinates> {
    match value {
        Value::Object(c) => {
            let lat = c.get("lat").and_then(as_coordinate)?;
            let lng = c
                .get("lng")
                .or_else(|| c.get("lon"))
                .and_then(as_coordinate)?;
            valid_coordinates(lat, lng)
        }
        Value::Array(pair) if pair.len() == 2 => {
            let lng = as_coordinate(&pair[0])?;
            let lat = as_coordinate(&pair[1])?;
            valid_coordinates(lat, lng)
        }
        _ => None,
    }
}

fn as_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn valid_coordinates(lat: f64, lng: f64) -> Option<Coordinates> {
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng))
        .then_some(Coordinates { lat, lng })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current_shape() -> Value {
        json!({
            "id": "abc-1",
            "source": "idealista",
            "title": "Bilocale Trastevere",
            "price": 1450.0,
            "currency": "EUR",
            "address": "Via della Lungaretta 12, Roma",
            "coordinates": {"lat": 41.889, "lng": 12.47},
            "area": 55.0,
            "rooms": 2,
            "bathrooms": 1,
            "property_type": "apartment",
            "photos": ["https://img.example/1.jpg"],
            "features": ["balcony", "elevator"],
            "url": "https://idealista.example/abc-1",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T10:00:00Z",
            "is_available": true
        })
    }

    fn legacy_shape() -> Value {
        json!({
            "_id": 9001,
            "site": "immobiliare",
            "name": "Trilocale Prati",
            "price_value": "2100",
            "address_text": "Via Cola di Rienzo 1",
            "lat": "41.907",
            "lng": 12.46,
            "surface": 80,
            "room_count": "3",
            "baths": 2,
            "type": "apartment",
            "images": [{"url": "https://img.example/a.jpg"}, "https://img.example/b.jpg", {"alt": "x"}],
            "amenities": ["garden", ""],
            "link": "https://immobiliare.example/9001",
            "published_at": 1_700_000_000,
            "available": 0
        })
    }

    #[test]
    fn current_shape_maps_field_for_field() {
        let listing = normalize_listing(&current_shape());
        assert_eq!(listing.id, "abc-1");
        assert_eq!(listing.source, "idealista");
        assert_eq!(listing.price, 1450.0);
        assert_eq!(
            listing.coordinates,
            Some(Coordinates {
                lat: 41.889,
                lng: 12.47
            })
        );
        assert_eq!(listing.rooms, 2);
        assert_eq!(listing.features, vec!["balcony", "elevator"]);
        assert!(listing.created_at.is_some());
        assert!(listing.is_available);
    }

    #[test]
    fn legacy_keys_are_used_as_fallbacks() {
        let listing = normalize_listing(&legacy_shape());
        assert_eq!(listing.id, "9001");
        assert_eq!(listing.source, "immobiliare");
        assert_eq!(listing.title, "Trilocale Prati");
        assert_eq!(listing.price, 2100.0);
        assert_eq!(listing.address, "Via Cola di Rienzo 1");
        assert_eq!(
            listing.coordinates,
            Some(Coordinates {
                lat: 41.907,
                lng: 12.46
            })
        );
        assert_eq!(listing.area, 80.0);
        assert_eq!(listing.rooms, 3);
        assert_eq!(listing.bathrooms, 2);
        assert_eq!(
            listing.photos,
            vec!["https://img.example/a.jpg", "https://img.example/b.jpg"]
        );
        assert_eq!(listing.features, vec!["garden"]);
        assert_eq!(listing.url, "https://immobiliare.example/9001");
        assert_eq!(
            listing.created_at,
            Utc.timestamp_opt(1_700_000_000, 0).single()
        );
        assert!(!listing.is_available);
    }

    #[test]
    fn primary_key_wins_over_legacy_key() {
        let listing = normalize_listing(&json!({"title": "new", "name": "old"}));
        assert_eq!(listing.title, "new");
    }

    #[test]
    fn unusable_primary_falls_through_to_legacy() {
        let listing = normalize_listing(&json!({
            "price": null,
            "rent": 700,
            "rooms": "many",
            "room_count": 1
        }));
        assert_eq!(listing.price, 700.0);
        assert_eq!(listing.rooms, 1);
    }

    #[test]
    fn empty_object_gets_defaults() {
        assert_eq!(normalize_listing(&json!({})), Listing::default());
    }

    #[test]
    fn non_object_input_gets_defaults() {
        for raw in [json!(null), json!(42), json!("listing"), json!([1, 2])] {
            assert_eq!(normalize_listing(&raw), Listing::default());
        }
    }

    #[test]
    fn malformed_fields_degrade_to_defaults() {
        let listing = normalize_listing(&json!({
            "id": {"nested": true},
            "price": -10,
            "area": "big",
            "photos": "not-a-list",
            "coordinates": {"lat": 200, "lng": 12},
            "created_at": "yesterday",
            "is_available": "maybe"
        }));
        assert_eq!(listing.id, "");
        assert_eq!(listing.price, 0.0);
        assert_eq!(listing.area, 0.0);
        assert!(listing.photos.is_empty());
        assert_eq!(listing.coordinates, None);
        assert_eq!(listing.created_at, None);
        assert!(listing.is_available);
    }

    #[test]
    fn geojson_pair_is_lng_then_lat() {
        let listing = normalize_listing(&json!({"coordinates": [12.5, 41.9]}));
        assert_eq!(
            listing.coordinates,
            Some(Coordinates {
                lat: 41.9,
                lng: 12.5
            })
        );
    }

    #[test]
    fn normalizing_is_idempotent() {
        for raw in [current_shape(), legacy_shape(), json!({}), json!({"price": "12.5"})] {
            let once = normalize_listing(&raw);
            let reserialized = serde_json::to_value(&once).unwrap();
            let twice = normalize_listing(&reserialized);
            assert_eq!(once, twice);
        }
    }
}
