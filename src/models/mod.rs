pub mod account;
pub mod filters;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use filters::{BuildingMaterial, City, FilterState, FloorPosition, PropertyType, RoomChoice};

/// Number of listings requested per page
pub const PAGE_SIZE: u32 = 50;

/// Geographic position of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Canonical listing record.
///
/// Field names double as the normalizer's primary keys, so a serialized
/// `Listing` normalizes back to itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: String,
    pub source: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub area: f64,
    pub rooms: u32,
    pub bathrooms: u32,
    pub property_type: String,
    pub photos: Vec<String>,
    pub features: Vec<String>,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_available: bool,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            id: String::new(),
            source: String::new(),
            title: String::new(),
            price: 0.0,
            currency: String::new(),
            address: String::new(),
            coordinates: None,
            area: 0.0,
            rooms: 0,
            bathrooms: 0,
            property_type: String::new(),
            photos: Vec::new(),
            features: Vec::new(),
            url: String::new(),
            created_at: None,
            updated_at: None,
            is_available: true,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultPage {
    pub total: u64,
    pub listings: Vec<Listing>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl SearchResultPage {
    /// Number of pages needed to show `total` results.
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.page_size)
    }
}

/// `ceil(total / page_size)`; a zero page size yields zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Offset of the first record on a 1-based `page`.
pub fn skip_for(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}
