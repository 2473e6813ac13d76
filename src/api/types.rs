use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Search response body.
///
/// The backend has shipped two envelopes and mixes their keys: the list is
/// `listings` or `results`, the count is `total` or `total_count`, in any
/// pairing. A body with neither list key fails to decode.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SearchEnvelope {
    /// `{ "listings": [...], "total": N }`
    Current {
        listings: Vec<Value>,
        #[serde(default)]
        total: Option<Value>,
        #[serde(default)]
        total_count: Option<Value>,
    },
    /// `{ "results": [...], "total_count": N }`
    Legacy {
        results: Vec<Value>,
        #[serde(default)]
        total: Option<Value>,
        #[serde(default)]
        total_count: Option<Value>,
    },
}

impl SearchEnvelope {
    /// Flatten either envelope. `total` wins over `total_count`; when
    /// neither holds a usable count the number of listings returned is
    /// used.
    pub fn into_raw_page(self) -> RawSearchPage {
        let (listings, total, total_count) = match self {
            Self::Current {
                listings,
                total,
                total_count,
            } => (listings, total, total_count),
            Self::Legacy {
                results,
                total,
                total_count,
            } => (results, total, total_count),
        };
        let total = total
            .as_ref()
            .and_then(as_count)
            .or_else(|| total_count.as_ref().and_then(as_count))
            .unwrap_or(listings.len() as u64);
        RawSearchPage { listings, total }
    }
}

/// Non-negative count, also from a float such as `42.0`
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.round() as u64)
    })
}

/// Un-normalized listings plus the total match count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSearchPage {
    pub listings: Vec<Value>,
    pub total: u64,
}

/// Favorite as returned by `/favorites`
#[derive(Debug, Clone, Deserialize)]
pub struct RawFavorite {
    #[serde(default)]
    pub listing_id: Option<Value>,
    #[serde(default)]
    pub listing: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `/favorites` returns either a bare array or `{ "favorites": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FavoritesEnvelope {
    Bare(Vec<RawFavorite>),
    Wrapped { favorites: Vec<RawFavorite> },
}

impl FavoritesEnvelope {
    pub fn into_vec(self) -> Vec<RawFavorite> {
        match self {
            Self::Bare(items) | Self::Wrapped { favorites: items } => items,
        }
    }
}
