use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Listing;

/// A listing the user starred
#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    pub listing_id: String,
    pub listing: Listing,
    pub added_at: Option<DateTime<Utc>>,
}

/// Saved search the backend re-runs to notify the user of new listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    /// Backend query parameters, as produced by the mapper
    #[serde(default)]
    pub filters: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DigestFrequency {
    #[default]
    Instant,
    Daily,
    Weekly,
}

/// Per-user notification settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub email_enabled: bool,
    #[serde(default)]
    pub telegram_enabled: bool,
    #[serde(default)]
    pub frequency: DigestFrequency,
    /// Skip notifications for listings above this price
    #[serde(default)]
    pub max_price_alert: Option<u64>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_enabled: true,
            telegram_enabled: false,
            frequency: DigestFrequency::default(),
            max_price_alert: None,
        }
    }
}

fn default_true() -> bool {
    true
}
